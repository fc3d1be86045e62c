use crate::config::constants::*;

/// Annuity factor for an asset with the given lifetime in years and
/// discount rate, e.g. calc_annuity(20.0, 0.05) * 20.0 = 1.6
pub fn calc_annuity(lifetime_years: f64, discount_rate: f64) -> f64 {
    if discount_rate > 0.0 {
        discount_rate / (1.0 - 1.0 / (1.0 + discount_rate).powf(lifetime_years))
    } else {
        1.0 / lifetime_years
    }
}

/// Normalise a series so it sums to one. A zero-sum series stays all zero.
pub fn normed(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| v / total).collect()
}

/// Convert a raw cost value to ZAR per MW conventions based on its unit label.
/// Per-kW figures are scaled to per-MW, USD figures to EUR, EUR figures to ZAR.
pub fn convert_cost_value(value: f64, unit: &str, usd_to_eur: f64, eur_to_zar: f64) -> f64 {
    let mut v = value;
    if unit.contains("/kW") {
        v *= COST_PER_KW_TO_PER_MW;
    }
    if unit.contains("USD") {
        v *= usd_to_eur;
    }
    if unit.contains("EUR") {
        v *= eur_to_zar;
    }
    v
}

/// Thermal efficiency from a heat rate in GJ per MWh electric.
pub fn heat_rate_to_efficiency(heat_rate_gj_per_mwh: f64) -> f64 {
    GJ_PER_MWH / heat_rate_gj_per_mwh
}

/// Fuel cost in R per MWh electric from a fuel price in R per GJ thermal.
pub fn fuel_cost_per_mwh_el(fuel_price_r_per_gj: f64, efficiency: f64) -> f64 {
    GJ_PER_MWH * fuel_price_r_per_gj / efficiency
}

/// Per-unit hourly ramp limit from a ramp rate in MW per minute.
pub fn ramp_limit_per_unit(max_ramp_mw_per_min: f64, p_nom_mw: f64) -> f64 {
    MINUTES_PER_HOUR * max_ramp_mw_per_min / p_nom_mw
}
