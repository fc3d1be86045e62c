use std::collections::{BTreeMap, HashMap};

use anyhow::{anyhow, Result};
use chrono::Duration;
use tracing::{info, warn};

use crate::config::constants::GAS_LIMIT_WILDCARD_SCALE;
use crate::config::model_config::ModelConfig;
use crate::core::attach::update_transmission_costs;
use crate::core::network::Network;
use crate::core::scenario::{
    LimitFactor, LimitKind, ScaleAttr, Scenario, ScenarioOpt, TransmissionLimit,
};
use crate::data::costs_loader::CostTable;
use crate::data::renewables_loader::AreaRecord;
use crate::data::sources::RENEWABLE_CARRIERS;
use crate::models::global_constraint::{ConstraintType, GlobalConstraint, Sense};
use crate::utils::logging::{self, OperationCategory};

/// Apply every scenario adjustment to an assembled network, in the fixed
/// order: renewable caps, line security margin, temporal options, emission
/// and usage caps, carrier scalings, emission prices, the reserve-margin
/// hour and finally the transmission expansion limit.
pub fn apply_scenario(
    n: &mut Network,
    scenario: &Scenario,
    config: &ModelConfig,
    costs: &CostTable,
    areas: &HashMap<String, Vec<AreaRecord>>,
) -> Result<()> {
    let _timing = logging::start_timing("apply_scenario", OperationCategory::ScenarioAdjust);

    add_renewable_expansion_limits(n, areas, &config.respotentials.capacity_per_sqm);
    set_line_s_max_pu(n, config.lines.s_max_pu);

    if let Some(hours) = scenario.opts.iter().find_map(|o| match o {
        ScenarioOpt::Resample { hours } => Some(*hours),
        _ => None,
    }) {
        info!("Resampling the network to {}h resolution", hours);
        *n = average_every_nhours(n, hours)?;
    }

    if let Some(segments) = scenario.opts.iter().find_map(|o| match o {
        ScenarioOpt::Segment { segments } => Some(*segments),
        _ => None,
    }) {
        info!("Aggregating time series to {} segments", segments);
        *n = apply_time_segmentation(n, segments)?;
    }

    if let Some(factor) = scenario.opts.iter().find_map(|o| match o {
        ScenarioOpt::Co2Limit { factor } => Some(*factor),
        _ => None,
    }) {
        let limit = match factor {
            Some(f) => {
                info!("Setting CO2 limit from wildcard factor {}", f);
                f * config.electricity.co2_base
            }
            None => {
                info!("Setting CO2 limit from config");
                config.electricity.co2_limit
            }
        };
        add_co2limit(n, limit);
    }

    if let Some(factor) = scenario.opts.iter().find_map(|o| match o {
        ScenarioOpt::GasLimit { factor } => Some(*factor),
        _ => None,
    }) {
        let limit = match factor {
            Some(f) => f * GAS_LIMIT_WILDCARD_SCALE,
            None => config
                .electricity
                .gas_limit
                .ok_or_else(|| anyhow!("CH4L requested but no gas limit configured"))?,
        };
        add_gaslimit(n, limit * n.n_years());
    }

    for opt in &scenario.opts {
        if let ScenarioOpt::CarrierScale {
            carrier,
            attr,
            factor,
        } = opt
        {
            scale_carrier_attribute(n, carrier, *attr, *factor);
        }
    }

    if let Some(price) = scenario.opts.iter().find_map(|o| match o {
        ScenarioOpt::EmissionPrices { co2_price } => Some(*co2_price),
        _ => None,
    }) {
        let prices = match price {
            Some(p) => {
                info!("Setting emission prices from wildcard value");
                HashMap::from([("co2".to_string(), p)])
            }
            None => {
                info!("Setting emission prices from config");
                config.costs.emission_prices.clone()
            }
        };
        add_emission_prices(n, &prices);
    }

    if scenario.opts.iter().any(|o| matches!(o, ScenarioOpt::Safe)) {
        add_safe_reserve_snapshot(n, config.electricity.safe_reserve_margin)?;
    }

    set_transmission_limit(n, &scenario.ll, costs, config.lines.length_factor)?;
    set_line_nom_max(n, config.lines.s_nom_max, config.links.p_nom_max);

    Ok(())
}

/// Per-bus expansion caps for area-constrained renewables.
pub fn add_renewable_expansion_limits(
    n: &mut Network,
    areas: &HashMap<String, Vec<AreaRecord>>,
    capacity_per_sqm: &HashMap<String, f64>,
) {
    for carrier in RENEWABLE_CARRIERS {
        let (carrier_areas, per_sqm) = match (areas.get(carrier), capacity_per_sqm.get(carrier)) {
            (Some(a), Some(c)) => (a, *c),
            _ => continue,
        };
        for area in carrier_areas {
            if n.bus(&area.region).is_none() {
                continue;
            }
            n.add_global_constraint(GlobalConstraint {
                name: format!("TechLimit {} {}", area.region, carrier),
                constraint_type: ConstraintType::TechCapacityExpansionLimit,
                carrier_attribute: carrier.to_string(),
                sense: Sense::LessEqual,
                constant: area.available_area * per_sqm,
                bus: Some(area.region.clone()),
            });
        }
    }
}

pub fn set_line_s_max_pu(n: &mut Network, s_max_pu: f64) {
    for line in n.lines_mut() {
        line.s_max_pu = s_max_pu;
    }
    info!("N-1 security margin of lines set to {}", s_max_pu);
}

/// Aggregate the time dimension over the given per-snapshot group keys:
/// weightings are summed, series averaged, the first timestamp of each
/// group survives.
fn aggregate_snapshots(n: &Network, group_keys: &[usize]) -> Network {
    let snapshots = n.snapshots();
    let weightings = n.snapshot_weightings();

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (position, key) in group_keys.iter().enumerate() {
        groups.entry(*key).or_default().push(position);
    }

    let mut new_snapshots = Vec::with_capacity(groups.len());
    let mut new_weightings = Vec::with_capacity(groups.len());
    for positions in groups.values() {
        new_snapshots.push(snapshots[positions[0]]);
        new_weightings.push(positions.iter().map(|i| weightings[*i]).sum());
    }

    let mean_over_groups = |column: &[f64]| -> Vec<f64> {
        groups
            .values()
            .map(|positions| {
                positions.iter().map(|i| column[*i]).sum::<f64>() / positions.len() as f64
            })
            .collect()
    };

    let generators = n.generators_p_max_pu().map_columns(mean_over_groups);
    let loads = n.loads_p_set().map_columns(mean_over_groups);
    let inflow = n.storage_units_inflow().map_columns(mean_over_groups);

    let mut m = n.clone();
    m.replace_time_dimension(new_snapshots, new_weightings, generators, loads, inflow);
    m
}

/// Average the network to a coarser resolution of `hours`-sized buckets
/// anchored at the first snapshot.
pub fn average_every_nhours(n: &Network, hours: u32) -> Result<Network> {
    if hours == 0 {
        return Err(anyhow!("resampling resolution must be positive"));
    }
    let snapshots = n.snapshots();
    if snapshots.is_empty() {
        return Ok(n.clone());
    }
    let first = snapshots[0];
    let keys: Vec<usize> = snapshots
        .iter()
        .map(|t| {
            let offset = t.signed_duration_since(first).num_hours();
            (offset / hours as i64) as usize
        })
        .collect();
    Ok(aggregate_snapshots(n, &keys))
}

/// Aggregate the horizon into `segments` spans of equal snapshot count.
/// Proper feature-driven segmentation is left to external tooling; this
/// keeps the segment count contract while staying deterministic.
pub fn apply_time_segmentation(n: &Network, segments: u32) -> Result<Network> {
    if segments == 0 {
        return Err(anyhow!("segment count must be positive"));
    }
    let count = n.snapshots().len();
    if count == 0 {
        return Ok(n.clone());
    }
    if segments as usize >= count {
        warn!(
            "Requested {} segments for {} snapshots, keeping the network unchanged",
            segments, count
        );
        return Ok(n.clone());
    }
    let span = count.div_ceil(segments as usize);
    let keys: Vec<usize> = (0..count).map(|i| i / span).collect();
    Ok(aggregate_snapshots(n, &keys))
}

pub fn add_co2limit(n: &mut Network, limit: f64) {
    n.add_global_constraint(GlobalConstraint {
        name: "CO2Limit".to_string(),
        constraint_type: ConstraintType::PrimaryEnergy,
        carrier_attribute: "co2_emissions".to_string(),
        sense: Sense::LessEqual,
        constant: limit,
        bus: None,
    });
}

/// Cap the thermal energy drawn by gas-burning carriers.
pub fn add_gaslimit(n: &mut Network, limit: f64) {
    for carrier in ["OCGT", "CCGT", "CHP"] {
        if let Some(c) = n.carrier_mut(carrier) {
            c.gas_usage = 1.0;
        }
    }
    n.add_global_constraint(GlobalConstraint {
        name: "GasLimit".to_string(),
        constraint_type: ConstraintType::PrimaryEnergy,
        carrier_attribute: "gas_usage".to_string(),
        sense: Sense::LessEqual,
        constant: limit,
        bus: None,
    });
}

/// Fold exogenous emission prices into marginal costs, weighted by each
/// component's conversion efficiency.
pub fn add_emission_prices(n: &mut Network, prices: &HashMap<String, f64>) {
    let mut price_per_carrier: HashMap<String, f64> = HashMap::new();
    for carrier in n.carriers() {
        let mut ep = 0.0;
        for (kind, price) in prices {
            match kind.as_str() {
                "co2" => ep += price * carrier.co2_emissions,
                other => warn!("No emission attribute for price kind {}", other),
            }
        }
        price_per_carrier.insert(carrier.name.clone(), ep);
    }

    for generator in n.generators_mut() {
        if let Some(ep) = price_per_carrier.get(&generator.carrier) {
            generator.marginal_cost += ep / generator.efficiency;
        }
    }
    for unit in n.storage_units_mut() {
        if let Some(ep) = price_per_carrier.get(&unit.carrier) {
            unit.marginal_cost += ep / unit.efficiency_dispatch;
        }
    }
}

/// Scale one attribute of everything belonging to a carrier. "AC" addresses
/// the lines, which have no marginal cost and expose their rating cap as
/// the scalable capacity attribute.
pub fn scale_carrier_attribute(n: &mut Network, carrier: &str, attr: ScaleAttr, factor: f64) {
    if carrier == "AC" {
        for line in n.lines_mut() {
            match attr {
                ScaleAttr::PNomMax => line.s_nom_max *= factor,
                ScaleAttr::CapitalCost => line.capital_cost *= factor,
                ScaleAttr::MarginalCost => {}
            }
        }
        if attr == ScaleAttr::MarginalCost {
            warn!("Lines have no marginal cost to scale");
        }
        return;
    }

    let mut matched = false;
    for generator in n.generators_mut() {
        if generator.carrier.contains(carrier) {
            matched = true;
            match attr {
                ScaleAttr::PNomMax => generator.p_nom_max *= factor,
                ScaleAttr::CapitalCost => generator.capital_cost *= factor,
                ScaleAttr::MarginalCost => generator.marginal_cost *= factor,
            }
        }
    }
    for unit in n.storage_units_mut() {
        if unit.carrier.contains(carrier) {
            matched = true;
            match attr {
                ScaleAttr::PNomMax => {}
                ScaleAttr::CapitalCost => unit.capital_cost *= factor,
                ScaleAttr::MarginalCost => unit.marginal_cost *= factor,
            }
        }
    }
    if !matched {
        warn!("Carrier scaling {}+{}{} matched nothing", carrier, attr, factor);
    }
}

/// Append a zero-weighted snapshot carrying the reserve-margin peak load
/// with no variable feed-in.
pub fn add_safe_reserve_snapshot(n: &mut Network, reserve_margin: f64) -> Result<()> {
    let totals = n.total_load_per_snapshot();
    let peak = totals
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .ok_or_else(|| anyhow!("cannot add a reserve margin hour to an empty horizon"))?;

    let load_names: Vec<String> = n.loads().iter().map(|l| l.name.clone()).collect();
    let peak_values: Vec<(String, f64)> = load_names
        .iter()
        .map(|name| {
            let value = n
                .loads_p_set()
                .column(name)
                .map(|c| c[peak])
                .unwrap_or(0.0);
            (name.clone(), value)
        })
        .collect();

    let last = *n
        .snapshots()
        .last()
        .ok_or_else(|| anyhow!("cannot add a reserve margin hour to an empty horizon"))?;
    let new_snapshot = last + Duration::hours(1);
    // Zero weighting keeps the extra hour out of all energy totals, zero
    // fill removes the variable feed-in there.
    n.append_snapshot(new_snapshot, 0.0, 0.0);

    for (name, value) in peak_values {
        if let Some(column) = n.loads_p_set_mut().column_mut(&name) {
            if let Some(slot) = column.last_mut() {
                *slot = value * (1.0 + reserve_margin);
            }
        }
    }
    info!(
        "Added reserve margin hour at {} with margin {}",
        new_snapshot, reserve_margin
    );
    Ok(())
}

/// Today's thermal rating of every line; typed lines derive it from the
/// conductor type, nominal voltage and circuit count.
fn effective_line_s_nom(n: &Network) -> Vec<f64> {
    n.lines()
        .iter()
        .map(|line| {
            if line.line_type.is_empty() {
                line.s_nom
            } else {
                let i_nom = n.line_type(&line.line_type).map(|t| t.i_nom).unwrap_or(0.0);
                let v_nom = n.bus(&line.bus0).map(|b| b.v_nom).unwrap_or(0.0);
                3.0_f64.sqrt() * i_nom * line.num_parallel * v_nom
            }
        })
        .collect()
}

/// Bound transmission expansion by cost or volume relative to today's grid,
/// or free it entirely for the optimiser.
pub fn set_transmission_limit(
    n: &mut Network,
    limit: &TransmissionLimit,
    costs: &CostTable,
    length_factor: f64,
) -> Result<()> {
    let lines_s_nom = effective_line_s_nom(n);

    let line_col = |line: &crate::models::branch::Line| match limit.kind {
        LimitKind::Cost => line.capital_cost,
        LimitKind::Volume => line.length,
    };
    let link_col = |link: &crate::models::branch::Link| match limit.kind {
        LimitKind::Cost => link.capital_cost,
        LimitKind::Volume => link.length,
    };

    let mut reference: f64 = n
        .lines()
        .iter()
        .zip(&lines_s_nom)
        .map(|(line, s_nom)| s_nom * line_col(line))
        .sum();
    reference += n
        .links()
        .iter()
        .filter(|l| l.is_dc())
        .map(|link| link.p_nom * link_col(link))
        .sum::<f64>();

    update_transmission_costs(n, costs, length_factor, false)?;

    let expandable = match limit.factor {
        LimitFactor::Opt => true,
        LimitFactor::Fixed(f) => f > 1.0,
    };
    if expandable {
        for (line, s_nom) in n.lines_mut().iter_mut().zip(&lines_s_nom) {
            line.s_nom_min = *s_nom;
            line.s_nom_extendable = true;
        }
        for link in n.links_mut().iter_mut().filter(|l| l.is_dc()) {
            link.p_nom_min = link.p_nom;
            link.p_nom_extendable = true;
        }
    }

    if let LimitFactor::Fixed(factor) = limit.factor {
        let (name, constraint_type) = match limit.kind {
            LimitKind::Cost => ("lc_limit", ConstraintType::TransmissionExpansionCostLimit),
            LimitKind::Volume => ("lv_limit", ConstraintType::TransmissionVolumeExpansionLimit),
        };
        n.add_global_constraint(GlobalConstraint {
            name: name.to_string(),
            constraint_type,
            carrier_attribute: "AC, DC".to_string(),
            sense: Sense::LessEqual,
            constant: factor * reference,
            bus: None,
        });
    }
    Ok(())
}

/// Clip nominal capacity ceilings to the configured caps.
pub fn set_line_nom_max(n: &mut Network, s_nom_max: f64, p_nom_max: f64) {
    for line in n.lines_mut() {
        line.s_nom_max = line.s_nom_max.min(s_nom_max);
    }
    for link in n.links_mut() {
        link.p_nom_max = link.p_nom_max.min(p_nom_max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::branch::{Line, LineType, Link};
    use crate::models::bus::Bus;
    use crate::models::carrier::Carrier;
    use crate::models::generator::Generator;
    use crate::models::load::Load;
    use crate::models::storage_unit::StorageUnit;
    use crate::utils::spatial::Coordinate;
    use chrono::NaiveDate;

    fn ts(hour: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn small_network() -> Network {
        let mut n = Network::new("test".to_string());
        n.add_bus(Bus::new("A".to_string(), 400.0, Coordinate::new(0.0, 0.0), 1.0));
        n.add_bus(Bus::new("B".to_string(), 400.0, Coordinate::new(1.0, 0.0), 1.0));
        n.set_snapshots((0..6).map(ts).collect(), vec![1.0; 6]);
        n
    }

    #[test]
    fn resampling_sums_weights_and_averages_series() {
        let mut n = small_network();
        n.add_load(Load::new("A".to_string(), "A".to_string()));
        n.loads_p_set_mut()
            .set_column("A", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        n.generators_p_max_pu_mut()
            .set_column("A wind", vec![0.2, 0.4, 0.6, 0.8, 1.0, 0.0]);

        let m = average_every_nhours(&n, 3).unwrap();
        assert_eq!(m.snapshots().len(), 2);
        assert_eq!(m.snapshot_weightings(), &[3.0, 3.0]);
        assert_eq!(m.loads_p_set().column("A").unwrap(), &[2.0, 5.0]);
        let wind = m.generators_p_max_pu().column("A wind").unwrap();
        assert!((wind[0] - 0.4).abs() < 1e-12);
        assert!((wind[1] - 0.6).abs() < 1e-12);
        // total represented time is conserved
        assert!((m.n_years() - n.n_years()).abs() < 1e-12);
    }

    #[test]
    fn segmentation_produces_requested_segment_count() {
        let mut n = small_network();
        n.loads_p_set_mut()
            .set_column("A", vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        n.add_load(Load::new("A".to_string(), "A".to_string()));
        let m = apply_time_segmentation(&n, 2).unwrap();
        assert_eq!(m.snapshots().len(), 2);
        assert_eq!(m.snapshot_weightings(), &[3.0, 3.0]);
    }

    #[test]
    fn oversized_segment_request_is_a_no_op() {
        let n = small_network();
        let m = apply_time_segmentation(&n, 10).unwrap();
        assert_eq!(m.snapshots().len(), 6);
    }

    #[test]
    fn co2_limit_constraint_is_registered() {
        let mut n = small_network();
        add_co2limit(&mut n, 5.0e7);
        let c = n.global_constraint("CO2Limit").unwrap();
        assert_eq!(c.carrier_attribute, "co2_emissions");
        assert_eq!(c.sense, Sense::LessEqual);
        assert!((c.constant - 5.0e7).abs() < 1e-6);
    }

    #[test]
    fn gas_limit_tags_gas_carriers() {
        let mut n = small_network();
        n.ensure_carrier(Carrier::new("OCGT".to_string(), 0.187));
        n.ensure_carrier(Carrier::new("coal".to_string(), 0.32));
        add_gaslimit(&mut n, 1.0e6);
        assert_eq!(n.carrier("OCGT").unwrap().gas_usage, 1.0);
        assert_eq!(n.carrier("coal").unwrap().gas_usage, 0.0);
        assert!(n.global_constraint("GasLimit").is_some());
    }

    #[test]
    fn emission_prices_raise_marginal_costs_by_efficiency() {
        let mut n = small_network();
        n.ensure_carrier(Carrier::new("coal".to_string(), 0.32));
        n.add_generator(Generator {
            name: "A coal".to_string(),
            bus: "A".to_string(),
            carrier: "coal".to_string(),
            efficiency: 0.4,
            marginal_cost: 100.0,
            ..Default::default()
        });
        n.add_storage_unit(StorageUnit {
            name: "A PHS".to_string(),
            bus: "A".to_string(),
            carrier: "coal".to_string(),
            efficiency_dispatch: 0.8,
            marginal_cost: 10.0,
            ..Default::default()
        });
        add_emission_prices(&mut n, &HashMap::from([("co2".to_string(), 100.0)]));
        let g = n.generator("A coal").unwrap();
        assert!((g.marginal_cost - (100.0 + 100.0 * 0.32 / 0.4)).abs() < 1e-9);
        let s = &n.storage_units()[0];
        assert!((s.marginal_cost - (10.0 + 100.0 * 0.32 / 0.8)).abs() < 1e-9);
    }

    #[test]
    fn carrier_scaling_hits_matching_components() {
        let mut n = small_network();
        n.add_generator(Generator {
            name: "A solar".to_string(),
            bus: "A".to_string(),
            carrier: "solar".to_string(),
            p_nom_max: 100.0,
            ..Default::default()
        });
        n.add_generator(Generator {
            name: "A coal".to_string(),
            bus: "A".to_string(),
            carrier: "coal".to_string(),
            p_nom_max: 200.0,
            ..Default::default()
        });
        scale_carrier_attribute(&mut n, "solar", ScaleAttr::PNomMax, 1.5);
        assert!((n.generator("A solar").unwrap().p_nom_max - 150.0).abs() < 1e-9);
        assert!((n.generator("A coal").unwrap().p_nom_max - 200.0).abs() < 1e-9);
    }

    #[test]
    fn ac_scaling_addresses_lines() {
        let mut n = small_network();
        n.add_line(Line {
            name: "L".to_string(),
            bus0: "A".to_string(),
            bus1: "B".to_string(),
            length: 10.0,
            s_nom: 100.0,
            s_nom_min: 0.0,
            s_nom_max: 500.0,
            s_nom_extendable: false,
            s_max_pu: 1.0,
            num_parallel: 1.0,
            line_type: String::new(),
            capital_cost: 50.0,
        });
        scale_carrier_attribute(&mut n, "AC", ScaleAttr::CapitalCost, 0.8);
        assert!((n.lines()[0].capital_cost - 40.0).abs() < 1e-9);
        scale_carrier_attribute(&mut n, "AC", ScaleAttr::PNomMax, 2.0);
        assert!((n.lines()[0].s_nom_max - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn safe_snapshot_carries_scaled_peak_load() {
        let mut n = small_network();
        n.add_load(Load::new("A".to_string(), "A".to_string()));
        n.loads_p_set_mut()
            .set_column("A", vec![5.0, 9.0, 7.0, 6.0, 4.0, 3.0]);
        n.generators_p_max_pu_mut()
            .set_column("A wind", vec![0.5; 6]);
        add_safe_reserve_snapshot(&mut n, 0.1).unwrap();

        assert_eq!(n.snapshots().len(), 7);
        assert_eq!(n.snapshot_weightings()[6], 0.0);
        let load = n.loads_p_set().column("A").unwrap();
        assert!((load[6] - 9.0 * 1.1).abs() < 1e-9);
        let wind = n.generators_p_max_pu().column("A wind").unwrap();
        assert_eq!(wind[6], 0.0);
    }

    fn costs_with_transmission() -> CostTable {
        use crate::data::costs_loader::{build_cost_table, CostRecord};
        let rec = |tech: &str, value: f64| CostRecord {
            technology: tech.to_string(),
            year: 2030,
            parameter: "investment".to_string(),
            value,
            unit: "ZAR/MW/km".to_string(),
            source: String::new(),
        };
        let records = vec![
            rec("HVAC overhead", 2.0),
            rec("HVDC overhead", 1.5),
            rec("HVDC submarine", 4.0),
            rec("HVDC inverter pair", 100.0),
        ];
        let config = crate::config::model_config::CostsConfig {
            usd_to_eur: 1.0,
            eur_to_zar: 1.0,
            ..Default::default()
        };
        build_cost_table(&records, &config, 2030, &HashMap::new(), 1.0).unwrap()
    }

    fn network_with_branches() -> Network {
        let mut n = small_network();
        n.add_line_type(LineType {
            name: "std".to_string(),
            i_nom: 0.5,
        });
        n.add_line(Line {
            name: "plain".to_string(),
            bus0: "A".to_string(),
            bus1: "B".to_string(),
            length: 100.0,
            s_nom: 500.0,
            s_nom_min: 0.0,
            s_nom_max: f64::INFINITY,
            s_nom_extendable: false,
            s_max_pu: 1.0,
            num_parallel: 1.0,
            line_type: String::new(),
            capital_cost: 0.0,
        });
        n.add_line(Line {
            name: "typed".to_string(),
            bus0: "A".to_string(),
            bus1: "B".to_string(),
            length: 50.0,
            s_nom: 0.0,
            s_nom_min: 0.0,
            s_nom_max: f64::INFINITY,
            s_nom_extendable: false,
            s_max_pu: 1.0,
            num_parallel: 2.0,
            line_type: "std".to_string(),
            capital_cost: 0.0,
        });
        n.add_link(Link {
            name: "dc".to_string(),
            bus0: "A".to_string(),
            bus1: "B".to_string(),
            carrier: "DC".to_string(),
            p_nom: 200.0,
            p_nom_min: 0.0,
            p_nom_max: f64::INFINITY,
            p_nom_extendable: false,
            length: 80.0,
            underwater_fraction: 0.0,
            capital_cost: 0.0,
        });
        n
    }

    #[test]
    fn volume_limit_sets_constraint_and_extendability() {
        let mut n = network_with_branches();
        let limit = TransmissionLimit {
            kind: LimitKind::Volume,
            factor: LimitFactor::Fixed(1.25),
        };
        set_transmission_limit(&mut n, &limit, &costs_with_transmission(), 1.0).unwrap();

        let typed_s_nom = 3.0_f64.sqrt() * 0.5 * 2.0 * 400.0;
        let reference = 500.0 * 100.0 + typed_s_nom * 50.0 + 200.0 * 80.0;
        let c = n.global_constraint("lv_limit").unwrap();
        assert_eq!(c.constraint_type, ConstraintType::TransmissionVolumeExpansionLimit);
        assert!((c.constant - 1.25 * reference).abs() < 1e-6);

        // factor above one frees expansion from today's rating
        assert!(n.lines().iter().all(|l| l.s_nom_extendable));
        assert!((n.lines()[1].s_nom_min - typed_s_nom).abs() < 1e-9);
        assert!(n.links()[0].p_nom_extendable);
        assert!((n.links()[0].p_nom_min - 200.0).abs() < 1e-9);
    }

    #[test]
    fn opt_limit_frees_expansion_without_constraint() {
        let mut n = network_with_branches();
        let limit = TransmissionLimit {
            kind: LimitKind::Cost,
            factor: LimitFactor::Opt,
        };
        set_transmission_limit(&mut n, &limit, &costs_with_transmission(), 1.0).unwrap();
        assert!(n.global_constraint("lc_limit").is_none());
        assert!(n.lines().iter().all(|l| l.s_nom_extendable));
        // transmission capital costs were refreshed on the way
        assert!((n.lines()[0].capital_cost - 100.0 * 2.0).abs() < 1e-9);
    }

    #[test]
    fn unity_factor_caps_without_freeing_expansion() {
        let mut n = network_with_branches();
        let limit = TransmissionLimit {
            kind: LimitKind::Volume,
            factor: LimitFactor::Fixed(1.0),
        };
        set_transmission_limit(&mut n, &limit, &costs_with_transmission(), 1.0).unwrap();
        assert!(n.global_constraint("lv_limit").is_some());
        assert!(n.lines().iter().all(|l| !l.s_nom_extendable));
    }

    #[test]
    fn nominal_caps_are_clipped() {
        let mut n = network_with_branches();
        set_line_nom_max(&mut n, 800.0, 150.0);
        assert!(n.lines().iter().all(|l| l.s_nom_max == 800.0));
        assert_eq!(n.links()[0].p_nom_max, 150.0);
    }

    #[test]
    fn renewable_limits_follow_area_potentials() {
        let mut n = small_network();
        let areas = HashMap::from([(
            "onwind".to_string(),
            vec![
                AreaRecord {
                    region: "A".to_string(),
                    available_area: 2.0e6,
                },
                AreaRecord {
                    region: "MISSING".to_string(),
                    available_area: 9.9e6,
                },
            ],
        )]);
        let per_sqm = HashMap::from([("onwind".to_string(), 5e-6)]);
        add_renewable_expansion_limits(&mut n, &areas, &per_sqm);
        let c = n.global_constraint("TechLimit A onwind").unwrap();
        assert_eq!(c.bus.as_deref(), Some("A"));
        assert!((c.constant - 10.0).abs() < 1e-9);
        assert!(n.global_constraint("TechLimit MISSING onwind").is_none());
    }
}
