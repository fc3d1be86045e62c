use std::collections::HashMap;
use std::fs::File;
use std::io::Read;

use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::const_funcs::{calc_annuity, convert_cost_value};
use crate::config::constants::DEFAULT_LIFETIME_YEARS;
use crate::config::model_config::CostsConfig;
use crate::models::carrier::suptech;

// Parameter names as they appear in the cost assumption files
const P_INVESTMENT: &str = "investment";
const P_LIFETIME: &str = "lifetime";
const P_FOM: &str = "FOM";
const P_VOM: &str = "VOM";
const P_FUEL: &str = "fuel";
const P_EFFICIENCY: &str = "efficiency";
const P_DISCOUNT: &str = "discount rate";
const P_CO2: &str = "CO2 intensity";

const KNOWN_PARAMETERS: [&str; 8] = [
    P_INVESTMENT,
    P_LIFETIME,
    P_FOM,
    P_VOM,
    P_FUEL,
    P_EFFICIENCY,
    P_DISCOUNT,
    P_CO2,
];

#[derive(Debug)]
pub enum CostsLoadError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    EmptyTable(u32),
    MissingTechnology(String),
}

impl From<std::io::Error> for CostsLoadError {
    fn from(err: std::io::Error) -> Self {
        CostsLoadError::IoError(err)
    }
}

impl From<csv::Error> for CostsLoadError {
    fn from(err: csv::Error) -> Self {
        CostsLoadError::CsvError(err)
    }
}

impl std::fmt::Display for CostsLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostsLoadError::IoError(e) => write!(f, "IO error: {}", e),
            CostsLoadError::CsvError(e) => write!(f, "CSV error: {}", e),
            CostsLoadError::EmptyTable(year) => {
                write!(f, "No cost assumptions found for year {}", year)
            }
            CostsLoadError::MissingTechnology(tech) => {
                write!(f, "No cost assumptions for technology: {}", tech)
            }
        }
    }
}

impl std::error::Error for CostsLoadError {}

/// One row of the cost assumption file.
#[derive(Debug, Clone, Deserialize)]
pub struct CostRecord {
    pub technology: String,
    pub year: u32,
    pub parameter: String,
    pub value: f64,
    pub unit: String,
    #[serde(default)]
    pub source: String,
}

/// Fully derived cost assumptions for a single technology, in ZAR and MW.
#[derive(Debug, Clone)]
pub struct TechCost {
    pub co2_emissions: f64,
    /// Fixed O&M as percent of investment per year.
    pub fom: f64,
    pub vom: f64,
    pub discount_rate: f64,
    pub efficiency: f64,
    pub efficiency_store: f64,
    pub efficiency_dispatch: f64,
    pub fuel: f64,
    pub investment: f64,
    pub lifetime: f64,
    pub capital_cost: f64,
    pub marginal_cost: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CostTable {
    techs: HashMap<String, TechCost>,
}

impl CostTable {
    pub fn get(&self, technology: &str) -> Option<&TechCost> {
        self.techs.get(technology)
    }

    pub fn at(&self, technology: &str) -> Result<&TechCost, CostsLoadError> {
        self.techs
            .get(technology)
            .ok_or_else(|| CostsLoadError::MissingTechnology(technology.to_string()))
    }

    pub fn contains(&self, technology: &str) -> bool {
        self.techs.contains_key(technology)
    }

    pub fn technologies(&self) -> Vec<&String> {
        self.techs.keys().collect()
    }

    /// CO2 intensity for a carrier, falling back to its technology family
    /// and to zero when nothing is on record.
    pub fn co2_emissions_for(&self, carrier: &str) -> f64 {
        self.techs
            .get(carrier)
            .or_else(|| self.techs.get(suptech(carrier)))
            .map(|t| t.co2_emissions)
            .unwrap_or(0.0)
    }
}

pub fn load_cost_records(path: &str) -> Result<Vec<CostRecord>, CostsLoadError> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(contents.as_bytes());

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: CostRecord = result?;
        records.push(record);
    }
    Ok(records)
}

/// Assemble per-technology cost assumptions for one model year.
///
/// Values are unit-converted, duplicate entries summed, per-year capital
/// costs annuitized over the asset lifetime and scaled by the number of
/// modelled years.
pub fn build_cost_table(
    records: &[CostRecord],
    config: &CostsConfig,
    cost_year: u32,
    max_hours: &HashMap<String, f64>,
    n_years: f64,
) -> Result<CostTable, CostsLoadError> {
    let mut params: HashMap<String, HashMap<String, f64>> = HashMap::new();

    for record in records.iter().filter(|r| r.year == cost_year) {
        if !KNOWN_PARAMETERS.contains(&record.parameter.as_str()) {
            debug!(
                "Ignoring cost parameter {} for {}",
                record.parameter, record.technology
            );
            continue;
        }
        let value = convert_cost_value(
            record.value,
            &record.unit,
            config.usd_to_eur,
            config.eur_to_zar,
        );
        *params
            .entry(record.technology.clone())
            .or_default()
            .entry(record.parameter.clone())
            .or_insert(0.0) += value;
    }

    if params.is_empty() {
        return Err(CostsLoadError::EmptyTable(cost_year));
    }

    // Open and combined cycle gas turbines burn the same fuel as the
    // generic gas entry and share its emission intensity.
    if let Some(gas) = params.get("gas").cloned() {
        for tech in ["OCGT", "CCGT"] {
            if let Some(entry) = params.get_mut(tech) {
                if let Some(fuel) = gas.get(P_FUEL) {
                    entry.insert(P_FUEL.to_string(), *fuel);
                }
                if let Some(co2) = gas.get(P_CO2) {
                    entry.insert(P_CO2.to_string(), *co2);
                }
            }
        }
    }

    let mut techs: HashMap<String, TechCost> = HashMap::new();
    for (tech, p) in &params {
        let efficiency = p.get(P_EFFICIENCY).copied().unwrap_or(1.0);
        // A single efficiency figure is read as round trip efficiency
        let half_trip = p.get(P_EFFICIENCY).map(|e| e.sqrt()).unwrap_or(1.0);
        let discount_rate = p.get(P_DISCOUNT).copied().unwrap_or(config.discount_rate);
        let lifetime = p.get(P_LIFETIME).copied().unwrap_or(DEFAULT_LIFETIME_YEARS);
        let investment = p.get(P_INVESTMENT).copied().unwrap_or(0.0);
        let fom = p.get(P_FOM).copied().unwrap_or(0.0);
        let vom = p.get(P_VOM).copied().unwrap_or(0.0);
        let fuel = p.get(P_FUEL).copied().unwrap_or(0.0);
        let co2_emissions = p.get(P_CO2).copied().unwrap_or(0.0);

        let capital_cost =
            (calc_annuity(lifetime, discount_rate) + fom / 100.0) * investment * n_years;
        let marginal_cost = vom + fuel / efficiency;

        techs.insert(
            tech.clone(),
            TechCost {
                co2_emissions,
                fom,
                vom,
                discount_rate,
                efficiency,
                efficiency_store: half_trip,
                efficiency_dispatch: half_trip,
                fuel,
                investment,
                lifetime,
                capital_cost,
                marginal_cost,
            },
        );
    }

    // Generic solar is the midpoint of rooftop and utility installations
    if let (Some(rooftop), Some(utility)) = (
        techs.get("solar-rooftop").cloned(),
        techs.get("solar-utility").cloned(),
    ) {
        let capital_cost = 0.5 * (rooftop.capital_cost + utility.capital_cost);
        let entry = techs.entry("solar".to_string()).or_insert(utility);
        entry.capital_cost = capital_cost;
    }

    // Composite storage technologies assembled from their parts
    if let (Some(inverter), Some(store)) = (
        techs.get("battery inverter").cloned(),
        techs.get("battery storage").cloned(),
    ) {
        let hours = max_hours.get("battery").copied().unwrap_or(1.0);
        let mut battery = inverter;
        battery.capital_cost += hours * store.capital_cost;
        battery.marginal_cost = 0.0;
        battery.co2_emissions = 0.0;
        techs.insert("battery".to_string(), battery);
    }

    if let (Some(electrolysis), Some(fuel_cell), Some(store)) = (
        techs.get("electrolysis").cloned(),
        techs.get("fuel cell").cloned(),
        techs.get("hydrogen storage").cloned(),
    ) {
        let hours = max_hours.get("H2").copied().unwrap_or(1.0);
        let mut h2 = electrolysis.clone();
        h2.capital_cost =
            electrolysis.capital_cost + fuel_cell.capital_cost + hours * store.capital_cost;
        h2.marginal_cost = 0.0;
        h2.co2_emissions = 0.0;
        h2.efficiency_store = electrolysis.efficiency;
        h2.efficiency_dispatch = fuel_cell.efficiency;
        techs.insert("H2".to_string(), h2);
    }

    // Config-level overrides take precedence over everything derived
    for (tech, value) in &config.capital_cost {
        match techs.get_mut(tech) {
            Some(entry) => entry.capital_cost = *value,
            None => warn!("Capital cost override for unknown technology {}", tech),
        }
    }
    for (tech, value) in &config.marginal_cost {
        match techs.get_mut(tech) {
            Some(entry) => entry.marginal_cost = *value,
            None => warn!("Marginal cost override for unknown technology {}", tech),
        }
    }

    Ok(CostTable { techs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::const_funcs::calc_annuity;

    fn rec(technology: &str, parameter: &str, value: f64, unit: &str) -> CostRecord {
        CostRecord {
            technology: technology.to_string(),
            year: 2030,
            parameter: parameter.to_string(),
            value,
            unit: unit.to_string(),
            source: String::new(),
        }
    }

    fn test_config() -> CostsConfig {
        CostsConfig {
            discount_rate: 0.08,
            usd_to_eur: 0.75,
            eur_to_zar: 12.0,
            ..Default::default()
        }
    }

    fn hours() -> HashMap<String, f64> {
        HashMap::from([("battery".to_string(), 3.0), ("H2".to_string(), 10.0)])
    }

    #[test]
    fn capital_cost_is_annuitized_with_fom() {
        let records = vec![
            rec("coal", P_INVESTMENT, 1000.0, "USD/kW"),
            rec("coal", P_LIFETIME, 30.0, "years"),
            rec("coal", P_FOM, 2.0, "%/year"),
        ];
        let table = build_cost_table(&records, &test_config(), 2030, &hours(), 1.0).unwrap();
        let coal = table.at("coal").unwrap();
        let investment = 1000.0 * 1e3 * 0.75;
        let expected = (calc_annuity(30.0, 0.08) + 0.02) * investment;
        assert!((coal.capital_cost - expected).abs() < 1e-6);
    }

    #[test]
    fn marginal_cost_combines_vom_and_fuel() {
        let records = vec![
            rec("coal", P_VOM, 50.0, "ZAR/MWh"),
            rec("coal", P_FUEL, 100.0, "ZAR/MWh_th"),
            rec("coal", P_EFFICIENCY, 0.4, "p.u."),
        ];
        let table = build_cost_table(&records, &test_config(), 2030, &hours(), 1.0).unwrap();
        let coal = table.at("coal").unwrap();
        assert!((coal.marginal_cost - (50.0 + 100.0 / 0.4)).abs() < 1e-9);
    }

    #[test]
    fn gas_turbines_inherit_gas_fuel_and_emissions() {
        let records = vec![
            rec("gas", P_FUEL, 200.0, "ZAR/MWh_th"),
            rec("gas", P_CO2, 0.187, "tCO2/MWh_th"),
            rec("OCGT", P_EFFICIENCY, 0.39, "p.u."),
            rec("CCGT", P_EFFICIENCY, 0.55, "p.u."),
        ];
        let table = build_cost_table(&records, &test_config(), 2030, &hours(), 1.0).unwrap();
        let ocgt = table.at("OCGT").unwrap();
        assert!((ocgt.fuel - 200.0).abs() < 1e-9);
        assert!((ocgt.co2_emissions - 0.187).abs() < 1e-9);
        assert!((ocgt.marginal_cost - 200.0 / 0.39).abs() < 1e-9);
        assert!((table.at("CCGT").unwrap().marginal_cost - 200.0 / 0.55).abs() < 1e-9);
    }

    #[test]
    fn single_efficiency_becomes_round_trip() {
        let records = vec![rec("PHS", P_EFFICIENCY, 0.81, "p.u.")];
        let table = build_cost_table(&records, &test_config(), 2030, &hours(), 1.0).unwrap();
        let phs = table.at("PHS").unwrap();
        assert!((phs.efficiency_store - 0.9).abs() < 1e-9);
        assert!((phs.efficiency_dispatch - 0.9).abs() < 1e-9);
    }

    #[test]
    fn battery_is_composed_from_inverter_and_store() {
        let records = vec![
            rec("battery inverter", P_INVESTMENT, 300.0, "ZAR/kW"),
            rec("battery inverter", P_EFFICIENCY, 0.9, "p.u."),
            rec("battery storage", P_INVESTMENT, 200.0, "ZAR/kWh"),
        ];
        let table = build_cost_table(&records, &test_config(), 2030, &hours(), 1.0).unwrap();
        let battery = table.at("battery").unwrap();
        let inverter = table.at("battery inverter").unwrap();
        let store = table.at("battery storage").unwrap();
        let expected = inverter.capital_cost + 3.0 * store.capital_cost;
        assert!((battery.capital_cost - expected).abs() < 1e-6);
        assert_eq!(battery.marginal_cost, 0.0);
        assert_eq!(battery.co2_emissions, 0.0);
    }

    #[test]
    fn hydrogen_chain_sets_asymmetric_efficiencies() {
        let records = vec![
            rec("electrolysis", P_INVESTMENT, 500.0, "ZAR/kW"),
            rec("electrolysis", P_EFFICIENCY, 0.7, "p.u."),
            rec("fuel cell", P_INVESTMENT, 400.0, "ZAR/kW"),
            rec("fuel cell", P_EFFICIENCY, 0.5, "p.u."),
            rec("hydrogen storage", P_INVESTMENT, 10.0, "ZAR/kWh"),
        ];
        let table = build_cost_table(&records, &test_config(), 2030, &hours(), 1.0).unwrap();
        let h2 = table.at("H2").unwrap();
        assert!((h2.efficiency_store - 0.7).abs() < 1e-9);
        assert!((h2.efficiency_dispatch - 0.5).abs() < 1e-9);
        let expected = table.at("electrolysis").unwrap().capital_cost
            + table.at("fuel cell").unwrap().capital_cost
            + 10.0 * table.at("hydrogen storage").unwrap().capital_cost;
        assert!((h2.capital_cost - expected).abs() < 1e-6);
    }

    #[test]
    fn solar_is_midpoint_of_rooftop_and_utility() {
        let records = vec![
            rec("solar-rooftop", P_INVESTMENT, 800.0, "ZAR/kW"),
            rec("solar-utility", P_INVESTMENT, 400.0, "ZAR/kW"),
        ];
        let table = build_cost_table(&records, &test_config(), 2030, &hours(), 1.0).unwrap();
        let solar = table.at("solar").unwrap();
        let rooftop = table.at("solar-rooftop").unwrap();
        let utility = table.at("solar-utility").unwrap();
        let expected = 0.5 * (rooftop.capital_cost + utility.capital_cost);
        assert!((solar.capital_cost - expected).abs() < 1e-6);
    }

    #[test]
    fn config_overrides_win() {
        let mut config = test_config();
        config.marginal_cost.insert("coal".to_string(), 123.0);
        let records = vec![rec("coal", P_VOM, 50.0, "ZAR/MWh")];
        let table = build_cost_table(&records, &config, 2030, &hours(), 1.0).unwrap();
        assert!((table.at("coal").unwrap().marginal_cost - 123.0).abs() < 1e-12);
    }

    #[test]
    fn duplicate_parameter_rows_are_summed() {
        let records = vec![
            rec("coal", P_VOM, 20.0, "ZAR/MWh"),
            rec("coal", P_VOM, 30.0, "ZAR/MWh"),
        ];
        let table = build_cost_table(&records, &test_config(), 2030, &hours(), 1.0).unwrap();
        assert!((table.at("coal").unwrap().vom - 50.0).abs() < 1e-12);
    }

    #[test]
    fn missing_year_is_an_error() {
        let records = vec![rec("coal", P_VOM, 20.0, "ZAR/MWh")];
        let result = build_cost_table(&records, &test_config(), 2050, &hours(), 1.0);
        assert!(matches!(result, Err(CostsLoadError::EmptyTable(2050))));
    }

    #[test]
    fn capital_cost_scales_with_modelled_years() {
        let records = vec![
            rec("coal", P_INVESTMENT, 100.0, "ZAR/kW"),
            rec("coal", P_LIFETIME, 25.0, "years"),
        ];
        let one = build_cost_table(&records, &test_config(), 2030, &hours(), 1.0).unwrap();
        let three = build_cost_table(&records, &test_config(), 2030, &hours(), 3.0).unwrap();
        let ratio = three.at("coal").unwrap().capital_cost / one.at("coal").unwrap().capital_cost;
        assert!((ratio - 3.0).abs() < 1e-9);
    }
}
