use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;

use serde::{Deserialize, Serialize};

use crate::config::constants::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostsConfig {
    pub discount_rate: f64,
    pub usd_to_eur: f64,
    pub eur_to_zar: f64,
    /// Price per tonne by emission kind, keyed like "co2".
    pub emission_prices: HashMap<String, f64>,
    /// Per-technology overrides applied after the cost table is assembled.
    pub marginal_cost: HashMap<String, f64>,
    pub capital_cost: HashMap<String, f64>,
}

impl Default for CostsConfig {
    fn default() -> Self {
        Self {
            discount_rate: DEFAULT_DISCOUNT_RATE,
            usd_to_eur: DEFAULT_USD_TO_EUR,
            eur_to_zar: DEFAULT_EUR_TO_ZAR,
            emission_prices: HashMap::from([("co2".to_string(), 0.0)]),
            marginal_cost: HashMap::new(),
            capital_cost: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendableCarriers {
    pub generator: Vec<String>,
    pub storage_unit: Vec<String>,
}

impl Default for ExtendableCarriers {
    fn default() -> Self {
        Self {
            generator: vec!["OCGT".to_string(), "CCGT".to_string()],
            storage_unit: vec!["battery".to_string(), "H2".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectricityConfig {
    pub v_nom: f64,
    /// Annual national demand in MWh, spread over the load profile.
    pub demand: f64,
    pub co2_limit: f64,
    /// Reference emissions that Co2L wildcard factors scale against.
    pub co2_base: f64,
    pub gas_limit: Option<f64>,
    pub safe_reserve_margin: f64,
    /// Whether CSP stations from the fleet data are attached.
    pub csp: bool,
    pub max_hours: HashMap<String, f64>,
    pub extendable_carriers: ExtendableCarriers,
    /// Optional bus restriction per region setup and carrier; carriers not
    /// listed may be built at every bus.
    pub buses: HashMap<String, HashMap<String, Vec<String>>>,
    /// Bus that absorbs the cross-border station, per region setup.
    pub cross_border_bus: HashMap<String, String>,
}

impl Default for ElectricityConfig {
    fn default() -> Self {
        Self {
            v_nom: DEFAULT_V_NOM_KV,
            demand: 250.0e6,
            co2_limit: DEFAULT_CO2_LIMIT,
            co2_base: DEFAULT_CO2_BASE,
            gas_limit: None,
            safe_reserve_margin: DEFAULT_SAFE_RESERVE_MARGIN,
            csp: false,
            max_hours: HashMap::from([
                ("battery".to_string(), 3.0),
                ("H2".to_string(), 10.0),
            ]),
            extendable_carriers: ExtendableCarriers::default(),
            buses: HashMap::new(),
            cross_border_bus: HashMap::from([
                ("RSA".to_string(), "RSA".to_string()),
                ("27-supply".to_string(), "POLOKWANE".to_string()),
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinesConfig {
    pub s_max_pu: f64,
    pub s_nom_max: f64,
    /// Detour factor applied to as-the-crow-flies corridor lengths.
    pub length_factor: f64,
    /// Registered line types: name to nominal current in kA.
    pub line_types: HashMap<String, f64>,
}

impl Default for LinesConfig {
    fn default() -> Self {
        Self {
            s_max_pu: DEFAULT_S_MAX_PU,
            s_nom_max: f64::INFINITY,
            length_factor: DEFAULT_LENGTH_FACTOR,
            line_types: HashMap::from([
                ("Al/St 240/40 4-bundle 380.0".to_string(), 0.645),
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    pub p_nom_max: f64,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            p_nom_max: f64::INFINITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResPotentialsConfig {
    /// Installable capacity per square metre of available area, MW/m2.
    pub capacity_per_sqm: HashMap<String, f64>,
}

impl Default for ResPotentialsConfig {
    fn default() -> Self {
        Self {
            capacity_per_sqm: HashMap::from([
                ("onwind".to_string(), 5e-6),
                ("solar".to_string(), 1.7e-5),
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model and cost assumption year.
    pub year: u32,
    /// Weather and demand year the hourly profiles are taken from.
    pub historical_year: i32,
    pub costs: CostsConfig,
    pub electricity: ElectricityConfig,
    pub lines: LinesConfig,
    pub links: LinksConfig,
    pub respotentials: ResPotentialsConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            year: DEFAULT_COST_YEAR,
            historical_year: DEFAULT_HISTORICAL_YEAR,
            costs: CostsConfig::default(),
            electricity: ElectricityConfig::default(),
            lines: LinesConfig::default(),
            links: LinksConfig::default(),
            respotentials: ResPotentialsConfig::default(),
        }
    }
}

impl ModelConfig {
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }

    /// Buses a carrier may be expanded at under the given region setup, or
    /// None when the carrier is unrestricted.
    pub fn candidate_buses(&self, region_setup: &str, carrier: &str) -> Option<&Vec<String>> {
        self.electricity
            .buses
            .get(region_setup)
            .and_then(|per_carrier| per_carrier.get(carrier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_consistent() {
        let config = ModelConfig::default();
        assert!(config.costs.discount_rate > 0.0);
        assert!(config.electricity.max_hours.contains_key("battery"));
        assert!(config.lines.s_max_pu <= 1.0);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ModelConfig =
            serde_json::from_str(r#"{"year": 2040, "costs": {"discount_rate": 0.1}}"#).unwrap();
        assert_eq!(config.year, 2040);
        assert!((config.costs.discount_rate - 0.1).abs() < 1e-12);
        assert_eq!(config.historical_year, DEFAULT_HISTORICAL_YEAR);
        assert!((config.costs.eur_to_zar - DEFAULT_EUR_TO_ZAR).abs() < 1e-12);
    }

    #[test]
    fn candidate_buses_lookup() {
        let mut config = ModelConfig::default();
        config.electricity.buses.insert(
            "27-supply".to_string(),
            HashMap::from([("nuclear".to_string(), vec!["KLEINSEE".to_string()])]),
        );
        assert_eq!(
            config.candidate_buses("27-supply", "nuclear").unwrap(),
            &vec!["KLEINSEE".to_string()]
        );
        assert!(config.candidate_buses("27-supply", "coal").is_none());
        assert!(config.candidate_buses("RSA", "nuclear").is_none());
    }
}
