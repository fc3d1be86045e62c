use std::fs::File;
use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use tracing::warn;

use crate::config::const_funcs::{
    fuel_cost_per_mwh_el, heat_rate_to_efficiency, ramp_limit_per_unit,
};
use crate::config::constants::{
    COST_PER_KW_TO_PER_MW, ZA_MAX_LAT, ZA_MAX_LON, ZA_MIN_LAT, ZA_MIN_LON,
};
use crate::utils::spatial::Coordinate;

// Column headers as exported from the utility's fleet workbook
const COL_NAME: &str = "Power Station Name";
const COL_CARRIER: &str = "Fuel/technology type";
const COL_P_NOM: &str = "Installed/ Operational Capacity in 2016 (MW)";
const COL_DECOM: &str = "Decommissioning Date";
const COL_LON: &str = "GPS Longitude";
const COL_LAT: &str = "GPS Latitude";
const COL_HEAT_RATE: &str = "Heat Rate (GJ/MWh)";
const COL_FUEL_PRICE: &str = "Fuel Price (R/GJ)";
const COL_VOM: &str = "Variable Operations and Maintenance Cost (R/MWh)";
const COL_FOM: &str = "Fixed Operations and maintenance costs (R/kW/yr)";
const COL_MAX_RAMP: &str = "Max Ramp Up (MW/min)";
const COL_PUMP_EFF: &str = "Pump Efficiency (%)";
const COL_PUMP_UNITS: &str = "Pump Units";
const COL_PUMP_LOAD: &str = "Pump Load per unit (MW)";
const COL_MAX_STORAGE: &str = "Pumped Storage - Max Storage (GWh)";
const COL_CSP_HOURS: &str = "CSP Storage (hours)";

const INCLUDES_CAPEX_SUFFIX: &str = " (includes capex)";

#[derive(Debug)]
pub enum FleetLoadError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    MissingColumn(String),
    InvalidCapacity(String),
    InvalidNumber(String),
}

impl From<std::io::Error> for FleetLoadError {
    fn from(err: std::io::Error) -> Self {
        FleetLoadError::IoError(err)
    }
}

impl From<csv::Error> for FleetLoadError {
    fn from(err: csv::Error) -> Self {
        FleetLoadError::CsvError(err)
    }
}

impl std::fmt::Display for FleetLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FleetLoadError::IoError(e) => write!(f, "IO error: {}", e),
            FleetLoadError::CsvError(e) => write!(f, "CSV error: {}", e),
            FleetLoadError::MissingColumn(c) => write!(f, "Missing column: {}", c),
            FleetLoadError::InvalidCapacity(s) => write!(f, "Invalid capacity: {}", s),
            FleetLoadError::InvalidNumber(s) => write!(f, "Invalid number: {}", s),
        }
    }
}

impl std::error::Error for FleetLoadError {}

/// One existing power station with fields already converted to the model's
/// conventions (per-MW costs, per-unit ramp limits, thermal efficiency).
#[derive(Debug, Clone)]
pub struct FleetRecord {
    pub name: String,
    pub carrier: String,
    pub p_nom: f64,
    pub position: Option<Coordinate>,
    pub efficiency: Option<f64>,
    pub marginal_cost: Option<f64>,
    pub capital_cost: Option<f64>,
    pub ramp_limit_up: Option<f64>,
    pub pump_efficiency_pct: Option<f64>,
    pub pump_units: Option<f64>,
    pub pump_load_mw: Option<f64>,
    pub max_storage_gwh: Option<f64>,
    pub csp_storage_hours: Option<f64>,
}

fn is_na(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed == "-"
}

fn optional_number(raw: &str) -> Result<Option<f64>, FleetLoadError> {
    if is_na(raw) {
        return Ok(None);
    }
    raw.trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|_| FleetLoadError::InvalidNumber(raw.to_string()))
}

// Fixed O&M figures are occasionally annotated in the source workbook
fn optional_fom(raw: &str) -> Result<Option<f64>, FleetLoadError> {
    let trimmed = raw.trim().trim_end_matches(INCLUDES_CAPEX_SUFFIX);
    optional_number(trimmed)
}

fn normalize_carrier(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "Pumped Storage" {
        "PHS".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Decommissioning year extracted from free-text dates; "beyond 2050" and
/// empty fields mean the station stays.
fn decommissioning_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if is_na(trimmed) || trimmed.to_lowercase().contains("beyond") {
        return None;
    }
    let digits: Vec<char> = trimmed.chars().collect();
    for window in digits.windows(4) {
        if window.iter().all(|c| c.is_ascii_digit()) {
            let year: i32 = window.iter().collect::<String>().parse().ok()?;
            if (1900..2200).contains(&year) {
                return Some(year);
            }
        }
    }
    None
}

struct ColumnIndex {
    indices: std::collections::HashMap<String, usize>,
}

impl ColumnIndex {
    fn new(headers: &StringRecord) -> Self {
        let indices = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.to_string(), i))
            .collect();
        Self { indices }
    }

    fn require(&self, name: &str) -> Result<usize, FleetLoadError> {
        self.indices
            .get(name)
            .copied()
            .ok_or_else(|| FleetLoadError::MissingColumn(name.to_string()))
    }

    fn get<'a>(&self, record: &'a StringRecord, name: &str) -> &'a str {
        self.indices
            .get(name)
            .and_then(|i| record.get(*i))
            .unwrap_or("")
    }
}

pub fn load_fleet(path: &str, model_year: u32) -> Result<Vec<FleetRecord>, FleetLoadError> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    parse_fleet(&contents, model_year)
}

pub fn parse_fleet(contents: &str, model_year: u32) -> Result<Vec<FleetRecord>, FleetLoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::new(&headers);
    // Hard requirements; everything else degrades to None
    columns.require(COL_NAME)?;
    columns.require(COL_CARRIER)?;
    columns.require(COL_P_NOM)?;

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let name = columns.get(&record, COL_NAME).trim().to_string();
        if name.is_empty() {
            continue;
        }

        // Stations leaving the system before the model year are dropped
        if let Some(year) = decommissioning_year(columns.get(&record, COL_DECOM)) {
            if year < model_year as i32 {
                debug!("Dropping {} (decommissioned {})", name, year);
                continue;
            }
        }

        let raw_p_nom = columns.get(&record, COL_P_NOM);
        let p_nom = optional_number(raw_p_nom)?
            .ok_or_else(|| FleetLoadError::InvalidCapacity(format!("{}: {}", name, raw_p_nom)))?;

        let lon = optional_number(columns.get(&record, COL_LON))?;
        let lat = optional_number(columns.get(&record, COL_LAT))?;
        let position = match (lon, lat) {
            (Some(x), Some(y)) => {
                if !(ZA_MIN_LON..=ZA_MAX_LON).contains(&x) || !(ZA_MIN_LAT..=ZA_MAX_LAT).contains(&y)
                {
                    warn!(
                        "Station {} lies outside the supply area bounds ({}, {})",
                        name, x, y
                    );
                }
                Some(Coordinate::new(x, y))
            }
            _ => None,
        };

        let heat_rate = optional_number(columns.get(&record, COL_HEAT_RATE))?;
        let fuel_price = optional_number(columns.get(&record, COL_FUEL_PRICE))?;
        let vom = optional_number(columns.get(&record, COL_VOM))?;
        let fom = optional_fom(columns.get(&record, COL_FOM))?;
        let max_ramp = optional_number(columns.get(&record, COL_MAX_RAMP))?;

        let efficiency = heat_rate.map(heat_rate_to_efficiency);
        let fuel_term = match (fuel_price, efficiency) {
            (Some(fp), Some(eff)) => Some(fuel_cost_per_mwh_el(fp, eff)),
            _ => None,
        };
        let marginal_cost = match (fuel_term, vom) {
            (Some(fuel), Some(vom)) => Some(fuel + vom),
            _ => None,
        };
        let capital_cost = fom.map(|f| COST_PER_KW_TO_PER_MW * f);
        let ramp_limit_up = if p_nom > 0.0 {
            max_ramp.map(|r| ramp_limit_per_unit(r, p_nom))
        } else {
            None
        };

        records.push(FleetRecord {
            name,
            carrier: normalize_carrier(columns.get(&record, COL_CARRIER)),
            p_nom,
            position,
            efficiency,
            marginal_cost,
            capital_cost,
            ramp_limit_up,
            pump_efficiency_pct: optional_number(columns.get(&record, COL_PUMP_EFF))?,
            pump_units: optional_number(columns.get(&record, COL_PUMP_UNITS))?,
            pump_load_mw: optional_number(columns.get(&record, COL_PUMP_LOAD))?,
            max_storage_gwh: optional_number(columns.get(&record, COL_MAX_STORAGE))?,
            csp_storage_hours: optional_number(columns.get(&record, COL_CSP_HOURS))?,
        });
    }

    Ok(records)
}
