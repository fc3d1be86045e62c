// Shared constants for the network preparation pipeline.
// Monetary values are ZAR unless a conversion constant says otherwise.

// Geographic bounds of the South African supply area (degrees)
pub const ZA_MIN_LAT: f64 = -35.5;
pub const ZA_MAX_LAT: f64 = -21.9;
pub const ZA_MIN_LON: f64 = 16.0;
pub const ZA_MAX_LON: f64 = 33.5;

// Time
pub const HOURS_PER_YEAR: f64 = 8760.0;
pub const MINUTES_PER_HOUR: f64 = 60.0;

// Model horizon defaults
pub const DEFAULT_COST_YEAR: u32 = 2030;
pub const DEFAULT_HISTORICAL_YEAR: i32 = 2017;

// Unit conversions
pub const GJ_PER_MWH: f64 = 3.6;
pub const COST_PER_KW_TO_PER_MW: f64 = 1e3;
pub const GWH_TO_MWH: f64 = 1e3;

// Currency conversion defaults (2013 reference year)
pub const DEFAULT_USD_TO_EUR: f64 = 0.7532;
pub const DEFAULT_EUR_TO_ZAR: f64 = 12.76;

// Cost assumption defaults
pub const DEFAULT_DISCOUNT_RATE: f64 = 0.08;
pub const DEFAULT_LIFETIME_YEARS: f64 = 25.0;

// Electrical defaults
pub const DEFAULT_V_NOM_KV: f64 = 400.0;
pub const DEFAULT_S_MAX_PU: f64 = 0.7;
pub const DEFAULT_LENGTH_FACTOR: f64 = 1.25;

// Emission defaults (tonnes CO2)
pub const DEFAULT_CO2_LIMIT: f64 = 1.0e8;
pub const DEFAULT_CO2_BASE: f64 = 2.39e8;

// CH4L wildcard factors are given in millions of MWh thermal
pub const GAS_LIMIT_WILDCARD_SCALE: f64 = 1e6;

// SAFE reserve margin applied to the peak demand hour
pub const DEFAULT_SAFE_RESERVE_MARGIN: f64 = 0.1;

// Cross-border hydro: long-run average inflow reference for Cahora Bassa (MW)
pub const CAHORA_BASSA_REFERENCE_INFLOW_MW: f64 = 2187.0;
pub const CROSS_BORDER_STATION: &str = "CahoraBassa";
