use serde::{Deserialize, Serialize};

fn infinite() -> f64 {
    f64::INFINITY
}

/// A standard conductor type; the nominal current fixes the thermal rating
/// of lines referencing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineType {
    pub name: String,
    /// Nominal current in kA.
    pub i_nom: f64,
}

/// An AC transmission corridor between two buses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    /// Corridor length in km.
    pub length: f64,
    pub s_nom: f64,
    #[serde(default)]
    pub s_nom_min: f64,
    #[serde(default = "infinite")]
    pub s_nom_max: f64,
    #[serde(default)]
    pub s_nom_extendable: bool,
    /// N-1 security derating of the thermal rating.
    #[serde(default = "default_s_max_pu")]
    pub s_max_pu: f64,
    #[serde(default = "default_num_parallel")]
    pub num_parallel: f64,
    /// Name of a registered line type, empty for untyped lines.
    #[serde(default)]
    pub line_type: String,
    #[serde(default)]
    pub capital_cost: f64,
}

fn default_s_max_pu() -> f64 {
    1.0
}

fn default_num_parallel() -> f64 {
    1.0
}

/// A controllable point-to-point connection, typically HVDC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    #[serde(default = "default_dc_carrier")]
    pub carrier: String,
    pub p_nom: f64,
    #[serde(default)]
    pub p_nom_min: f64,
    #[serde(default = "infinite")]
    pub p_nom_max: f64,
    #[serde(default)]
    pub p_nom_extendable: bool,
    #[serde(default)]
    pub length: f64,
    /// Share of the corridor routed under water, weighting submarine cable costs.
    #[serde(default)]
    pub underwater_fraction: f64,
    #[serde(default)]
    pub capital_cost: f64,
}

fn default_dc_carrier() -> String {
    "DC".to_string()
}

impl Link {
    pub fn is_dc(&self) -> bool {
        self.carrier == "DC"
    }
}
