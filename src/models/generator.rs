use serde::{Deserialize, Serialize};

/// A dispatchable or variable generator attached to one bus.
///
/// Variable generators carry their availability as a per-unit time series in
/// the network's `generators.p_max_pu` table rather than on the record itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generator {
    pub name: String,
    pub bus: String,
    pub carrier: String,
    pub p_nom: f64,
    pub p_nom_extendable: bool,
    pub p_nom_max: f64,
    pub efficiency: f64,
    pub capital_cost: f64,
    pub marginal_cost: f64,
    /// Per-unit ramp-up limit per hour, unset for unconstrained plants.
    pub ramp_limit_up: Option<f64>,
}

impl Default for Generator {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus: String::new(),
            carrier: String::new(),
            p_nom: 0.0,
            p_nom_extendable: false,
            p_nom_max: f64::INFINITY,
            efficiency: 1.0,
            capital_cost: 0.0,
            marginal_cost: 0.0,
            ramp_limit_up: None,
        }
    }
}
