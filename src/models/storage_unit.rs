use serde::{Deserialize, Serialize};

/// A storage unit with coupled charge and discharge power at one bus.
///
/// Natural inflow (for hydro reservoirs) lives in the network's
/// `storage_units.inflow` series table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageUnit {
    pub name: String,
    pub bus: String,
    pub carrier: String,
    pub p_nom: f64,
    pub p_nom_extendable: bool,
    /// Energy capacity expressed as hours of discharge at p_nom.
    pub max_hours: f64,
    pub efficiency_store: f64,
    pub efficiency_dispatch: f64,
    /// Most negative per-unit dispatch, i.e. the pumping capability.
    pub p_min_pu: f64,
    pub p_max_pu: f64,
    pub cyclic_state_of_charge: bool,
    pub capital_cost: f64,
    pub marginal_cost: f64,
}

impl Default for StorageUnit {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus: String::new(),
            carrier: String::new(),
            p_nom: 0.0,
            p_nom_extendable: false,
            max_hours: 1.0,
            efficiency_store: 1.0,
            efficiency_dispatch: 1.0,
            p_min_pu: 0.0,
            p_max_pu: 1.0,
            cyclic_state_of_charge: true,
            capital_cost: 0.0,
            marginal_cost: 0.0,
        }
    }
}
