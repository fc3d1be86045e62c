use serde::{Deserialize, Serialize};

/// A demand sink at one bus; the actual demand profile is the
/// `loads.p_set` series column of the same name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Load {
    pub name: String,
    pub bus: String,
}

impl Load {
    pub fn new(name: String, bus: String) -> Self {
        Self { name, bus }
    }
}
