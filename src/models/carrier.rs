use serde::{Deserialize, Serialize};

/// An energy carrier shared by generators and storage units.
///
/// Emission and usage intensities hang off the carrier so that scenario
/// constraints can address whole technology groups at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Carrier {
    pub name: String,
    /// Tonnes CO2 per MWh thermal of consumed fuel.
    pub co2_emissions: f64,
    /// Set to one for gas-burning carriers when a gas usage cap is active.
    pub gas_usage: f64,
}

impl Carrier {
    pub fn new(name: String, co2_emissions: f64) -> Self {
        Self {
            name,
            co2_emissions,
            gas_usage: 0.0,
        }
    }
}

/// The leading technology family of a carrier name, e.g. "solar" for
/// "solar-rooftop". Cost records are frequently keyed by the family.
pub fn suptech(carrier: &str) -> &str {
    carrier.split('-').next().unwrap_or(carrier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suptech_strips_variant_suffix() {
        assert_eq!(suptech("solar-rooftop"), "solar");
        assert_eq!(suptech("onwind"), "onwind");
    }
}
