use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintType {
    #[serde(rename = "primary_energy")]
    PrimaryEnergy,
    #[serde(rename = "tech_capacity_expansion_limit")]
    TechCapacityExpansionLimit,
    #[serde(rename = "transmission_expansion_cost_limit")]
    TransmissionExpansionCostLimit,
    #[serde(rename = "transmission_volume_expansion_limit")]
    TransmissionVolumeExpansionLimit,
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConstraintType::PrimaryEnergy => write!(f, "primary_energy"),
            ConstraintType::TechCapacityExpansionLimit => {
                write!(f, "tech_capacity_expansion_limit")
            }
            ConstraintType::TransmissionExpansionCostLimit => {
                write!(f, "transmission_expansion_cost_limit")
            }
            ConstraintType::TransmissionVolumeExpansionLimit => {
                write!(f, "transmission_volume_expansion_limit")
            }
        }
    }
}

impl FromStr for ConstraintType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary_energy" => Ok(ConstraintType::PrimaryEnergy),
            "tech_capacity_expansion_limit" => Ok(ConstraintType::TechCapacityExpansionLimit),
            "transmission_expansion_cost_limit" => Ok(ConstraintType::TransmissionExpansionCostLimit),
            "transmission_volume_expansion_limit" => {
                Ok(ConstraintType::TransmissionVolumeExpansionLimit)
            }
            _ => Err(format!("Unknown constraint type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "==")]
    Equal,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Sense::LessEqual => write!(f, "<="),
            Sense::GreaterEqual => write!(f, ">="),
            Sense::Equal => write!(f, "=="),
        }
    }
}

/// A scenario-level bound handed verbatim to the downstream solver, such as
/// an emission cap or a transmission expansion budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConstraint {
    pub name: String,
    pub constraint_type: ConstraintType,
    /// Carrier attribute the bound sums over, e.g. "co2_emissions".
    pub carrier_attribute: String,
    pub sense: Sense,
    pub constant: f64,
    /// Set for per-bus bounds such as technology expansion limits.
    pub bus: Option<String>,
}
