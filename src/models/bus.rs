use serde::{Deserialize, Serialize};

use crate::utils::spatial::{Coordinate, Positioned};

/// A single supply region collapsed to one electrical node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub name: String,
    pub v_nom: f64,
    pub x: f64,
    pub y: f64,
    /// Resident population of the region, used to distribute national demand.
    pub population: f64,
}

impl Bus {
    pub fn new(name: String, v_nom: f64, position: Coordinate, population: f64) -> Self {
        Self {
            name,
            v_nom,
            x: position.x,
            y: position.y,
            population,
        }
    }
}

impl Positioned for Bus {
    fn position(&self) -> Coordinate {
        Coordinate::new(self.x, self.y)
    }
}
