use std::fs::File;
use std::io::BufReader;

use serde::Deserialize;

use crate::utils::spatial::{distance_to_polygon, is_point_inside_polygon, Coordinate};

#[derive(Debug, Deserialize)]
pub struct SupplyRegionData {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub population: f64,
    /// Boundary as lon/lat pairs.
    pub polygon: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub struct SupplyRegionsFile {
    pub regions: Vec<SupplyRegionData>,
}

/// A supply region: one electrical node plus the polygon used to assign
/// power stations geographically.
#[derive(Debug, Clone)]
pub struct SupplyRegion {
    pub name: String,
    pub position: Coordinate,
    pub population: f64,
    pub polygon: Vec<Coordinate>,
}

impl SupplyRegion {
    pub fn contains(&self, point: &Coordinate) -> bool {
        is_point_inside_polygon(point, &self.polygon)
    }

    pub fn distance_to(&self, point: &Coordinate) -> f64 {
        distance_to_polygon(point, &self.polygon)
    }
}

/// The region whose polygon contains the point, if any.
pub fn containing_region<'a>(
    regions: &'a [SupplyRegion],
    point: &Coordinate,
) -> Option<&'a SupplyRegion> {
    regions.iter().find(|r| r.contains(point))
}

/// The region with the smallest distance to the point.
pub fn nearest_region<'a>(
    regions: &'a [SupplyRegion],
    point: &Coordinate,
) -> Option<&'a SupplyRegion> {
    regions
        .iter()
        .map(|r| (r, r.distance_to(point)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(r, _)| r)
}

pub fn load_supply_regions(path: &str) -> Result<Vec<SupplyRegion>, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let parsed: SupplyRegionsFile = serde_json::from_reader(reader)?;

    let mut regions = Vec::new();
    for data in parsed.regions {
        let polygon = data
            .polygon
            .iter()
            .map(|p| Coordinate::new(p[0], p[1]))
            .collect();
        regions.push(SupplyRegion {
            name: data.name,
            position: Coordinate::new(data.x, data.y),
            population: data.population,
            polygon,
        });
    }
    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_region(name: &str, x0: f64) -> SupplyRegion {
        SupplyRegion {
            name: name.to_string(),
            position: Coordinate::new(x0 + 0.5, 0.5),
            population: 1.0,
            polygon: vec![
                Coordinate::new(x0, 0.0),
                Coordinate::new(x0 + 1.0, 0.0),
                Coordinate::new(x0 + 1.0, 1.0),
                Coordinate::new(x0, 1.0),
            ],
        }
    }

    #[test]
    fn containing_region_prefers_polygon_membership() {
        let regions = vec![square_region("WEST", 0.0), square_region("EAST", 2.0)];
        let hit = containing_region(&regions, &Coordinate::new(2.5, 0.5)).unwrap();
        assert_eq!(hit.name, "EAST");
        assert!(containing_region(&regions, &Coordinate::new(1.5, 0.5)).is_none());
    }

    #[test]
    fn nearest_region_breaks_gap_cases() {
        let regions = vec![square_region("WEST", 0.0), square_region("EAST", 2.0)];
        // Point in the gap, slightly closer to EAST
        let hit = nearest_region(&regions, &Coordinate::new(1.6, 0.5)).unwrap();
        assert_eq!(hit.name, "EAST");
    }

    #[test]
    fn regions_parse_from_json() {
        let raw = r#"{
            "regions": [
                {"name": "GAUTENG", "x": 28.1, "y": -26.2, "population": 14.7e6,
                 "polygon": [[27.5, -26.8], [28.8, -26.8], [28.8, -25.6], [27.5, -25.6]]}
            ]
        }"#;
        let parsed: SupplyRegionsFile = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.regions.len(), 1);
        assert_eq!(parsed.regions[0].polygon.len(), 4);
    }
}
