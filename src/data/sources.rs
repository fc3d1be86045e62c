use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::data::costs_loader::{load_cost_records, CostRecord};
use crate::data::fleet_loader::{load_fleet, FleetRecord};
use crate::data::hydro_loader::{load_hydro_inflow, InflowTable};
use crate::data::load_loader::{load_system_demand, LoadSeries};
use crate::data::renewables_loader::{
    load_availability_profiles, load_available_areas, AreaRecord, ProfileTable,
};
use crate::models::branch::{Line, Link};

/// Renewable carriers with per-region area and profile files.
pub const RENEWABLE_CARRIERS: [&str; 2] = ["onwind", "solar"];

/// Well-known file names inside the data directory.
#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: &str) -> Self {
        Self {
            root: PathBuf::from(root),
        }
    }

    fn join(&self, name: &str) -> String {
        self.root.join(name).to_string_lossy().into_owned()
    }

    pub fn supply_regions(&self) -> String {
        self.join("supply_regions.json")
    }

    pub fn lines(&self) -> String {
        self.join("lines.csv")
    }

    pub fn links(&self) -> String {
        self.join("links.csv")
    }

    pub fn tech_costs(&self) -> String {
        self.join("tech_costs.csv")
    }

    pub fn system_load(&self) -> String {
        self.join("system_load.csv")
    }

    pub fn area(&self, carrier: &str) -> String {
        self.join(&format!("{}_area.csv", carrier))
    }

    pub fn profiles(&self, carrier: &str) -> String {
        self.join(&format!("{}_profiles.csv", carrier))
    }

    pub fn existing_fleet(&self) -> String {
        self.join("existing_fleet.csv")
    }

    pub fn hydro_inflow(&self) -> String {
        self.join("hydro_inflow.csv")
    }
}

/// Everything the assembly phase reads from disk, loaded up front so that
/// batch runs touch the filesystem only once.
#[derive(Debug, Clone)]
pub struct InputData {
    pub lines: Vec<Line>,
    pub links: Vec<Link>,
    pub load: LoadSeries,
    pub cost_records: Vec<CostRecord>,
    pub areas: HashMap<String, Vec<AreaRecord>>,
    pub profiles: HashMap<String, ProfileTable>,
    pub fleet: Vec<FleetRecord>,
    pub inflow: InflowTable,
}

fn load_csv_records<T: serde::de::DeserializeOwned>(path: &str) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path))?;
    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: T = result.with_context(|| format!("parsing {}", path))?;
        records.push(record);
    }
    Ok(records)
}

pub fn load_input_data(
    paths: &DataPaths,
    model_year: u32,
    historical_year: i32,
) -> Result<InputData> {
    let lines: Vec<Line> = load_csv_records(&paths.lines())?;

    // HVDC links are optional; many region setups have none
    let links: Vec<Link> = if Path::new(&paths.links()).exists() {
        load_csv_records(&paths.links())?
    } else {
        info!("No links file at {}, continuing without HVDC links", paths.links());
        Vec::new()
    };

    let load = load_system_demand(&paths.system_load(), historical_year)
        .with_context(|| format!("loading {}", paths.system_load()))?;

    let cost_records = load_cost_records(&paths.tech_costs())
        .with_context(|| format!("loading {}", paths.tech_costs()))?;

    let mut areas = HashMap::new();
    let mut profiles = HashMap::new();
    for carrier in RENEWABLE_CARRIERS {
        let area = load_available_areas(&paths.area(carrier))
            .with_context(|| format!("loading {}", paths.area(carrier)))?;
        let profile = load_availability_profiles(&paths.profiles(carrier), historical_year)
            .with_context(|| format!("loading {}", paths.profiles(carrier)))?;
        areas.insert(carrier.to_string(), area);
        profiles.insert(carrier.to_string(), profile);
    }

    let fleet = load_fleet(&paths.existing_fleet(), model_year)
        .with_context(|| format!("loading {}", paths.existing_fleet()))?;

    let inflow = load_hydro_inflow(&paths.hydro_inflow(), historical_year)
        .with_context(|| format!("loading {}", paths.hydro_inflow()))?;

    Ok(InputData {
        lines,
        links,
        load,
        cost_records,
        areas,
        profiles,
        fleet,
        inflow,
    })
}
