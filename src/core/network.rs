use std::collections::HashMap;

use chrono::NaiveDateTime;
use tracing::warn;

use crate::config::constants::HOURS_PER_YEAR;
use crate::models::branch::{Line, LineType, Link};
use crate::models::bus::Bus;
use crate::models::carrier::Carrier;
use crate::models::generator::Generator;
use crate::models::global_constraint::GlobalConstraint;
use crate::models::load::Load;
use crate::models::storage_unit::StorageUnit;

/// A table of per-snapshot series keyed by component name.
#[derive(Debug, Clone, Default)]
pub struct SeriesTable {
    columns: HashMap<String, Vec<f64>>,
}

impl SeriesTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_column(&mut self, name: &str, values: Vec<f64>) {
        self.columns.insert(name.to_string(), values);
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Vec<f64>> {
        self.columns.get_mut(name)
    }

    pub fn names(&self) -> Vec<&String> {
        self.columns.keys().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Append one row with the same value in every column.
    pub fn push_row(&mut self, value: f64) {
        for column in self.columns.values_mut() {
            column.push(value);
        }
    }

    /// Build a new table by mapping every column through `f`.
    pub fn map_columns<F>(&self, f: F) -> SeriesTable
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| (name.clone(), f(values)))
            .collect();
        SeriesTable { columns }
    }
}

/// The assembled power system model: component tables, hourly snapshots and
/// the time-series tables that go with them.
///
/// This is a passive container. It knows how to hold and mutate the model
/// the preparation pipeline builds; solving it is someone else's job.
#[derive(Debug, Clone)]
pub struct Network {
    name: String,
    buses: Vec<Bus>,
    carriers: Vec<Carrier>,
    line_types: Vec<LineType>,
    lines: Vec<Line>,
    links: Vec<Link>,
    generators: Vec<Generator>,
    storage_units: Vec<StorageUnit>,
    loads: Vec<Load>,
    global_constraints: Vec<GlobalConstraint>,
    snapshots: Vec<NaiveDateTime>,
    snapshot_weightings: Vec<f64>,
    generators_p_max_pu: SeriesTable,
    loads_p_set: SeriesTable,
    storage_units_inflow: SeriesTable,
}

impl Network {
    pub fn new(name: String) -> Self {
        Self {
            name,
            buses: Vec::new(),
            carriers: Vec::new(),
            line_types: Vec::new(),
            lines: Vec::new(),
            links: Vec::new(),
            generators: Vec::new(),
            storage_units: Vec::new(),
            loads: Vec::new(),
            global_constraints: Vec::new(),
            snapshots: Vec::new(),
            snapshot_weightings: Vec::new(),
            generators_p_max_pu: SeriesTable::new(),
            loads_p_set: SeriesTable::new(),
            storage_units_inflow: SeriesTable::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // Buses

    pub fn add_bus(&mut self, bus: Bus) {
        if self.bus(&bus.name).is_some() {
            warn!("Duplicate bus {} ignored", bus.name);
            return;
        }
        self.buses.push(bus);
    }

    pub fn bus(&self, name: &str) -> Option<&Bus> {
        self.buses.iter().find(|b| b.name == name)
    }

    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn bus_names(&self) -> Vec<String> {
        self.buses.iter().map(|b| b.name.clone()).collect()
    }

    // Carriers

    /// Register a carrier unless one of the same name already exists.
    pub fn ensure_carrier(&mut self, carrier: Carrier) {
        if self.carrier(&carrier.name).is_none() {
            self.carriers.push(carrier);
        }
    }

    pub fn carrier(&self, name: &str) -> Option<&Carrier> {
        self.carriers.iter().find(|c| c.name == name)
    }

    pub fn carrier_mut(&mut self, name: &str) -> Option<&mut Carrier> {
        self.carriers.iter_mut().find(|c| c.name == name)
    }

    pub fn carriers(&self) -> &[Carrier] {
        &self.carriers
    }

    // Line types and branches

    pub fn add_line_type(&mut self, line_type: LineType) {
        self.line_types.push(line_type);
    }

    pub fn line_type(&self, name: &str) -> Option<&LineType> {
        self.line_types.iter().find(|t| t.name == name)
    }

    pub fn line_types(&self) -> &[LineType] {
        &self.line_types
    }

    pub fn add_line(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut Vec<Line> {
        &mut self.lines
    }

    pub fn add_link(&mut self, link: Link) {
        self.links.push(link);
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn links_mut(&mut self) -> &mut Vec<Link> {
        &mut self.links
    }

    // Generators, storage units and loads

    pub fn add_generator(&mut self, generator: Generator) {
        if self.generator(&generator.name).is_some() {
            warn!("Duplicate generator {} ignored", generator.name);
            return;
        }
        self.generators.push(generator);
    }

    pub fn generator(&self, name: &str) -> Option<&Generator> {
        self.generators.iter().find(|g| g.name == name)
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    pub fn generators_mut(&mut self) -> &mut Vec<Generator> {
        &mut self.generators
    }

    pub fn add_storage_unit(&mut self, unit: StorageUnit) {
        if self.storage_units.iter().any(|s| s.name == unit.name) {
            warn!("Duplicate storage unit {} ignored", unit.name);
            return;
        }
        self.storage_units.push(unit);
    }

    pub fn storage_units(&self) -> &[StorageUnit] {
        &self.storage_units
    }

    pub fn storage_units_mut(&mut self) -> &mut Vec<StorageUnit> {
        &mut self.storage_units
    }

    pub fn add_load(&mut self, load: Load) {
        self.loads.push(load);
    }

    pub fn loads(&self) -> &[Load] {
        &self.loads
    }

    // Global constraints

    /// Add a constraint, replacing any previous one of the same name.
    pub fn add_global_constraint(&mut self, constraint: GlobalConstraint) {
        if let Some(existing) = self
            .global_constraints
            .iter_mut()
            .find(|c| c.name == constraint.name)
        {
            warn!("Global constraint {} replaced", constraint.name);
            *existing = constraint;
            return;
        }
        self.global_constraints.push(constraint);
    }

    pub fn global_constraint(&self, name: &str) -> Option<&GlobalConstraint> {
        self.global_constraints.iter().find(|c| c.name == name)
    }

    pub fn global_constraints(&self) -> &[GlobalConstraint] {
        &self.global_constraints
    }

    // Snapshots and series

    pub fn set_snapshots(&mut self, snapshots: Vec<NaiveDateTime>, weightings: Vec<f64>) {
        assert_eq!(
            snapshots.len(),
            weightings.len(),
            "snapshot and weighting lengths differ"
        );
        self.snapshots = snapshots;
        self.snapshot_weightings = weightings;
    }

    pub fn snapshots(&self) -> &[NaiveDateTime] {
        &self.snapshots
    }

    pub fn snapshot_weightings(&self) -> &[f64] {
        &self.snapshot_weightings
    }

    /// Years of system operation the snapshots represent.
    pub fn n_years(&self) -> f64 {
        self.snapshot_weightings.iter().sum::<f64>() / HOURS_PER_YEAR
    }

    /// Append one snapshot; every existing series column gets `fill` there.
    pub fn append_snapshot(&mut self, snapshot: NaiveDateTime, weighting: f64, fill: f64) {
        self.snapshots.push(snapshot);
        self.snapshot_weightings.push(weighting);
        self.generators_p_max_pu.push_row(fill);
        self.loads_p_set.push_row(fill);
        self.storage_units_inflow.push_row(fill);
    }

    pub fn generators_p_max_pu(&self) -> &SeriesTable {
        &self.generators_p_max_pu
    }

    pub fn generators_p_max_pu_mut(&mut self) -> &mut SeriesTable {
        &mut self.generators_p_max_pu
    }

    pub fn loads_p_set(&self) -> &SeriesTable {
        &self.loads_p_set
    }

    pub fn loads_p_set_mut(&mut self) -> &mut SeriesTable {
        &mut self.loads_p_set
    }

    pub fn storage_units_inflow(&self) -> &SeriesTable {
        &self.storage_units_inflow
    }

    pub fn storage_units_inflow_mut(&mut self) -> &mut SeriesTable {
        &mut self.storage_units_inflow
    }

    /// Swap out the whole time dimension, used by temporal aggregation.
    pub fn replace_time_dimension(
        &mut self,
        snapshots: Vec<NaiveDateTime>,
        weightings: Vec<f64>,
        generators_p_max_pu: SeriesTable,
        loads_p_set: SeriesTable,
        storage_units_inflow: SeriesTable,
    ) {
        assert_eq!(snapshots.len(), weightings.len());
        self.snapshots = snapshots;
        self.snapshot_weightings = weightings;
        self.generators_p_max_pu = generators_p_max_pu;
        self.loads_p_set = loads_p_set;
        self.storage_units_inflow = storage_units_inflow;
    }

    /// Total set load per snapshot, summed over all load columns.
    pub fn total_load_per_snapshot(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.snapshots.len()];
        for load in &self.loads {
            if let Some(column) = self.loads_p_set.column(&load.name) {
                for (t, v) in column.iter().enumerate() {
                    totals[t] += v;
                }
            }
        }
        totals
    }

    /// Structural checks run before hand-off; returns human-readable issues.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for window in self.snapshots.windows(2) {
            if window[1] <= window[0] {
                issues.push(format!(
                    "snapshots not strictly increasing around {}",
                    window[1]
                ));
                break;
            }
        }
        for (t, w) in self.snapshot_weightings.iter().enumerate() {
            if *w < 0.0 {
                issues.push(format!("negative snapshot weighting at position {}", t));
                break;
            }
        }

        let check_bus = |issues: &mut Vec<String>, kind: &str, name: &str, bus: &str| {
            if self.bus(bus).is_none() {
                issues.push(format!("{} {} references unknown bus {}", kind, name, bus));
            }
        };
        for g in &self.generators {
            check_bus(&mut issues, "generator", &g.name, &g.bus);
        }
        for s in &self.storage_units {
            check_bus(&mut issues, "storage unit", &s.name, &s.bus);
        }
        for l in &self.loads {
            check_bus(&mut issues, "load", &l.name, &l.bus);
        }
        for line in &self.lines {
            check_bus(&mut issues, "line", &line.name, &line.bus0);
            check_bus(&mut issues, "line", &line.name, &line.bus1);
            if !line.line_type.is_empty() && self.line_type(&line.line_type).is_none() {
                issues.push(format!(
                    "line {} references unknown line type {}",
                    line.name, line.line_type
                ));
            }
        }
        for link in &self.links {
            check_bus(&mut issues, "link", &link.name, &link.bus0);
            check_bus(&mut issues, "link", &link.name, &link.bus1);
        }

        let expect_len = self.snapshots.len();
        let mut check_table = |table: &SeriesTable, label: &str| {
            for name in table.names() {
                let len = table.column(name).map(|c| c.len()).unwrap_or(0);
                if len != expect_len {
                    issues.push(format!(
                        "{} series {} has {} values for {} snapshots",
                        label, name, len, expect_len
                    ));
                }
            }
        };
        check_table(&self.generators_p_max_pu, "generators.p_max_pu");
        check_table(&self.loads_p_set, "loads.p_set");
        check_table(&self.storage_units_inflow, "storage_units.inflow");

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn bus(name: &str) -> Bus {
        Bus::new(name.to_string(), 400.0, crate::utils::spatial::Coordinate::new(25.0, -29.0), 1.0)
    }

    #[test]
    fn duplicate_bus_is_ignored() {
        let mut n = Network::new("test".to_string());
        n.add_bus(bus("A"));
        n.add_bus(bus("A"));
        assert_eq!(n.buses().len(), 1);
    }

    #[test]
    fn ensure_carrier_registers_once() {
        let mut n = Network::new("test".to_string());
        n.ensure_carrier(Carrier::new("coal".to_string(), 0.32));
        n.ensure_carrier(Carrier::new("coal".to_string(), 0.0));
        assert_eq!(n.carriers().len(), 1);
        assert!((n.carrier("coal").unwrap().co2_emissions - 0.32).abs() < 1e-12);
    }

    #[test]
    fn n_years_follows_weightings() {
        let mut n = Network::new("test".to_string());
        n.set_snapshots(vec![ts(1, 0), ts(1, 3)], vec![4380.0, 4380.0]);
        assert!((n.n_years() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn append_snapshot_extends_series() {
        let mut n = Network::new("test".to_string());
        n.set_snapshots(vec![ts(1, 0), ts(1, 1)], vec![1.0, 1.0]);
        n.loads_p_set_mut().set_column("A", vec![10.0, 12.0]);
        n.append_snapshot(ts(1, 2), 0.0, 0.0);
        assert_eq!(n.snapshots().len(), 3);
        assert_eq!(n.loads_p_set().column("A").unwrap(), &[10.0, 12.0, 0.0]);
    }

    #[test]
    fn validate_flags_unknown_bus_and_ragged_series() {
        let mut n = Network::new("test".to_string());
        n.add_bus(bus("A"));
        n.set_snapshots(vec![ts(1, 0), ts(1, 1)], vec![1.0, 1.0]);
        n.add_generator(Generator {
            name: "B coal".to_string(),
            bus: "B".to_string(),
            carrier: "coal".to_string(),
            ..Default::default()
        });
        n.generators_p_max_pu_mut().set_column("B coal", vec![1.0]);
        let issues = n.validate();
        assert!(issues.iter().any(|i| i.contains("unknown bus B")));
        assert!(issues.iter().any(|i| i.contains("has 1 values for 2")));
    }

    #[test]
    fn total_load_sums_columns() {
        let mut n = Network::new("test".to_string());
        n.add_bus(bus("A"));
        n.add_bus(bus("B"));
        n.set_snapshots(vec![ts(1, 0), ts(1, 1)], vec![1.0, 1.0]);
        n.add_load(Load::new("A".to_string(), "A".to_string()));
        n.add_load(Load::new("B".to_string(), "B".to_string()));
        n.loads_p_set_mut().set_column("A", vec![1.0, 2.0]);
        n.loads_p_set_mut().set_column("B", vec![3.0, 4.0]);
        assert_eq!(n.total_load_per_snapshot(), vec![4.0, 6.0]);
    }
}
