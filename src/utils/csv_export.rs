use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::Local;
use csv::Writer;
use serde::Serialize;
use tracing::info;

use crate::core::network::{Network, SeriesTable};
use crate::utils::logging::{self, OperationCategory};

#[derive(Debug)]
pub enum ExportError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    JsonError(serde_json::Error),
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::IoError(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::CsvError(err)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::JsonError(err)
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::IoError(e) => write!(f, "IO error: {}", e),
            ExportError::CsvError(e) => write!(f, "CSV error: {}", e),
            ExportError::JsonError(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

/// Scenario identification recorded next to the exported tables.
#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub region_setup: String,
    pub ll: String,
    pub opts: String,
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes a network as a directory of CSV tables plus a JSON meta file,
/// the exchange format handed to the downstream solver.
pub struct CsvExporter {
    out_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(out_dir: &Path) -> Result<Self, ExportError> {
        fs::create_dir_all(out_dir)?;
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
        })
    }

    pub fn export_network(&self, n: &Network, meta: &RunMeta) -> Result<(), ExportError> {
        let _timing = logging::start_timing("export_network", OperationCategory::Export);

        self.write_table("buses.csv", n.buses())?;
        self.write_table("carriers.csv", n.carriers())?;
        self.write_table("line_types.csv", n.line_types())?;
        self.write_table("lines.csv", n.lines())?;
        self.write_table("links.csv", n.links())?;
        self.write_table("generators.csv", n.generators())?;
        self.write_table("storage_units.csv", n.storage_units())?;
        self.write_table("loads.csv", n.loads())?;
        self.write_table("global_constraints.csv", n.global_constraints())?;

        self.write_snapshots(n)?;

        let generator_order: Vec<String> =
            n.generators().iter().map(|g| g.name.clone()).collect();
        self.write_series("generators-p_max_pu.csv", n, n.generators_p_max_pu(), &generator_order)?;
        let load_order: Vec<String> = n.loads().iter().map(|l| l.name.clone()).collect();
        self.write_series("loads-p_set.csv", n, n.loads_p_set(), &load_order)?;
        let storage_order: Vec<String> =
            n.storage_units().iter().map(|s| s.name.clone()).collect();
        self.write_series("storage_units-inflow.csv", n, n.storage_units_inflow(), &storage_order)?;

        self.write_meta(n, meta)?;

        info!("Exported network {} to {}", n.name(), self.out_dir.display());
        Ok(())
    }

    fn write_table<T: Serialize>(&self, file_name: &str, rows: &[T]) -> Result<(), ExportError> {
        let mut writer = Writer::from_path(self.out_dir.join(file_name))?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_snapshots(&self, n: &Network) -> Result<(), ExportError> {
        let mut writer = Writer::from_path(self.out_dir.join("snapshots.csv"))?;
        writer.write_record(["snapshot", "weighting"])?;
        for (snapshot, weighting) in n.snapshots().iter().zip(n.snapshot_weightings()) {
            writer.write_record([
                snapshot.format(TIMESTAMP_FORMAT).to_string(),
                weighting.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Series tables are written with columns in component order so that
    /// exports of the same network are byte-stable.
    fn write_series(
        &self,
        file_name: &str,
        n: &Network,
        table: &SeriesTable,
        component_order: &[String],
    ) -> Result<(), ExportError> {
        let columns: Vec<&String> = component_order
            .iter()
            .filter(|name| table.column(name).is_some())
            .collect();

        let mut writer = Writer::from_path(self.out_dir.join(file_name))?;
        let mut header = vec!["snapshot".to_string()];
        header.extend(columns.iter().map(|c| (*c).clone()));
        writer.write_record(&header)?;

        for (t, snapshot) in n.snapshots().iter().enumerate() {
            let mut row = vec![snapshot.format(TIMESTAMP_FORMAT).to_string()];
            for name in &columns {
                let value = table.column(name).map(|c| c[t]).unwrap_or(0.0);
                row.push(value.to_string());
            }
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_meta(&self, n: &Network, meta: &RunMeta) -> Result<(), ExportError> {
        let payload = serde_json::json!({
            "network": n.name(),
            "region_setup": meta.region_setup,
            "ll": meta.ll,
            "opts": meta.opts,
            "created": Local::now().to_rfc3339(),
            "n_years": n.n_years(),
            "components": {
                "buses": n.buses().len(),
                "carriers": n.carriers().len(),
                "lines": n.lines().len(),
                "links": n.links().len(),
                "generators": n.generators().len(),
                "storage_units": n.storage_units().len(),
                "loads": n.loads().len(),
                "global_constraints": n.global_constraints().len(),
            },
            "snapshots": n.snapshots().len(),
        });
        let file = File::create(self.out_dir.join("meta.json"))?;
        serde_json::to_writer_pretty(file, &payload)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bus::Bus;
    use crate::models::generator::Generator;
    use crate::models::load::Load;
    use crate::utils::spatial::Coordinate;
    use chrono::NaiveDate;

    fn sample_network() -> Network {
        let mut n = Network::new("export-test".to_string());
        n.add_bus(Bus::new("A".to_string(), 400.0, Coordinate::new(25.0, -29.0), 1.0e6));
        let snapshots: Vec<_> = (0..3)
            .map(|h| {
                NaiveDate::from_ymd_opt(2017, 1, 1)
                    .unwrap()
                    .and_hms_opt(h, 0, 0)
                    .unwrap()
            })
            .collect();
        n.set_snapshots(snapshots, vec![1.0; 3]);
        n.add_generator(Generator {
            name: "A onwind".to_string(),
            bus: "A".to_string(),
            carrier: "onwind".to_string(),
            p_nom_extendable: true,
            ..Default::default()
        });
        n.generators_p_max_pu_mut()
            .set_column("A onwind", vec![0.1, 0.5, 0.9]);
        n.add_load(Load::new("A".to_string(), "A".to_string()));
        n.loads_p_set_mut().set_column("A", vec![10.0, 11.0, 12.0]);
        n
    }

    #[test]
    fn exports_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path()).unwrap();
        let meta = RunMeta {
            region_setup: "27-supply".to_string(),
            ll: "copt".to_string(),
            opts: "Co2L".to_string(),
        };
        exporter.export_network(&sample_network(), &meta).unwrap();

        for file in [
            "buses.csv",
            "carriers.csv",
            "lines.csv",
            "generators.csv",
            "loads.csv",
            "snapshots.csv",
            "generators-p_max_pu.csv",
            "loads-p_set.csv",
            "meta.json",
        ] {
            assert!(dir.path().join(file).exists(), "missing {}", file);
        }

        let snapshots = std::fs::read_to_string(dir.path().join("snapshots.csv")).unwrap();
        assert_eq!(snapshots.lines().count(), 4);
        assert!(snapshots.contains("2017-01-01 00:00:00"));

        let series = std::fs::read_to_string(dir.path().join("generators-p_max_pu.csv")).unwrap();
        let mut lines = series.lines();
        assert_eq!(lines.next().unwrap(), "snapshot,A onwind");
        assert!(lines.next().unwrap().ends_with(",0.1"));

        let meta_raw = std::fs::read_to_string(dir.path().join("meta.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&meta_raw).unwrap();
        assert_eq!(parsed["ll"], "copt");
        assert_eq!(parsed["components"]["generators"], 1);
    }
}
