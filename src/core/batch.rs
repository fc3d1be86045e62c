use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{error, info};

use crate::config::model_config::ModelConfig;
use crate::core::network::Network;
use crate::core::prepare::apply_scenario;
use crate::core::scenario::Scenario;
use crate::data::costs_loader::CostTable;
use crate::data::renewables_loader::AreaRecord;
use crate::utils::csv_export::{CsvExporter, RunMeta};

/// One entry of the scenario list, identified by its two wildcard strings.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioSpec {
    pub ll: String,
    pub opts: String,
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    scenarios: Vec<ScenarioSpec>,
}

pub fn load_scenario_specs(path: &str) -> Result<Vec<ScenarioSpec>> {
    let file = File::open(path).with_context(|| format!("opening {}", path))?;
    let reader = BufReader::new(file);
    let parsed: ScenarioFile =
        serde_json::from_reader(reader).with_context(|| format!("parsing {}", path))?;
    Ok(parsed.scenarios)
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub succeeded: usize,
    /// Failed scenarios with their error messages.
    pub failed: Vec<(String, String)>,
}

/// Prepare every scenario from one assembled base network. Each scenario
/// works on its own clone, so scenarios can run in parallel; a failing
/// scenario is reported and does not abort the batch.
pub fn run_scenario_batch(
    base: &Network,
    costs: &CostTable,
    areas: &HashMap<String, Vec<AreaRecord>>,
    config: &ModelConfig,
    region_setup: &str,
    specs: &[ScenarioSpec],
    out_root: &Path,
    parallel: bool,
) -> Result<BatchOutcome> {
    info!(
        "Preparing {} scenarios into {}",
        specs.len(),
        out_root.display()
    );

    let progress = ProgressBar::new(specs.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .expect("valid progress bar template"),
    );

    let process = |spec: &ScenarioSpec| -> Result<(), (String, String)> {
        let label = format!("{}_{}", spec.ll, spec.opts);
        progress.set_message(label.clone());
        let result = (|| -> Result<()> {
            let scenario = Scenario::parse(&spec.ll, &spec.opts)?;
            let mut n = base.clone();
            apply_scenario(&mut n, &scenario, config, costs, areas)?;
            let out_dir = out_root.join(scenario.dir_name());
            let exporter = CsvExporter::new(&out_dir)?;
            exporter.export_network(
                &n,
                &RunMeta {
                    region_setup: region_setup.to_string(),
                    ll: spec.ll.clone(),
                    opts: spec.opts.clone(),
                },
            )?;
            Ok(())
        })();
        progress.inc(1);
        result.map_err(|e| (label, format!("{:#}", e)))
    };

    let results: Vec<Result<(), (String, String)>> = if parallel {
        specs.par_iter().map(process).collect()
    } else {
        specs.iter().map(process).collect()
    };
    progress.finish_and_clear();

    let mut outcome = BatchOutcome {
        succeeded: 0,
        failed: Vec::new(),
    };
    for result in results {
        match result {
            Ok(()) => outcome.succeeded += 1,
            Err((label, message)) => {
                error!("Scenario {} failed: {}", label, message);
                outcome.failed.push((label, message));
            }
        }
    }
    info!(
        "Scenario batch finished: {} prepared, {} failed",
        outcome.succeeded,
        outcome.failed.len()
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::costs_loader::{build_cost_table, CostRecord};
    use crate::models::bus::Bus;
    use crate::models::load::Load;
    use crate::utils::spatial::Coordinate;
    use chrono::NaiveDate;

    fn base_network() -> Network {
        let mut n = Network::new("batch-test".to_string());
        n.add_bus(Bus::new("A".to_string(), 400.0, Coordinate::new(0.0, 0.0), 1.0));
        let snapshots: Vec<_> = (0..4)
            .map(|h| {
                NaiveDate::from_ymd_opt(2017, 1, 1)
                    .unwrap()
                    .and_hms_opt(h, 0, 0)
                    .unwrap()
            })
            .collect();
        n.set_snapshots(snapshots, vec![1.0; 4]);
        n.add_load(Load::new("A".to_string(), "A".to_string()));
        n.loads_p_set_mut().set_column("A", vec![1.0, 2.0, 3.0, 2.0]);
        n
    }

    fn costs() -> CostTable {
        let records = vec![CostRecord {
            technology: "HVAC overhead".to_string(),
            year: 2030,
            parameter: "investment".to_string(),
            value: 2.0,
            unit: "ZAR/MW/km".to_string(),
            source: String::new(),
        }];
        let config = crate::config::model_config::CostsConfig::default();
        build_cost_table(&records, &config, 2030, &HashMap::new(), 1.0).unwrap()
    }

    #[test]
    fn batch_prepares_good_scenarios_and_reports_bad_ones() {
        let dir = tempfile::tempdir().unwrap();
        let specs = vec![
            ScenarioSpec {
                ll: "copt".to_string(),
                opts: "Co2L-2h".to_string(),
            },
            ScenarioSpec {
                ll: "v1.25".to_string(),
                opts: "Ep".to_string(),
            },
            ScenarioSpec {
                ll: "xopt".to_string(),
                opts: "Co2L".to_string(),
            },
        ];
        let outcome = run_scenario_batch(
            &base_network(),
            &costs(),
            &HashMap::new(),
            &ModelConfig::default(),
            "RSA",
            &specs,
            dir.path(),
            false,
        )
        .unwrap();

        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed.len(), 1);
        assert!(outcome.failed[0].0.starts_with("xopt"));
        assert!(dir.path().join("elec_copt_Co2L-2h/meta.json").exists());
        assert!(dir.path().join("elec_v1.25_Ep/snapshots.csv").exists());
    }

    #[test]
    fn scenario_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenarios.json");
        std::fs::write(
            &path,
            r#"{"scenarios": [{"ll": "copt", "opts": "Co2L-24h"}, {"ll": "v1.1", "opts": "Ep"}]}"#,
        )
        .unwrap();
        let specs = load_scenario_specs(path.to_str().unwrap()).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].ll, "copt");
        assert_eq!(specs[1].opts, "Ep");
    }
}
