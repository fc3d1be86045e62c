use std::path::Path;

use anyhow::Result;
use clap::Parser;

use zagrid::analysis::summary::print_network_summary;
use zagrid::cli::cli::Args;
use zagrid::config::model_config::ModelConfig;
use zagrid::core::attach::assemble_network;
use zagrid::core::batch::{load_scenario_specs, run_scenario_batch};
use zagrid::core::prepare::apply_scenario;
use zagrid::core::scenario::Scenario;
use zagrid::data::regions_loader::{load_supply_regions, SupplyRegion};
use zagrid::data::sources::{load_input_data, DataPaths};
use zagrid::utils::csv_export::{CsvExporter, RunMeta};
use zagrid::utils::logging::{self, DataLoadType, OperationCategory};
use zagrid::utils::spatial::Coordinate;

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    logging::init_logging(args.enable_timing(), args.debug_logging());

    println!("zagrid network preparation");
    println!(
        "Region setup: {}, data: {}, output: {}",
        args.regions(),
        args.data_dir(),
        args.output_dir()
    );

    let config = match args.config() {
        Some(path) => ModelConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {}", path, e))?,
        None => ModelConfig::default(),
    };

    let paths = DataPaths::new(args.data_dir());
    let regions = load_regions(&paths);

    let inputs = {
        let _timing = logging::start_timing(
            "load_input_data",
            OperationCategory::DataLoad {
                subcategory: DataLoadType::Other,
            },
        );
        load_input_data(&paths, config.year, config.historical_year)?
    };

    let (mut network, costs) = assemble_network(&config, args.regions(), &regions, &inputs)?;
    println!(
        "Assembled base network with {} buses and {} generators",
        network.buses().len(),
        network.generators().len()
    );

    if let Some(scenarios_path) = args.scenarios() {
        let specs = load_scenario_specs(scenarios_path)?;
        let outcome = run_scenario_batch(
            &network,
            &costs,
            &inputs.areas,
            &config,
            args.regions(),
            &specs,
            Path::new(args.output_dir()),
            args.parallel(),
        )?;
        println!(
            "Prepared {} scenarios, {} failed",
            outcome.succeeded,
            outcome.failed.len()
        );
        for (label, message) in &outcome.failed {
            eprintln!("  {}: {}", label, message);
        }
    } else {
        let scenario = Scenario::parse(args.ll(), args.opts())?;
        apply_scenario(&mut network, &scenario, &config, &costs, &inputs.areas)?;

        let out_dir = Path::new(args.output_dir()).join(scenario.dir_name());
        let exporter = CsvExporter::new(&out_dir)?;
        exporter.export_network(
            &network,
            &RunMeta {
                region_setup: args.regions().to_string(),
                ll: scenario.ll_raw().to_string(),
                opts: scenario.opts_raw().to_string(),
            },
        )?;
        println!("Network written to {}", out_dir.display());
        print_network_summary(&network);
    }

    logging::print_timing_report();
    Ok(())
}

fn load_regions(paths: &DataPaths) -> Vec<SupplyRegion> {
    match load_supply_regions(&paths.supply_regions()) {
        Ok(regions) if !regions.is_empty() => regions,
        Ok(_) => {
            eprintln!(
                "No regions in {}. Using fallback supply regions.",
                paths.supply_regions()
            );
            fallback_regions()
        }
        Err(e) => {
            eprintln!(
                "Failed to load supply regions: {}. Using fallback supply regions.",
                e
            );
            fallback_regions()
        }
    }
}

// Coarse fallback so the pipeline stays usable without region data
fn fallback_regions() -> Vec<SupplyRegion> {
    let square = |x: f64, y: f64| {
        vec![
            Coordinate::new(x - 1.0, y - 1.0),
            Coordinate::new(x + 1.0, y - 1.0),
            Coordinate::new(x + 1.0, y + 1.0),
            Coordinate::new(x - 1.0, y + 1.0),
        ]
    };
    vec![
        SupplyRegion {
            name: "GAUTENG".to_string(),
            position: Coordinate::new(28.0, -26.2),
            population: 15_800_000.0,
            polygon: square(28.0, -26.2),
        },
        SupplyRegion {
            name: "CAPE TOWN".to_string(),
            position: Coordinate::new(18.6, -33.9),
            population: 4_700_000.0,
            polygon: square(18.6, -33.9),
        },
        SupplyRegion {
            name: "DURBAN".to_string(),
            position: Coordinate::new(31.0, -29.9),
            population: 3_900_000.0,
            polygon: square(31.0, -29.9),
        },
        SupplyRegion {
            name: "POLOKWANE".to_string(),
            position: Coordinate::new(29.5, -23.9),
            population: 800_000.0,
            polygon: square(29.5, -23.9),
        },
    ]
}
