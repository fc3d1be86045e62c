use std::error::Error;
use std::process::ExitCode;

use clap::Parser;

use zagrid::config::model_config::ModelConfig;
use zagrid::core::attach::assemble_network;
use zagrid::data::regions_loader::load_supply_regions;
use zagrid::data::sources::{load_input_data, DataPaths};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short = 'd', long, default_value = "assets/sample")]
    data_dir: String,

    #[arg(short, long, help = "JSON model configuration file")]
    config: Option<String>,

    #[arg(short, long, default_value = "27-supply")]
    regions: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match args.config.as_deref() {
        Some(path) => match ModelConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("FAIL config {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => ModelConfig::default(),
    };

    println!("Validating input data in {}...", args.data_dir);
    let paths = DataPaths::new(&args.data_dir);
    let mut hard_errors = 0;

    let regions = match load_supply_regions(&paths.supply_regions()) {
        Ok(regions) => {
            println!("ok  supply regions: {} regions", regions.len());
            for region in &regions {
                if region.polygon.len() < 3 {
                    println!(
                        "warn  region {} has a degenerate polygon ({} points)",
                        region.name,
                        region.polygon.len()
                    );
                }
            }
            regions
        }
        Err(e) => {
            report_failure("supply regions", e.as_ref());
            hard_errors += 1;
            Vec::new()
        }
    };

    let inputs = match load_input_data(&paths, config.year, config.historical_year) {
        Ok(inputs) => {
            println!(
                "ok  inputs: {} lines, {} links, {} load hours, {} cost rows, {} fleet stations",
                inputs.lines.len(),
                inputs.links.len(),
                inputs.load.timestamps.len(),
                inputs.cost_records.len(),
                inputs.fleet.len()
            );
            Some(inputs)
        }
        Err(e) => {
            eprintln!("FAIL inputs: {:#}", e);
            hard_errors += 1;
            None
        }
    };

    if let (Some(inputs), false) = (inputs, regions.is_empty()) {
        match assemble_network(&config, &args.regions, &regions, &inputs) {
            Ok((network, _costs)) => {
                let issues = network.validate();
                if issues.is_empty() {
                    println!("ok  assembled network is structurally sound");
                } else {
                    for issue in &issues {
                        println!("warn  {}", issue);
                    }
                }
            }
            Err(e) => {
                eprintln!("FAIL assembly: {:#}", e);
                hard_errors += 1;
            }
        }
    }

    if hard_errors > 0 {
        eprintln!("{} hard errors found", hard_errors);
        ExitCode::FAILURE
    } else {
        println!("All inputs usable");
        ExitCode::SUCCESS
    }
}

fn report_failure(source: &str, error: &(dyn Error + 'static)) {
    eprintln!("FAIL {}: {}", source, error);
}
