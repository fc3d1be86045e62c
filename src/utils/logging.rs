use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lazy_static::lazy_static;
use parking_lot::RwLock;
use tracing::Level;
use tracing_subscriber::{prelude::*, EnvFilter};
use tracing_timing::{Builder, Histogram};

// Categories for the phases of the preparation pipeline
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum OperationCategory {
    DataLoad {
        subcategory: DataLoadType,
    },
    NetworkBuild {
        subcategory: BuildStage,
    },
    ScenarioAdjust,
    Export,
    Other,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum DataLoadType {
    Topology,
    Costs,
    TimeSeries,
    Fleet,
    Other,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum BuildStage {
    Topology,
    Load,
    Renewables,
    Fleet,
    Extendable,
    Storage,
}

impl OperationCategory {
    pub fn as_str(&self) -> String {
        match self {
            OperationCategory::DataLoad { subcategory } => {
                format!(
                    "Data Load - {}",
                    match subcategory {
                        DataLoadType::Topology => "Topology",
                        DataLoadType::Costs => "Costs",
                        DataLoadType::TimeSeries => "Time Series",
                        DataLoadType::Fleet => "Fleet",
                        DataLoadType::Other => "Other",
                    }
                )
            }
            OperationCategory::NetworkBuild { subcategory } => {
                format!(
                    "Network Build - {}",
                    match subcategory {
                        BuildStage::Topology => "Topology",
                        BuildStage::Load => "Load",
                        BuildStage::Renewables => "Renewables",
                        BuildStage::Fleet => "Fleet",
                        BuildStage::Extendable => "Extendable",
                        BuildStage::Storage => "Storage",
                    }
                )
            }
            OperationCategory::ScenarioAdjust => "Scenario Adjust".to_string(),
            OperationCategory::Export => "Export".to_string(),
            OperationCategory::Other => "Other Operations".to_string(),
        }
    }
}

lazy_static! {
    static ref TIMING_ENABLED: AtomicBool = AtomicBool::new(false);
    static ref FUNCTION_TIMINGS: Arc<RwLock<HashMap<String, Histogram<u64>>>> =
        Arc::new(RwLock::new(HashMap::new()));
    static ref CATEGORY_TIMINGS: Arc<RwLock<HashMap<OperationCategory, Histogram<u64>>>> =
        Arc::new(RwLock::new(HashMap::new()));
}

pub struct TimingGuard {
    function_name: String,
    category: OperationCategory,
    start: Instant,
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        record_timing(&self.function_name, duration, &self.category);
    }
}

pub fn start_timing(function_name: &str, category: OperationCategory) -> TimingGuard {
    TimingGuard {
        function_name: function_name.to_string(),
        category,
        start: Instant::now(),
    }
}

fn record_timing(function_name: &str, duration: Duration, category: &OperationCategory) {
    if !is_timing_enabled() {
        return;
    }

    let duration_ns = duration.as_nanos() as u64;

    {
        let mut timings = FUNCTION_TIMINGS.write();
        let histogram = timings
            .entry(function_name.to_string())
            .or_insert_with(|| Histogram::<u64>::new_with_bounds(1, 60_000_000_000, 3).unwrap());
        let _ = histogram.record(duration_ns);
    }

    {
        let mut category_timings = CATEGORY_TIMINGS.write();
        let histogram = category_timings
            .entry(category.clone())
            .or_insert_with(|| Histogram::<u64>::new_with_bounds(1, 60_000_000_000, 3).unwrap());
        let _ = histogram.record(duration_ns);
    }
}

pub fn init_logging(enable_timing: bool, debug_logging: bool) {
    TIMING_ENABLED.store(enable_timing, Ordering::SeqCst);

    let default_level = if debug_logging {
        "zagrid=debug"
    } else {
        "zagrid=info"
    };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(Level::INFO.into())
        .add_directive(default_level.parse().unwrap());

    if enable_timing {
        let histogram = || Histogram::<u64>::new_with_bounds(1, 60_000_000_000, 3).unwrap();
        let timing_layer = Builder::default().layer(histogram);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .with(timing_layer.boxed());

        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set up tracing subscriber");
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer());

        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set up tracing subscriber");
    }
}

pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::SeqCst)
}

pub fn print_timing_report() {
    if !is_timing_enabled() {
        return;
    }

    println!("\nPerformance Report");
    println!("==================");

    println!("\nBy function:");
    let timings = FUNCTION_TIMINGS.read();
    let mut entries: Vec<_> = timings.iter().collect();
    entries.sort_by(|a, b| {
        let a_total = a.1.mean() * a.1.len() as f64;
        let b_total = b.1.mean() * b.1.len() as f64;
        b_total.partial_cmp(&a_total).unwrap_or(std::cmp::Ordering::Equal)
    });
    for (name, histogram) in entries {
        println!(
            "{}: count={}, mean={:.2}ms, p95={:.2}ms",
            name,
            histogram.len(),
            histogram.mean() / 1_000_000.0,
            histogram.value_at_quantile(0.95) as f64 / 1_000_000.0,
        );
    }

    println!("\nBy category:");
    let category_timings = CATEGORY_TIMINGS.read();
    let mut categories: Vec<_> = category_timings.iter().collect();
    categories.sort_by(|a, b| {
        let a_total = a.1.mean() * a.1.len() as f64;
        let b_total = b.1.mean() * b.1.len() as f64;
        b_total.partial_cmp(&a_total).unwrap_or(std::cmp::Ordering::Equal)
    });
    for (category, histogram) in categories {
        println!(
            "{}: count={}, mean={:.2}ms",
            category.as_str(),
            histogram.len(),
            histogram.mean() / 1_000_000.0,
        );
    }
}
