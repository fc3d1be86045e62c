use clap::Parser;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(short = 'd', long, default_value = "assets/sample")]
    data_dir: String,

    #[arg(short, long, help = "JSON model configuration file")]
    config: Option<String>,

    #[arg(short, long, default_value = "networks")]
    output_dir: String,

    #[arg(short, long, default_value = "27-supply")]
    regions: String,

    #[arg(long, default_value = "copt", help = "Transmission expansion wildcard, e.g. copt or v1.25")]
    ll: String,

    #[arg(long, default_value = "Co2L-3h", help = "Scenario options, e.g. Co2L0.2-24h-Ep")]
    opts: String,

    #[arg(short, long, help = "JSON file listing ll/opts scenario combinations")]
    scenarios: Option<String>,

    #[arg(short, long, default_value_t = true)]
    parallel: bool,

    #[arg(long, default_value_t = false)]
    enable_timing: bool,

    #[arg(long, default_value_t = false)]
    debug_logging: bool,
}

// Add getter methods for all fields
impl Args {
    pub fn data_dir(&self) -> &str {
        &self.data_dir
    }

    pub fn config(&self) -> Option<&str> {
        self.config.as_deref()
    }

    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }

    pub fn regions(&self) -> &str {
        &self.regions
    }

    pub fn ll(&self) -> &str {
        &self.ll
    }

    pub fn opts(&self) -> &str {
        &self.opts
    }

    pub fn scenarios(&self) -> Option<&str> {
        self.scenarios.as_deref()
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }
}
