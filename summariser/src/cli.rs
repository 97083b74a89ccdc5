use jtl_summariser::{DEFAULT_THRESHOLD_MULTIPLIER, DEFAULT_WINDOW_SECONDS};
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// Path to a result log (.jtl CSV with a header row) to analyse.
    pub path: Option<PathBuf>,

    /// TOML file listing named runs to summarise and compare, instead of a single result log.
    #[arg(long, conflicts_with = "path")]
    pub config: Option<PathBuf>,

    /// Directory to write reports and charts to.
    ///
    /// Defaults to the directory of the result log, or for a run list to the `output_dir` from the
    /// config file and then `analysis_output`.
    #[arg(long, env = "JTL_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Width in seconds of the windows used to detect bottlenecks.
    #[arg(
        long,
        default_value_t = DEFAULT_WINDOW_SECONDS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub window_secs: u64,

    /// A window is a bottleneck when its mean latency is above this multiple of the average.
    #[arg(long, default_value_t = DEFAULT_THRESHOLD_MULTIPLIER)]
    pub threshold: f64,

    /// The most requests expected to succeed in each run. Overrides `expected_success` from the
    /// config file.
    #[arg(long)]
    pub expected_success: Option<u64>,
}
