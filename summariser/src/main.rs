use anyhow::{anyhow, bail, Context};
use clap::Parser as _;
use jtl_summariser::config::SummariserConfig;
use jtl_summariser::report::{self, ReportStyle};
use jtl_summariser::AnalysisOptions;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

mod cli;

const DEFAULT_OUTPUT_DIR: &str = "analysis_output";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = cli::CliArgs::parse();
    let style = ReportStyle::default();

    match (&args.config, &args.path) {
        (Some(config_path), _) => compare_runs(config_path, &args, &style),
        (None, Some(path)) => analyze_single_file(path, &args, &style),
        (None, None) => bail!("No input given, pass a result log or --config <RUNS_TOML>"),
    }
}

fn analyze_single_file(
    path: &Path,
    args: &cli::CliArgs,
    style: &ReportStyle,
) -> anyhow::Result<()> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }

    let options = AnalysisOptions {
        window_seconds: args.window_secs,
        threshold_multiplier: args.threshold,
        ..Default::default()
    };
    let output_dir = args.output_dir.clone().unwrap_or_else(|| {
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    debug!("Writing reports to {}", output_dir.display());

    let analysis = jtl_summariser::analyze_file(path, &options)?;
    println!("{}", report::render_file_analysis(&analysis, options.window_seconds));

    let written =
        jtl_summariser::write_file_reports(&analysis, path, &options, &output_dir, style)?;
    println!("\nGenerated files:");
    for file in written {
        println!("  {}", file.display());
    }

    Ok(())
}

fn compare_runs(
    config_path: &Path,
    args: &cli::CliArgs,
    style: &ReportStyle,
) -> anyhow::Result<()> {
    let config = SummariserConfig::load(config_path)
        .with_context(|| format!("Loading run list {}", config_path.display()))?;
    info!("Summarising {} runs", config.runs.len());

    let expected_success = args.expected_success.or(config.expected_success);
    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let outcome = jtl_summariser::summarize_runs(&config.runs);
    for summary in &outcome.summaries {
        println!("{}", report::render_run_validation(summary, expected_success));
    }

    if outcome.summaries.is_empty() {
        return Err(anyhow!(
            "All {} runs failed:\n{:#?}",
            outcome.failures.len(),
            outcome.failures
        ));
    }
    if !outcome.failures.is_empty() {
        warn!(
            "{} out of {} runs failed and were skipped",
            outcome.failures.len(),
            config.runs.len()
        );
    }

    println!("{}", report::render_run_table(&outcome.summaries));

    let written = jtl_summariser::write_run_reports(
        &outcome.summaries,
        expected_success,
        &output_dir,
        style,
    )?;
    println!("\nGenerated files:");
    for file in written {
        println!("  {}", file.display());
    }

    Ok(())
}
