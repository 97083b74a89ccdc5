use crate::analyze::AnalysisError;
use crate::config::RunConfig;
use crate::model::{FileAnalysis, ResultRecord};
use crate::report::ReportStyle;
use anyhow::Context;
use jtl_summary_model::RunSummary;
use std::path::{Path, PathBuf};

pub mod analyze;
pub mod config;
pub mod filter;
pub mod frame;
pub mod model;
pub mod partition;
pub mod report;

/// Default width of the windows used for bottleneck detection and the latency timelines
pub const DEFAULT_WINDOW_SECONDS: u64 = 5;
/// A window is a bottleneck when its mean latency exceeds this multiple of the average
pub const DEFAULT_THRESHOLD_MULTIPLIER: f64 = 2.0;

/// Settings for the single file analysis
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    pub window_seconds: u64,
    pub threshold_multiplier: f64,
    pub latency_boundaries_ms: Vec<u64>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            window_seconds: DEFAULT_WINDOW_SECONDS,
            threshold_multiplier: DEFAULT_THRESHOLD_MULTIPLIER,
            latency_boundaries_ms: analyze::DEFAULT_LATENCY_BOUNDARIES_MS.to_vec(),
        }
    }
}

/// Load, filter and summarise the records of one configured run.
pub fn summarize_run(run: &RunConfig) -> anyhow::Result<RunSummary> {
    let records = frame::load_records(&run.path)?;
    log::debug!(
        "Loaded {} records for run {} from {}",
        records.len(),
        run.name,
        run.path.display()
    );

    let records = match &run.label_filter {
        Some(label_filter) => {
            let filtered = filter::filter_by_label(&records, label_filter);
            log::debug!(
                "Kept {} of {} records matching label `{label_filter}`",
                filtered.len(),
                records.len()
            );
            filtered
        }
        None => records,
    };

    if records.is_empty() {
        log::warn!(
            "No records to summarise for run {} in {}",
            run.name,
            run.path.display()
        );
    }

    Ok(analyze::summarize_with(
        &records,
        &run.name,
        &run.response_classes,
    ))
}

/// Result of summarising a list of runs
#[derive(Debug, Default)]
pub struct RunsOutcome {
    /// Summaries of the runs that succeeded, in configuration order
    pub summaries: Vec<RunSummary>,
    /// Runs that failed, with the reason
    pub failures: Vec<(String, anyhow::Error)>,
}

/// Summarise each run in turn. A run that fails is logged and skipped, the rest still run.
pub fn summarize_runs(runs: &[RunConfig]) -> RunsOutcome {
    let mut outcome = RunsOutcome::default();

    for run in runs {
        match summarize_run(run)
            .with_context(|| format!("Run {} from {}", run.name, run.path.display()))
        {
            Ok(summary) => {
                log::info!(
                    "Summarised run {}: {} records, {:.2} TPS",
                    run.name,
                    summary.total_count,
                    summary.throughput_per_second
                );
                outcome.summaries.push(summary);
            }
            Err(e) => {
                log::error!("Skipping run {} ({}): {e:#}", run.name, run.path.display());
                outcome.failures.push((run.name.clone(), e));
            }
        }
    }

    outcome
}

/// Compute the full single file analysis over already loaded records.
pub fn analyze_records(
    records: &[ResultRecord],
    options: &AnalysisOptions,
) -> Result<FileAnalysis, AnalysisError> {
    let (anomalous_windows, anomaly_threshold_ms) = analyze::detect_anomalies(
        records,
        options.window_seconds,
        options.threshold_multiplier,
    )?;

    let (throughput_timeline, throughput_window_seconds) =
        analyze::bounded_time_windows(records, 1)?;
    let (timeline, timeline_window_seconds) =
        analyze::bounded_time_windows(records, options.window_seconds)?;

    Ok(FileAnalysis {
        latency: analyze::latency_stats(records),
        throughput: analyze::throughput_stats(records),
        success: analyze::success_stats(records),
        by_label: partition::breakdown_by_label(records),
        anomalous_windows,
        anomaly_threshold_ms,
        latency_buckets: analyze::bucket_latencies(records, &options.latency_boundaries_ms)?,
        throughput_timeline,
        throughput_window_seconds,
        timeline,
        timeline_window_seconds,
        elapsed_ms: records.iter().map(|r| r.elapsed_ms).collect(),
    })
}

pub fn analyze_file(path: &Path, options: &AnalysisOptions) -> anyhow::Result<FileAnalysis> {
    let records = frame::load_records(path)?;
    log::info!("Loaded {} requests from {}", records.len(), path.display());

    analyze_records(&records, options).with_context(|| format!("Analysis of {}", path.display()))
}

/// Write the comparison outputs for a set of run summaries: the CSV, the success chart and the
/// scaling chart. Returns the paths written.
pub fn write_run_reports(
    summaries: &[RunSummary],
    expected_success: Option<u64>,
    output_dir: &Path,
    style: &ReportStyle,
) -> anyhow::Result<Vec<PathBuf>> {
    let csv_path = output_dir.join(report::SUMMARIES_CSV_FILE);
    report::write_summaries_csv(summaries, &csv_path)?;

    let success_chart = report::write_output(
        output_dir,
        report::SUCCESS_CHART_FILE,
        &report::render_success_chart(summaries, expected_success, style),
    )?;
    let scaling_chart = report::write_output(
        output_dir,
        report::SCALING_CHART_FILE,
        &report::render_scaling_chart(summaries, style),
    )?;

    Ok(vec![csv_path, success_chart, scaling_chart])
}

/// Write the single file outputs: the dashboard chart and the text report. Returns the paths
/// written.
pub fn write_file_reports(
    analysis: &FileAnalysis,
    source: &Path,
    options: &AnalysisOptions,
    output_dir: &Path,
    style: &ReportStyle,
) -> anyhow::Result<Vec<PathBuf>> {
    let dashboard = report::write_output(
        output_dir,
        report::DASHBOARD_CHART_FILE,
        &report::render_dashboard_chart(analysis, options.threshold_multiplier, style),
    )?;

    let source_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());
    let text_report = report::write_text_report(analysis, &source_name, output_dir)?;

    Ok(vec![dashboard, text_report])
}
