use anyhow::Context;
use jtl_summary_model::RunSummary;
use polars::prelude::*;
use std::path::Path;

/// Header of the run summaries CSV, in column order.
pub const SUMMARY_COLUMNS: [&str; 9] = [
    "runName",
    "totalCount",
    "successCount",
    "expectedFailureCount",
    "durationSeconds",
    "throughputPerSecond",
    "latencyP50Ms",
    "latencyP95Ms",
    "latencyP99Ms",
];

fn summaries_frame(summaries: &[RunSummary]) -> anyhow::Result<DataFrame> {
    let [name, total, success, failure, duration, throughput, p50, p95, p99] = SUMMARY_COLUMNS;

    let frame = df!(
        name => summaries.iter().map(|s| s.run_name.clone()).collect::<Vec<_>>(),
        total => summaries.iter().map(|s| s.total_count).collect::<Vec<_>>(),
        success => summaries.iter().map(|s| s.success_count).collect::<Vec<_>>(),
        failure => summaries.iter().map(|s| s.expected_failure_count).collect::<Vec<_>>(),
        duration => summaries.iter().map(|s| s.duration_seconds).collect::<Vec<_>>(),
        throughput => summaries.iter().map(|s| s.throughput_per_second).collect::<Vec<_>>(),
        p50 => summaries.iter().map(|s| s.latency_p50_ms).collect::<Vec<_>>(),
        p95 => summaries.iter().map(|s| s.latency_p95_ms).collect::<Vec<_>>(),
        p99 => summaries.iter().map(|s| s.latency_p99_ms).collect::<Vec<_>>(),
    )?;

    Ok(frame)
}

/// Write one row per run, in the given order.
pub fn write_summaries_csv(summaries: &[RunSummary], path: &Path) -> anyhow::Result<()> {
    let mut frame = summaries_frame(summaries).context("Build run summary frame")?;
    log::trace!("Run summary frame: {}", frame);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut frame)
        .with_context(|| format!("Failed to write run summaries to {}", path.display()))?;

    Ok(())
}
