use crate::model::FileAnalysis;
use chrono::{DateTime, TimeZone};
use std::path::{Path, PathBuf};

const RULE_WIDTH: usize = 70;

/// Render the headline statistics of a single file analysis as a plain text report.
pub fn render_text_report<Tz>(
    analysis: &FileAnalysis,
    source_name: &str,
    generated_at: DateTime<Tz>,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let rule = "=".repeat(RULE_WIDTH);

    let lines = [
        rule.clone(),
        "Load Test Performance - Analysis Report".to_string(),
        rule,
        format!("Generated at: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        format!("Data file: {source_name}"),
        format!("Total requests: {}", analysis.latency.count),
        String::new(),
        "Key performance indicators:".to_string(),
        format!("  Mean response time: {:.2} ms", analysis.latency.mean),
        format!("  Median response time: {:.2} ms", analysis.latency.median),
        format!("  P95 response time: {:.2} ms", analysis.latency.p95),
        format!("  P99 response time: {:.2} ms", analysis.latency.p99),
        format!("  Mean TPS: {:.2}", analysis.throughput.mean),
        format!("  Max TPS: {:.2}", analysis.throughput.max),
        format!("  Success rate: {:.2}%", analysis.success.success_rate_pct),
    ];

    lines.join("\n") + "\n"
}

/// Render the text report, stamped with the local time, into `output_dir`.
pub fn write_text_report(
    analysis: &FileAnalysis,
    source_name: &str,
    output_dir: &Path,
) -> anyhow::Result<PathBuf> {
    super::write_output(
        output_dir,
        super::TEXT_REPORT_FILE,
        &render_text_report(analysis, source_name, chrono::Local::now()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LatencyStats, SuccessStats, ThroughputStats};
    use chrono::Utc;

    #[test]
    fn report_contains_headline_statistics() {
        let analysis = FileAnalysis {
            latency: LatencyStats {
                count: 1234,
                mean: 101.5,
                median: 90.0,
                p95: 250.25,
                p99: 480.0,
                ..Default::default()
            },
            throughput: ThroughputStats {
                mean: 42.123,
                max: 77.0,
                ..Default::default()
            },
            success: SuccessStats {
                success_rate_pct: 99.5,
                ..Default::default()
            },
            by_label: vec![],
            anomalous_windows: vec![],
            anomaly_threshold_ms: 0.0,
            latency_buckets: vec![],
            throughput_timeline: vec![],
            throughput_window_seconds: 1,
            timeline: vec![],
            timeline_window_seconds: 5,
            elapsed_ms: vec![],
        };
        let generated_at = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();

        let report = render_text_report(&analysis, "results.jtl", generated_at);

        for expected in [
            "Generated at: 2024-03-15 12:00:00",
            "Data file: results.jtl",
            "Total requests: 1234",
            "Mean response time: 101.50 ms",
            "Median response time: 90.00 ms",
            "P95 response time: 250.25 ms",
            "P99 response time: 480.00 ms",
            "Mean TPS: 42.12",
            "Max TPS: 77.00",
            "Success rate: 99.50%",
        ] {
            assert!(report.contains(expected), "Missing `{expected}` in:\n{report}");
        }
    }
}
