use crate::analyze::percentage;
use crate::model::{FileAnalysis, LabelBreakdown};
use chrono::DateTime;
use jtl_summary_model::RunSummary;
use tabled::settings::Style;
use tabled::{Table, Tabled};

const RULE_WIDTH: usize = 70;
const MAX_LISTED_ANOMALIES: usize = 10;

#[derive(Tabled)]
struct RunRow {
    run: String,
    total: u64,
    success: u64,
    #[tabled(rename = "expected failure")]
    expected_failure: u64,
    #[tabled(rename = "duration (s)", display = "float2")]
    duration_seconds: f64,
    #[tabled(rename = "TPS", display = "float2")]
    throughput_per_second: f64,
    #[tabled(rename = "p50 (ms)", display = "float2")]
    latency_p50_ms: f64,
    #[tabled(rename = "p95 (ms)", display = "float2")]
    latency_p95_ms: f64,
    #[tabled(rename = "p99 (ms)", display = "float2")]
    latency_p99_ms: f64,
}

fn float2(n: &f64) -> String {
    format!("{:.2}", n)
}

impl From<&RunSummary> for RunRow {
    fn from(summary: &RunSummary) -> Self {
        Self {
            run: summary.run_name.clone(),
            total: summary.total_count,
            success: summary.success_count,
            expected_failure: summary.expected_failure_count,
            duration_seconds: summary.duration_seconds,
            throughput_per_second: summary.throughput_per_second,
            latency_p50_ms: summary.latency_p50_ms,
            latency_p95_ms: summary.latency_p95_ms,
            latency_p99_ms: summary.latency_p99_ms,
        }
    }
}

pub fn render_run_table(summaries: &[RunSummary]) -> String {
    let rows = summaries.iter().map(RunRow::from).collect::<Vec<_>>();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.to_string()
}

pub fn render_label_table(breakdown: &[LabelBreakdown]) -> String {
    let mut table = Table::new(breakdown);
    table.with(Style::modern());
    table.to_string()
}

/// The consistency check printed for each run of a comparison.
pub fn render_run_validation(summary: &RunSummary, expected_success: Option<u64>) -> String {
    let mut lines = vec![
        format!("--- VALIDATION: {} ---", summary.run_name),
        format!("Total requests: {}", summary.total_count),
        format!("Successful requests: {}", summary.success_count),
        format!("Expected failures: {}", summary.expected_failure_count),
    ];
    if let Some(expected) = expected_success {
        lines.push(format!(
            "Goal achieved (success count <= {expected}): {}",
            summary.meets_expected_success(expected)
        ));
    }
    lines.push("-".repeat(42));

    lines.join("\n")
}

fn section(title: &str) -> Vec<String> {
    let rule = "=".repeat(RULE_WIDTH);
    vec![String::new(), rule.clone(), title.to_string(), rule]
}

fn format_timestamp(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch_ms.to_string())
}

/// Render every section of a single file analysis for the console.
pub fn render_file_analysis(analysis: &FileAnalysis, window_seconds: u64) -> String {
    let mut lines = Vec::new();

    let latency = &analysis.latency;
    lines.extend(section("Response Time Statistics"));
    lines.push(format!("Total requests:  {}", latency.count));
    lines.push(format!("Mean:            {:.2} ms", latency.mean));
    lines.push(format!("Median:          {:.2} ms", latency.median));
    lines.push(format!("Min:             {:.2} ms", latency.min));
    lines.push(format!("Max:             {:.2} ms", latency.max));
    lines.push(format!("Std:             {:.2} ms", latency.std));
    lines.push("Percentiles:".to_string());
    lines.push(format!("  P50:           {:.2} ms", latency.p50));
    lines.push(format!("  P90:           {:.2} ms", latency.p90));
    lines.push(format!("  P95:           {:.2} ms", latency.p95));
    lines.push(format!("  P99:           {:.2} ms", latency.p99));

    let throughput = &analysis.throughput;
    lines.extend(section("TPS (Transactions Per Second)"));
    lines.push(format!("Mean TPS:        {:.2}", throughput.mean));
    lines.push(format!("Max TPS:         {:.2}", throughput.max));
    lines.push(format!("Min TPS:         {:.2}", throughput.min));
    lines.push(format!("Median TPS:      {:.2}", throughput.median));

    let success = &analysis.success;
    lines.extend(section("Success Rate"));
    lines.push(format!("Total requests:  {}", success.total));
    lines.push(format!("Succeeded:       {}", success.succeeded));
    lines.push(format!("Failed:          {}", success.failed));
    lines.push(format!("Success rate:    {:.2}%", success.success_rate_pct));
    if success.failed > 0 {
        lines.push(String::new());
        lines.push("Failed response codes:".to_string());
        for (code, count) in &success.failed_response_codes {
            lines.push(format!("  {code}: {count}"));
        }
    }

    lines.extend(section("Performance by Label"));
    lines.push(render_label_table(&analysis.by_label));

    lines.extend(section("Bottleneck Detection"));
    if analysis.anomalous_windows.is_empty() {
        lines.push("No bottlenecks found".to_string());
    } else {
        lines.push(format!(
            "Found {} windows of {window_seconds}s above {:.2} ms",
            analysis.anomalous_windows.len(),
            analysis.anomaly_threshold_ms
        ));
        lines.push(format!("Top {MAX_LISTED_ANOMALIES}:"));
        for window in analysis.anomalous_windows.iter().take(MAX_LISTED_ANOMALIES) {
            lines.push(format!(
                "  {}: {:.2} ms",
                format_timestamp(window.window_start),
                window.mean_latency_ms
            ));
        }
    }

    lines.extend(section("Latency Distribution"));
    for bucket in &analysis.latency_buckets {
        let pct = percentage(bucket.count, analysis.latency.count);
        lines.push(format!(
            "  {:12}: {:6} ({:5.1}%) {}",
            bucket.label(),
            bucket.count,
            pct,
            "█".repeat((pct / 2.0) as usize)
        ));
    }

    lines.join("\n")
}
