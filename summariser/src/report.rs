use anyhow::Context;
use std::path::{Path, PathBuf};

mod chart;
mod console;
mod csv;
mod text;

pub use chart::{render_dashboard_chart, render_scaling_chart, render_success_chart};
pub use console::{
    render_file_analysis, render_label_table, render_run_table, render_run_validation,
};
pub use csv::{write_summaries_csv, SUMMARY_COLUMNS};
pub use text::{render_text_report, write_text_report};

pub const SUMMARIES_CSV_FILE: &str = "run_summaries.csv";
pub const SUCCESS_CHART_FILE: &str = "concurrency_success_count.svg";
pub const SCALING_CHART_FILE: &str = "performance_scaling.svg";
pub const DASHBOARD_CHART_FILE: &str = "performance_analysis.svg";
pub const TEXT_REPORT_FILE: &str = "analysis_report.txt";

/// Visual settings shared by every chart
///
/// Passed to each renderer explicitly so rendering has no global state.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportStyle {
    pub width: u32,
    pub height: u32,
    /// Height of one panel in the single run dashboard
    pub panel_height: u32,
    pub font_family: String,
    pub title_size: f64,
    pub label_size: f64,
    pub background: String,
    pub axis: String,
    pub grid: String,
    pub primary: String,
    pub secondary: String,
    pub success: String,
    pub error: String,
    pub reference: String,
    pub histogram: String,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 700,
            panel_height: 420,
            font_family: "DejaVu Sans, Helvetica, Arial, sans-serif".to_string(),
            title_size: 18.0,
            label_size: 12.0,
            background: "#ffffff".to_string(),
            axis: "#333333".to_string(),
            grid: "#dddddd".to_string(),
            primary: "#1e90ff".to_string(),
            secondary: "#ff4500".to_string(),
            success: "#4caf50".to_string(),
            error: "#f44336".to_string(),
            reference: "#d62728".to_string(),
            histogram: "#9c27b0".to_string(),
        }
    }
}

/// Create the output directory if needed and write `content` to `file_name` inside it.
pub fn write_output(output_dir: &Path, file_name: &str, content: &str) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let path = output_dir.join(file_name);
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::debug!("Wrote {}", path.display());

    Ok(path)
}
