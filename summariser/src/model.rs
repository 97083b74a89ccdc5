use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One row of a load test result log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Request start, epoch milliseconds
    pub timestamp: i64,
    /// Request duration in milliseconds
    pub elapsed_ms: u64,
    /// Transaction name, `None` when the log left the cell empty
    pub label: Option<String>,
    /// Response code as text, for example `200` or `Non HTTP response code: ...`
    pub response_code: String,
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation, 0 with fewer than two values
    pub std: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Requests per second, computed over one second windows across the whole run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputStats {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub median: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub success_rate_pct: f64,
    /// Response codes of failed records, most frequent first
    pub failed_response_codes: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct LabelBreakdown {
    pub label: String,
    pub count: usize,
    #[tabled(rename = "mean (ms)", display = "float2")]
    pub mean_ms: f64,
    #[tabled(rename = "median (ms)", display = "float2")]
    pub median_ms: f64,
    #[tabled(rename = "min (ms)", display = "float2")]
    pub min_ms: f64,
    #[tabled(rename = "max (ms)", display = "float2")]
    pub max_ms: f64,
    #[tabled(rename = "p95 (ms)", display = "float2")]
    pub p95_ms: f64,
    pub success: usize,
    #[tabled(rename = "success rate (%)", display = "float2")]
    pub success_rate_pct: f64,
}

fn float2(n: &f64) -> String {
    format!("{:.2}", n)
}

/// Occupancy of the half-open latency interval `[lower_ms, upper_ms)`
///
/// The last bucket of a set has no upper bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyBucket {
    pub lower_ms: u64,
    pub upper_ms: Option<u64>,
    pub count: usize,
}

impl LatencyBucket {
    pub fn label(&self) -> String {
        match self.upper_ms {
            Some(upper) => {
                if self.lower_ms % 1000 == 0 && upper % 1000 == 0 && self.lower_ms > 0 {
                    format!("{}-{}s", self.lower_ms / 1000, upper / 1000)
                } else {
                    format!("{}-{}ms", self.lower_ms, upper)
                }
            }
            None => format!("{}+", format_boundary(self.lower_ms)),
        }
    }
}

fn format_boundary(ms: u64) -> String {
    if ms > 0 && ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{}ms", ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalousWindow {
    /// Start of the window, epoch milliseconds
    pub window_start: i64,
    pub mean_latency_ms: f64,
}

/// Activity within one fixed-size time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window, epoch milliseconds
    pub start: i64,
    pub count: usize,
    /// Mean elapsed time of the records in the window, 0 when the window is empty
    pub mean_latency_ms: f64,
    /// Share of failed records in the window, 0 when the window is empty
    pub error_rate_pct: f64,
}

/// Everything the single file analysis computes for one result log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub latency: LatencyStats,
    pub throughput: ThroughputStats,
    pub success: SuccessStats,
    pub by_label: Vec<LabelBreakdown>,
    pub anomalous_windows: Vec<AnomalousWindow>,
    /// The latency a window mean must exceed to be reported as anomalous
    pub anomaly_threshold_ms: f64,
    pub latency_buckets: Vec<LatencyBucket>,
    /// Request counts over time, one second windows unless the log is too long for them
    pub throughput_timeline: Vec<TimeWindow>,
    pub throughput_window_seconds: u64,
    /// Windows of the anomaly detection width, for the latency and error timelines
    pub timeline: Vec<TimeWindow>,
    /// Width of the [FileAnalysis::timeline] windows, wider than requested for very long logs
    pub timeline_window_seconds: u64,
    /// Raw elapsed times, kept for the latency histogram
    pub elapsed_ms: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(lower_ms: u64, upper_ms: Option<u64>) -> LatencyBucket {
        LatencyBucket {
            lower_ms,
            upper_ms,
            count: 0,
        }
    }

    #[test]
    fn bucket_labels() {
        assert_eq!("0-50ms", bucket(0, Some(50)).label());
        assert_eq!("500-1000ms", bucket(500, Some(1000)).label());
        assert_eq!("1-2s", bucket(1000, Some(2000)).label());
        assert_eq!("2s+", bucket(2000, None).label());
        assert_eq!("0ms+", bucket(0, None).label());
        assert_eq!("750ms+", bucket(750, None).label());
    }
}
