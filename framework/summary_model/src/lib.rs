use serde::{Deserialize, Serialize};

/// Response code prefix treated as a successful request by default.
pub const DEFAULT_SUCCESS_PREFIX: &str = "200";
/// Response code prefix treated as an expected, business-level failure by default.
pub const DEFAULT_EXPECTED_FAILURE_PREFIX: &str = "400";

/// Summary of a single named run
///
/// Computed fresh from the result records of one load test run and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// The name of the run, as given by the run configuration
    pub run_name: String,
    /// The number of records considered for this run, after label filtering
    pub total_count: u64,
    /// The number of records in the success response class
    pub success_count: u64,
    /// The number of records in the expected failure response class
    ///
    /// Records with any other response code are counted in [RunSummary::total_count] only.
    pub expected_failure_count: u64,
    /// The observed duration of the run, in seconds
    ///
    /// This is the span between the first and last record timestamps. For a single record it
    /// is that record's elapsed time and for no records it is 0.
    pub duration_seconds: f64,
    /// Records per second over [RunSummary::duration_seconds], or 0 if the duration is 0
    pub throughput_per_second: f64,
    /// Median latency in milliseconds
    pub latency_p50_ms: f64,
    /// 95th percentile latency in milliseconds
    pub latency_p95_ms: f64,
    /// 99th percentile latency in milliseconds
    pub latency_p99_ms: f64,
}

impl RunSummary {
    /// Create the zero-valued summary used when a run has no records
    pub fn empty(run_name: impl Into<String>) -> Self {
        Self {
            run_name: run_name.into(),
            total_count: 0,
            success_count: 0,
            expected_failure_count: 0,
            duration_seconds: 0.0,
            throughput_per_second: 0.0,
            latency_p50_ms: 0.0,
            latency_p95_ms: 0.0,
            latency_p99_ms: 0.0,
        }
    }

    /// Records that fall in neither the success nor the expected failure class
    pub fn other_count(&self) -> u64 {
        self.total_count
            .saturating_sub(self.success_count + self.expected_failure_count)
    }

    /// Check the success count against the number of successes the scenario allows
    ///
    /// Contention scenarios (for example, many buyers competing for a limited stock) expect at
    /// most `expected_success` requests to succeed. More than that indicates a consistency bug
    /// in the system under test.
    pub fn meets_expected_success(&self, expected_success: u64) -> bool {
        self.success_count <= expected_success
    }
}

/// The response code classes of interest for a run
///
/// A record belongs to a class when its response code starts with the class prefix. Response
/// codes are compared as text because load generators also report non-numeric codes.
///
/// The classes are disjoint: a code matching both prefixes is a success only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseClasses {
    #[serde(default = "default_success_prefix")]
    pub success_prefix: String,
    #[serde(default = "default_expected_failure_prefix")]
    pub expected_failure_prefix: String,
}

impl ResponseClasses {
    pub fn is_success(&self, response_code: &str) -> bool {
        response_code.starts_with(&self.success_prefix)
    }

    pub fn is_expected_failure(&self, response_code: &str) -> bool {
        !self.is_success(response_code)
            && response_code.starts_with(&self.expected_failure_prefix)
    }
}

impl Default for ResponseClasses {
    fn default() -> Self {
        Self {
            success_prefix: default_success_prefix(),
            expected_failure_prefix: default_expected_failure_prefix(),
        }
    }
}

fn default_success_prefix() -> String {
    DEFAULT_SUCCESS_PREFIX.to_string()
}

fn default_expected_failure_prefix() -> String {
    DEFAULT_EXPECTED_FAILURE_PREFIX.to_string()
}
