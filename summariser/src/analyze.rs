use crate::model::{
    AnomalousWindow, LatencyBucket, LatencyStats, ResultRecord, SuccessStats, ThroughputStats,
    TimeWindow,
};
use itertools::Itertools;
use jtl_summary_model::{ResponseClasses, RunSummary};
use polars::prelude::Column;
use std::collections::BTreeMap;
use thiserror::Error;

/// Latency bucket boundaries used by the single file analysis, in milliseconds.
pub const DEFAULT_LATENCY_BOUNDARIES_MS: [u64; 7] = [0, 50, 100, 200, 500, 1000, 2000];

/// Upper bound on the number of windows a timeline may span.
///
/// A stray timestamp far from the rest of the log would otherwise allocate one window per second
/// of the gap.
pub const MAX_TIMELINE_WINDOWS: u64 = 1_000_000;

#[derive(Error, Debug, PartialEq)]
pub enum AnalysisError {
    #[error("Bucket boundaries must be non-decreasing, found {previous} before {next}")]
    UnsortedBoundaries { previous: u64, next: u64 },
    #[error("Window width must be at least one second")]
    ZeroWindow,
    #[error(
        "Records span {windows} windows of {window_seconds}s, more than the supported {max}",
        max = MAX_TIMELINE_WINDOWS
    )]
    TimelineTooLong { windows: u64, window_seconds: u64 },
}

/// Summarise a run using the default response classes, `200` for success and `400` for expected
/// failures.
pub fn summarize(records: &[ResultRecord], run_name: &str) -> RunSummary {
    summarize_with(records, run_name, &ResponseClasses::default())
}

pub fn summarize_with(
    records: &[ResultRecord],
    run_name: &str,
    classes: &ResponseClasses,
) -> RunSummary {
    if records.is_empty() {
        return RunSummary::empty(run_name);
    }

    let total_count = records.len() as u64;
    let success_count = records
        .iter()
        .filter(|r| classes.is_success(&r.response_code))
        .count() as u64;
    let expected_failure_count = records
        .iter()
        .filter(|r| classes.is_expected_failure(&r.response_code))
        .count() as u64;

    let duration_seconds = observed_duration_seconds(records);
    let throughput_per_second = if duration_seconds > 0.0 {
        total_count as f64 / duration_seconds
    } else {
        0.0
    };

    let sorted = sorted_elapsed(records);

    RunSummary {
        run_name: run_name.to_string(),
        total_count,
        success_count,
        expected_failure_count,
        duration_seconds,
        throughput_per_second,
        latency_p50_ms: quantile(&sorted, 0.50),
        latency_p95_ms: quantile(&sorted, 0.95),
        latency_p99_ms: quantile(&sorted, 0.99),
    }
}

fn observed_duration_seconds(records: &[ResultRecord]) -> f64 {
    match records {
        [] => 0.0,
        [only] => only.elapsed_ms as f64 / 1000.0,
        _ => match records.iter().map(|r| r.timestamp).minmax().into_option() {
            Some((start, end)) => end.abs_diff(start) as f64 / 1000.0,
            None => 0.0,
        },
    }
}

pub(crate) fn sorted_elapsed(records: &[ResultRecord]) -> Vec<f64> {
    records
        .iter()
        .map(|r| r.elapsed_ms)
        .sorted_unstable()
        .map(|v| v as f64)
        .collect()
}

/// Linear interpolation between the order statistics around rank `q * (n - 1)`.
///
/// `sorted` must be in ascending order. Returns 0 for an empty input.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}

/// Mean and sample standard deviation, 0 when there are too few values for either.
pub(crate) fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let column = Column::new("value".into(), values);
    let mean = column.as_materialized_series().mean().unwrap_or(0.0);
    let std = if values.len() < 2 {
        0.0
    } else {
        column.as_materialized_series().std(1).unwrap_or(0.0)
    };

    (mean, std)
}

pub fn latency_stats(records: &[ResultRecord]) -> LatencyStats {
    let sorted = sorted_elapsed(records);
    if sorted.is_empty() {
        return LatencyStats::default();
    }

    let (mean, std) = mean_and_std(&sorted);

    LatencyStats {
        count: sorted.len(),
        mean,
        median: quantile(&sorted, 0.50),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        std,
        p50: quantile(&sorted, 0.50),
        p90: quantile(&sorted, 0.90),
        p95: quantile(&sorted, 0.95),
        p99: quantile(&sorted, 0.99),
    }
}

/// Requests per second across the run.
///
/// Seconds are aligned to the epoch. Seconds between the first and last record without any
/// request count as zero.
pub fn throughput_stats(records: &[ResultRecord]) -> ThroughputStats {
    let second_of = |r: &ResultRecord| r.timestamp.div_euclid(1000);
    let Some((first, last)) = records.iter().map(second_of).minmax().into_option() else {
        return ThroughputStats::default();
    };

    let seconds = last.abs_diff(first) + 1;
    let busy = records
        .iter()
        .map(second_of)
        .counts()
        .into_values()
        .map(|count| count as f64)
        .sorted_unstable_by(f64::total_cmp)
        .collect::<Vec<_>>();
    let quiet = seconds - busy.len() as u64;

    // quiet seconds sort before every busy one
    let nth = |rank: u64| {
        if rank < quiet {
            0.0
        } else {
            busy[(rank - quiet) as usize]
        }
    };
    let middle = (seconds - 1) / 2;
    let median = if (seconds - 1) % 2 == 0 {
        nth(middle)
    } else {
        (nth(middle) + nth(middle + 1)) / 2.0
    };

    ThroughputStats {
        mean: records.len() as f64 / seconds as f64,
        max: busy.last().copied().unwrap_or(0.0),
        min: nth(0),
        median,
    }
}

pub fn success_stats(records: &[ResultRecord]) -> SuccessStats {
    let total = records.len();
    let succeeded = records.iter().filter(|r| r.success).count();
    let failed = total - succeeded;

    let failed_response_codes = records
        .iter()
        .filter(|r| !r.success)
        .map(|r| r.response_code.clone())
        .counts()
        .into_iter()
        .sorted_by(|(a_code, a_count), (b_code, b_count)| {
            b_count.cmp(a_count).then_with(|| a_code.cmp(b_code))
        })
        .collect();

    SuccessStats {
        total,
        succeeded,
        failed,
        success_rate_pct: percentage(succeeded, total),
        failed_response_codes,
    }
}

pub(crate) fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Split the records into consecutive epoch-aligned windows of `window_seconds`.
///
/// Windows run from the one holding the earliest record to the one holding the latest, and
/// windows without records are included with zero values.
pub fn time_windows(
    records: &[ResultRecord],
    window_seconds: u64,
) -> Result<Vec<TimeWindow>, AnalysisError> {
    let width = i128::from(window_width_ms(window_seconds)?);
    let Some((first, last)) = records.iter().map(|r| r.timestamp).minmax().into_option() else {
        return Ok(Vec::new());
    };

    let first_start = i128::from(first).div_euclid(width) * width;
    let last_start = i128::from(last).div_euclid(width) * width;
    let windows = (last_start - first_start) / width + 1;
    if windows > i128::from(MAX_TIMELINE_WINDOWS) {
        return Err(AnalysisError::TimelineTooLong {
            windows: u64::try_from(windows).unwrap_or(u64::MAX),
            window_seconds,
        });
    }

    let mut accumulated = vec![WindowAccumulator::default(); windows as usize];
    for record in records {
        let index = (i128::from(record.timestamp) - first_start) / width;
        accumulated[index as usize].add(record);
    }

    Ok(accumulated
        .into_iter()
        .enumerate()
        .map(|(index, acc)| TimeWindow {
            start: saturating_i64(first_start + index as i128 * width),
            count: acc.count,
            mean_latency_ms: acc.mean_latency_ms(),
            error_rate_pct: percentage(acc.failed, acc.count),
        })
        .collect())
}

/// As [time_windows], but windows are widened when the records span more than
/// [MAX_TIMELINE_WINDOWS] of `window_seconds`. Returns the windows and the width used.
pub fn bounded_time_windows(
    records: &[ResultRecord],
    window_seconds: u64,
) -> Result<(Vec<TimeWindow>, u64), AnalysisError> {
    if window_seconds == 0 {
        return Err(AnalysisError::ZeroWindow);
    }

    let span_ms = records
        .iter()
        .map(|r| r.timestamp)
        .minmax()
        .into_option()
        .map(|(first, last)| last.abs_diff(first))
        .unwrap_or(0);
    let width = window_seconds.max(span_ms.div_ceil((MAX_TIMELINE_WINDOWS - 1) * 1000));
    if width != window_seconds {
        log::info!("Records span {span_ms} ms, widening {window_seconds}s windows to {width}s");
    }

    Ok((time_windows(records, width)?, width))
}

fn saturating_i64(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

#[derive(Debug, Clone, Default)]
struct WindowAccumulator {
    count: usize,
    elapsed_sum: u128,
    failed: usize,
}

impl WindowAccumulator {
    fn add(&mut self, record: &ResultRecord) {
        self.count += 1;
        self.elapsed_sum += record.elapsed_ms as u128;
        if !record.success {
            self.failed += 1;
        }
    }

    fn mean_latency_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.elapsed_sum as f64 / self.count as f64
        }
    }
}

fn window_width_ms(window_seconds: u64) -> Result<i64, AnalysisError> {
    if window_seconds == 0 {
        return Err(AnalysisError::ZeroWindow);
    }

    Ok(window_seconds.saturating_mul(1000).min(i64::MAX as u64) as i64)
}

/// Count records per latency interval.
///
/// `boundaries` define the half-open intervals `[b[i], b[i+1])` and a final open-ended interval
/// starting at the last boundary. Values below the first boundary are counted in the first
/// bucket, so every record lands in exactly one bucket.
pub fn bucket_latencies(
    records: &[ResultRecord],
    boundaries: &[u64],
) -> Result<Vec<LatencyBucket>, AnalysisError> {
    if let Some((previous, next)) = boundaries.iter().tuple_windows().find(|(a, b)| a > b) {
        return Err(AnalysisError::UnsortedBoundaries {
            previous: *previous,
            next: *next,
        });
    }

    if boundaries.is_empty() {
        return Ok(vec![LatencyBucket {
            lower_ms: 0,
            upper_ms: None,
            count: records.len(),
        }]);
    }

    let mut buckets = boundaries
        .iter()
        .enumerate()
        .map(|(i, lower)| LatencyBucket {
            lower_ms: *lower,
            upper_ms: boundaries.get(i + 1).copied(),
            count: 0,
        })
        .collect::<Vec<_>>();

    for record in records {
        let index = boundaries
            .partition_point(|b| *b <= record.elapsed_ms)
            .saturating_sub(1);
        buckets[index].count += 1;
    }

    Ok(buckets)
}

/// Find windows whose mean latency is more than `threshold_multiplier` times the mean of all
/// window means.
///
/// Windows are `window_seconds` wide and aligned to the earliest record. Windows without records
/// are ignored. The result is ordered by descending mean latency, then by window start.
pub fn detect_anomalous_windows(
    records: &[ResultRecord],
    window_seconds: u64,
    threshold_multiplier: f64,
) -> Result<Vec<AnomalousWindow>, AnalysisError> {
    Ok(detect_anomalies(records, window_seconds, threshold_multiplier)?.0)
}

/// As [detect_anomalous_windows], also returning the latency threshold that was applied.
pub(crate) fn detect_anomalies(
    records: &[ResultRecord],
    window_seconds: u64,
    threshold_multiplier: f64,
) -> Result<(Vec<AnomalousWindow>, f64), AnalysisError> {
    let width = window_width_ms(window_seconds)?;
    let Some(origin) = records.iter().map(|r| r.timestamp).min() else {
        return Ok((Vec::new(), 0.0));
    };

    let width = width as u64;
    let mut windows = BTreeMap::<u64, WindowAccumulator>::new();
    for record in records {
        let index = record.timestamp.abs_diff(origin) / width;
        windows.entry(index).or_default().add(record);
    }

    let window_means = windows
        .into_iter()
        .map(|(index, acc)| {
            (
                origin.saturating_add_unsigned(index * width),
                acc.mean_latency_ms(),
            )
        })
        .collect::<Vec<_>>();

    let global_mean =
        window_means.iter().map(|(_, m)| m).sum::<f64>() / window_means.len() as f64;
    let threshold = threshold_multiplier * global_mean;
    log::debug!(
        "Anomaly threshold {threshold:.2} ms over {} windows of {window_seconds}s",
        window_means.len()
    );

    let anomalies = window_means
        .into_iter()
        .filter(|(_, mean)| *mean > threshold)
        .map(|(window_start, mean_latency_ms)| AnomalousWindow {
            window_start,
            mean_latency_ms,
        })
        .sorted_by(|a, b| {
            b.mean_latency_ms
                .total_cmp(&a.mean_latency_ms)
                .then_with(|| a.window_start.cmp(&b.window_start))
        })
        .collect();

    Ok((anomalies, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: i64, elapsed_ms: u64, response_code: &str) -> ResultRecord {
        ResultRecord {
            timestamp,
            elapsed_ms,
            label: Some("Complete Reservation".to_string()),
            response_code: response_code.to_string(),
            success: response_code.starts_with('2'),
        }
    }

    #[test]
    fn summarize_counts_classes_and_throughput() {
        let records = vec![
            record(1000, 100, "200"),
            record(2000, 200, "200"),
            record(3000, 300, "400"),
        ];

        let summary = summarize(&records, "50");

        assert_eq!("50", summary.run_name);
        assert_eq!(3, summary.total_count);
        assert_eq!(2, summary.success_count);
        assert_eq!(1, summary.expected_failure_count);
        assert_eq!(2.0, summary.duration_seconds);
        assert_eq!(1.5, summary.throughput_per_second);
        assert_eq!(200.0, summary.latency_p50_ms);
        assert!((summary.latency_p95_ms - 290.0).abs() < 1e-9);
        assert!((summary.latency_p99_ms - 298.0).abs() < 1e-9);
    }

    #[test]
    fn summarize_single_record_uses_elapsed_as_duration() {
        let summary = summarize(&[record(1000, 500, "200")], "single");

        assert_eq!(0.5, summary.duration_seconds);
        assert_eq!(2.0, summary.throughput_per_second);
        assert_eq!(500.0, summary.latency_p50_ms);
        assert_eq!(500.0, summary.latency_p99_ms);
    }

    #[test]
    fn summarize_empty_is_zero_valued() {
        let summary = summarize(&[], "empty");

        assert_eq!(RunSummary::empty("empty"), summary);
    }

    #[test]
    fn summarize_same_timestamps_has_no_throughput() {
        let records = vec![record(1000, 10, "200"), record(1000, 20, "200")];

        let summary = summarize(&records, "burst");

        assert_eq!(0.0, summary.duration_seconds);
        assert_eq!(0.0, summary.throughput_per_second);
    }

    #[test]
    fn summarize_ignores_other_response_codes() {
        let records = vec![
            record(1000, 10, "200"),
            record(1100, 10, "500"),
            record(1200, 10, "Non HTTP response code: java.net.SocketTimeoutException"),
            record(1300, 10, "409"),
        ];

        let summary = summarize(&records, "mixed");

        assert_eq!(4, summary.total_count);
        assert_eq!(1, summary.success_count);
        assert_eq!(0, summary.expected_failure_count);
        assert_eq!(3, summary.other_count());
    }

    #[test]
    fn summarize_with_custom_classes() {
        let records = vec![record(0, 10, "201"), record(10, 10, "409")];
        let classes = ResponseClasses {
            success_prefix: "2".to_string(),
            expected_failure_prefix: "409".to_string(),
        };

        let summary = summarize_with(&records, "custom", &classes);

        assert_eq!(1, summary.success_count);
        assert_eq!(1, summary.expected_failure_count);
    }

    #[test]
    fn overlapping_classes_keep_counts_within_total() {
        let records = vec![
            record(0, 10, "200"),
            record(1000, 10, "201"),
            record(2000, 10, "404"),
        ];
        let classes = ResponseClasses {
            success_prefix: "2".to_string(),
            expected_failure_prefix: "20".to_string(),
        };

        let summary = summarize_with(&records, "overlap", &classes);

        assert_eq!(3, summary.total_count);
        assert_eq!(2, summary.success_count);
        assert_eq!(0, summary.expected_failure_count);
        assert_eq!(1, summary.other_count());
    }

    #[test]
    fn summarize_is_independent_of_record_order() {
        let records = (0..50)
            .map(|i| {
                let code = if i % 3 == 0 { "400" } else { "200" };
                record(1000 + i * 37, (i as u64 * 7919) % 613, code)
            })
            .collect::<Vec<_>>();
        let mut reversed = records.clone();
        reversed.reverse();
        let mut rotated = records.clone();
        rotated.rotate_left(17);

        let expected = summarize(&records, "run");

        assert_eq!(expected, summarize(&reversed, "run"));
        assert_eq!(expected, summarize(&rotated, "run"));
    }

    #[test]
    fn class_counts_never_exceed_total() {
        let codes = ["200", "400", "500", "2000", "4001", "", "302"];
        for n in 0..codes.len() * 3 {
            let records = (0..n)
                .map(|i| record(i as i64 * 10, 5, codes[i % codes.len()]))
                .collect::<Vec<_>>();

            let summary = summarize(&records, "run");

            assert!(summary.success_count + summary.expected_failure_count <= summary.total_count);
        }
    }

    #[test]
    fn quantile_interpolates_between_order_statistics() {
        let sorted = [1.0, 2.0, 3.0, 4.0];

        assert_eq!(0.0, quantile(&[], 0.5));
        assert_eq!(2.5, quantile(&sorted, 0.5));
        assert_eq!(1.0, quantile(&sorted, 0.0));
        assert_eq!(4.0, quantile(&sorted, 1.0));
        assert!((quantile(&sorted, 0.95) - 3.85).abs() < 1e-9);
    }

    #[test]
    fn latency_stats_describe_elapsed() {
        let records = vec![
            record(0, 10, "200"),
            record(0, 20, "200"),
            record(0, 30, "200"),
            record(0, 40, "200"),
        ];

        let stats = latency_stats(&records);

        assert_eq!(4, stats.count);
        assert_eq!(25.0, stats.mean);
        assert_eq!(25.0, stats.median);
        assert_eq!(10.0, stats.min);
        assert_eq!(40.0, stats.max);
        assert!((stats.std - 12.909944487358056).abs() < 1e-9);
        assert!((stats.p90 - 37.0).abs() < 1e-9);
    }

    #[test]
    fn latency_stats_of_nothing_are_zero() {
        assert_eq!(LatencyStats::default(), latency_stats(&[]));
        assert_eq!(0.0, latency_stats(&[record(0, 7, "200")]).std);
    }

    #[test]
    fn throughput_counts_quiet_seconds() {
        let records = vec![
            record(10_100, 5, "200"),
            record(10_900, 5, "200"),
            record(10_950, 5, "200"),
            record(12_000, 5, "200"),
        ];

        let stats = throughput_stats(&records);

        // seconds 10, 11 and 12 hold 3, 0 and 1 requests
        assert!((stats.mean - 4.0 / 3.0).abs() < 1e-9);
        assert_eq!(3.0, stats.max);
        assert_eq!(0.0, stats.min);
        assert_eq!(1.0, stats.median);
    }

    #[test]
    fn throughput_median_of_even_second_count() {
        // seconds 0 to 3 hold 2, 0, 0 and 4 requests
        let records = [0, 10, 3_000, 3_100, 3_200, 3_300]
            .into_iter()
            .map(|ts| record(ts, 5, "200"))
            .collect::<Vec<_>>();

        let stats = throughput_stats(&records);

        assert_eq!(1.5, stats.mean);
        assert_eq!(4.0, stats.max);
        assert_eq!(0.0, stats.min);
        assert_eq!(1.0, stats.median);
        assert_eq!(ThroughputStats::default(), throughput_stats(&[]));
    }

    #[test]
    fn throughput_of_a_log_spanning_days() {
        let start = 1_710_504_000_000;
        let twelve_days = 12 * 24 * 60 * 60 * 1000;
        let records = vec![
            record(start, 5, "200"),
            record(start + 1, 5, "200"),
            record(start + twelve_days, 5, "200"),
        ];

        let stats = throughput_stats(&records);

        assert_eq!(2.0, stats.max);
        assert_eq!(0.0, stats.min);
        assert_eq!(0.0, stats.median);
        assert!((stats.mean - 3.0 / 1_036_801.0).abs() < 1e-12);
    }

    #[test]
    fn success_stats_rank_failed_codes() {
        let records = vec![
            record(0, 1, "200"),
            record(0, 1, "500"),
            record(0, 1, "400"),
            record(0, 1, "500"),
            record(0, 1, "200"),
        ];

        let stats = success_stats(&records);

        assert_eq!(5, stats.total);
        assert_eq!(2, stats.succeeded);
        assert_eq!(3, stats.failed);
        assert_eq!(40.0, stats.success_rate_pct);
        assert_eq!(
            vec![("500".to_string(), 2), ("400".to_string(), 1)],
            stats.failed_response_codes
        );
    }

    #[test]
    fn success_stats_of_nothing() {
        let stats = success_stats(&[]);

        assert_eq!(0, stats.total);
        assert_eq!(0.0, stats.success_rate_pct);
    }

    #[test]
    fn time_windows_are_epoch_aligned_and_filled() -> anyhow::Result<()> {
        let records = vec![
            record(7_000, 100, "200"),
            record(9_999, 300, "500"),
            record(21_000, 50, "200"),
        ];

        let windows = time_windows(&records, 5)?;

        assert_eq!(
            vec![5_000, 10_000, 15_000, 20_000],
            windows.iter().map(|w| w.start).collect::<Vec<_>>()
        );
        assert_eq!(2, windows[0].count);
        assert_eq!(200.0, windows[0].mean_latency_ms);
        assert_eq!(50.0, windows[0].error_rate_pct);
        assert_eq!(0, windows[1].count);
        assert_eq!(0.0, windows[1].mean_latency_ms);
        assert_eq!(1, windows[3].count);

        Ok(())
    }

    #[test]
    fn time_windows_reject_zero_width_and_huge_spans() {
        let records = vec![record(0, 1, "200"), record(i64::MAX / 2, 1, "200")];

        assert_eq!(Err(AnalysisError::ZeroWindow), time_windows(&records, 0));
        assert!(matches!(
            time_windows(&records, 1),
            Err(AnalysisError::TimelineTooLong { .. })
        ));
    }

    #[test]
    fn long_timelines_are_widened() -> anyhow::Result<()> {
        let start = 1_710_504_000_000;
        let twelve_days = 12 * 24 * 60 * 60 * 1000;
        let records = vec![
            record(start, 10, "200"),
            record(start + twelve_days, 30, "500"),
        ];

        let (windows, width) = bounded_time_windows(&records, 1)?;

        assert_eq!(2, width);
        assert!(windows.len() as u64 <= MAX_TIMELINE_WINDOWS);
        assert_eq!(2, windows.iter().map(|w| w.count).sum::<usize>());

        let (windows, width) = bounded_time_windows(&records, 5)?;
        assert_eq!(5, width);
        assert_eq!(207_361, windows.len());

        assert_eq!(Err(AnalysisError::ZeroWindow), bounded_time_windows(&records, 0));

        Ok(())
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() -> anyhow::Result<()> {
        let records = vec![record(i64::MIN, 10, "200"), record(i64::MAX, 30, "200")];

        let summary = summarize(&records, "extremes");
        assert_eq!(u64::MAX as f64 / 1000.0, summary.duration_seconds);

        let anomalies = detect_anomalous_windows(&records, 5, 1.0)?;
        assert_eq!(1, anomalies.len());
        assert_eq!(30.0, anomalies[0].mean_latency_ms);
        assert!(anomalies[0].window_start > 0);

        let (windows, _) = bounded_time_windows(&records, 5)?;
        assert_eq!(i64::MIN, windows[0].start);
        assert_eq!(2, windows.iter().map(|w| w.count).sum::<usize>());

        assert_eq!(1.0, throughput_stats(&records).max);

        Ok(())
    }

    #[test]
    fn buckets_are_half_open() -> anyhow::Result<()> {
        let records = [0, 49, 50, 99, 100, 1999, 2000, 60_000]
            .into_iter()
            .map(|elapsed| record(0, elapsed, "200"))
            .collect::<Vec<_>>();

        let buckets = bucket_latencies(&records, &DEFAULT_LATENCY_BOUNDARIES_MS)?;

        assert_eq!(
            vec![
                ("0-50ms".to_string(), 2),
                ("50-100ms".to_string(), 2),
                ("100-200ms".to_string(), 1),
                ("200-500ms".to_string(), 0),
                ("500-1000ms".to_string(), 0),
                ("1-2s".to_string(), 1),
                ("2s+".to_string(), 2),
            ],
            buckets
                .iter()
                .map(|b| (b.label(), b.count))
                .collect::<Vec<_>>()
        );

        Ok(())
    }

    #[test]
    fn bucket_counts_sum_to_record_count() -> anyhow::Result<()> {
        let records = (0..200u64)
            .map(|i| record(0, (i * 7919) % 3000, "200"))
            .collect::<Vec<_>>();
        let boundary_sets: [&[u64]; 5] = [
            &[],
            &[100],
            &[500, 1000],
            &[100, 100, 250, 250, 2500],
            &DEFAULT_LATENCY_BOUNDARIES_MS,
        ];

        for boundaries in boundary_sets {
            let buckets = bucket_latencies(&records, boundaries)?;
            let total = buckets.iter().map(|b| b.count).sum::<usize>();
            assert_eq!(records.len(), total, "boundaries {boundaries:?}");
        }

        Ok(())
    }

    #[test]
    fn values_below_first_boundary_land_in_first_bucket() -> anyhow::Result<()> {
        let records = vec![record(0, 10, "200"), record(0, 150, "200")];

        let buckets = bucket_latencies(&records, &[100, 200])?;

        assert_eq!(2, buckets[0].count);
        assert_eq!(0, buckets[1].count);

        Ok(())
    }

    #[test]
    fn unsorted_boundaries_are_rejected() {
        assert_eq!(
            Err(AnalysisError::UnsortedBoundaries {
                previous: 500,
                next: 100
            }),
            bucket_latencies(&[], &[0, 500, 100])
        );
    }

    #[test]
    fn uniform_windows_are_not_anomalous() -> anyhow::Result<()> {
        let records = (0..20)
            .map(|i| record(1_000 + i * 1_000, 120, "200"))
            .collect::<Vec<_>>();

        assert!(detect_anomalous_windows(&records, 5, 2.0)?.is_empty());
        assert!(detect_anomalous_windows(&records, 5, 1.01)?.is_empty());

        Ok(())
    }

    #[test]
    fn anomalous_windows_ordered_by_mean_then_start() -> anyhow::Result<()> {
        // windows of 5s from t=1000: [1000, 6000) mean 10, [6000, 11000) mean 100,
        // [11000, 16000) mean 10, [16000, 21000) mean 100, [31000, 36000) mean 400
        let records = vec![
            record(1_000, 10, "200"),
            record(2_000, 10, "200"),
            record(6_000, 100, "200"),
            record(11_000, 10, "200"),
            record(16_500, 50, "200"),
            record(17_000, 150, "200"),
            record(31_000, 400, "200"),
        ];

        // global mean of window means is (10 + 100 + 10 + 100 + 400) / 5 = 124
        let anomalies = detect_anomalous_windows(&records, 5, 0.5)?;

        assert_eq!(
            vec![
                AnomalousWindow {
                    window_start: 31_000,
                    mean_latency_ms: 400.0
                },
                AnomalousWindow {
                    window_start: 6_000,
                    mean_latency_ms: 100.0
                },
                AnomalousWindow {
                    window_start: 16_000,
                    mean_latency_ms: 100.0
                },
            ],
            anomalies
        );

        let anomalies = detect_anomalous_windows(&records, 5, 2.0)?;
        assert_eq!(1, anomalies.len());
        assert_eq!(31_000, anomalies[0].window_start);

        Ok(())
    }

    #[test]
    fn anomaly_detection_edge_cases() -> anyhow::Result<()> {
        assert!(detect_anomalous_windows(&[], 5, 2.0)?.is_empty());
        assert_eq!(
            Err(AnalysisError::ZeroWindow),
            detect_anomalous_windows(&[record(0, 1, "200")], 0, 2.0)
        );

        let (_, threshold) = detect_anomalies(&[record(0, 40, "200")], 5, 2.0)?;
        assert_eq!(80.0, threshold);

        Ok(())
    }
}
