use crate::analyze::{mean_and_std, percentage, quantile, sorted_elapsed};
use crate::model::{LabelBreakdown, ResultRecord};
use std::collections::BTreeMap;

/// Partition the records by label.
///
/// Returns the records for each label as a [`BTreeMap`] keyed by label, with the records of each
/// partition in their original order. Records without a label are not part of any partition.
pub fn partition_by_label(records: &[ResultRecord]) -> BTreeMap<String, Vec<ResultRecord>> {
    let mut partitioned = BTreeMap::<String, Vec<ResultRecord>>::new();
    let mut unlabelled = 0;

    for record in records {
        match &record.label {
            Some(label) => partitioned
                .entry(label.clone())
                .or_default()
                .push(record.clone()),
            None => unlabelled += 1,
        }
    }

    if unlabelled > 0 {
        log::warn!("Skipped {unlabelled} records without a label");
    }
    log::debug!("Partitioned records into {} labels", partitioned.len());

    partitioned
}

/// Latency and success statistics per label, ordered by label.
pub fn breakdown_by_label(records: &[ResultRecord]) -> Vec<LabelBreakdown> {
    partition_by_label(records)
        .into_iter()
        .map(|(label, records)| {
            let sorted = sorted_elapsed(&records);
            let count = sorted.len();
            let success = records.iter().filter(|r| r.success).count();

            LabelBreakdown {
                label,
                count,
                mean_ms: mean_and_std(&sorted).0,
                median_ms: quantile(&sorted, 0.50),
                min_ms: sorted[0],
                max_ms: sorted[count - 1],
                p95_ms: quantile(&sorted, 0.95),
                success,
                success_rate_pct: percentage(success, count),
            }
        })
        .collect()
}
