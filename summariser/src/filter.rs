use crate::model::ResultRecord;

/// Keep records whose label contains `substring`, case-sensitive.
///
/// Records without a label never match.
pub fn filter_by_label(records: &[ResultRecord], substring: &str) -> Vec<ResultRecord> {
    records
        .iter()
        .filter(|record| {
            record
                .label
                .as_deref()
                .map(|label| label.contains(substring))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Keep records whose response code starts with `prefix`.
pub fn filter_by_response_class(records: &[ResultRecord], prefix: &str) -> Vec<ResultRecord> {
    records
        .iter()
        .filter(|record| record.response_code.starts_with(prefix))
        .cloned()
        .collect()
}
