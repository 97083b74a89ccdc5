use crate::model::ResultRecord;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TIMESTAMP_COLUMN: &str = "timeStamp";
pub const ELAPSED_COLUMN: &str = "elapsed";
pub const LABEL_COLUMN: &str = "label";
pub const RESPONSE_CODE_COLUMN: &str = "responseCode";
pub const SUCCESS_COLUMN: &str = "success";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Result log not found: {path:?}")]
    NotFound { path: PathBuf },
    #[error("Malformed result log {path:?}: {reason}")]
    MalformedInput { path: PathBuf, reason: String },
    #[error("Failed to read result log {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        LoadError::MalformedInput {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Load the result records from a delimited result log with a header row.
///
/// Every column is read as text and parsed here, so a bad value is reported with its column and
/// row instead of silently changing the inferred column type.
pub fn load_records(path: &Path) -> Result<Vec<ResultRecord>, LoadError> {
    match std::fs::metadata(path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| LoadError::malformed(path, e.to_string()))?;

    log::trace!("Loaded frame: {}", frame);

    records_from_frame(path, &frame)
}

fn records_from_frame(path: &Path, frame: &DataFrame) -> Result<Vec<ResultRecord>, LoadError> {
    let timestamps = text_column(path, frame, TIMESTAMP_COLUMN)?;
    let elapsed = text_column(path, frame, ELAPSED_COLUMN)?;
    let labels = text_column(path, frame, LABEL_COLUMN)?;
    let response_codes = text_column(path, frame, RESPONSE_CODE_COLUMN)?;
    let success = if frame.column(SUCCESS_COLUMN).is_ok() {
        Some(text_column(path, frame, SUCCESS_COLUMN)?)
    } else {
        log::debug!("No {SUCCESS_COLUMN} column in {path:?}, deriving it from the response code");
        None
    };

    let mut records = Vec::with_capacity(frame.height());
    for row in 0..frame.height() {
        let timestamp = parse_cell(path, TIMESTAMP_COLUMN, row, timestamps.get(row))?;
        let elapsed_ms = parse_cell(path, ELAPSED_COLUMN, row, elapsed.get(row))?;
        let response_code = response_codes.get(row).unwrap_or_default().trim().to_string();
        let label = labels
            .get(row)
            .filter(|label| !label.is_empty())
            .map(str::to_string);

        let success = match success.as_ref().and_then(|column| column.get(row)) {
            Some(value) if !value.trim().is_empty() => parse_success(path, row, value)?,
            _ => derive_success(&response_code),
        };

        records.push(ResultRecord {
            timestamp,
            elapsed_ms,
            label,
            response_code,
            success,
        });
    }

    Ok(records)
}

fn text_column<'a>(
    path: &Path,
    frame: &'a DataFrame,
    name: &str,
) -> Result<&'a StringChunked, LoadError> {
    frame
        .column(name)
        .map_err(|_| LoadError::malformed(path, format!("Missing required column `{name}`")))?
        .str()
        .map_err(|e| LoadError::malformed(path, format!("Column `{name}` is not text: {e}")))
}

fn parse_cell<T>(path: &Path, column: &str, row: usize, value: Option<&str>) -> Result<T, LoadError>
where
    T: std::str::FromStr,
{
    let value = value.map(str::trim).unwrap_or_default();
    value.parse::<T>().map_err(|_| {
        LoadError::malformed(
            path,
            format!("Invalid value `{value}` in column `{column}` at row {}", row + 1),
        )
    })
}

fn parse_success(path: &Path, row: usize, value: &str) -> Result<bool, LoadError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(LoadError::malformed(
            path,
            format!(
                "Invalid value `{other}` in column `{SUCCESS_COLUMN}` at row {}",
                row + 1
            ),
        )),
    }
}

/// Treat 2xx and 3xx responses as successful when the log has no success flag.
fn derive_success(response_code: &str) -> bool {
    response_code.starts_with('2') || response_code.starts_with('3')
}
