// Error taxonomy for report generation.
//
// Only `create_report` decides which of these are fatal; everything below it
// returns `Result<_, ReportError>` and lets the caller degrade.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid period label '{label}': expected 'YYYY-YY' or 'YYYY-YYYY'")]
    InvalidFormat { label: String },

    #[error("store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("store query failed: {reason}")]
    Query { reason: String },

    #[error("no usable data: {reason}")]
    EmptyResult { reason: String },

    #[error("could not load asset {}: {reason}", path.display())]
    AssetLoad { path: PathBuf, reason: String },

    #[error("column {column} is outside the {num_cols}-column layout")]
    LayoutMismatch { column: usize, num_cols: usize },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("could not write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
}

impl ReportError {
    pub fn invalid_format(label: &str) -> Self {
        ReportError::InvalidFormat {
            label: label.to_string(),
        }
    }
}

impl From<rusqlite::Error> for ReportError {
    fn from(e: rusqlite::Error) -> Self {
        ReportError::Query {
            reason: e.to_string(),
        }
    }
}

impl From<csv::Error> for ReportError {
    fn from(e: csv::Error) -> Self {
        ReportError::Query {
            reason: e.to_string(),
        }
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
