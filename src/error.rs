//! Error types for loading and validating emissions data.

/// Failures that stop a dataset from being loaded at all.
#[derive(thiserror::Error, Debug)]
pub enum EmissionsError {
    #[error("missing column '{0}' in CSV header")]
    MissingColumn(String),
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Reasons a single row is dropped during ingestion.
///
/// These never abort a load; they are tallied in [`crate::table::IngestReport`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("unparseable timestamp '{0}'")]
    Timestamp(String),
    #[error("row at line {0} is not valid UTF-8")]
    Encoding(u64),
    #[error("unreadable row: {0}")]
    Unreadable(String),
}

impl RowError {
    /// Stable key used when counting rejections.
    pub fn kind(&self) -> &'static str {
        match self {
            RowError::Timestamp(_) => "timestamp",
            RowError::Encoding(_) => "encoding",
            RowError::Unreadable(_) => "unreadable",
        }
    }
}
