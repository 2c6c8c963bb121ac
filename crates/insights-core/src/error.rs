use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the payout insights pipeline.
#[derive(Error, Debug)]
pub enum InsightsError {
    /// The uploaded document is not valid JSON or does not have the expected
    /// record shape.  No table is produced.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The uploaded document exceeds the configured size or row limit.
    #[error("Input too large: {actual} {unit} exceeds the limit of {limit}")]
    TooLargeInput {
        actual: u64,
        limit: u64,
        unit: &'static str,
    },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The filtered table could not be written as CSV.
    #[error("Failed to export CSV: {0}")]
    Export(#[from] csv::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl InsightsError {
    /// Whether this error means "the upload is unusable", i.e. the single
    /// user-visible invalid-file state.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            InsightsError::MalformedInput(_) | InsightsError::TooLargeInput { .. }
        )
    }
}

impl From<serde_json::Error> for InsightsError {
    fn from(err: serde_json::Error) -> Self {
        InsightsError::MalformedInput(err.to_string())
    }
}

/// Convenience alias used throughout the insights crates.
pub type Result<T> = std::result::Result<T, InsightsError>;
