//! Error types for the cleaning pipeline

use thiserror::Error;

/// Result type alias for cleaning operations
pub type Result<T> = std::result::Result<T, CleanError>;

/// Main error type for the pipeline.
///
/// `Config` and `DataFormat` are caller mistakes and map to a 4xx-equivalent
/// signal; everything else maps to a 5xx-equivalent signal. Stage
/// degradations (KNN falling back to median, SMOTE skipped) are not errors
/// and are recorded in the [`CleaningReport`](crate::cleaning::CleaningReport)
/// instead.
#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data format error: {0}")]
    DataFormat(String),

    #[error("Column '{column}' failed: {reason}")]
    Column { column: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl CleanError {
    /// Whether this error is the caller's fault (4xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(self, CleanError::Config(_) | CleanError::DataFormat(_))
    }
}

impl From<polars::error::PolarsError> for CleanError {
    fn from(err: polars::error::PolarsError) -> Self {
        CleanError::Unexpected(err.to_string())
    }
}

impl From<serde_json::Error> for CleanError {
    fn from(err: serde_json::Error) -> Self {
        CleanError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CleanError::Config("columns not found: x".to_string());
        assert_eq!(err.to_string(), "Configuration error: columns not found: x");
    }

    #[test]
    fn test_client_error_split() {
        assert!(CleanError::Config("bad".into()).is_client_error());
        assert!(CleanError::DataFormat("empty".into()).is_client_error());
        assert!(!CleanError::Unexpected("boom".into()).is_client_error());
        assert!(!CleanError::Column {
            column: "a".into(),
            reason: "parse".into()
        }
        .is_client_error());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CleanError = io_err.into();
        assert!(matches!(err, CleanError::Io(_)));
    }
}
