//! History error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Errors that can occur while reading, writing or resolving history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("no videos in history")]
    EmptyHistory,

    #[error("index out of range: {index} (have {len} videos)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid index: {0}")]
    InvalidReference(String),

    #[error("cannot determine home directory for the history file")]
    NoHomeDirectory,

    #[error("Failed to parse history file {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HistoryError {
    pub fn invalid_reference(reference: impl Into<String>) -> Self {
        Self::InvalidReference(reference.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = HistoryError::IndexOutOfRange { index: 5, len: 2 };
        assert_eq!(err.to_string(), "index out of range: 5 (have 2 videos)");
    }
}
