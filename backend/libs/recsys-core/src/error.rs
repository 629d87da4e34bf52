//! Error types for loading and writing recommendation data.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for data operations.
pub type DataResult<T> = Result<T, DataError>;

/// Errors that can occur while reading or writing data files.
#[derive(Error, Debug)]
pub enum DataError {
    /// Underlying file operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line could not be parsed
    #[error("Malformed line {line} in {source_name}: {reason}")]
    MalformedLine {
        source_name: String,
        line: usize,
        reason: String,
    },

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(source_name: &str, line: usize, reason: impl Into<String>) -> Self {
        DataError::MalformedLine {
            source_name: source_name.to_string(),
            line,
            reason: reason.into(),
        }
    }
}
