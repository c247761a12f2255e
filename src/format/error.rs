//! Error types for result record operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing result records.
#[derive(Error, Debug)]
pub enum RecordError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid record structure or content
    #[error("Invalid record: {message}")]
    InvalidFormat {
        /// Description of the format error
        message: String,
    },

    /// Record file does not exist
    #[error("Record not found: {path:?}")]
    NotFound {
        /// Path where the record was expected
        path: PathBuf,
    },

    /// Version mismatch between expected and found
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version string
        expected: String,
        /// Found version string
        found: String,
    },
}

impl RecordError {
    /// Create an invalid format error with a message.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }
}
