//! Error types for coursefib

use thiserror::Error;

/// Result type for coursefib operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or searching timetables
#[derive(Error, Debug)]
pub enum Error {
    /// A session record has a missing or unparseable field
    #[error("Malformed session record #{index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// A clock time could not be parsed
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    /// The search visited more nodes than allowed
    #[error("Search aborted after {limit} nodes")]
    SearchAborted { limit: u64 },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session table error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            index,
            reason: reason.into(),
        }
    }
}
