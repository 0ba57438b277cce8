//! Error types for the deleted-library scanner.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for scanner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the scanner.
///
/// Every variant is fatal for a run. A process vanishing mid-scan is not an
/// error and never reaches this type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("process collection failed: {0}")]
    Collection(String),

    #[error("failed to open file: {}: {source}", path.display())]
    AccessFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read file: {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: mapping line is not valid UTF-8", path.display())]
    Decode { path: PathBuf, line: usize },

    #[error("metrics encoding failed: {0}")]
    Metrics(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
