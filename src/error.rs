//! Error types for the shell script profiler

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while reading or updating per-function state records
///
/// None of these are fatal to the instrumented script: the `ssp` binary logs
/// them and still exits with the status the caller asked for.
#[derive(Error, Debug)]
pub enum SspError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to persist {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out after {waited:?} waiting for lock {}", .path.display())]
    LockTimeout { path: PathBuf, waited: Duration },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

impl SspError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SspError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for profiler operations
pub type Result<T> = std::result::Result<T, SspError>;
