//! Monitor error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from monitor lifecycle operations.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The folder's watch could not be installed or kept alive; only this
    /// folder stops being monitored.
    #[error("folder unavailable: {path}: {source}")]
    FolderUnavailable {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The folder is already being monitored.
    #[error("already watching: {path}")]
    AlreadyWatching { path: PathBuf },

    /// The folder is not being monitored.
    #[error("not watching: {path}")]
    NotWatching { path: PathBuf },

    /// An ignore pattern failed to compile.
    #[error("invalid ignore pattern: {0}")]
    InvalidPattern(#[from] globset::Error),
}
