//! Action outcomes and the executor's error taxonomy.

use std::path::PathBuf;

use thiserror::Error;

use filevalet_core::ActionKind;

/// Errors an action can fail with.
#[derive(Debug, Error)]
pub enum ActionError {
    /// A file already exists at the destination and overwrite is disabled.
    #[error("destination already exists: {path}")]
    Conflict { path: PathBuf },

    /// A path the action needs does not exist.
    #[error("not found: {path}")]
    NotFound { path: PathBuf },

    /// File locked or insufficient rights.
    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ActionError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Why an action was skipped rather than executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The source file no longer existed when the action ran.
    NotFound,
    /// Confirmation was requested and declined.
    ConfirmationDeclined,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "source no longer exists"),
            Self::ConfirmationDeclined => write!(f, "confirmation declined"),
        }
    }
}

/// Tri-state result of one action.
///
/// Failures are reported, never propagated as process-level errors; a bad
/// action logs and the caller continues with the next candidate.
#[derive(Debug)]
pub enum ActionOutcome {
    /// The action ran to completion.
    Succeeded {
        kind: ActionKind,
        /// Where the file ended up, for actions that relocate it.
        destination: Option<PathBuf>,
    },
    /// The action did not run; not an error.
    Skipped(SkipReason),
    /// The action ran and failed.
    Failed(ActionError),
}

impl ActionOutcome {
    /// Whether the action ran to completion.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Whether the action was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    /// Whether the action failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// One-line rendering for logs and reports.
    pub fn summary(&self) -> String {
        match self {
            Self::Succeeded { kind, destination } => match destination {
                Some(dest) => format!("{kind} succeeded -> {}", dest.display()),
                None => format!("{kind} succeeded"),
            },
            Self::Skipped(reason) => format!("skipped: {reason}"),
            Self::Failed(error) => format!("failed: {error}"),
        }
    }
}
