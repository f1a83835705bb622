//! Actions a matching rule performs on a file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The kind of file operation a rule triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Move the file to a destination folder.
    Move,
    /// Copy the file to a destination folder.
    Copy,
    /// Rename the file in place using a pattern.
    Rename,
    /// Permanently delete the file.
    Delete,
    /// Move the file into the trash bin.
    Recycle,
    /// Open the file with the platform default handler.
    Open,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Move => write!(f, "move"),
            Self::Copy => write!(f, "copy"),
            Self::Rename => write!(f, "rename"),
            Self::Delete => write!(f, "delete"),
            Self::Recycle => write!(f, "recycle"),
            Self::Open => write!(f, "open"),
        }
    }
}

/// A rule's action with its parameters.
///
/// `destination` is required for Move/Copy and `pattern` for Rename
/// (tokens `{name}`, `{ext}`, `{date}`, `{time}`). Delete must carry
/// `confirm = true`; the engine never auto-confirms permanent deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    #[serde(default)]
    pub destination: Option<PathBuf>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub confirm: bool,
}

impl Action {
    fn bare(kind: ActionKind) -> Self {
        Self {
            kind,
            destination: None,
            pattern: None,
            overwrite: false,
            confirm: false,
        }
    }

    /// Move to a destination folder.
    pub fn move_to(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: Some(destination.into()),
            ..Self::bare(ActionKind::Move)
        }
    }

    /// Copy to a destination folder.
    pub fn copy_to(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: Some(destination.into()),
            ..Self::bare(ActionKind::Copy)
        }
    }

    /// Rename in place using a pattern.
    pub fn rename(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            ..Self::bare(ActionKind::Rename)
        }
    }

    /// Permanently delete; confirmation is mandatory and pre-set.
    pub fn delete() -> Self {
        Self {
            confirm: true,
            ..Self::bare(ActionKind::Delete)
        }
    }

    /// Move into the trash bin.
    pub fn recycle() -> Self {
        Self::bare(ActionKind::Recycle)
    }

    /// Open with the platform default handler.
    pub fn open() -> Self {
        Self::bare(ActionKind::Open)
    }

    /// Allow replacing an existing file at the destination.
    pub fn with_overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }

    /// Require confirmation before the action runs.
    pub fn with_confirm(mut self) -> Self {
        self.confirm = true;
        self
    }

    /// Check the parameters required by this action kind.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.kind {
            ActionKind::Move | ActionKind::Copy => {
                if self.destination.is_none() {
                    return Err(ValidationError::MissingDestination { kind: self.kind });
                }
            }
            ActionKind::Rename => {
                if self.pattern.as_deref().is_none_or(str::is_empty) {
                    return Err(ValidationError::MissingPattern);
                }
            }
            ActionKind::Delete => {
                if !self.confirm {
                    return Err(ValidationError::DeleteWithoutConfirm);
                }
            }
            ActionKind::Recycle | ActionKind::Open => {}
        }
        Ok(())
    }
}
