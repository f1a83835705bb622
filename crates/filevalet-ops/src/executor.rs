//! The action executor: concrete file-system operations with conflict and
//! overwrite semantics.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use chrono::Local;
use tracing::debug;

use filevalet_core::{Action, ActionKind};

use crate::outcome::{ActionError, ActionOutcome, SkipReason};
use crate::pattern::expand_pattern;
use crate::trash::TrashBin;

/// Executes rule actions against the file system.
///
/// Cheap to clone; the only shared state is the trash bin handle.
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    bin: Arc<TrashBin>,
}

impl ActionExecutor {
    /// Create an executor recycling into the given bin.
    pub fn new(bin: Arc<TrashBin>) -> Self {
        Self { bin }
    }

    /// The trash bin this executor recycles into.
    pub fn bin(&self) -> &Arc<TrashBin> {
        &self.bin
    }

    /// Execute one action against one file.
    ///
    /// A source that vanished since it was matched (lost race with a prior
    /// action or an external change) is a skip, never an error.
    pub fn execute(&self, path: &Path, action: &Action) -> ActionOutcome {
        if !path.is_file() {
            return ActionOutcome::Skipped(SkipReason::NotFound);
        }

        let outcome = match action.kind {
            ActionKind::Move => self.transfer(path, action, true),
            ActionKind::Copy => self.transfer(path, action, false),
            ActionKind::Rename => self.rename(path, action),
            ActionKind::Delete => self.delete_file(path),
            ActionKind::Recycle => self.recycle(path),
            ActionKind::Open => open_detached(path),
        };
        debug!(path = %path.display(), kind = %action.kind, outcome = %outcome.summary(), "action executed");
        outcome
    }

    /// Move or copy `path` into the action's destination folder.
    fn transfer(&self, path: &Path, action: &Action, remove_source: bool) -> ActionOutcome {
        let Some(dest_dir) = action.destination.as_deref() else {
            // Validation rejects this at construction; fail defensively.
            return ActionOutcome::Failed(ActionError::NotFound {
                path: PathBuf::new(),
            });
        };
        if !dest_dir.is_dir() {
            return ActionOutcome::Failed(ActionError::NotFound {
                path: dest_dir.to_path_buf(),
            });
        }

        let Some(name) = path.file_name() else {
            return ActionOutcome::Skipped(SkipReason::NotFound);
        };
        let target = dest_dir.join(name);
        if target.exists() && !action.overwrite {
            return ActionOutcome::Failed(ActionError::Conflict { path: target });
        }

        let result = if remove_source {
            move_file(path, &target)
        } else {
            fs::copy(path, &target)
                .map(|_| ())
                .map_err(|e| ActionError::io(path, e))
        };

        match result {
            Ok(()) => ActionOutcome::Succeeded {
                kind: action.kind,
                destination: Some(target),
            },
            Err(error) => ActionOutcome::Failed(error),
        }
    }

    /// Rename `path` in its own folder using the action's pattern.
    fn rename(&self, path: &Path, action: &Action) -> ActionOutcome {
        let Some(pattern) = action.pattern.as_deref() else {
            return ActionOutcome::Failed(ActionError::NotFound {
                path: PathBuf::new(),
            });
        };

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let new_name = expand_pattern(pattern, &stem, &extension, Local::now());

        let parent = path.parent().unwrap_or(Path::new(""));
        let target = parent.join(new_name);
        if target == path {
            return ActionOutcome::Succeeded {
                kind: ActionKind::Rename,
                destination: Some(target),
            };
        }
        if target.exists() && !action.overwrite {
            return ActionOutcome::Failed(ActionError::Conflict { path: target });
        }

        match move_file(path, &target) {
            Ok(()) => ActionOutcome::Succeeded {
                kind: ActionKind::Rename,
                destination: Some(target),
            },
            Err(error) => ActionOutcome::Failed(error),
        }
    }

    /// Permanently delete a file.
    ///
    /// Also the primitive the trash eviction manager uses; a path that is
    /// already gone is a skip (the bin may have been emptied externally).
    pub fn delete_file(&self, path: &Path) -> ActionOutcome {
        if !path.exists() {
            return ActionOutcome::Skipped(SkipReason::NotFound);
        }
        match fs::remove_file(path) {
            Ok(()) => ActionOutcome::Succeeded {
                kind: ActionKind::Delete,
                destination: None,
            },
            Err(e) => ActionOutcome::Failed(ActionError::io(path, e)),
        }
    }

    /// Move a file into the trash bin.
    fn recycle(&self, path: &Path) -> ActionOutcome {
        match self.bin.recycle(path) {
            Ok(entry) => ActionOutcome::Succeeded {
                kind: ActionKind::Recycle,
                destination: Some(entry.path),
            },
            Err(error) => ActionOutcome::Failed(error),
        }
    }
}

/// Move one file, replacing an existing target.
///
/// Plain rename first (atomic replace where the platform supports it); a
/// platform that refuses to rename over an existing file gets delete-then-
/// rename; a cross-filesystem move falls back to copy + remove.
fn move_file(source: &Path, target: &Path) -> Result<(), ActionError> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }

    if target.exists() {
        fs::remove_file(target).map_err(|e| ActionError::io(target, e))?;
        if fs::rename(source, target).is_ok() {
            return Ok(());
        }
    }

    fs::copy(source, target).map_err(|e| ActionError::io(source, e))?;
    fs::remove_file(source).map_err(|e| ActionError::io(source, e))?;
    Ok(())
}

/// Launch the platform default handler for a file, detached.
///
/// Fire-and-forget: a spawn failure is reported but never retried.
fn open_detached(path: &Path) -> ActionOutcome {
    match opener_command(path).spawn() {
        Ok(_) => ActionOutcome::Succeeded {
            kind: ActionKind::Open,
            destination: None,
        },
        Err(e) => ActionOutcome::Failed(ActionError::io(path, e)),
    }
}

#[cfg(target_os = "macos")]
fn opener_command(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(target_os = "windows")]
fn opener_command(path: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(path);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener_command(path: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    cmd
}
