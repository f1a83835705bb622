//! Immutable configuration snapshots.
//!
//! The external configuration layer owns the authoritative mutable store;
//! the core only ever reads published snapshots. A worker clones the
//! current `Arc` once per pass, so a rule disabled mid-pass cannot flip in
//! the middle of evaluating one file.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::folder::Folder;
use crate::policy::TrashPolicy;

/// Everything the core consumes from the configuration layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Watched folders with their scoped rules.
    #[serde(default)]
    pub folders: Vec<Folder>,
    /// Active trash policy, if any.
    #[serde(default)]
    pub trash_policy: Option<TrashPolicy>,
}

impl ConfigSnapshot {
    /// Validate every folder and rule in the snapshot.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for folder in &self.folders {
            folder.validate()?;
        }
        Ok(())
    }

    /// Look up a folder by path.
    pub fn folder(&self, path: &Path) -> Option<&Folder> {
        self.folders.iter().find(|f| f.path == path)
    }
}

/// Shared handle to the most recently published snapshot.
///
/// Publishing swaps the pointer; readers holding the previous `Arc` keep a
/// consistent view until their pass finishes.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Arc<ConfigSnapshot>>,
}

impl SnapshotStore {
    /// Create a store holding the given snapshot.
    pub fn new(snapshot: ConfigSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Publish a new snapshot, replacing the current one.
    pub fn publish(&self, snapshot: ConfigSnapshot) {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(snapshot);
    }

    /// The currently published snapshot.
    pub fn current(&self) -> Arc<ConfigSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
