//! File metadata snapshots consumed by the condition evaluator.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// File metadata timestamps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Timestamps {
    /// Last modification time.
    pub modified: SystemTime,
    /// Last access time (if available).
    pub accessed: Option<SystemTime>,
    /// Creation time (if available, platform-dependent).
    pub created: Option<SystemTime>,
}

impl Timestamps {
    /// Create timestamps with only modified time.
    pub fn with_modified(modified: SystemTime) -> Self {
        Self {
            modified,
            accessed: None,
            created: None,
        }
    }

    /// Create timestamps with all available times.
    pub fn new(
        modified: SystemTime,
        accessed: Option<SystemTime>,
        created: Option<SystemTime>,
    ) -> Self {
        Self {
            modified,
            accessed,
            created,
        }
    }
}

/// A point-in-time metadata snapshot of one regular file.
///
/// Conditions only ever see this snapshot; the engine never re-reads the
/// file mid-evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMeta {
    /// Full path the snapshot was taken from.
    pub path: PathBuf,
    /// File name without the extension.
    pub stem: CompactString,
    /// Extension without the leading separator; empty if none.
    pub extension: CompactString,
    /// Size in bytes.
    pub size: u64,
    /// Metadata timestamps.
    pub timestamps: Timestamps,
}

impl FileMeta {
    /// Snapshot a regular file's metadata.
    ///
    /// Fails for missing paths and non-files; timestamps the platform
    /// cannot provide are left unset.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }

        let timestamps = Timestamps::new(
            metadata.modified()?,
            metadata.accessed().ok(),
            metadata.created().ok(),
        );

        Ok(Self {
            path: path.to_path_buf(),
            stem: path
                .file_stem()
                .map(|s| CompactString::from(s.to_string_lossy().as_ref()))
                .unwrap_or_default(),
            extension: path
                .extension()
                .map(|e| CompactString::from(e.to_string_lossy().as_ref()))
                .unwrap_or_default(),
            size: metadata.len(),
            timestamps,
        })
    }
}
