//! Managed trash bin.
//!
//! Layout follows the XDG trash convention the original desktop tools use:
//! payloads live under `files/` and each has a sidecar under `info/` named
//! `<file>.trashinfo` recording the original path and deletion date. A bin
//! emptied externally is tolerated; entries are re-listed from disk on
//! every pass.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDateTime};
use tracing::{debug, warn};

use filevalet_core::TrashEntry;

use crate::outcome::ActionError;

const INFO_HEADER: &str = "[Trash Info]";
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A managed trash location.
#[derive(Debug, Clone)]
pub struct TrashBin {
    root: PathBuf,
}

impl TrashBin {
    /// Open (creating if needed) a bin rooted at the given directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ActionError> {
        let root = root.into();
        let bin = Self { root };
        fs::create_dir_all(bin.files_dir()).map_err(|e| ActionError::io(bin.files_dir(), e))?;
        fs::create_dir_all(bin.info_dir()).map_err(|e| ActionError::io(bin.info_dir(), e))?;
        Ok(bin)
    }

    /// Default bin location under the user's local data directory.
    pub fn default_root() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("filevalet")
            .join("trash")
    }

    /// Root directory of the bin.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn files_dir(&self) -> PathBuf {
        self.root.join("files")
    }

    fn info_dir(&self) -> PathBuf {
        self.root.join("info")
    }

    /// Move a file into the bin and record its entry.
    pub fn recycle(&self, source: &Path) -> Result<TrashEntry, ActionError> {
        let size = fs::metadata(source)
            .map_err(|e| ActionError::io(source, e))?
            .len();

        let name = source
            .file_name()
            .ok_or_else(|| ActionError::NotFound {
                path: source.to_path_buf(),
            })?;
        let target = unique_bin_path(&self.files_dir(), name);

        move_into_bin(source, &target)?;

        let deleted: DateTime<Local> = Local::now();
        let entry = TrashEntry {
            path: target.clone(),
            original_path: source.to_path_buf(),
            size,
            deleted_at: deleted.into(),
        };
        self.write_sidecar(&entry, deleted)?;

        debug!(
            source = %source.display(),
            bin_path = %target.display(),
            "recycled file into trash bin"
        );
        Ok(entry)
    }

    /// List the bin's current entries from disk.
    ///
    /// Unreadable payloads are skipped with a warning; a payload without a
    /// sidecar falls back to its own path and modification time.
    pub fn entries(&self) -> Vec<TrashEntry> {
        let mut entries = Vec::new();
        let read_dir = match fs::read_dir(self.files_dir()) {
            Ok(rd) => rd,
            Err(e) => {
                warn!(bin = %self.root.display(), error = %e, "cannot list trash bin");
                return entries;
            }
        };

        for item in read_dir.flatten() {
            let path = item.path();
            let metadata = match item.metadata() {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unreadable trash entry");
                    continue;
                }
            };

            let (original_path, deleted_at) = match self.read_sidecar(&path) {
                Some(parsed) => parsed,
                None => (
                    path.clone(),
                    metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                ),
            };

            entries.push(TrashEntry {
                path,
                original_path,
                size: metadata.len(),
                deleted_at,
            });
        }
        entries
    }

    /// Remove the sidecar belonging to an entry, if present.
    ///
    /// Called after the payload has been permanently deleted; sidecar
    /// cleanup failures are not fatal.
    pub fn remove_sidecar(&self, entry: &TrashEntry) {
        if let Some(info) = self.sidecar_path(&entry.path) {
            if let Err(e) = fs::remove_file(&info) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %info.display(), error = %e, "failed to remove trash sidecar");
                }
            }
        }
    }

    fn sidecar_path(&self, bin_path: &Path) -> Option<PathBuf> {
        let name = bin_path.file_name()?;
        let mut file_name = name.to_os_string();
        file_name.push(".trashinfo");
        Some(self.info_dir().join(file_name))
    }

    fn write_sidecar(&self, entry: &TrashEntry, deleted: DateTime<Local>) -> Result<(), ActionError> {
        let Some(info) = self.sidecar_path(&entry.path) else {
            return Ok(());
        };
        let contents = format!(
            "{INFO_HEADER}\nPath={}\nDeletionDate={}\n",
            entry.original_path.display(),
            deleted.format(DATE_FORMAT)
        );
        fs::write(&info, contents).map_err(|e| ActionError::io(&info, e))
    }

    fn read_sidecar(&self, bin_path: &Path) -> Option<(PathBuf, SystemTime)> {
        let info = self.sidecar_path(bin_path)?;
        let contents = fs::read_to_string(info).ok()?;

        let mut original = None;
        let mut deleted = None;
        for line in contents.lines() {
            if let Some(path) = line.strip_prefix("Path=") {
                original = Some(PathBuf::from(path));
            } else if let Some(date) = line.strip_prefix("DeletionDate=") {
                deleted = NaiveDateTime::parse_from_str(date, DATE_FORMAT)
                    .ok()
                    .and_then(|naive| naive.and_local_timezone(Local).earliest())
                    .map(SystemTime::from);
            }
        }
        Some((
            original?,
            deleted.unwrap_or(SystemTime::UNIX_EPOCH),
        ))
    }
}

/// Move a payload into the bin: rename when possible, copy + remove when
/// the bin lives on another filesystem.
fn move_into_bin(source: &Path, target: &Path) -> Result<(), ActionError> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }
    fs::copy(source, target).map_err(|e| ActionError::io(source, e))?;
    fs::remove_file(source).map_err(|e| ActionError::io(source, e))?;
    Ok(())
}

/// Pick a free name in the bin for an incoming payload.
///
/// For a taken "file.txt", tries "file (1).txt", "file (2).txt", and so on.
fn unique_bin_path(dir: &Path, name: &std::ffi::OsStr) -> PathBuf {
    let direct = dir.join(name);
    if !direct.exists() {
        return direct;
    }

    let stem = direct
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = direct.extension().map(|e| e.to_string_lossy().into_owned());

    for i in 1..1000 {
        let candidate = match &extension {
            Some(ext) => format!("{stem} ({i}).{ext}"),
            None => format!("{stem} ({i})"),
        };
        let candidate = dir.join(candidate);
        if !candidate.exists() {
            return candidate;
        }
    }

    // Saturated: fall back to a timestamp suffix.
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let fallback = match &extension {
        Some(ext) => format!("{stem}_{secs}.{ext}"),
        None => format!("{stem}_{secs}"),
    };
    dir.join(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin_in(dir: &Path) -> TrashBin {
        TrashBin::open(dir.join("trash")).unwrap()
    }

    #[test]
    fn test_recycle_creates_entry_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin_in(dir.path());
        let victim = dir.path().join("old.log");
        std::fs::write(&victim, b"obsolete").unwrap();

        let entry = bin.recycle(&victim).unwrap();
        assert!(!victim.exists());
        assert!(entry.path.exists());
        assert_eq!(entry.original_path, victim);
        assert_eq!(entry.size, 8);

        let listed = bin.entries();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].original_path, victim);
        assert_eq!(listed[0].size, 8);
    }

    #[test]
    fn test_recycle_name_collision() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin_in(dir.path());

        for contents in [b"one" as &[u8], b"three"] {
            let victim = dir.path().join("dup.txt");
            std::fs::write(&victim, contents).unwrap();
            bin.recycle(&victim).unwrap();
        }

        let mut names: Vec<String> = bin
            .entries()
            .iter()
            .map(|e| e.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["dup (1).txt", "dup.txt"]);
    }

    #[test]
    fn test_entries_survive_missing_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin_in(dir.path());
        let victim = dir.path().join("naked.txt");
        std::fs::write(&victim, b"x").unwrap();
        let entry = bin.recycle(&victim).unwrap();

        bin.remove_sidecar(&entry);
        let listed = bin.entries();
        assert_eq!(listed.len(), 1);
        // Without a sidecar the entry falls back to its bin path.
        assert_eq!(listed[0].original_path, entry.path);
    }

    #[test]
    fn test_deletion_date_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let bin = bin_in(dir.path());
        let victim = dir.path().join("dated.txt");
        std::fs::write(&victim, b"x").unwrap();

        let before = SystemTime::now();
        let entry = bin.recycle(&victim).unwrap();
        let entries = bin.entries();
        let listed = &entries[0];

        // Sidecar stores whole seconds; allow a little slack either way.
        let slack = std::time::Duration::from_secs(2);
        assert!(listed.deleted_at >= before - slack);
        assert!(listed.deleted_at <= entry.deleted_at + slack);
    }
}
