//! Fallback folder walk.

use std::path::{Path, PathBuf};

use globset::GlobSet;
use tracing::debug;
use walkdir::WalkDir;

/// Collect the candidate files of one folder, in walk order.
///
/// Unreadable entries are skipped; the rest of the walk continues.
pub(crate) fn collect_files(root: &Path, recursive: bool, ignore: &GlobSet) -> Vec<PathBuf> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).max_depth(max_depth) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(folder = %root.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if is_ignored(ignore, entry.path()) {
            continue;
        }
        files.push(entry.into_path());
    }
    files
}

/// Whether the monitor should never dispatch this path.
pub(crate) fn is_ignored(ignore: &GlobSet, path: &Path) -> bool {
    path.file_name()
        .map(|name| ignore.is_match(name))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;

    fn ignore_set() -> GlobSet {
        MonitorConfig::default().ignore_set().unwrap()
    }

    #[test]
    fn test_flat_walk_skips_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("top.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("nested.txt"), b"y").unwrap();

        let files = collect_files(dir.path(), false, &ignore_set());
        assert_eq!(files, vec![dir.path().join("top.txt")]);
    }

    #[test]
    fn test_recursive_walk_descends() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("top.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("nested.txt"), b"y").unwrap();

        let mut files = collect_files(dir.path(), true, &ignore_set());
        files.sort();
        assert_eq!(
            files,
            vec![
                dir.path().join("sub").join("nested.txt"),
                dir.path().join("top.txt"),
            ]
        );
    }

    #[test]
    fn test_in_progress_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("movie.crdownload"), b"x").unwrap();
        std::fs::write(dir.path().join(".hidden"), b"x").unwrap();
        std::fs::write(dir.path().join("done.iso"), b"x").unwrap();

        let files = collect_files(dir.path(), false, &ignore_set());
        assert_eq!(files, vec![dir.path().join("done.iso")]);
    }
}
