//! Recursive deletion of files and directory trees.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetask_core::DeleteMode;
use tracing::{debug, warn};

/// What happened to one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    /// The path existed and is gone now.
    Deleted,
    /// Nothing was there to delete.
    Missing,
    /// The path, or part of it, is still there.
    Failed,
}

/// Delete one file or directory tree.
pub fn delete_path(path: &Path, mode: DeleteMode) -> Deletion {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Deletion::Missing,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot stat path for deletion");
            return Deletion::Failed;
        }
    };

    let result = match mode {
        DeleteMode::Permanent if metadata.is_dir() => fs::remove_dir_all(path),
        DeleteMode::Permanent => fs::remove_file(path),
        DeleteMode::Trash => trash::delete(path).map_err(|e| io::Error::other(e.to_string())),
    };

    match result {
        Ok(()) => {
            debug!(path = %path.display(), ?mode, "deleted");
            Deletion::Deleted
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "deletion failed");
            Deletion::Failed
        }
    }
}

/// Delete every path; true if none of them failed.
///
/// All paths are attempted even after a failure.
pub fn delete_all(paths: &[PathBuf], mode: DeleteMode) -> bool {
    paths
        .iter()
        .map(|path| delete_path(path, mode))
        .fold(true, |ok, outcome| ok && outcome != Deletion::Failed)
}

/// Delete every path and return the ones that existed and are gone now.
pub fn delete_existing(paths: &[PathBuf], mode: DeleteMode) -> Vec<PathBuf> {
    paths
        .iter()
        .filter(|path| delete_path(path, mode) == Deletion::Deleted)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn test_delete_file_and_tree() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        let tree = temp.path().join("tree");
        fs::write(&file, "x").unwrap();
        fs::create_dir_all(tree.join("a/b")).unwrap();
        fs::write(tree.join("a/b/c.txt"), "c").unwrap();

        assert_eq!(delete_path(&file, DeleteMode::Permanent), Deletion::Deleted);
        assert_eq!(delete_path(&tree, DeleteMode::Permanent), Deletion::Deleted);
        assert!(!file.exists());
        assert!(!tree.exists());
    }

    #[test]
    fn test_missing_path_is_noop() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");

        assert_eq!(delete_path(&missing, DeleteMode::Permanent), Deletion::Missing);
        assert!(delete_all(&[missing.clone()], DeleteMode::Permanent));
        assert!(delete_existing(&[missing], DeleteMode::Permanent).is_empty());
    }

    #[test]
    fn test_delete_existing_reports_only_deleted() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().join("present");
        fs::write(&present, "x").unwrap();
        let missing = temp.path().join("missing");

        let deleted = delete_existing(&[missing, present.clone()], DeleteMode::Permanent);
        assert_eq!(deleted, vec![present]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_removed_not_followed() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("target");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.txt"), "keep").unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(delete_path(&link, DeleteMode::Permanent), Deletion::Deleted);
        assert!(target.join("keep.txt").exists());
    }
}
