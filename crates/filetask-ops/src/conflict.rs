//! Conflict detection and resolution for file operations.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use filetask_core::{ConflictDecision, ConflictStrategy, OperationError};
use tracing::debug;

use crate::callback::FileOperationCallback;

/// Holds the sticky decision of one batch and asks the host when needed.
///
/// A resolver belongs to exactly one batch invocation. The stored decision
/// starts as `(Overwrite, false)`; once the host answers with `apply_to_all`
/// it is frozen for the rest of the batch.
pub struct ConflictResolver<'a, C> {
    callback: &'a C,
    current: ConflictDecision,
    prompts: usize,
}

impl<'a, C: FileOperationCallback> ConflictResolver<'a, C> {
    /// Create a resolver for a fresh batch.
    pub fn new(callback: &'a C) -> Self {
        Self {
            callback,
            current: ConflictDecision::default(),
            prompts: 0,
        }
    }

    /// How many times the host has been asked in this batch.
    pub fn prompts(&self) -> usize {
        self.prompts
    }

    /// Decide what to do with a conflicting source item.
    pub async fn resolve(&mut self, source: &Path) -> Result<ConflictDecision, OperationError> {
        if self.current.apply_to_all {
            return Ok(self.current);
        }

        self.prompts += 1;
        let decision = self.callback.file_conflict(source).await?;
        debug!(
            source = %source.display(),
            strategy = %decision.strategy,
            apply_to_all = decision.apply_to_all,
            "conflict resolved"
        );
        self.current = decision;
        Ok(decision)
    }

    /// Turn a planned target into the path to write, or `None` to skip.
    ///
    /// Targets that do not exist are returned unchanged without consulting
    /// the resolver. `is_dir` selects the naming rule for `KeepBoth`.
    pub async fn resolve_target(
        &mut self,
        source: &Path,
        target: PathBuf,
        is_dir: bool,
    ) -> Result<Option<PathBuf>, OperationError> {
        if !entry_exists(&target) {
            return Ok(Some(target));
        }

        let decision = self.resolve(source).await?;
        Ok(match decision.strategy {
            ConflictStrategy::Skip => None,
            ConflictStrategy::Overwrite => Some(target),
            ConflictStrategy::KeepBoth if is_dir => Some(unique_dir_path(&target)),
            ConflictStrategy::KeepBoth => Some(unique_path(&target)),
        })
    }
}

/// Check whether anything, even a dangling symlink, occupies `path`.
pub(crate) fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Generate a free sibling name for a file, keeping its extension.
///
/// For "file.txt", tries "file (1).txt", "file (2).txt", etc.
pub fn unique_path(path: &Path) -> PathBuf {
    numbered_sibling(path, path.file_stem(), path.extension())
}

/// Generate a free sibling name for a directory.
///
/// The whole name counts as the stem, so "photos.2020" becomes
/// "photos.2020 (1)".
pub fn unique_dir_path(path: &Path) -> PathBuf {
    numbered_sibling(path, path.file_name(), None)
}

fn numbered_sibling(path: &Path, stem: Option<&OsStr>, extension: Option<&OsStr>) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    let stem = stem.unwrap_or_default();

    let mut counter: u64 = 1;
    loop {
        let candidate = parent.join(numbered_name(stem, counter, extension));
        if !entry_exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn numbered_name(stem: &OsStr, counter: u64, extension: Option<&OsStr>) -> OsString {
    let mut name = OsString::from(stem);
    name.push(format!(" ({counter})"));
    if let Some(ext) = extension {
        name.push(".");
        name.push(ext);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn test_unique_path() {
        let path = PathBuf::from("/nonexistent-filetask-dir/test.txt");
        let renamed = unique_path(&path);
        assert_eq!(renamed, PathBuf::from("/nonexistent-filetask-dir/test (1).txt"));
    }

    #[test]
    fn test_unique_path_no_extension() {
        let path = PathBuf::from("/nonexistent-filetask-dir/testfile");
        let renamed = unique_path(&path);
        assert_eq!(renamed, PathBuf::from("/nonexistent-filetask-dir/testfile (1)"));
    }

    #[test]
    fn test_unique_path_skips_taken_names() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        fs::write(temp.path().join("a (1).txt"), "a1").unwrap();

        let renamed = unique_path(&temp.path().join("a.txt"));
        assert_eq!(renamed, temp.path().join("a (2).txt"));
    }

    #[test]
    fn test_unique_path_is_deterministic() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("report.pdf"), "x").unwrap();

        let first = unique_path(&temp.path().join("report.pdf"));
        let second = unique_path(&temp.path().join("report.pdf"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_unique_path_last_extension_only() {
        let renamed = unique_path(Path::new("/nonexistent-filetask-dir/archive.tar.gz"));
        assert_eq!(
            renamed,
            PathBuf::from("/nonexistent-filetask-dir/archive.tar (1).gz")
        );
    }

    #[test]
    fn test_unique_path_dotfile() {
        let renamed = unique_path(Path::new("/nonexistent-filetask-dir/.env"));
        assert_eq!(renamed, PathBuf::from("/nonexistent-filetask-dir/.env (1)"));
    }

    #[test]
    fn test_unique_dir_path_keeps_dots() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("photos.2020")).unwrap();

        let renamed = unique_dir_path(&temp.path().join("photos.2020"));
        assert_eq!(renamed, temp.path().join("photos.2020 (1)"));
    }
}
