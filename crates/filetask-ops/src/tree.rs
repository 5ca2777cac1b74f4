//! Directory tree replication.
//!
//! The walk is a plain iterator of [`TreeEvent`]s consumed by an async loop,
//! so the conflict callback can suspend between two events without parking
//! a traversal thread.

use std::fs;
use std::path::{Path, PathBuf};

use filetask_core::{OperationError, TransferMode};
use jwalk::{Parallelism, WalkDir};
use tracing::{debug, warn};

use crate::batch::BatchRun;
use crate::callback::FileOperationCallback;

/// One step of a depth-first walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    /// A directory, yielded before anything beneath it.
    Directory(PathBuf),
    /// Anything that is not a directory.
    File(PathBuf),
    /// An entry that could not be read, or a directory whose contents
    /// could not be listed.
    Failed { path: PathBuf, message: String },
}

/// Lazy, deterministic depth-first walk of a directory tree.
///
/// Entries are visited serially in name order, hidden files included,
/// without following symlinks. The root itself is the first event. A
/// directory that cannot be listed yields its `Directory` event followed by
/// a `Failed` event for the same path.
pub struct TreeWalk {
    root: PathBuf,
    inner: jwalk::DirEntryIter<((), ())>,
    pending: Option<TreeEvent>,
}

impl TreeWalk {
    /// Start walking `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let inner = WalkDir::new(&root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false)
            .min_depth(0)
            .into_iter();
        Self {
            root,
            inner,
            pending: None,
        }
    }
}

impl Iterator for TreeWalk {
    type Item = TreeEvent;

    fn next(&mut self) -> Option<TreeEvent> {
        if let Some(event) = self.pending.take() {
            return Some(event);
        }

        let event = match self.inner.next()? {
            Ok(mut entry) if entry.file_type().is_dir() => {
                let path = entry.path();
                // jwalk reports an unlistable directory on the entry itself.
                if let Some(err) = entry.read_children_error.take() {
                    self.pending = Some(TreeEvent::Failed {
                        path: path.clone(),
                        message: err.to_string(),
                    });
                }
                TreeEvent::Directory(path)
            }
            Ok(entry) => TreeEvent::File(entry.path()),
            Err(err) => TreeEvent::Failed {
                path: err
                    .path()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| self.root.clone()),
                message: err.to_string(),
            },
        };
        Some(event)
    }
}

/// What a replication left behind at the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeReport {
    /// Entries skipped by a conflict decision or a failed visit.
    pub left_behind: usize,
}

/// Map `path` under `source_root` to the same relative place under
/// `destination_root`.
pub fn relocate(source_root: &Path, destination_root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(source_root) {
        Ok(relative) if relative.as_os_str().is_empty() => destination_root.to_path_buf(),
        Ok(relative) => destination_root.join(relative),
        Err(_) => destination_root.join(path.file_name().unwrap_or_default()),
    }
}

/// Recreate `source_dir` at `destination_dir`, routing each file through
/// conflict resolution and the copy engine.
///
/// Directory creation is idempotent. A file that cannot be transferred is
/// recorded as skipped and the walk goes on; only failing to create the
/// destination root, cancellation and callback failures end it.
pub(crate) async fn replicate<C: FileOperationCallback>(
    run: &mut BatchRun<'_, C>,
    source_dir: &Path,
    destination_dir: &Path,
    mode: TransferMode,
) -> Result<TreeReport, OperationError> {
    debug!(
        source = %source_dir.display(),
        destination = %destination_dir.display(),
        "replicating tree"
    );

    fs::create_dir_all(destination_dir).map_err(|e| OperationError::write(destination_dir, e))?;

    let mut report = TreeReport::default();

    for event in TreeWalk::new(source_dir) {
        match event {
            TreeEvent::Directory(dir) => {
                let target = relocate(source_dir, destination_dir, &dir);
                if let Err(e) = fs::create_dir_all(&target) {
                    let error = OperationError::write(&target, e);
                    warn!(path = %dir.display(), %error, "skipping directory");
                    run.record_skip(&dir, &error);
                    report.left_behind += 1;
                }
            }
            TreeEvent::File(file) => {
                let target = relocate(source_dir, destination_dir, &file);
                match run.transfer_file(&file, target, mode).await {
                    Ok(Some(_)) => {}
                    Ok(None) => report.left_behind += 1,
                    Err(error) if error.is_per_file() => {
                        warn!(path = %file.display(), %error, "skipping file");
                        run.record_skip(&file, &error);
                        report.left_behind += 1;
                    }
                    Err(error) => return Err(error),
                }
            }
            TreeEvent::Failed { path, message } => {
                warn!(path = %path.display(), %message, "skipping unreadable entry");
                run.record_skip_reason(&path, message);
                report.left_behind += 1;
            }
        }
    }

    Ok(report)
}

/// Remove empty directories under `root`, deepest first, then `root` itself.
///
/// Directories that still hold something are left alone.
pub(crate) fn prune_empty_dirs(root: &Path) {
    let mut dirs: Vec<PathBuf> = TreeWalk::new(root)
        .filter_map(|event| match event {
            TreeEvent::Directory(dir) => Some(dir),
            _ => None,
        })
        .collect();

    // Pre-order puts parents before children.
    dirs.reverse();
    for dir in dirs {
        if fs::remove_dir(&dir).is_ok() {
            debug!(path = %dir.display(), "removed empty directory");
        }
    }
}
