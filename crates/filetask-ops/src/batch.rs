//! Batch orchestration: the top-level copy/move entry point.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetask_core::{
    BatchConfig, BatchOutcome, CopyEntry, DeleteMode, MoveCleanup, OperationError, SkippedItem,
    TransferMode,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::blocking::{join, unblock};
use crate::callback::FileOperationCallback;
use crate::conflict::ConflictResolver;
use crate::copy::CopyEngine;
use crate::delete::{Deletion, delete_all, delete_existing, delete_path};
use crate::progress::ProgressState;
use crate::mime::{GuessMime, MimeLookup, enrich};
use crate::size::total_size;
use crate::tree::{self, TreeReport};

/// Runs copy, move and delete batches.
///
/// A `FileTask` carries configuration only. Every call to
/// [`process`](Self::process) gets its own conflict state, so one task can
/// serve several batches, even concurrently.
pub struct FileTask {
    config: BatchConfig,
    mime: Box<dyn MimeLookup>,
    cancel: CancellationToken,
}

impl FileTask {
    /// Create a task with the given configuration.
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            mime: Box::new(GuessMime),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the content type lookup used to annotate results.
    pub fn with_mime_lookup(mut self, lookup: impl MimeLookup + 'static) -> Self {
        self.mime = Box::new(lookup);
        self
    }

    /// Stop copies between chunks once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Copy or move `sources` into the directory `destination`.
    ///
    /// Items are processed in order. Conflicts are resolved through
    /// `callback`; a decision with `apply_to_all` is reused for the rest of
    /// this call. The first error that is not confined to a single file in a
    /// tree aborts the batch; items already done stay done.
    ///
    /// Sizing, streaming and cleanup run on the blocking pool, so this must
    /// be awaited inside a tokio runtime.
    pub async fn process<C: FileOperationCallback>(
        &self,
        sources: &[PathBuf],
        destination: &Path,
        callback: &C,
        mode: TransferMode,
    ) -> Result<BatchOutcome, OperationError> {
        let bytes_total = {
            let sources = sources.to_vec();
            let policy = self.config.size_policy;
            unblock(move || total_size(&sources, policy)).await??
        };
        info!(
            items = sources.len(),
            bytes_total,
            destination = %destination.display(),
            %mode,
            "starting batch"
        );

        let mut run = BatchRun::new(
            callback,
            CopyEngine::new(
                bytes_total,
                self.config.effective_chunk_size(),
                self.cancel.clone(),
            ),
        );
        let mut entries = Vec::with_capacity(sources.len());

        for source in sources {
            if let Some(entry) = self
                .process_item(&mut run, sources, source, destination, mode)
                .await?
            {
                entries.push(entry);
            }
        }

        enrich(&mut entries, self.mime.as_ref());

        let progress = run.progress;
        info!(
            processed = entries.len(),
            skipped = run.skipped.len(),
            prompts = run.resolver.prompts(),
            bytes_copied = progress.bytes_copied(),
            "batch finished"
        );

        Ok(BatchOutcome {
            entries,
            skipped: run.skipped,
            bytes_copied: progress.bytes_copied(),
            bytes_total,
        })
    }

    async fn process_item<C: FileOperationCallback>(
        &self,
        run: &mut BatchRun<'_, C>,
        sources: &[PathBuf],
        source: &Path,
        destination: &Path,
        mode: TransferMode,
    ) -> Result<Option<CopyEntry>, OperationError> {
        let name = source
            .file_name()
            .ok_or_else(|| OperationError::InvalidSource {
                path: source.to_path_buf(),
            })?;
        let target = destination.join(name);
        let metadata = fs::metadata(source).map_err(|e| OperationError::io(source, e))?;

        if !metadata.is_dir() {
            let Some(target) = run.transfer_file(source, target, mode).await? else {
                debug!(source = %source.display(), "skipped by conflict decision");
                return Ok(None);
            };
            return Ok(Some(CopyEntry::new(absolute(&target), absolute(source))));
        }

        let Some(target) = run.resolver.resolve_target(source, target, true).await? else {
            debug!(source = %source.display(), "directory skipped by conflict decision");
            return Ok(None);
        };
        ensure_outside(source, &target)?;

        let report = tree::replicate(run, source, &target, mode).await?;

        if mode.is_move() {
            match self.config.move_cleanup {
                MoveCleanup::PerItem => {
                    let source = source.to_path_buf();
                    unblock(move || remove_moved_tree(&source, &report)).await??;
                }
                MoveCleanup::WholeBatch => {
                    let sources = sources.to_vec();
                    unblock(move || remove_all_sources(&sources)).await??;
                }
            }
        }

        Ok(Some(CopyEntry::new(absolute(&target), absolute(source))))
    }

    /// Recursively delete every path; true if none of them is left.
    ///
    /// Paths that do not exist are a no-op and do not count as failures.
    pub fn delete_files_and_directories(&self, paths: &[PathBuf]) -> bool {
        delete_all(paths, self.config.delete_mode)
    }

    /// Recursively delete every path and return the ones actually deleted.
    ///
    /// Paths that do not exist are not reported.
    pub fn delete_paths(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        delete_existing(paths, self.config.delete_mode)
    }
}

impl Default for FileTask {
    fn default() -> Self {
        Self::new(BatchConfig::default())
    }
}

/// Per-call state shared by the top-level loop and the tree walk.
///
/// The copy engine is lent to the blocking pool for each file and handed
/// back afterwards; `progress` mirrors its state between transfers.
pub(crate) struct BatchRun<'a, C> {
    callback: &'a C,
    pub(crate) resolver: ConflictResolver<'a, C>,
    engine: Option<CopyEngine>,
    pub(crate) progress: ProgressState,
    pub(crate) skipped: Vec<SkippedItem>,
}

impl<'a, C: FileOperationCallback> BatchRun<'a, C> {
    pub(crate) fn new(callback: &'a C, engine: CopyEngine) -> Self {
        Self {
            callback,
            resolver: ConflictResolver::new(callback),
            progress: engine.progress(),
            engine: Some(engine),
            skipped: Vec::new(),
        }
    }

    /// Resolve a possible conflict at `target`, then copy or move the file.
    ///
    /// Returns the path actually written, or `None` when skipped.
    pub(crate) async fn transfer_file(
        &mut self,
        source: &Path,
        target: PathBuf,
        mode: TransferMode,
    ) -> Result<Option<PathBuf>, OperationError> {
        let Some(target) = self.resolver.resolve_target(source, target, false).await? else {
            return Ok(None);
        };

        // Only a blocking task that died mid-transfer leaves no engine.
        let mut engine = self.engine.take().ok_or(OperationError::Cancelled)?;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let source = source.to_path_buf();

        let task = tokio::task::spawn_blocking(move || {
            let result = engine.transfer(&source, &target, mode, &mut |percent| {
                let _ = tx.send(percent);
            });
            (engine, target, result)
        });

        // The channel closes when the transfer returns.
        while let Some(percent) = rx.recv().await {
            self.callback.on_progress(percent);
        }

        let (engine, target, result) = join(task).await?;
        self.progress = engine.progress();
        self.engine = Some(engine);
        result?;
        Ok(Some(target))
    }

    pub(crate) fn record_skip(&mut self, path: &Path, error: &OperationError) {
        self.record_skip_reason(path, error.to_string());
    }

    pub(crate) fn record_skip_reason(&mut self, path: &Path, reason: impl Into<String>) {
        self.skipped.push(SkippedItem::new(path, reason));
    }
}

/// Delete the source of a moved tree.
///
/// When everything made it across the whole tree goes; otherwise only the
/// directories that became empty are removed and skipped files stay put.
fn remove_moved_tree(source: &Path, report: &TreeReport) -> Result<(), OperationError> {
    if report.left_behind > 0 {
        debug!(
            source = %source.display(),
            left_behind = report.left_behind,
            "keeping skipped files at source"
        );
        tree::prune_empty_dirs(source);
        return Ok(());
    }

    fs::remove_dir_all(source).map_err(|e| OperationError::SourceNotRemoved {
        path: source.to_path_buf(),
        source: e,
    })
}

/// Delete every requested source of a batch after a directory move.
///
/// All paths are attempted; the first one still present afterwards fails
/// the batch.
fn remove_all_sources(sources: &[PathBuf]) -> Result<(), OperationError> {
    let failed: Vec<&PathBuf> = sources
        .iter()
        .filter(|path| delete_path(path, DeleteMode::Permanent) == Deletion::Failed)
        .collect();

    match failed.first() {
        None => Ok(()),
        Some(path) => {
            warn!(failed = failed.len(), "failed to remove requested sources after move");
            Err(OperationError::SourceNotRemoved {
                path: path.to_path_buf(),
                source: io::Error::other("source is still present after the move"),
            })
        }
    }
}

/// Reject writing a directory into itself or one of its descendants.
fn ensure_outside(source: &Path, target: &Path) -> Result<(), OperationError> {
    let source_abs = fs::canonicalize(source).map_err(|e| OperationError::io(source, e))?;
    let target_abs = canonical_target(target);

    if target_abs.starts_with(&source_abs) {
        return Err(OperationError::DestinationInsideSource {
            source_path: source.to_path_buf(),
            destination: target.to_path_buf(),
        });
    }
    Ok(())
}

/// Canonical form of a path that may not exist yet.
fn canonical_target(target: &Path) -> PathBuf {
    if let Ok(path) = fs::canonicalize(target) {
        return path;
    }
    match (target.parent(), target.file_name()) {
        (Some(parent), Some(name)) => canonical_target(parent).join(name),
        _ => absolute(target),
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
