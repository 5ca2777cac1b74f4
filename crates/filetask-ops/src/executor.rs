//! Spawned batches with channel-based progress and conflict prompts.

use std::path::PathBuf;

use filetask_core::{BatchConfig, BatchOutcome, OperationError, TransferMode};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::batch::FileTask;
use crate::blocking::join;
use crate::callback::{BatchEvent, ChannelCallback};

/// A batch running on the tokio runtime.
///
/// Drain events with [`next_event`](Self::next_event) until it returns
/// `None`, answering every conflict request, then collect the result with
/// [`wait`](Self::wait).
#[derive(Debug)]
pub struct BatchHandle {
    events: mpsc::UnboundedReceiver<BatchEvent>,
    cancel: CancellationToken,
    task: JoinHandle<Result<BatchOutcome, OperationError>>,
}

impl BatchHandle {
    /// Next progress update or conflict request; `None` once the batch ended.
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    /// Ask the batch to stop before its next chunk.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the batch result.
    pub async fn wait(self) -> Result<BatchOutcome, OperationError> {
        join(self.task).await?
    }
}

/// Executor for file operations with a unified interface.
#[derive(Debug, Clone, Default)]
pub struct OperationExecutor {
    /// Configuration handed to every batch.
    pub config: BatchConfig,
}

impl OperationExecutor {
    /// Create an executor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor with the given configuration.
    pub fn with_config(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Start a copy batch.
    pub fn copy(&self, sources: Vec<PathBuf>, destination: PathBuf) -> BatchHandle {
        start_batch(
            FileTask::new(self.config.clone()),
            sources,
            destination,
            TransferMode::Copy,
        )
    }

    /// Start a move batch.
    pub fn move_to(&self, sources: Vec<PathBuf>, destination: PathBuf) -> BatchHandle {
        start_batch(
            FileTask::new(self.config.clone()),
            sources,
            destination,
            TransferMode::Move,
        )
    }

    /// Delete paths on the blocking pool, returning those actually deleted.
    pub fn delete(&self, paths: Vec<PathBuf>) -> JoinHandle<Vec<PathBuf>> {
        let task = FileTask::new(self.config.clone());
        tokio::task::spawn_blocking(move || task.delete_paths(&paths))
    }
}

/// Start a copy batch with default settings.
pub fn start_copy(sources: Vec<PathBuf>, destination: PathBuf) -> BatchHandle {
    OperationExecutor::new().copy(sources, destination)
}

/// Start a move batch with default settings.
pub fn start_move(sources: Vec<PathBuf>, destination: PathBuf) -> BatchHandle {
    OperationExecutor::new().move_to(sources, destination)
}

/// Spawn `task` over `sources`, wiring its callback to a channel.
///
/// The task's cancellation token is replaced by one owned by the handle.
pub fn start_batch(
    task: FileTask,
    sources: Vec<PathBuf>,
    destination: PathBuf,
    mode: TransferMode,
) -> BatchHandle {
    let cancel = CancellationToken::new();
    let task = task.with_cancellation(cancel.clone());
    let (callback, events) = ChannelCallback::new();

    let task = tokio::spawn(async move {
        task.process(&sources, &destination, &callback, mode).await
    });

    BatchHandle {
        events,
        cancel,
        task,
    }
}
