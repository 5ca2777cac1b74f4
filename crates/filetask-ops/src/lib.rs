//! Copy/move/delete engine for filetask.
//!
//! This crate performs recursive copy, move and delete batches with
//! byte-accurate progress across the whole batch and per-item conflict
//! resolution through a host callback whose answer can stick for the rest of
//! the batch.

mod batch;
mod blocking;
mod callback;
mod conflict;
mod copy;
mod delete;
mod executor;
mod mime;
mod progress;
mod size;
mod tree;

pub use batch::FileTask;
pub use callback::{BatchEvent, ChannelCallback, ConflictRequest, FileOperationCallback};
pub use conflict::{ConflictResolver, unique_dir_path, unique_path};
pub use copy::{CopyEngine, StreamError};
pub use delete::{Deletion, delete_all, delete_existing, delete_path};
pub use executor::{BatchHandle, OperationExecutor, start_batch, start_copy, start_move};
pub use mime::{GuessMime, MimeLookup, NoMime, enrich};
pub use progress::ProgressState;
pub use size::total_size;
pub use tree::{TreeEvent, TreeReport, TreeWalk, relocate};

pub use filetask_core::{
    BatchConfig, BatchOutcome, CallbackError, ConflictDecision, ConflictStrategy, CopyEntry,
    DeleteMode, MoveCleanup, OperationError, SizePolicy, SkippedItem, TransferMode,
};
