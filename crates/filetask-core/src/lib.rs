//! Core types for filetask.
//!
//! This crate provides the data model shared by the copy/move engine and its
//! hosts: conflict decisions, batch results, errors and configuration.

mod config;
mod decision;
mod error;
mod outcome;

pub use config::{
    BatchConfig, BatchConfigBuilder, DEFAULT_CHUNK_SIZE, DeleteMode, MoveCleanup, SizePolicy,
};
pub use decision::{ConflictDecision, ConflictStrategy, TransferMode};
pub use error::{CallbackError, OperationError};
pub use outcome::{BatchOutcome, CopyEntry, SkippedItem};
