//! Error types for copy, move and delete batches.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can end a batch or a single item within it.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Source path vanished or never existed.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The data reached the destination but the source could not be deleted.
    ///
    /// Both copies now exist, so the move did not complete.
    #[error("Copied but failed to remove source {path}: {source}")]
    SourceNotRemoved {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The conflict decision callback itself failed.
    #[error("Conflict callback failed: {message}")]
    ConflictCallback { message: String },

    /// Cannot copy or move a directory into itself.
    #[error("Cannot place {source_path} inside itself at {destination}")]
    DestinationInsideSource {
        source_path: PathBuf,
        destination: PathBuf,
    },

    /// Source has no final path component to reuse at the destination.
    #[error("Source has no file name: {path}")]
    InvalidSource { path: PathBuf },

    /// The batch was cancelled between chunks.
    #[error("Operation cancelled")]
    Cancelled,
}

impl OperationError {
    /// Create an I/O error for a read-side path, mapping well-known kinds.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an I/O error for a write-side path.
    ///
    /// Every kind stays `Io`: a missing destination parent is an I/O failure
    /// of the write, not a vanished source.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether a tree walk may record this error against one file and go on.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. }
                | Self::NotFound { .. }
                | Self::Io { .. }
                | Self::SourceNotRemoved { .. }
        )
    }
}

impl From<CallbackError> for OperationError {
    fn from(err: CallbackError) -> Self {
        Self::ConflictCallback {
            message: err.to_string(),
        }
    }
}

/// Failure reported by a conflict decision callback.
#[derive(Debug, Clone, Error)]
pub enum CallbackError {
    /// Whoever was supposed to answer went away.
    #[error("Conflict prompt closed without an answer")]
    Closed,

    /// The host failed to produce a decision.
    #[error("{message}")]
    Other { message: String },
}

impl CallbackError {
    /// Create a callback error from any message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_maps_kinds() {
        let err = OperationError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, OperationError::PermissionDenied { .. }));

        let err = OperationError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, OperationError::NotFound { .. }));
    }

    #[test]
    fn test_write_keeps_io() {
        let err = OperationError::write(
            "/missing/dir/file",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no parent"),
        );
        assert!(matches!(err, OperationError::Io { .. }));
    }

    #[test]
    fn test_per_file_classification() {
        assert!(OperationError::NotFound { path: "/x".into() }.is_per_file());
        assert!(!OperationError::Cancelled.is_per_file());
        assert!(!OperationError::from(CallbackError::Closed).is_per_file());
    }
}
