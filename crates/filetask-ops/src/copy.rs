//! Chunked streaming copy with batch-wide progress and cancellation.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use filetask_core::{OperationError, TransferMode};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::progress::ProgressState;

/// Why a stream copy stopped early.
#[derive(Debug)]
pub enum StreamError {
    /// Reading the source failed.
    Read(io::Error),
    /// Writing the destination failed.
    Write(io::Error),
    /// Cancellation was requested between chunks.
    Cancelled,
}

/// Streams file content while accounting progress for the whole batch.
///
/// One engine lives for one batch: it owns the batch [`ProgressState`] and a
/// reusable chunk buffer.
pub struct CopyEngine {
    progress: ProgressState,
    buffer: Vec<u8>,
    cancel: CancellationToken,
}

impl CopyEngine {
    /// Create an engine for a batch of `bytes_total` bytes.
    pub fn new(bytes_total: u64, chunk_size: usize, cancel: CancellationToken) -> Self {
        Self {
            progress: ProgressState::new(bytes_total),
            buffer: vec![0u8; chunk_size.max(1)],
            cancel,
        }
    }

    /// Current batch progress.
    pub fn progress(&self) -> ProgressState {
        self.progress
    }

    /// Copy `reader` into `writer` chunk by chunk.
    ///
    /// `on_progress` receives the batch percentage after every chunk. A
    /// stream that yields no chunk at all still reports once. Cancellation is
    /// checked before each chunk; whatever was written so far stays written.
    pub fn copy_stream<R, W>(
        &mut self,
        reader: &mut R,
        writer: &mut W,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<u64, StreamError>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let mut copied = 0u64;
        let mut chunks = 0usize;

        loop {
            if self.cancel.is_cancelled() {
                return Err(StreamError::Cancelled);
            }

            let read = match reader.read(&mut self.buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(StreamError::Read(e)),
            };

            writer
                .write_all(&self.buffer[..read])
                .map_err(StreamError::Write)?;

            copied += read as u64;
            chunks += 1;
            self.progress.add(read as u64);
            on_progress(self.progress.percentage());
        }

        if chunks == 0 {
            on_progress(self.progress.percentage());
        }

        writer.flush().map_err(StreamError::Write)?;
        Ok(copied)
    }

    /// Copy or move one file to `target`, which is created or truncated.
    ///
    /// The target's parent directory must already exist. Sources that are
    /// not regular files after following symlinks (directories, FIFOs,
    /// devices) fail with `Io` before the target is touched. Under
    /// [`TransferMode::Move`] the source is deleted only after a complete
    /// copy; if that fails the data exists twice and the item fails with
    /// [`OperationError::SourceNotRemoved`].
    pub fn transfer(
        &mut self,
        source: &Path,
        target: &Path,
        mode: TransferMode,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<u64, OperationError> {
        let metadata = fs::metadata(source).map_err(|e| OperationError::io(source, e))?;
        if !metadata.is_file() {
            return Err(OperationError::io(
                source,
                io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        if is_same_file(source, target) {
            // Writing a file onto itself would truncate it first.
            debug!(path = %source.display(), "source and target are the same file");
            self.progress.add(metadata.len());
            on_progress(self.progress.percentage());
            return Ok(0);
        }

        debug!(
            source = %source.display(),
            target = %target.display(),
            %mode,
            "transferring file"
        );

        let copied = {
            let mut input = File::open(source).map_err(|e| OperationError::io(source, e))?;
            let mut output = File::create(target).map_err(|e| OperationError::write(target, e))?;

            self.copy_stream(&mut input, &mut output, on_progress)
                .map_err(|e| match e {
                    StreamError::Read(e) => OperationError::io(source, e),
                    StreamError::Write(e) => OperationError::write(target, e),
                    StreamError::Cancelled => OperationError::Cancelled,
                })?
        };

        if mode.is_move() {
            fs::remove_file(source).map_err(|e| OperationError::SourceNotRemoved {
                path: source.to_path_buf(),
                source: e,
            })?;
        }

        Ok(copied)
    }
}

/// Check if both paths resolve to the same existing file.
fn is_same_file(source: &Path, target: &Path) -> bool {
    match (fs::canonicalize(source), fs::canonicalize(target)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use tempfile::TempDir;

    #[test]
    fn test_copy_stream_reports_per_chunk() {
        let mut engine = CopyEngine::new(10, 4, CancellationToken::new());
        let mut reader = Cursor::new(vec![7u8; 10]);
        let mut writer: Vec<u8> = Vec::new();
        let mut reports = Vec::new();

        let copied = engine
            .copy_stream(&mut reader, &mut writer, &mut |p| reports.push(p))
            .unwrap();

        assert_eq!(copied, 10);
        assert_eq!(writer, vec![7u8; 10]);
        assert_eq!(reports, vec![40, 80, 100]);
    }

    #[test]
    fn test_copy_stream_accumulates_across_files() {
        let mut engine = CopyEngine::new(8, 1024, CancellationToken::new());
        let mut reports = Vec::new();

        for _ in 0..2 {
            let mut reader = Cursor::new(vec![1u8; 4]);
            let mut writer: Vec<u8> = Vec::new();
            engine
                .copy_stream(&mut reader, &mut writer, &mut |p| reports.push(p))
                .unwrap();
        }

        assert_eq!(reports, vec![50, 100]);
        assert_eq!(engine.progress().bytes_copied(), 8);
    }

    #[test]
    fn test_empty_stream_with_zero_total_reports_done() {
        let mut engine = CopyEngine::new(0, 16, CancellationToken::new());
        let mut reports = Vec::new();

        engine
            .copy_stream(&mut Cursor::new(Vec::<u8>::new()), &mut Vec::<u8>::new(), &mut |p| {
                reports.push(p)
            })
            .unwrap();

        assert_eq!(reports, vec![100]);
    }

    #[test]
    fn test_cancelled_before_first_chunk() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut engine = CopyEngine::new(4, 2, cancel);
        let mut writer: Vec<u8> = Vec::new();

        let result = engine.copy_stream(&mut Cursor::new(vec![0u8; 4]), &mut writer, &mut |_| {});
        assert!(matches!(result, Err(StreamError::Cancelled)));
        assert!(writer.is_empty());
    }

    #[test]
    fn test_transfer_move_removes_source() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.bin");
        let target = temp.path().join("b.bin");
        fs::write(&source, b"hello").unwrap();

        let mut engine = CopyEngine::new(5, 2, CancellationToken::new());
        let copied = engine
            .transfer(&source, &target, TransferMode::Move, &mut |_| {})
            .unwrap();

        assert_eq!(copied, 5);
        assert!(!source.exists());
        assert_eq!(fs::read(&target).unwrap(), b"hello");
    }

    #[test]
    fn test_transfer_overwrites_existing_target() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("new.txt");
        let target = temp.path().join("old.txt");
        fs::write(&source, b"new").unwrap();
        fs::write(&target, b"previous content").unwrap();

        let mut engine = CopyEngine::new(3, 64, CancellationToken::new());
        engine
            .transfer(&source, &target, TransferMode::Copy, &mut |_| {})
            .unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new");
        assert!(source.exists());
    }

    #[test]
    fn test_transfer_onto_itself_keeps_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("same.txt");
        fs::write(&path, b"keep me").unwrap();

        let mut engine = CopyEngine::new(7, 64, CancellationToken::new());
        let mut reports = Vec::new();
        engine
            .transfer(&path, &path, TransferMode::Move, &mut |p| reports.push(p))
            .unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"keep me");
        assert_eq!(reports, vec![100]);
    }

    #[test]
    fn test_transfer_missing_source() {
        let temp = TempDir::new().unwrap();
        let mut engine = CopyEngine::new(0, 64, CancellationToken::new());

        let result = engine.transfer(
            &temp.path().join("gone"),
            &temp.path().join("target"),
            TransferMode::Copy,
            &mut |_| {},
        );
        assert!(matches!(result, Err(OperationError::NotFound { .. })));
    }

    #[test]
    fn test_transfer_missing_target_parent() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.txt");
        fs::write(&source, b"a").unwrap();
        let mut engine = CopyEngine::new(1, 64, CancellationToken::new());

        let result = engine.transfer(
            &source,
            &temp.path().join("no/such/dir/a.txt"),
            TransferMode::Move,
            &mut |_| {},
        );
        assert!(matches!(result, Err(OperationError::Io { .. })));
        assert!(source.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_transfer_rejects_directory_symlink() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("dir");
        fs::create_dir(&dir).unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&dir, &link).unwrap();
        let target = temp.path().join("copy");

        let mut engine = CopyEngine::new(0, 64, CancellationToken::new());
        let result = engine.transfer(&link, &target, TransferMode::Copy, &mut |_| {});

        assert!(matches!(result, Err(OperationError::Io { .. })));
        assert!(!target.exists());
    }
}
