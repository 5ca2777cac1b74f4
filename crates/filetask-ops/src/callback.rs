//! Host callbacks: progress sink and conflict decisions.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};

use filetask_core::{CallbackError, ConflictDecision};
use tokio::sync::{mpsc, oneshot};

/// Interface a host implements to drive a batch.
///
/// `on_progress` is called synchronously from the copy loop and must return
/// quickly. `file_conflict` may suspend for as long as it likes; the batch
/// waits for it without a timeout.
pub trait FileOperationCallback: Send + Sync {
    /// Batch-wide progress, 0 to 100.
    fn on_progress(&self, percent: u8);

    /// Decide what to do with `source`, whose destination already exists.
    fn file_conflict(
        &self,
        source: &Path,
    ) -> impl Future<Output = Result<ConflictDecision, CallbackError>> + Send;
}

/// Event sent by a batch running behind a [`ChannelCallback`].
#[derive(Debug)]
pub enum BatchEvent {
    /// Batch-wide progress changed.
    Progress(u8),
    /// A conflict needs an answer before the batch can go on.
    Conflict(ConflictRequest),
}

/// A pending conflict question.
///
/// Dropping the request without answering fails the batch with a
/// conflict callback error.
#[derive(Debug)]
pub struct ConflictRequest {
    /// The source item whose destination already exists.
    pub source: PathBuf,
    reply: oneshot::Sender<ConflictDecision>,
}

impl ConflictRequest {
    /// Send the decision back to the waiting batch.
    pub fn answer(self, decision: ConflictDecision) {
        // The batch may have been cancelled in the meantime.
        let _ = self.reply.send(decision);
    }
}

/// Callback that forwards everything over a channel.
///
/// Progress events are only sent when the percentage changes.
#[derive(Debug)]
pub struct ChannelCallback {
    tx: mpsc::UnboundedSender<BatchEvent>,
    last_percent: AtomicU8,
}

impl ChannelCallback {
    /// Create a callback and the receiver for its events.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BatchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let callback = Self {
            tx,
            last_percent: AtomicU8::new(u8::MAX),
        };
        (callback, rx)
    }
}

impl FileOperationCallback for ChannelCallback {
    fn on_progress(&self, percent: u8) {
        if self.last_percent.swap(percent, Ordering::Relaxed) != percent {
            let _ = self.tx.send(BatchEvent::Progress(percent));
        }
    }

    async fn file_conflict(&self, source: &Path) -> Result<ConflictDecision, CallbackError> {
        let (reply, answer) = oneshot::channel();
        let request = ConflictRequest {
            source: source.to_path_buf(),
            reply,
        };
        self.tx
            .send(BatchEvent::Conflict(request))
            .map_err(|_| CallbackError::Closed)?;
        answer.await.map_err(|_| CallbackError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use filetask_core::ConflictStrategy;

    #[test]
    fn test_progress_is_deduplicated() {
        let (callback, mut rx) = ChannelCallback::new();
        callback.on_progress(10);
        callback.on_progress(10);
        callback.on_progress(20);

        assert!(matches!(rx.try_recv(), Ok(BatchEvent::Progress(10))));
        assert!(matches!(rx.try_recv(), Ok(BatchEvent::Progress(20))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_conflict_round_trip() {
        let (callback, mut rx) = ChannelCallback::new();

        let responder = tokio::spawn(async move {
            match rx.recv().await {
                Some(BatchEvent::Conflict(request)) => {
                    assert_eq!(request.source, PathBuf::from("/src/a.txt"));
                    request.answer(ConflictDecision::always(ConflictStrategy::Skip));
                }
                other => panic!("unexpected event: {other:?}"),
            }
        });

        let decision = callback.file_conflict(Path::new("/src/a.txt")).await.unwrap();
        assert_eq!(decision, ConflictDecision::always(ConflictStrategy::Skip));
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_request_is_an_error() {
        let (callback, mut rx) = ChannelCallback::new();

        let responder = tokio::spawn(async move {
            // Receive and drop without answering.
            let _ = rx.recv().await;
        });

        let result = callback.file_conflict(Path::new("/src/a.txt")).await;
        assert!(matches!(result, Err(CallbackError::Closed)));
        responder.await.unwrap();
    }
}
