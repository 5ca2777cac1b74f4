//! Filesystem work on tokio's blocking pool.

use filetask_core::OperationError;
use tokio::task::JoinHandle;

/// Run `f` on the blocking pool and wait for it.
pub(crate) async fn unblock<F, T>(f: F) -> Result<T, OperationError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    join(tokio::task::spawn_blocking(f)).await
}

/// Wait for a spawned task, resuming its panic if it had one.
///
/// A task that was aborted, for example by runtime shutdown, counts as
/// cancelled.
pub(crate) async fn join<T>(task: JoinHandle<T>) -> Result<T, OperationError> {
    match task.await {
        Ok(value) => Ok(value),
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(OperationError::Cancelled),
    }
}
