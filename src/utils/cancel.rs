//! Cancellation scope helpers.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Why a scoped call did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    /// The per-call deadline passed.
    TimedOut,
    /// The enclosing scope was cancelled.
    Cancelled,
}

/// Run `fut` until it completes, `timeout` elapses, or `cancel` fires.
///
/// The future is dropped on interruption, which releases whatever it owns
/// (response bodies, child processes spawned with `kill_on_drop`).
pub async fn scoped<F, T>(
    cancel: &CancellationToken,
    timeout: Duration,
    fut: F,
) -> Result<T, Interrupted>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled),
        res = tokio::time::timeout(timeout, fut) => res.map_err(|_| Interrupted::TimedOut),
    }
}

/// Sleep for `delay` unless the scope is cancelled first.
///
/// Returns `false` when cancelled.
pub async fn pause(cancel: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Cancel `token` once `deadline` elapses.
///
/// The watcher exits early if the token is cancelled by someone else.
pub fn cancel_after(token: &CancellationToken, deadline: Duration) {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(deadline) => {
                tracing::debug!("Request deadline of {:?} reached", deadline);
                token.cancel();
            }
        }
    });
}
