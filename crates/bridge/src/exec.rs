//! Cancellation-aware execution of platform calls that have no native
//! abort. The call runs as a detached task racing the caller's
//! cancellation signal; exactly one outcome is ever surfaced.

use std::future::Future;

use {thiserror::Error, tokio_util::sync::CancellationToken, tracing::debug};

/// Why a raced call produced no result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaceError {
    /// The caller's cancellation fired before the call finished. The
    /// call keeps running in the background; its eventual outcome is
    /// discarded.
    #[error("invocation canceled")]
    Canceled,

    /// The background task did not run to completion (panic).
    #[error("background call failed: {0}")]
    Join(String),
}

/// Race a non-cancellable call against a cancellation signal.
///
/// The call is spawned as an independent task. If it finishes first, its
/// output is returned. If the cancellation fires first, `Canceled` is
/// returned immediately and the task is left running to completion — a
/// deliberate bounded background cost in exchange for caller
/// responsiveness; the task is never force-killed.
pub async fn race_cancel<T, F>(cancel: &CancellationToken, call: F) -> Result<T, RaceError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let mut handle = tokio::spawn(call);
    tokio::select! {
        res = &mut handle => res.map_err(|e| RaceError::Join(e.to_string())),
        _ = cancel.cancelled() => {
            debug!("cancellation won the race, call continues in background");
            Err(RaceError::Canceled)
        },
    }
}
