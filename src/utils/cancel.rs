//! Cancellation utilities
//!
//! Provides the cancellation signal threaded through every model call and every
//! stream pull.

use std::future::Future;
use std::pin::Pin;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::LlmError;

/// A handle that can be used to request cancellation.
///
/// Clones share the same signal.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Pending calls fail with `LlmError::Cancelled` and
    /// wrapped streams stop pulling from their source.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// A handle that is cancelled with this one but can also be cancelled alone.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }
}

/// Run `fut` unless `cancel` fires first.
pub async fn run_cancellable<T, F>(cancel: Option<&CancelHandle>, fut: F) -> Result<T, LlmError>
where
    F: Future<Output = Result<T, LlmError>>,
{
    let Some(cancel) = cancel else {
        return fut.await;
    };
    if cancel.is_cancelled() {
        return Err(LlmError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(LlmError::Cancelled),
        out = fut => out,
    }
}

/// Make a stream cancellable.
///
/// Each pull races the inner stream against the signal. Once cancellation is
/// observed the wrapper yields a single `Err(LlmError::Cancelled)` and ends;
/// the inner stream is dropped so providers stop producing tokens.
pub fn make_cancellable_stream<T>(
    stream: Pin<Box<dyn Stream<Item = Result<T, LlmError>> + Send>>,
    cancel: CancelHandle,
) -> Pin<Box<dyn Stream<Item = Result<T, LlmError>> + Send>>
where
    T: Send + 'static,
{
    let mut inner = stream;
    let s = async_stream::stream! {
        loop {
            if cancel.is_cancelled() {
                yield Err(LlmError::Cancelled);
                break;
            }
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                item = inner.next() => Some(item),
            };
            match next {
                None => {
                    yield Err(LlmError::Cancelled);
                    break;
                }
                Some(None) => break,
                Some(Some(item)) => yield item,
            }
        }
    };
    Box::pin(s)
}
