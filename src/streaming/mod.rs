//! Core Streaming Types
//!
//! Streams are pull-based: the consumer drives iteration and the producer only
//! does work when polled. None of them can be restarted; resuming requires a
//! fresh call.

use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::error::LlmError;
use crate::types::{ObjectChunk, StreamChunk};

pub use crate::utils::cancel::make_cancellable_stream;

/// Stream of model chunks. Every provider implements streaming by returning this type.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, LlmError>> + Send>>;

/// Stream of partial and final objects produced by `stream_object`.
pub type ObjectStream<T> = Pin<Box<dyn Stream<Item = Result<ObjectChunk<T>, LlmError>> + Send>>;

/// Enforce the single-terminal-chunk invariant on a chunk stream.
///
/// Chunks after the first terminal chunk are dropped. If the inner stream ends
/// without a terminal chunk, a `StreamChunk::Error` is appended. An `Err` item
/// (provider failure, cancellation) is forwarded and ends the stream without a
/// synthesized terminal chunk.
pub fn ensure_single_terminal(stream: ChunkStream) -> ChunkStream {
    let mut inner = stream;
    let s = async_stream::stream! {
        let mut terminated = false;
        while let Some(item) = inner.next().await {
            match item {
                Ok(chunk) => {
                    let terminal = chunk.is_terminal();
                    yield Ok(chunk);
                    if terminal {
                        terminated = true;
                        break;
                    }
                }
                Err(e) => {
                    yield Err(e);
                    terminated = true;
                    break;
                }
            }
        }
        if !terminated {
            tracing::warn!("chunk stream ended without a terminal chunk");
            yield Ok(StreamChunk::error("stream ended without a terminal chunk"));
        }
    };
    Box::pin(s)
}

/// Build a chunk stream from a fixed list of chunks.
pub fn chunk_stream_from(chunks: Vec<StreamChunk>) -> ChunkStream {
    Box::pin(futures::stream::iter(chunks.into_iter().map(Ok)))
}
