//! Language-model-level middleware
//!
//! A middleware intercepts `generate` and `stream` calls of a wrapped model.
//! The around-style hooks (`wrap_generate`, `wrap_stream`) receive the next
//! continuation in the chain and return a new continuation; the remaining hooks
//! are shortcuts for the common cases and run at the middleware's own position
//! in the chain.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::LlmError;
use crate::streaming::ChunkStream;
use crate::types::{GenerateResult, LanguageModelCallOptions, StreamChunk};

pub type GenerateFuture = BoxFuture<'static, Result<GenerateResult, LlmError>>;
pub type StreamFuture = BoxFuture<'static, Result<ChunkStream, LlmError>>;

/// Continuation for single-shot calls.
pub type GenerateFn = dyn Fn(LanguageModelCallOptions) -> GenerateFuture + Send + Sync;

/// Continuation for streaming calls.
pub type StreamFn = dyn Fn(LanguageModelCallOptions) -> StreamFuture + Send + Sync;

/// Model-level middleware.
///
/// Implementations are shared across concurrent calls of the same composed
/// model. Per-call state must live inside the returned continuation's future,
/// not on the middleware value, unless the middleware synchronizes it.
pub trait LanguageModelMiddleware: Send + Sync {
    /// Transform call options before they reach the rest of the chain.
    fn transform_params(
        &self,
        options: LanguageModelCallOptions,
    ) -> Result<LanguageModelCallOptions, LlmError> {
        Ok(options)
    }

    /// Around-style wrapper for single-shot calls. Default: passthrough.
    fn wrap_generate(&self, next: Arc<GenerateFn>) -> Arc<GenerateFn> {
        next
    }

    /// Around-style wrapper for streaming calls. Default: passthrough.
    fn wrap_stream(&self, next: Arc<StreamFn>) -> Arc<StreamFn> {
        next
    }

    /// Post-process a single-shot result on its way back out.
    fn post_generate(&self, result: GenerateResult) -> Result<GenerateResult, LlmError> {
        Ok(result)
    }

    /// Intercept a single stream chunk on its way back out. May return zero or
    /// more chunks; must not emit anything after a terminal chunk.
    fn on_stream_chunk(&self, chunk: StreamChunk) -> Result<Vec<StreamChunk>, LlmError> {
        Ok(vec![chunk])
    }

    /// Optional provider id override reported by the composed model.
    fn override_provider_id(&self, _current: &str) -> Option<String> {
        None
    }

    /// Optional model id override reported by the composed model.
    fn override_model_id(&self, _current: &str) -> Option<String> {
        None
    }
}

/// Resolve the provider id after applying overrides (first override wins).
pub fn apply_provider_id_override(
    middlewares: &[Arc<dyn LanguageModelMiddleware>],
    current: &str,
) -> String {
    middlewares
        .iter()
        .find_map(|mw| mw.override_provider_id(current))
        .unwrap_or_else(|| current.to_string())
}

/// Resolve the model id after applying overrides (first override wins).
pub fn apply_model_id_override(
    middlewares: &[Arc<dyn LanguageModelMiddleware>],
    current: &str,
) -> String {
    middlewares
        .iter()
        .find_map(|mw| mw.override_model_id(current))
        .unwrap_or_else(|| current.to_string())
}

/// Build the outermost single-shot continuation.
///
/// The list is folded in reverse, so the first middleware becomes the outermost
/// layer and runs first.
pub fn compose_generate(
    base: Arc<GenerateFn>,
    middlewares: &[Arc<dyn LanguageModelMiddleware>],
) -> Arc<GenerateFn> {
    middlewares
        .iter()
        .rev()
        .fold(base, |next, mw| generate_layer(mw.clone(), next))
}

/// Build the outermost streaming continuation. Same ordering as [`compose_generate`].
pub fn compose_stream(
    base: Arc<StreamFn>,
    middlewares: &[Arc<dyn LanguageModelMiddleware>],
) -> Arc<StreamFn> {
    middlewares
        .iter()
        .rev()
        .fold(base, |next, mw| stream_layer(mw.clone(), next))
}

fn generate_layer(mw: Arc<dyn LanguageModelMiddleware>, next: Arc<GenerateFn>) -> Arc<GenerateFn> {
    let wrapped = mw.wrap_generate(next);
    Arc::new(move |options: LanguageModelCallOptions| -> GenerateFuture {
        let mw = mw.clone();
        let wrapped = wrapped.clone();
        Box::pin(async move {
            let options = mw.transform_params(options)?;
            let result = wrapped(options).await?;
            mw.post_generate(result)
        })
    })
}

fn stream_layer(mw: Arc<dyn LanguageModelMiddleware>, next: Arc<StreamFn>) -> Arc<StreamFn> {
    let wrapped = mw.wrap_stream(next);
    Arc::new(move |options: LanguageModelCallOptions| -> StreamFuture {
        let mw = mw.clone();
        let wrapped = wrapped.clone();
        Box::pin(async move {
            let options = mw.transform_params(options)?;
            let stream = wrapped(options).await?;
            Ok(map_stream_chunks(mw, stream))
        })
    })
}

fn map_stream_chunks(mw: Arc<dyn LanguageModelMiddleware>, stream: ChunkStream) -> ChunkStream {
    let mut inner = stream;
    let s = async_stream::stream! {
        use futures::StreamExt;
        'outer: while let Some(item) = inner.next().await {
            match item {
                Ok(chunk) => match mw.on_stream_chunk(chunk) {
                    Ok(produced) => {
                        for c in produced {
                            let terminal = c.is_terminal();
                            yield Ok(c);
                            if terminal {
                                break 'outer;
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                },
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
        }
    };
    Box::pin(s)
}
