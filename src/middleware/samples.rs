//! Bundled middlewares

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;

use super::language_model::{
    GenerateFn, GenerateFuture, LanguageModelMiddleware, StreamFn, StreamFuture,
};
use crate::error::LlmError;
use crate::types::{CallSettings, LanguageModelCallOptions, StreamChunk};

/// Fill call settings the caller left unset.
///
/// Explicit per-call values always win; headers and provider options are merged
/// key by key with the same rule.
#[derive(Clone, Default)]
pub struct DefaultSettingsMiddleware {
    defaults: CallSettings,
}

impl DefaultSettingsMiddleware {
    pub fn new(defaults: CallSettings) -> Self {
        Self { defaults }
    }
}

impl LanguageModelMiddleware for DefaultSettingsMiddleware {
    fn transform_params(
        &self,
        mut options: LanguageModelCallOptions,
    ) -> Result<LanguageModelCallOptions, LlmError> {
        let d = &self.defaults;
        let s = &mut options.settings;
        s.max_tokens = s.max_tokens.or(d.max_tokens);
        s.temperature = s.temperature.or(d.temperature);
        s.top_p = s.top_p.or(d.top_p);
        s.top_k = s.top_k.or(d.top_k);
        s.presence_penalty = s.presence_penalty.or(d.presence_penalty);
        s.frequency_penalty = s.frequency_penalty.or(d.frequency_penalty);
        if s.stop_sequences.is_none() {
            s.stop_sequences = d.stop_sequences.clone();
        }
        s.seed = s.seed.or(d.seed);
        for (k, v) in &d.headers {
            s.headers.entry(k.clone()).or_insert_with(|| v.clone());
        }
        for (k, v) in &d.provider_options {
            s.provider_options
                .entry(k.clone())
                .or_insert_with(|| v.clone());
        }
        Ok(options)
    }
}

/// Clamp top_p to [0.0, 1.0].
#[derive(Clone, Default)]
pub struct ClampTopPMiddleware;

impl LanguageModelMiddleware for ClampTopPMiddleware {
    fn transform_params(
        &self,
        mut options: LanguageModelCallOptions,
    ) -> Result<LanguageModelCallOptions, LlmError> {
        if let Some(tp) = options.settings.top_p {
            options.settings.top_p = Some(tp.clamp(0.0, 1.0));
        }
        Ok(options)
    }
}

/// Log request summaries, outcomes and durations through `tracing`.
#[derive(Clone)]
pub struct LoggingMiddleware {
    label: Arc<str>,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self::with_label("llm")
    }

    /// Label included in every log line, useful when several chains are active.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: Arc::from(label.into()),
        }
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageModelMiddleware for LoggingMiddleware {
    fn wrap_generate(&self, next: Arc<GenerateFn>) -> Arc<GenerateFn> {
        let label = self.label.clone();
        Arc::new(move |options: LanguageModelCallOptions| -> GenerateFuture {
            let next = next.clone();
            let label = label.clone();
            Box::pin(async move {
                tracing::info!(
                    label = %label,
                    messages = options.messages.len(),
                    tools = options.tools.as_ref().map_or(0, Vec::len),
                    "generate request"
                );
                let start = Instant::now();
                let result = next(options).await;
                let elapsed_ms = start.elapsed().as_millis() as u64;
                match &result {
                    Ok(res) => tracing::info!(
                        label = %label,
                        elapsed_ms,
                        finish_reason = ?res.finish_reason,
                        output_tokens = ?res.usage.output_tokens,
                        "generate finished"
                    ),
                    Err(e) => tracing::warn!(
                        label = %label,
                        elapsed_ms,
                        kind = %e.kind(),
                        error = %e,
                        "generate failed"
                    ),
                }
                result
            })
        })
    }

    fn wrap_stream(&self, next: Arc<StreamFn>) -> Arc<StreamFn> {
        let label = self.label.clone();
        Arc::new(move |options: LanguageModelCallOptions| -> StreamFuture {
            let next = next.clone();
            let label = label.clone();
            Box::pin(async move {
                tracing::info!(
                    label = %label,
                    messages = options.messages.len(),
                    "stream request"
                );
                let start = Instant::now();
                let mut inner = next(options).await?;
                let s = async_stream::stream! {
                    let mut chunks = 0usize;
                    while let Some(item) = inner.next().await {
                        match &item {
                            Ok(StreamChunk::Finish { finish_reason, .. }) => tracing::info!(
                                label = %label,
                                chunks,
                                elapsed_ms = start.elapsed().as_millis() as u64,
                                finish_reason = ?finish_reason,
                                "stream finished"
                            ),
                            Ok(StreamChunk::Error { message }) => tracing::warn!(
                                label = %label,
                                chunks,
                                message = %message,
                                "stream ended with error chunk"
                            ),
                            Ok(_) => chunks += 1,
                            Err(e) => tracing::warn!(
                                label = %label,
                                chunks,
                                kind = %e.kind(),
                                "stream failed"
                            ),
                        }
                        yield item;
                    }
                };
                Ok(Box::pin(s) as crate::streaming::ChunkStream)
            })
        })
    }
}
