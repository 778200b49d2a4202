//! Middleware composition
//!
//! [`wrap_language_model`] turns an inner model plus an ordered middleware list
//! into a new model with the same `generate`/`stream` surface. Both continuation
//! chains are built once, at wrap time, and are immutable afterwards, so one
//! composed model can serve concurrent calls.

use std::sync::Arc;

use async_trait::async_trait;

use super::language_model::{
    GenerateFn, GenerateFuture, LanguageModelMiddleware, StreamFn, StreamFuture,
    apply_model_id_override, apply_provider_id_override, compose_generate, compose_stream,
};
use crate::error::LlmError;
use crate::streaming::{ChunkStream, ensure_single_terminal};
use crate::traits::LanguageModel;
use crate::types::{GenerateResult, LanguageModelCallOptions};

/// A model whose calls pass through a middleware chain.
pub struct WrappedLanguageModel {
    inner: Arc<dyn LanguageModel>,
    provider_id: String,
    model_id: String,
    middleware_count: usize,
    generate_chain: Arc<GenerateFn>,
    stream_chain: Arc<StreamFn>,
}

impl WrappedLanguageModel {
    pub fn new(
        inner: Arc<dyn LanguageModel>,
        middlewares: Vec<Arc<dyn LanguageModelMiddleware>>,
    ) -> Self {
        let provider_id = apply_provider_id_override(&middlewares, inner.provider_id());
        let model_id = apply_model_id_override(&middlewares, inner.model_id());

        let generate_inner = inner.clone();
        let generate_base: Arc<GenerateFn> = Arc::new(move |options: LanguageModelCallOptions| -> GenerateFuture {
            let model = generate_inner.clone();
            Box::pin(async move { model.generate(options).await })
        });

        let stream_inner = inner.clone();
        let stream_base: Arc<StreamFn> = Arc::new(move |options: LanguageModelCallOptions| -> StreamFuture {
            let model = stream_inner.clone();
            Box::pin(async move { model.stream(options).await })
        });

        Self {
            provider_id,
            model_id,
            middleware_count: middlewares.len(),
            generate_chain: compose_generate(generate_base, &middlewares),
            stream_chain: compose_stream(stream_base, &middlewares),
            inner,
        }
    }

    /// The model at the bottom of the chain.
    pub fn inner(&self) -> &Arc<dyn LanguageModel> {
        &self.inner
    }

    pub fn middleware_count(&self) -> usize {
        self.middleware_count
    }
}

#[async_trait]
impl LanguageModel for WrappedLanguageModel {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn specification_version(&self) -> &str {
        self.inner.specification_version()
    }

    async fn supported_urls(
        &self,
    ) -> Result<std::collections::HashMap<String, Vec<regex::Regex>>, LlmError> {
        self.inner.supported_urls().await
    }

    async fn generate(
        &self,
        options: LanguageModelCallOptions,
    ) -> Result<GenerateResult, LlmError> {
        (self.generate_chain)(options).await
    }

    async fn stream(&self, options: LanguageModelCallOptions) -> Result<ChunkStream, LlmError> {
        let stream = (self.stream_chain)(options).await?;
        Ok(ensure_single_terminal(stream))
    }
}

/// Wrap `model` with `middlewares`. The first middleware is the outermost layer.
///
/// An empty list returns the model unchanged.
pub fn wrap_language_model(
    model: Arc<dyn LanguageModel>,
    middlewares: Vec<Arc<dyn LanguageModelMiddleware>>,
) -> Arc<dyn LanguageModel> {
    if middlewares.is_empty() {
        return model;
    }
    tracing::debug!(
        provider = model.provider_id(),
        model = model.model_id(),
        middlewares = middlewares.len(),
        "wrapping language model"
    );
    Arc::new(WrappedLanguageModel::new(model, middlewares))
}
