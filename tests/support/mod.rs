//! Scripted in-memory models shared by the integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use unillm::error::LlmError;
use unillm::registry::FnProviderFactory;
use unillm::streaming::ChunkStream;
use unillm::traits::LanguageModel;
use unillm::types::{
    FinishReason, GenerateResult, LanguageModelCallOptions, StreamChunk, Usage,
};

/// A model that replays a configured response and records every call.
///
/// Without a configured `generate` response it echoes the content of the last
/// message it receives.
pub struct ScriptedModel {
    provider: String,
    model: String,
    generate: Option<Result<GenerateResult, LlmError>>,
    stream: Vec<Result<StreamChunk, LlmError>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<LanguageModelCallOptions>>,
}

impl ScriptedModel {
    pub fn new(provider: &str, model: &str) -> Self {
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            generate: None,
            stream: Vec::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn echo() -> Self {
        Self::new("scripted", "echo")
    }

    pub fn with_generate(mut self, result: Result<GenerateResult, LlmError>) -> Self {
        self.generate = Some(result);
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.with_generate(Ok(GenerateResult::text(text)))
    }

    pub fn with_stream_items(mut self, items: Vec<Result<StreamChunk, LlmError>>) -> Self {
        self.stream = items;
        self
    }

    /// Stream the given text deltas followed by a `Finish` chunk.
    pub fn with_text_deltas(self, deltas: &[&str], usage: Option<Usage>) -> Self {
        let mut items: Vec<Result<StreamChunk, LlmError>> = deltas
            .iter()
            .map(|d| Ok(StreamChunk::text_delta(*d)))
            .collect();
        items.push(Ok(StreamChunk::finish(FinishReason::Stop, usage)));
        self.with_stream_items(items)
    }

    /// Sleep before answering and between streamed chunks.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<LanguageModelCallOptions> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, options: &LanguageModelCallOptions) {
        self.calls.lock().unwrap().push(options.clone());
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn provider_id(&self) -> &str {
        &self.provider
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        options: LanguageModelCallOptions,
    ) -> Result<GenerateResult, LlmError> {
        self.record(&options);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.generate {
            Some(result) => result.clone(),
            None => {
                let last = options
                    .messages
                    .last()
                    .map(|m| m.content.clone())
                    .unwrap_or_default();
                Ok(GenerateResult::text(last))
            }
        }
    }

    async fn stream(&self, options: LanguageModelCallOptions) -> Result<ChunkStream, LlmError> {
        self.record(&options);
        let items = self.stream.clone();
        let delay = self.delay;
        let s = async_stream::stream! {
            for item in items {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                yield item;
            }
        };
        Ok(Box::pin(s))
    }
}

/// A factory that builds echo models named after the requested model id.
pub fn echo_factory(provider: &'static str) -> Arc<FnProviderFactory> {
    Arc::new(FnProviderFactory::new(provider, move |model_id| {
        let model: Arc<dyn LanguageModel> = Arc::new(ScriptedModel::new(provider, model_id));
        Ok(model)
    }))
}
