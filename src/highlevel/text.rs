//! Text generation facade

use tracing::Instrument;

use crate::error::LlmError;
use crate::streaming::{ChunkStream, ensure_single_terminal, make_cancellable_stream};
use crate::traits::LanguageModel;
use crate::types::{
    CallSettings, ChatMessage, GenerateResult, LanguageModelCallOptions, ResponseFormat,
    ToolChoice, ToolDefinition,
};
use crate::utils::cancel::{CancelHandle, run_cancellable};

/// Options for [`generate_text`] and [`stream_text`].
#[derive(Debug, Clone, Default)]
pub struct GenerateTextOptions {
    /// Prepended as a system message.
    pub system: Option<String>,
    /// Sent as a single user message after `system`.
    pub prompt: Option<String>,
    /// Appended after `system` and `prompt`, in order.
    pub messages: Vec<ChatMessage>,
    pub tools: Option<Vec<ToolDefinition>>,
    pub tool_choice: Option<ToolChoice>,
    pub settings: CallSettings,
    pub response_format: Option<ResponseFormat>,
    pub abort_signal: Option<CancelHandle>,
}

impl GenerateTextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    pub fn settings(mut self, settings: CallSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn cancel(mut self, handle: CancelHandle) -> Self {
        self.abort_signal = Some(handle);
        self
    }

    /// Build the message list: system, then prompt, then `messages`.
    pub fn build_messages(&self) -> Vec<ChatMessage> {
        build_messages(self.system.as_deref(), self.prompt.as_deref(), &self.messages)
    }

    /// Map these options onto model call options.
    pub fn to_call_options(&self) -> Result<LanguageModelCallOptions, LlmError> {
        let mut options = LanguageModelCallOptions::new(self.build_messages())?;
        options.tools = self.tools.clone();
        options.tool_choice = self.tool_choice.clone();
        options.settings = self.settings.clone();
        options.response_format = self.response_format.clone();
        options.abort_signal = self.abort_signal.clone();
        Ok(options)
    }
}

/// Empty `system` and `prompt` strings are treated as absent.
pub(crate) fn build_messages(
    system: Option<&str>,
    prompt: Option<&str>,
    messages: &[ChatMessage],
) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(messages.len() + 2);
    if let Some(system) = system.filter(|s| !s.is_empty()) {
        out.push(ChatMessage::system(system));
    }
    if let Some(prompt) = prompt.filter(|p| !p.is_empty()) {
        out.push(ChatMessage::user(prompt));
    }
    out.extend(messages.iter().cloned());
    out
}

pub(crate) fn call_span(operation: &'static str, model: &dyn LanguageModel) -> tracing::Span {
    tracing::info_span!(
        "unillm.call",
        operation,
        provider = model.provider_id(),
        model = model.model_id(),
        call_id = %uuid::Uuid::new_v4(),
    )
}

/// Generate text with a single model round trip.
pub async fn generate_text(
    model: &dyn LanguageModel,
    options: &GenerateTextOptions,
) -> Result<GenerateResult, LlmError> {
    let call = options.to_call_options()?;
    let span = call_span("generate_text", model);
    async move {
        tracing::debug!(messages = call.messages.len(), "calling model");
        let cancel = call.abort_signal.clone();
        let result = run_cancellable(cancel.as_ref(), model.generate(call)).await?;
        tracing::debug!(finish_reason = ?result.finish_reason, "model call finished");
        Ok(result)
    }
    .instrument(span)
    .await
}

/// Stream text chunks from a model.
///
/// The returned stream ends with exactly one terminal chunk, or with a single
/// `Err` item when the provider fails or the call is cancelled.
pub async fn stream_text(
    model: &dyn LanguageModel,
    options: &GenerateTextOptions,
) -> Result<ChunkStream, LlmError> {
    let call = options.to_call_options()?;
    let span = call_span("stream_text", model);
    async move {
        let cancel = call.abort_signal.clone();
        let stream = run_cancellable(cancel.as_ref(), model.stream(call)).await?;
        tracing::debug!("stream opened");
        let stream = ensure_single_terminal(stream);
        Ok(match cancel {
            Some(cancel) => make_cancellable_stream(stream, cancel),
            None => stream,
        })
    }
    .instrument(span)
    .await
}
