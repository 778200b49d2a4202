//! Structured object generation
//!
//! Two strategies reconstruct a typed `T` from a model:
//!
//! - [`ObjectGenerationMode::Json`] (default): the schema for `T` is serialized
//!   into a synthesized system message that replaces any caller system message;
//!   the response text is fence-stripped and deserialized case-insensitively.
//! - [`ObjectGenerationMode::Tool`]: the schema becomes the parameters of a
//!   single tool the model is forced to call; the tool call's raw arguments are
//!   deserialized directly.
//!
//! [`stream_object`] uses the same request construction and reparses the whole
//! accumulated text after every chunk, so each chunk carries the best partial
//! object available at that point.

use std::sync::Arc;

use futures::StreamExt;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::Instrument;

use super::extract::{deserialize_arguments, extract_and_deserialize};
use super::schema::{schema_for, schema_name};
use super::text::{build_messages, call_span};
use crate::error::LlmError;
use crate::streaming::{ObjectStream, ensure_single_terminal, make_cancellable_stream};
use crate::traits::LanguageModel;
use crate::types::{
    CallSettings, ChatMessage, FinishReason, LanguageModelCallOptions, ObjectChunk,
    ResponseFormat, StreamChunk, ToolCall, ToolChoice, ToolDefinition, Usage, Warning,
};
use crate::utils::cancel::{CancelHandle, run_cancellable};

const SCHEMA_INSTRUCTION: &str = "Respond only with a JSON value that conforms to the JSON schema below. \
Do not include explanations or any text outside the JSON value.\n\nJSON schema:\n";

const DEFAULT_TOOL_DESCRIPTION: &str = "Respond by calling this tool with the requested object.";

/// Strategy used to obtain structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectGenerationMode {
    /// Schema instructions in the system message, JSON parsed from the text.
    #[default]
    Json,
    /// Schema as a forced tool, JSON taken from the tool-call arguments.
    Tool,
}

/// Options for [`generate_object`].
#[derive(Debug, Clone, Default)]
pub struct GenerateObjectOptions {
    pub system: Option<String>,
    pub prompt: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub settings: CallSettings,
    pub mode: ObjectGenerationMode,
    /// Explicit schema; derived from `T` when absent.
    pub schema: Option<Value>,
    /// Tool name in tool mode and schema name hint in JSON mode.
    pub schema_name: Option<String>,
    pub schema_description: Option<String>,
    pub abort_signal: Option<CancelHandle>,
}

impl GenerateObjectOptions {
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

    pub fn settings(mut self, settings: CallSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn mode(mut self, mode: ObjectGenerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn schema_name(mut self, name: impl Into<String>) -> Self {
        self.schema_name = Some(name.into());
        self
    }

    pub fn schema_description(mut self, description: impl Into<String>) -> Self {
        self.schema_description = Some(description.into());
        self
    }

    pub fn cancel(mut self, handle: CancelHandle) -> Self {
        self.abort_signal = Some(handle);
        self
    }
}

/// Callback invoked with each non-empty text delta.
pub type DeltaCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Options for [`stream_object`].
#[derive(Clone, Default)]
pub struct StreamObjectOptions {
    pub options: GenerateObjectOptions,
    /// Called synchronously with every non-empty delta, before the matching
    /// chunk is yielded.
    pub on_delta: Option<DeltaCallback>,
}

impl StreamObjectOptions {
    pub fn new(options: GenerateObjectOptions) -> Self {
        Self {
            options,
            on_delta: None,
        }
    }

    pub fn on_delta<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_delta = Some(Arc::new(callback));
        self
    }
}

impl std::fmt::Debug for StreamObjectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamObjectOptions")
            .field("options", &self.options)
            .field("on_delta", &self.on_delta.is_some())
            .finish()
    }
}

/// A typed object plus the diagnostics of the call that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateObjectResult<T> {
    pub object: T,
    /// Response text in JSON mode, tool-call arguments in tool mode.
    pub raw_text: String,
    pub finish_reason: FinishReason,
    pub usage: Usage,
    pub warnings: Vec<Warning>,
}

/// Request and parsing parameters shared by the one-shot and streaming paths.
struct ObjectPlan {
    mode: ObjectGenerationMode,
    schema: Value,
    tool_name: String,
    call: LanguageModelCallOptions,
}

impl ObjectPlan {
    fn build<T: JsonSchema>(options: &GenerateObjectOptions) -> Result<Self, LlmError> {
        let base = build_messages(
            options.system.as_deref(),
            options.prompt.as_deref(),
            &options.messages,
        );
        if base.is_empty() {
            return Err(LlmError::InvalidPrompt(
                "object generation requires a system prompt, a prompt or messages".to_string(),
            ));
        }

        let schema = match &options.schema {
            Some(schema) => schema.clone(),
            None => schema_for::<T>()?,
        };
        let tool_name = options
            .schema_name
            .clone()
            .unwrap_or_else(schema_name::<T>);

        let call = match options.mode {
            ObjectGenerationMode::Json => {
                let rendered = serde_json::to_string_pretty(&schema)?;
                let mut system = String::new();
                if let Some(caller) = options.system.as_deref().filter(|s| !s.is_empty()) {
                    system.push_str(caller);
                    system.push_str("\n\n");
                }
                system.push_str(SCHEMA_INSTRUCTION);
                system.push_str(&rendered);

                let mut messages = Vec::with_capacity(base.len() + 1);
                messages.push(ChatMessage::system(system));
                messages.extend(base.into_iter().filter(|m| !m.is_system()));

                LanguageModelCallOptions::new(messages)?.with_response_format(
                    ResponseFormat::Json {
                        schema: Some(schema.clone()),
                        name: Some(tool_name.clone()),
                        description: options.schema_description.clone(),
                    },
                )
            }
            ObjectGenerationMode::Tool => {
                let description = options
                    .schema_description
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TOOL_DESCRIPTION.to_string());
                LanguageModelCallOptions::new(base)?
                    .with_tools(vec![ToolDefinition::new(
                        tool_name.clone(),
                        description,
                        schema.clone(),
                    )])
                    .with_tool_choice(ToolChoice::tool(tool_name.clone()))
            }
        };

        let mut call = call.with_settings(options.settings.clone());
        call.abort_signal = options.abort_signal.clone();

        Ok(Self {
            mode: options.mode,
            schema,
            tool_name,
            call,
        })
    }

    fn parse<T: DeserializeOwned>(&self, text: &str) -> Result<T, LlmError> {
        match self.mode {
            ObjectGenerationMode::Json => extract_and_deserialize(text, &self.schema),
            ObjectGenerationMode::Tool => deserialize_arguments(text),
        }
    }
}

fn select_tool_call<'a>(calls: &'a [ToolCall], tool_name: &str) -> Result<&'a ToolCall, LlmError> {
    match calls {
        [] => Err(LlmError::tool_invocation(
            Some(tool_name.to_string()),
            format!("expected a call to tool '{tool_name}' but the model made no tool call"),
        )),
        [only] => Ok(only),
        many => {
            tracing::warn!(
                tool = tool_name,
                count = many.len(),
                "model made several tool calls; using the first matching one"
            );
            Ok(many
                .iter()
                .find(|c| c.tool_name == tool_name)
                .unwrap_or(&many[0]))
        }
    }
}

/// Generate a typed object with a single model round trip.
///
/// Fails with `SchemaValidationError` (carrying the raw text) when the output
/// does not deserialize into `T`, and with `ToolInvocationError` when tool
/// mode gets no tool call back.
pub async fn generate_object<T>(
    model: &dyn LanguageModel,
    options: &GenerateObjectOptions,
) -> Result<GenerateObjectResult<T>, LlmError>
where
    T: JsonSchema + DeserializeOwned,
{
    let plan = ObjectPlan::build::<T>(options)?;
    let span = call_span("generate_object", model);
    async move {
        tracing::debug!(mode = ?plan.mode, tool = %plan.tool_name, "calling model");
        let cancel = plan.call.abort_signal.clone();
        let result = run_cancellable(cancel.as_ref(), model.generate(plan.call.clone())).await?;

        let raw_text = match plan.mode {
            ObjectGenerationMode::Json => result.text.clone().unwrap_or_default(),
            ObjectGenerationMode::Tool => select_tool_call(&result.tool_calls, &plan.tool_name)?
                .arguments
                .clone(),
        };
        let object = plan.parse::<T>(&raw_text).inspect_err(|e| {
            tracing::debug!(error = %e, "structured output failed to parse");
        })?;

        Ok(GenerateObjectResult {
            object,
            raw_text,
            finish_reason: result.finish_reason,
            usage: result.usage,
            warnings: result.warnings,
        })
    }
    .instrument(span)
    .await
}

/// Stream a typed object.
///
/// Yields one non-final [`ObjectChunk`] per underlying non-terminal chunk and
/// then exactly one final chunk. Parse failures never fail the stream: partial
/// chunks simply carry no object, and a failed final parse is reported in the
/// final chunk's `error`, as is an underlying stream that ends without a
/// terminal chunk. Provider errors and cancellation end the stream with a
/// single `Err` item and no final chunk.
pub async fn stream_object<T>(
    model: &dyn LanguageModel,
    options: &StreamObjectOptions,
) -> Result<ObjectStream<T>, LlmError>
where
    T: JsonSchema + DeserializeOwned + Send + 'static,
{
    let plan = ObjectPlan::build::<T>(&options.options)?;
    let span = call_span("stream_object", model);
    let cancel = plan.call.abort_signal.clone();
    let opened = async {
        tracing::debug!(mode = ?plan.mode, tool = %plan.tool_name, "opening stream");
        run_cancellable(cancel.as_ref(), model.stream(plan.call.clone())).await
    }
    .instrument(span)
    .await?;
    let mut inner = ensure_single_terminal(opened);
    if let Some(cancel) = cancel {
        inner = make_cancellable_stream(inner, cancel);
    }

    let on_delta = options.on_delta.clone();
    let s = async_stream::stream! {
        let mut accumulated = String::new();
        let mut tool_index: Option<usize> = None;
        let mut usage: Option<Usage> = None;
        let mut stream_error: Option<String> = None;
        let mut failed = false;

        while let Some(item) = inner.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(e);
                    failed = true;
                    break;
                }
            };
            let delta = match (plan.mode, chunk) {
                (_, StreamChunk::Finish { usage: u, .. }) => {
                    usage = u;
                    break;
                }
                (_, StreamChunk::Error { message }) => {
                    stream_error = Some(message);
                    break;
                }
                (ObjectGenerationMode::Json, StreamChunk::TextDelta { text }) => Some(text),
                (ObjectGenerationMode::Tool, StreamChunk::ToolCallDelta(d)) => {
                    let index = *tool_index.get_or_insert(d.index);
                    if index == d.index { d.arguments_delta } else { None }
                }
                _ => None,
            };
            let delta = delta.filter(|d| !d.is_empty());
            if let Some(d) = &delta {
                accumulated.push_str(d);
                if let Some(callback) = &on_delta {
                    callback(d);
                }
            }
            let partial = plan.parse::<T>(&accumulated).ok();
            yield Ok(ObjectChunk::partial(partial, delta, &accumulated));
        }

        if !failed {
            let (object, error) = match plan.parse::<T>(&accumulated) {
                Ok(object) => (Some(object), stream_error),
                Err(e) => (None, Some(stream_error.unwrap_or_else(|| e.to_string()))),
            };
            yield Ok(ObjectChunk::complete(object, accumulated, error, usage));
        }
    };
    Ok(Box::pin(s))
}
