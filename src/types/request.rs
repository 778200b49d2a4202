//! Model call options
//!
//! `LanguageModelCallOptions` is what a [`LanguageModel`](crate::traits::LanguageModel)
//! receives. It can only be built from a non-empty message list, so an empty
//! prompt is rejected while the options are being constructed rather than inside
//! an adapter.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{ChatMessage, ToolChoice, ToolDefinition};
use crate::error::LlmError;
use crate::utils::cancel::CancelHandle;

/// Sampling and transport settings shared by every call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Extra HTTP headers for the adapter to send.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// Provider-specific passthrough keyed by provider id.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub provider_options: HashMap<String, serde_json::Value>,
}

impl CallSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    pub fn frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    pub fn stop_sequences(mut self, stop: Vec<String>) -> Self {
        self.stop_sequences = Some(stop);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn provider_option(mut self, provider_id: impl Into<String>, value: serde_json::Value) -> Self {
        self.provider_options.insert(provider_id.into(), value);
        self
    }
}

/// Output format hint for adapters with a native JSON mode.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json {
        #[serde(skip_serializing_if = "Option::is_none")]
        schema: Option<serde_json::Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

/// Options handed to a language model for one `generate` or `stream` call.
#[derive(Debug, Clone)]
pub struct LanguageModelCallOptions {
    pub messages: Vec<ChatMessage>,
    pub tools: Option<Vec<ToolDefinition>>,
    pub tool_choice: Option<ToolChoice>,
    pub settings: CallSettings,
    pub response_format: Option<ResponseFormat>,
    /// Cancellation signal for this call.
    pub abort_signal: Option<CancelHandle>,
}

impl LanguageModelCallOptions {
    /// Build options from a message list. Fails with `InvalidPrompt` when empty.
    pub fn new(messages: Vec<ChatMessage>) -> Result<Self, LlmError> {
        if messages.is_empty() {
            return Err(LlmError::InvalidPrompt(
                "a model call requires at least one message".to_string(),
            ));
        }
        Ok(Self {
            messages,
            tools: None,
            tool_choice: None,
            settings: CallSettings::default(),
            response_format: None,
            abort_signal: None,
        })
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    pub fn with_settings(mut self, settings: CallSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn with_abort_signal(mut self, signal: CancelHandle) -> Self {
        self.abort_signal = Some(signal);
        self
    }
}
