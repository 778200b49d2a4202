//! Results returned by language models

use serde::{Deserialize, Serialize};

use super::{FinishReason, ToolCall, Usage, Warning};

/// Result of a single-shot `generate` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub finish_reason: FinishReason,
    /// Always present; individual fields may be unreported.
    pub usage: Usage,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
    /// Finish reason exactly as the vendor reported it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_finish_reason: Option<String>,
}

impl GenerateResult {
    /// A text result that finished with `Stop`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// A result carrying tool calls and `FinishReason::ToolCalls`.
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            finish_reason: FinishReason::ToolCalls,
            tool_calls: calls,
            ..Default::default()
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = reason;
        self
    }

    pub fn with_warning(mut self, warning: Warning) -> Self {
        self.warnings.push(warning);
        self
    }

    /// Response text, or an empty string when the model produced none.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}
