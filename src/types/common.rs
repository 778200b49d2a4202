//! Common enums and metadata types used across the library.

use serde::{Deserialize, Serialize};

/// Reason why the model stopped generating tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Completed naturally or hit a stop sequence.
    #[default]
    Stop,
    /// Reached the maximum number of tokens.
    Length,
    /// The model requested tool calls.
    ToolCalls,
    /// Content was filtered due to safety/policy violations.
    ContentFilter,
    /// Anything else; see `raw_finish_reason` on the result.
    Other,
}

/// Token usage reported by a provider.
///
/// Every field is optional: `None` means the vendor did not report it, not zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_input_tokens: Option<u32>,
}

impl Usage {
    /// Usage with input/output counts; the total is derived.
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens: Some(input_tokens),
            output_tokens: Some(output_tokens),
            total_tokens: Some(input_tokens.saturating_add(output_tokens)),
            ..Default::default()
        }
    }

    /// True when the provider reported nothing at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Warning from the model provider
///
/// Warnings indicate non-fatal issues during generation, such as unsupported
/// settings. The generation continues despite warnings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Warning {
    UnsupportedSetting {
        setting: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    UnsupportedTool {
        tool_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    Other {
        message: String,
    },
}

impl Warning {
    pub fn unsupported_setting(
        setting: impl Into<String>,
        details: Option<impl Into<String>>,
    ) -> Self {
        Self::UnsupportedSetting {
            setting: setting.into(),
            details: details.map(|d| d.into()),
        }
    }

    pub fn unsupported_tool(
        tool_name: impl Into<String>,
        details: Option<impl Into<String>>,
    ) -> Self {
        Self::UnsupportedTool {
            tool_name: tool_name.into(),
            details: details.map(|d| d.into()),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_usage_fields_are_not_serialized() {
        let json = serde_json::to_value(Usage::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
        assert!(Usage::default().is_empty());
    }

    #[test]
    fn usage_total_is_derived() {
        let usage = Usage::new(3, 4);
        assert_eq!(usage.total_tokens, Some(7));
        assert!(!usage.is_empty());
    }

    #[test]
    fn usage_total_saturates() {
        let usage = Usage::new(u32::MAX, 5);
        assert_eq!(usage.total_tokens, Some(u32::MAX));
    }

    #[test]
    fn warning_tagging() {
        let w = Warning::unsupported_setting("topK", Some("not supported"));
        let v = serde_json::to_value(&w).unwrap();
        assert_eq!(v["type"], "unsupported-setting");
        assert_eq!(v["setting"], "topK");
    }
}
