//! Tool calling and function definition types

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Tool definition for function calling.
///
/// `name` must be unique within a single call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema for the tool parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool invocation produced by a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub tool_name: String,
    /// Raw JSON arguments exactly as the model produced them.
    pub arguments: String,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        tool_name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the raw arguments as JSON.
    pub fn arguments_json(&self) -> Result<serde_json::Value, LlmError> {
        Ok(serde_json::from_str(&self.arguments)?)
    }
}

/// Incremental piece of a tool call emitted while streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    /// Position of the tool call within the response.
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments_delta: Option<String>,
}

/// Strategy the model should use when choosing tools.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    /// The model decides.
    #[default]
    Auto,
    /// The model must not call tools.
    None,
    /// The model must call at least one tool.
    Required,
    /// The model must call the named tool.
    Tool { name: String },
}

impl ToolChoice {
    pub fn tool(name: impl Into<String>) -> Self {
        Self::Tool { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_call_arguments_parse() {
        let call = ToolCall::new("call_1", "weather", r#"{"city":"Paris"}"#);
        assert_eq!(call.arguments_json().unwrap(), json!({"city": "Paris"}));
    }

    #[test]
    fn malformed_arguments_are_json_errors() {
        let call = ToolCall::new("call_1", "weather", "{city");
        assert!(matches!(call.arguments_json(), Err(LlmError::JsonError(_))));
    }

    #[test]
    fn tool_choice_serializes_tagged() {
        let v = serde_json::to_value(ToolChoice::tool("Person")).unwrap();
        assert_eq!(v, json!({"type": "tool", "name": "Person"}));
    }
}
