//! Tool execution helpers

use std::sync::Arc;

use crate::error::LlmError;
use crate::traits::ToolExecutor;
use crate::types::{ChatMessage, ToolCall, ToolDefinition};

/// Definitions for a set of executors, in order.
pub fn tool_definitions(executors: &[Arc<dyn ToolExecutor>]) -> Vec<ToolDefinition> {
    executors.iter().map(|e| e.definition()).collect()
}

/// Run every call against the executor with the matching name.
///
/// Returns one Tool-role message per call, in call order, named by the call id
/// so the next request can correlate results. Stops at the first failure.
pub async fn execute_tool_calls(
    executors: &[Arc<dyn ToolExecutor>],
    calls: &[ToolCall],
) -> Result<Vec<ChatMessage>, LlmError> {
    let mut messages = Vec::with_capacity(calls.len());
    for call in calls {
        let executor = executors
            .iter()
            .find(|e| e.name() == call.tool_name)
            .ok_or_else(|| {
                LlmError::tool_invocation(
                    Some(call.tool_name.clone()),
                    format!("no executor registered for tool '{}'", call.tool_name),
                )
            })?;
        let arguments = call.arguments_json().map_err(|e| {
            LlmError::tool_invocation(
                Some(call.tool_name.clone()),
                format!("malformed arguments for call '{}': {e}", call.id),
            )
        })?;
        tracing::debug!(tool = %call.tool_name, call_id = %call.id, "executing tool call");
        let output = executor.execute(arguments).await?;
        messages.push(ChatMessage::tool(call.id.clone(), output.into_content()));
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ToolOutput;
    use crate::types::MessageRole;
    use async_trait::async_trait;
    use serde_json::json;

    struct Add;

    #[async_trait]
    impl ToolExecutor for Add {
        fn name(&self) -> &str {
            "add"
        }
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(
                "add",
                "Add two numbers",
                json!({"type": "object", "properties": {"a": {"type": "number"}, "b": {"type": "number"}}}),
            )
        }
        async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, LlmError> {
            let a = arguments["a"].as_f64().unwrap_or_default();
            let b = arguments["b"].as_f64().unwrap_or_default();
            Ok(ToolOutput::Json(json!({"sum": a + b})))
        }
    }

    fn executors() -> Vec<Arc<dyn ToolExecutor>> {
        vec![Arc::new(Add)]
    }

    #[tokio::test]
    async fn results_are_tool_messages_named_by_call_id() {
        let calls = vec![ToolCall::new("call_1", "add", r#"{"a":1,"b":2}"#)];
        let out = execute_tool_calls(&executors(), &calls).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].role, MessageRole::Tool);
        assert_eq!(out[0].name.as_deref(), Some("call_1"));
        assert_eq!(out[0].content, r#"{"sum":3.0}"#);
    }

    #[tokio::test]
    async fn unknown_tool_and_bad_arguments_fail() {
        let err = execute_tool_calls(&executors(), &[ToolCall::new("1", "mul", "{}")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ToolInvocationError { .. }));

        let err = execute_tool_calls(&executors(), &[ToolCall::new("1", "add", "{oops")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ToolInvocationError { .. }));
    }

    #[test]
    fn definitions_follow_executor_order() {
        let defs = tool_definitions(&executors());
        assert_eq!(defs[0].name, "add");
    }
}
