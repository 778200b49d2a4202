//! Schema generation for structured output

use schemars::JsonSchema;
use serde_json::Value;

use crate::error::LlmError;

/// JSON schema document for `T`.
pub fn schema_for<T: JsonSchema>() -> Result<Value, LlmError> {
    serde_json::to_value(schemars::schema_for!(T))
        .map_err(|e| LlmError::InternalError(format!("failed to serialize schema: {e}")))
}

/// Name schemars assigns to `T`; the default tool name in tool mode.
pub fn schema_name<T: JsonSchema>() -> String {
    T::schema_name()
}
