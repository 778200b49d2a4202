//! Structured extraction
//!
//! Turns model text into a typed value: strip incidental markdown fences,
//! parse JSON, align object keys case-insensitively with the target schema and
//! deserialize.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::LlmError;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

// Guards against self-referential `$ref` chains.
const MAX_SCHEMA_DEPTH: usize = 32;

fn strip_once(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix(JSON_FENCE) {
        s = rest;
    } else if let Some(rest) = s.strip_prefix(FENCE) {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix(FENCE) {
        s = rest;
    }
    s.trim()
}

/// Remove a surrounding markdown code fence and whitespace.
///
/// A leading "```json" or "```" and a trailing "```" are dropped, then the
/// text is trimmed. The pass repeats until nothing changes, so
/// `strip_code_fences(strip_code_fences(x)) == strip_code_fences(x)`.
pub fn strip_code_fences(text: &str) -> &str {
    let mut current = text;
    loop {
        let next = strip_once(current);
        if next.len() == current.len() {
            return next;
        }
        current = next;
    }
}

/// Strip fences, parse and deserialize `text` into `T`.
///
/// Object keys that differ from the schema's property names only by ASCII case
/// are renamed before deserialization. Any failure is a `SchemaValidationError`
/// carrying `text` unchanged.
pub fn extract_and_deserialize<T: DeserializeOwned>(
    text: &str,
    schema: &Value,
) -> Result<T, LlmError> {
    let payload = strip_code_fences(text);
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| LlmError::schema_validation(format!("invalid JSON: {e}"), text))?;
    let value = align_keys(value, schema, schema, 0);
    serde_json::from_value(value).map_err(|e| {
        LlmError::schema_validation(format!("does not match the target type: {e}"), text)
    })
}

/// Deserialize tool-call arguments into `T` without any preprocessing.
pub fn deserialize_arguments<T: DeserializeOwned>(arguments: &str) -> Result<T, LlmError> {
    serde_json::from_str(arguments).map_err(|e| {
        LlmError::schema_validation(format!("tool arguments do not match the target type: {e}"), arguments)
    })
}

fn resolve<'a>(schema: &'a Value, root: &'a Value) -> &'a Value {
    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        let target = reference
            .strip_prefix("#/definitions/")
            .map(|name| ("definitions", name))
            .or_else(|| reference.strip_prefix("#/$defs/").map(|name| ("$defs", name)));
        if let Some((section, name)) = target {
            if let Some(found) = root.get(section).and_then(|d| d.get(name)) {
                return found;
            }
        }
        return schema;
    }
    for combinator in ["allOf", "anyOf", "oneOf"] {
        if let Some(variants) = schema.get(combinator).and_then(Value::as_array) {
            if let Some(first) = variants
                .iter()
                .find(|v| v.get("type").and_then(Value::as_str) != Some("null"))
            {
                return first;
            }
        }
    }
    schema
}

/// Rename object keys to the schema's property names, matching ASCII
/// case-insensitively. Exact matches and unknown keys are left alone.
pub fn align_keys(value: Value, schema: &Value, root: &Value, depth: usize) -> Value {
    if depth > MAX_SCHEMA_DEPTH {
        return value;
    }
    let mut schema = schema;
    // Follow reference and combinator indirections to a concrete schema.
    for _ in 0..MAX_SCHEMA_DEPTH {
        let next = resolve(schema, root);
        if std::ptr::eq(next, schema) {
            break;
        }
        schema = next;
    }

    match value {
        Value::Object(map) => {
            let properties = schema.get("properties").and_then(Value::as_object);
            let additional = schema
                .get("additionalProperties")
                .filter(|v| v.is_object());
            let present: Vec<String> = map.keys().cloned().collect();
            let mut out = Map::with_capacity(map.len());
            for (key, v) in map {
                let (name, sub) = match properties {
                    Some(props) if props.contains_key(&key) => (key.clone(), props.get(&key)),
                    Some(props) => match props.iter().find(|(p, _)| p.eq_ignore_ascii_case(&key)) {
                        Some((p, s)) if !present.contains(p) && !out.contains_key(p) => {
                            (p.clone(), Some(s))
                        }
                        _ => (key, additional),
                    },
                    None => (key, additional),
                };
                let v = match sub {
                    Some(s) => align_keys(v, s, root, depth + 1),
                    None => v,
                };
                out.insert(name, v);
            }
            Value::Object(out)
        }
        Value::Array(items) => match schema.get("items").filter(|v| v.is_object()) {
            Some(item_schema) => Value::Array(
                items
                    .into_iter()
                    .map(|v| align_keys(v, item_schema, root, depth + 1))
                    .collect(),
            ),
            None => Value::Array(items),
        },
        other => other,
    }
}
