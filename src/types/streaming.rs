//! Streamed chunk types

use serde::{Deserialize, Serialize};

use super::{FinishReason, ToolCallDelta, Usage};

/// One increment of a streamed model response.
///
/// A well-formed stream is any number of `TextDelta`/`ToolCallDelta` chunks
/// followed by exactly one terminal chunk (`Finish` or `Error`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamChunk {
    TextDelta {
        text: String,
    },
    ToolCallDelta(ToolCallDelta),
    Finish {
        finish_reason: FinishReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },
    Error {
        message: String,
    },
}

impl StreamChunk {
    pub fn text_delta(text: impl Into<String>) -> Self {
        Self::TextDelta { text: text.into() }
    }

    pub fn finish(finish_reason: FinishReason, usage: Option<Usage>) -> Self {
        Self::Finish {
            finish_reason,
            usage,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Whether this chunk ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finish { .. } | Self::Error { .. })
    }

    /// Text carried by a `TextDelta` chunk.
    pub fn as_text_delta(&self) -> Option<&str> {
        match self {
            Self::TextDelta { text } => Some(text),
            _ => None,
        }
    }
}

/// Incremental view of an object being generated by `stream_object`.
///
/// Every call yields zero or more chunks with `is_complete == false` followed by
/// exactly one chunk with `is_complete == true`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectChunk<T> {
    /// Best-effort parse of the accumulated text, `None` while it is not valid yet.
    pub object: Option<T>,
    /// The delta that produced this chunk, if any.
    pub delta: Option<String>,
    /// Concatenation of every delta observed so far.
    pub accumulated_text: String,
    pub is_complete: bool,
    /// Only set on the terminal chunk when the final parse or the stream failed.
    pub error: Option<String>,
    pub usage: Option<Usage>,
}

impl<T> ObjectChunk<T> {
    pub(crate) fn partial(object: Option<T>, delta: Option<String>, accumulated_text: &str) -> Self {
        Self {
            object,
            delta,
            accumulated_text: accumulated_text.to_string(),
            is_complete: false,
            error: None,
            usage: None,
        }
    }

    pub(crate) fn complete(
        object: Option<T>,
        accumulated_text: String,
        error: Option<String>,
        usage: Option<Usage>,
    ) -> Self {
        Self {
            object,
            delta: None,
            accumulated_text,
            is_complete: true,
            error,
            usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_chunks() {
        assert!(StreamChunk::finish(FinishReason::Stop, None).is_terminal());
        assert!(StreamChunk::error("boom").is_terminal());
        assert!(!StreamChunk::text_delta("hi").is_terminal());
    }

    #[test]
    fn chunk_wire_shape() {
        let v = serde_json::to_value(StreamChunk::text_delta("hi")).unwrap();
        assert_eq!(v, serde_json::json!({"type": "text_delta", "text": "hi"}));
    }
}
