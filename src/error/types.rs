//! Error taxonomy
//!
//! Errors raised by the orchestration layer itself (`InvalidPrompt`,
//! `ConfigurationError`, `ToolInvocationError`, `SchemaValidationError`) are
//! distinguished from errors raised by vendor adapters (`ProviderError`), which
//! the core hands back to callers exactly as the adapter produced them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for all unillm operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// No usable prompt or messages could be built from the caller's input.
    /// Raised before any model is contacted.
    #[error("Invalid prompt: {0}")]
    InvalidPrompt(String),

    /// Registry or option misconfiguration (unknown provider, malformed model id, ...).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A tool call was expected but missing, or a tool could not be invoked.
    #[error("Tool invocation error: {message}")]
    ToolInvocationError {
        tool_name: Option<String>,
        message: String,
    },

    /// Extracted text could not be deserialized into the requested type.
    #[error("Schema validation error: {message}")]
    SchemaValidationError {
        message: String,
        /// The text that failed to parse.
        raw_text: String,
    },

    /// Failure reported by a vendor adapter (network, auth, rate limit, policy).
    #[error("Provider error ({provider}): {message}")]
    ProviderError {
        provider: String,
        message: String,
        status_code: Option<u16>,
        code: Option<String>,
    },

    /// The call was cancelled through its cancel handle.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Explicit error-kind discriminant.
///
/// Compare kinds by equality instead of matching on variant payloads; the
/// value also serializes to a stable snake_case tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidPrompt,
    Configuration,
    ToolInvocation,
    SchemaValidation,
    Provider,
    Cancelled,
    Stream,
    Json,
    Unsupported,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPrompt => "invalid_prompt",
            Self::Configuration => "configuration",
            Self::ToolInvocation => "tool_invocation",
            Self::SchemaValidation => "schema_validation",
            Self::Provider => "provider",
            Self::Cancelled => "cancelled",
            Self::Stream => "stream",
            Self::Json => "json",
            Self::Unsupported => "unsupported",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LlmError {
    /// Create a provider error with just a provider id and message.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderError {
            provider: provider.into(),
            message: message.into(),
            status_code: None,
            code: None,
        }
    }

    /// Create a provider error carrying the vendor's HTTP status and error code.
    pub fn provider_with_status(
        provider: impl Into<String>,
        message: impl Into<String>,
        status_code: u16,
        code: Option<String>,
    ) -> Self {
        Self::ProviderError {
            provider: provider.into(),
            message: message.into(),
            status_code: Some(status_code),
            code,
        }
    }

    pub fn tool_invocation(tool_name: Option<String>, message: impl Into<String>) -> Self {
        Self::ToolInvocationError {
            tool_name,
            message: message.into(),
        }
    }

    pub fn schema_validation(message: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self::SchemaValidationError {
            message: message.into(),
            raw_text: raw_text.into(),
        }
    }

    /// The error-kind discriminant for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPrompt(_) => ErrorKind::InvalidPrompt,
            Self::ConfigurationError(_) => ErrorKind::Configuration,
            Self::ToolInvocationError { .. } => ErrorKind::ToolInvocation,
            Self::SchemaValidationError { .. } => ErrorKind::SchemaValidation,
            Self::ProviderError { .. } => ErrorKind::Provider,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::StreamError(_) => ErrorKind::Stream,
            Self::JsonError(_) => ErrorKind::Json,
            Self::UnsupportedOperation(_) => ErrorKind::Unsupported,
            Self::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// Raw text attached to a schema validation failure, if any.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            Self::SchemaValidationError { raw_text, .. } => Some(raw_text),
            _ => None,
        }
    }

    /// Vendor HTTP status code for provider errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ProviderError { status_code, .. } => *status_code,
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
