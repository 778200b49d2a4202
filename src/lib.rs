//! # unillm - a provider-agnostic LLM invocation layer
//!
//! unillm sits between application code and vendor adapters. Adapters
//! implement one contract ([`traits::LanguageModel`]); everything else in the
//! crate works against that contract:
//!
//! - **Registry**: resolve `"provider/model"` strings through registered
//!   factories ([`registry::ProviderRegistry`]).
//! - **Middleware**: wrap any model with an ordered interceptor chain that
//!   composes with onion semantics for both single-shot and streaming calls
//!   ([`middleware::wrap_language_model`]).
//! - **Facade**: [`generate_text`], [`stream_text`], [`generate_object`] and
//!   [`stream_object`], the latter two reconstructing typed values from model
//!   text or tool-call arguments.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use unillm::prelude::*;
//!
//! #[derive(serde::Deserialize, schemars::JsonSchema)]
//! struct City {
//!     name: String,
//!     population: u64,
//! }
//!
//! let registry = ProviderRegistry::new();
//! registry.register(my_openai_factory());
//! let model = registry.language_model("openai/gpt-4o-mini")?;
//!
//! let text = generate_text(model.as_ref(), &GenerateTextOptions::new().prompt("Hi")).await?;
//! let city = generate_object::<City>(
//!     model.as_ref(),
//!     &GenerateObjectOptions::new().prompt("Largest city in Japan?"),
//! )
//! .await?;
//! ```
#![deny(unsafe_code)]

pub mod error;
pub mod highlevel;
pub mod middleware;
pub mod registry;
pub mod streaming;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod utils;

pub use error::{ErrorKind, LlmError};
pub use highlevel::{
    GenerateObjectOptions, GenerateObjectResult, GenerateTextOptions, ObjectGenerationMode,
    StreamObjectOptions, generate_object, generate_text, stream_object, stream_text,
};
pub use middleware::wrap_language_model;
pub use registry::{ProviderFactory, ProviderRegistry, RegistryOptions};
pub use utils::cancel::CancelHandle;

/// Commonly used items.
pub mod prelude {
    pub use crate::error::{ErrorKind, LlmError};
    pub use crate::highlevel::{
        GenerateObjectOptions, GenerateObjectResult, GenerateTextOptions, ObjectGenerationMode,
        StreamObjectOptions, execute_tool_calls, generate_object, generate_text, stream_object,
        stream_text, tool_definitions,
    };
    pub use crate::middleware::{
        ClampTopPMiddleware, DefaultSettingsMiddleware, LanguageModelMiddleware, LoggingMiddleware,
        MiddlewareBuilder, wrap_language_model,
    };
    pub use crate::registry::{
        FnProviderFactory, ProviderFactory, ProviderRegistry, RegistryOptions,
        create_provider_registry,
    };
    pub use crate::streaming::{ChunkStream, ObjectStream};
    pub use crate::traits::{EmbeddingModel, LanguageModel, ToolExecutor, ToolOutput};
    pub use crate::types::*;
    pub use crate::utils::cancel::CancelHandle;
}

static_assertions::assert_impl_all!(LlmError: Send, Sync, std::error::Error);
static_assertions::assert_impl_all!(registry::ProviderRegistry: Send, Sync);
static_assertions::assert_impl_all!(middleware::WrappedLanguageModel: Send, Sync);
static_assertions::assert_impl_all!(types::LanguageModelCallOptions: Send, Sync, Clone);
static_assertions::assert_impl_all!(streaming::ChunkStream: Send);
