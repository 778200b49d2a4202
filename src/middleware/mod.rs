//! Middleware module (model-level)
//!
//! Middlewares wrap a language model with cross-cutting behavior (logging,
//! defaults, transformation, caching, retries) and compose with onion
//! semantics: given `[m0, m1, ..., mn]`, `m0` sees the call first and the
//! response last.

pub mod builder;
pub mod language_model;
pub mod named;
pub mod samples;
pub mod wrap;

pub use builder::MiddlewareBuilder;
pub use language_model::{
    GenerateFn, GenerateFuture, LanguageModelMiddleware, StreamFn, StreamFuture,
    compose_generate, compose_stream,
};
pub use named::NamedMiddleware;
pub use samples::{ClampTopPMiddleware, DefaultSettingsMiddleware, LoggingMiddleware};
pub use wrap::{WrappedLanguageModel, wrap_language_model};
