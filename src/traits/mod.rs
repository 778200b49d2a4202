//! Capability contracts consumed by the core.

pub mod embedding;
pub mod language_model;
pub mod tool;

pub use embedding::{EmbeddingModel, EmbeddingResult};
pub use language_model::{LanguageModel, SPECIFICATION_VERSION, is_url_supported};
pub use tool::{ToolExecutor, ToolOutput};
