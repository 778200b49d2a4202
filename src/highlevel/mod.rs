//! High-level facade
//!
//! `generate_text`, `stream_text`, `generate_object` and `stream_object` take
//! any [`LanguageModel`](crate::traits::LanguageModel), including composed and
//! registry-resolved ones. Options are borrowed and never mutated.

pub mod extract;
pub mod object;
pub mod schema;
pub mod text;
pub mod tools;

pub use extract::{extract_and_deserialize, strip_code_fences};
pub use object::{
    DeltaCallback, GenerateObjectOptions, GenerateObjectResult, ObjectGenerationMode,
    StreamObjectOptions, generate_object, stream_object,
};
pub use schema::schema_for;
pub use text::{GenerateTextOptions, generate_text, stream_text};
pub use tools::{execute_tool_calls, tool_definitions};
