//! Data model shared by every component: messages, tools, usage, call options,
//! results and streamed chunks.

pub mod common;
pub mod message;
pub mod request;
pub mod response;
pub mod streaming;
pub mod tools;

pub use common::*;
pub use message::*;
pub use request::*;
pub use response::*;
pub use streaming::*;
pub use tools::*;
