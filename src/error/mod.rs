//! Error handling types for unillm.
//!
//! Every fallible operation in the crate returns [`LlmError`]. Callers that need
//! to branch on the failure category should use [`LlmError::kind`].

mod conversions;
pub mod types;

pub use types::*;
