//! Provider registry
//!
//! Resolves symbolic `provider/model` identifiers into live models through
//! registered [`ProviderFactory`] values. A registry is an explicit instance:
//! build one at startup, register factories, and pass it to the call sites that
//! need it. Several independently configured registries can coexist.

pub mod entry;
pub mod helpers;

pub use entry::{ProviderFactory, ProviderRegistry, RegistryOptions};
pub use helpers::{FnProviderFactory, create_provider_registry};
