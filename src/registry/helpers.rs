//! Registry convenience helpers

use std::borrow::Cow;
use std::sync::Arc;

use super::entry::{ProviderFactory, ProviderRegistry, RegistryOptions};
use crate::error::LlmError;
use crate::traits::LanguageModel;

type BuildFn = dyn Fn(&str) -> Result<Arc<dyn LanguageModel>, LlmError> + Send + Sync;

/// A factory backed by a closure, handy for tests and small integrations.
pub struct FnProviderFactory {
    id: Cow<'static, str>,
    build: Box<BuildFn>,
}

impl FnProviderFactory {
    pub fn new<F>(id: impl Into<Cow<'static, str>>, build: F) -> Self
    where
        F: Fn(&str) -> Result<Arc<dyn LanguageModel>, LlmError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            build: Box::new(build),
        }
    }
}

impl ProviderFactory for FnProviderFactory {
    fn provider_id(&self) -> Cow<'static, str> {
        self.id.clone()
    }

    fn language_model(&self, model_id: &str) -> Result<Arc<dyn LanguageModel>, LlmError> {
        (self.build)(model_id)
    }
}

impl std::fmt::Debug for FnProviderFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnProviderFactory")
            .field("id", &self.id)
            .finish()
    }
}

/// Create a registry pre-populated with `factories`.
///
/// Later entries with the same provider id replace earlier ones.
pub fn create_provider_registry(
    factories: Vec<Arc<dyn ProviderFactory>>,
    opts: Option<RegistryOptions>,
) -> ProviderRegistry {
    let registry = ProviderRegistry::with_options(opts.unwrap_or_default());
    for f in factories {
        registry.register(f);
    }
    registry
}
