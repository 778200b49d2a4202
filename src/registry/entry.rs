//! Registry entry point
//!
//! Parses `provider<sep>model` identifiers, looks the provider up
//! case-insensitively and delegates construction to its factory. Resolved
//! language models are wrapped with the registry-level middlewares.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::LlmError;
use crate::middleware::language_model::LanguageModelMiddleware;
use crate::middleware::wrap::wrap_language_model;
use crate::traits::{EmbeddingModel, LanguageModel};

/// Produces model instances for one provider.
///
/// The registry never caches what a factory returns; every resolution calls
/// the factory again. Factories may cache internally.
pub trait ProviderFactory: Send + Sync {
    /// Provider id used as the registry key (compared case-insensitively).
    fn provider_id(&self) -> Cow<'static, str>;

    fn language_model(&self, model_id: &str) -> Result<Arc<dyn LanguageModel>, LlmError>;

    fn embedding_model(&self, model_id: &str) -> Result<Arc<dyn EmbeddingModel>, LlmError> {
        Err(LlmError::UnsupportedOperation(format!(
            "provider '{}' does not provide embedding models (requested '{}')",
            self.provider_id(),
            model_id
        )))
    }
}

/// Options for creating a provider registry.
#[derive(Clone)]
pub struct RegistryOptions {
    pub separator: char,
    pub language_model_middleware: Vec<Arc<dyn LanguageModelMiddleware>>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            separator: '/',
            language_model_middleware: Vec::new(),
        }
    }
}

impl std::fmt::Debug for RegistryOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryOptions")
            .field("separator", &self.separator)
            .field("middlewares", &self.language_model_middleware.len())
            .finish()
    }
}

/// Registry of provider factories.
///
/// Registration takes `&self` so a registry can be shared behind an `Arc`;
/// lookups only take the read lock.
pub struct ProviderRegistry {
    separator: char,
    middlewares: Vec<Arc<dyn LanguageModelMiddleware>>,
    factories: RwLock<HashMap<String, Arc<dyn ProviderFactory>>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            separator: options.separator,
            middlewares: options.language_model_middleware,
            factories: RwLock::new(HashMap::new()),
        }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Register a factory under its provider id, replacing any previous one.
    pub fn register(&self, factory: Arc<dyn ProviderFactory>) {
        let key = factory.provider_id().to_lowercase();
        let mut map = self
            .factories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if map.insert(key.clone(), factory).is_some() {
            tracing::debug!(provider = %key, "replaced provider factory");
        } else {
            tracing::debug!(provider = %key, "registered provider factory");
        }
    }

    /// Remove a provider. Returns whether it was registered.
    pub fn unregister(&self, provider_id: &str) -> bool {
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&provider_id.to_lowercase())
            .is_some()
    }

    pub fn contains(&self, provider_id: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&provider_id.to_lowercase())
    }

    /// Registered provider ids as the factories report them, sorted.
    pub fn provider_ids(&self) -> Vec<String> {
        let map = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        registered_ids(&map)
    }

    /// Split `provider<sep>model` at the first separator.
    pub fn split_id<'a>(&self, id: &'a str) -> Result<(&'a str, &'a str), LlmError> {
        match id.split_once(self.separator) {
            Some((p, m)) if !p.is_empty() && !m.is_empty() => Ok((p, m)),
            _ => Err(LlmError::ConfigurationError(format!(
                "Invalid model id for registry: '{}' (must be 'provider{}model')",
                id, self.separator
            ))),
        }
    }

    fn factory(&self, provider: &str) -> Result<Arc<dyn ProviderFactory>, LlmError> {
        let map = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(f) = map.get(&provider.to_lowercase()) {
            return Ok(f.clone());
        }
        let known = registered_ids(&map);
        let message = if known.is_empty() {
            format!("No provider registered for '{provider}': no providers are registered")
        } else {
            format!(
                "No provider registered for '{provider}'. Registered providers: {}",
                known.join(", ")
            )
        };
        Err(LlmError::ConfigurationError(message))
    }

    /// Resolve `provider/model` into a language model.
    ///
    /// The result is wrapped with the registry-level middlewares, if any.
    pub fn language_model(&self, id: &str) -> Result<Arc<dyn LanguageModel>, LlmError> {
        let (provider, model) = self.split_id(id)?;
        let factory = self.factory(provider)?;
        tracing::debug!(provider, model, "resolving language model");
        let model = factory.language_model(model)?;
        Ok(wrap_language_model(model, self.middlewares.clone()))
    }

    /// Resolve `provider/model` into an embedding model.
    pub fn embedding_model(&self, id: &str) -> Result<Arc<dyn EmbeddingModel>, LlmError> {
        let (provider, model) = self.split_id(id)?;
        let factory = self.factory(provider)?;
        tracing::debug!(provider, model, "resolving embedding model");
        factory.embedding_model(model)
    }
}

fn registered_ids(map: &HashMap<String, Arc<dyn ProviderFactory>>) -> Vec<String> {
    let mut ids: Vec<String> = map.values().map(|f| f.provider_id().into_owned()).collect();
    ids.sort();
    ids
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("separator", &self.separator)
            .field("providers", &self.provider_ids())
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}
