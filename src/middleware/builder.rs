//! Middleware builder for flexible middleware chain construction.

use std::sync::Arc;

use super::{LanguageModelMiddleware, NamedMiddleware, wrap_language_model};
use crate::error::LlmError;
use crate::traits::LanguageModel;

/// Builds an ordered middleware chain whose entries can be addressed by name.
///
/// The first entry is the outermost layer of the composed model.
///
/// ```rust,ignore
/// let middlewares = MiddlewareBuilder::new()
///     .add("logging", Arc::new(LoggingMiddleware::new()))?
///     .add("defaults", Arc::new(DefaultSettingsMiddleware::new(settings)))?
///     .insert_before("defaults", "clamp", Arc::new(ClampTopPMiddleware))?
///     .build();
/// ```
#[derive(Default, Clone)]
pub struct MiddlewareBuilder {
    middlewares: Vec<NamedMiddleware>,
}

impl MiddlewareBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware. Names must be unique.
    pub fn add(
        mut self,
        name: impl Into<String>,
        middleware: Arc<dyn LanguageModelMiddleware>,
    ) -> Result<Self, LlmError> {
        let named = NamedMiddleware::new(name, middleware);
        self.ensure_unique(&named.name)?;
        self.middlewares.push(named);
        Ok(self)
    }

    /// Insert a middleware directly before `target_name`.
    pub fn insert_before(
        mut self,
        target_name: &str,
        name: impl Into<String>,
        middleware: Arc<dyn LanguageModelMiddleware>,
    ) -> Result<Self, LlmError> {
        let index = self.position(target_name)?;
        let named = NamedMiddleware::new(name, middleware);
        self.ensure_unique(&named.name)?;
        self.middlewares.insert(index, named);
        Ok(self)
    }

    /// Insert a middleware directly after `target_name`.
    pub fn insert_after(
        mut self,
        target_name: &str,
        name: impl Into<String>,
        middleware: Arc<dyn LanguageModelMiddleware>,
    ) -> Result<Self, LlmError> {
        let index = self.position(target_name)?;
        let named = NamedMiddleware::new(name, middleware);
        self.ensure_unique(&named.name)?;
        self.middlewares.insert(index + 1, named);
        Ok(self)
    }

    /// Remove a middleware by name. Removing an unknown name is a no-op.
    pub fn remove(mut self, name: &str) -> Self {
        let before = self.middlewares.len();
        self.middlewares.retain(|m| m.name != name);
        if self.middlewares.len() == before {
            tracing::debug!(name, "middleware not present, nothing removed");
        }
        self
    }

    /// Swap the implementation behind `name`, keeping its position.
    pub fn replace(
        mut self,
        name: &str,
        middleware: Arc<dyn LanguageModelMiddleware>,
    ) -> Result<Self, LlmError> {
        let index = self.position(name)?;
        self.middlewares[index].middleware = middleware;
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.middlewares.iter().any(|m| m.name == name)
    }

    /// Names in chain order.
    pub fn names(&self) -> Vec<&str> {
        self.middlewares.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    pub fn build(self) -> Vec<Arc<dyn LanguageModelMiddleware>> {
        self.middlewares.into_iter().map(|m| m.middleware).collect()
    }

    /// Build the chain and wrap `model` with it.
    pub fn wrap(self, model: Arc<dyn LanguageModel>) -> Arc<dyn LanguageModel> {
        wrap_language_model(model, self.build())
    }

    fn position(&self, name: &str) -> Result<usize, LlmError> {
        self.middlewares
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| {
                LlmError::ConfigurationError(format!(
                    "no middleware named '{name}' in chain {:?}",
                    self.names()
                ))
            })
    }

    fn ensure_unique(&self, name: &str) -> Result<(), LlmError> {
        if self.contains(name) {
            return Err(LlmError::ConfigurationError(format!(
                "middleware '{name}' is already registered"
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for MiddlewareBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareBuilder")
            .field("names", &self.names())
            .finish()
    }
}
