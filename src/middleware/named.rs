//! Named middleware for identification and manipulation.

use std::sync::Arc;

use super::LanguageModelMiddleware;

/// Associates a name with a middleware so a chain can be edited by name.
#[derive(Clone)]
pub struct NamedMiddleware {
    pub name: String,
    pub middleware: Arc<dyn LanguageModelMiddleware>,
}

impl NamedMiddleware {
    pub fn new(name: impl Into<String>, middleware: Arc<dyn LanguageModelMiddleware>) -> Self {
        Self {
            name: name.into(),
            middleware,
        }
    }
}

impl std::fmt::Debug for NamedMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedMiddleware")
            .field("name", &self.name)
            .field("middleware", &"<dyn LanguageModelMiddleware>")
            .finish()
    }
}
