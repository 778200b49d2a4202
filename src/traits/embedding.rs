//! Embedding model contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::types::Usage;

/// Embeddings for a batch of input values, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResult {
    pub embeddings: Vec<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    fn provider_id(&self) -> &str;

    fn model_id(&self) -> &str;

    /// Largest batch accepted by one `embed` call, if limited.
    fn max_embeddings_per_call(&self) -> Option<usize> {
        None
    }

    async fn embed(&self, values: Vec<String>) -> Result<EmbeddingResult, LlmError>;
}
