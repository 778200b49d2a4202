//! Language model capability contract
//!
//! Vendor adapters implement [`LanguageModel`]. The core never reimplements
//! the contract; it composes models (middleware), resolves them (registry) and
//! calls them (facade).

use std::collections::HashMap;

use async_trait::async_trait;
use regex::Regex;

use crate::error::LlmError;
use crate::streaming::ChunkStream;
use crate::types::{GenerateResult, LanguageModelCallOptions};

/// Version of the model contract implemented by this crate.
pub const SPECIFICATION_VERSION: &str = "v1";

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider id, e.g. `"openai"`.
    fn provider_id(&self) -> &str;

    /// Model id as understood by the provider, e.g. `"gpt-4o"`.
    fn model_id(&self) -> &str;

    fn specification_version(&self) -> &str {
        SPECIFICATION_VERSION
    }

    /// URL patterns the model can fetch natively, keyed by media type
    /// (`"image/*"`, `"application/pdf"`, `"*"`). URLs that do not match are
    /// expected to be downloaded by the caller.
    async fn supported_urls(&self) -> Result<HashMap<String, Vec<Regex>>, LlmError> {
        Ok(HashMap::new())
    }

    /// Single-shot generation.
    async fn generate(&self, options: LanguageModelCallOptions)
    -> Result<GenerateResult, LlmError>;

    /// Streaming generation.
    async fn stream(&self, options: LanguageModelCallOptions) -> Result<ChunkStream, LlmError>;
}

/// Check whether `url` of `media_type` is natively supported by `model`.
pub async fn is_url_supported(
    model: &dyn LanguageModel,
    media_type: &str,
    url: &str,
) -> Result<bool, LlmError> {
    let patterns = model.supported_urls().await?;
    let media_type = media_type.to_ascii_lowercase();
    Ok(patterns
        .iter()
        .filter(|(key, _)| media_type_matches(&key.to_ascii_lowercase(), &media_type))
        .flat_map(|(_, regexes)| regexes.iter())
        .any(|re| re.is_match(url)))
}

fn media_type_matches(pattern: &str, media_type: &str) -> bool {
    if pattern == "*" || pattern == "*/*" {
        return true;
    }
    match pattern.strip_suffix("/*") {
        Some(prefix) => media_type
            .split_once('/')
            .is_some_and(|(top, _)| top == prefix),
        None => pattern == media_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StreamChunk;

    struct ImageUrlModel;

    #[async_trait]
    impl LanguageModel for ImageUrlModel {
        fn provider_id(&self) -> &str {
            "test"
        }

        fn model_id(&self) -> &str {
            "vision"
        }

        async fn supported_urls(&self) -> Result<HashMap<String, Vec<Regex>>, LlmError> {
            let re = Regex::new(r"^https://").map_err(|e| LlmError::InternalError(e.to_string()))?;
            Ok(HashMap::from([("image/*".to_string(), vec![re])]))
        }

        async fn generate(
            &self,
            _options: LanguageModelCallOptions,
        ) -> Result<GenerateResult, LlmError> {
            Ok(GenerateResult::text("ok"))
        }

        async fn stream(&self, _options: LanguageModelCallOptions) -> Result<ChunkStream, LlmError> {
            Ok(crate::streaming::chunk_stream_from(vec![StreamChunk::error(
                "unused",
            )]))
        }
    }

    #[tokio::test]
    async fn url_support_uses_media_type_wildcards() {
        let model = ImageUrlModel;
        assert!(is_url_supported(&model, "image/png", "https://x/a.png").await.unwrap());
        assert!(!is_url_supported(&model, "image/png", "http://x/a.png").await.unwrap());
        assert!(!is_url_supported(&model, "application/pdf", "https://x/a.pdf").await.unwrap());
    }

    #[test]
    fn default_spec_version() {
        assert_eq!(ImageUrlModel.specification_version(), "v1");
    }
}
