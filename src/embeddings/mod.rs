//! Embedding generation with multiple providers.
//!
//! Supports:
//! - Local embeddings via embed_anything (all-MiniLM-L6-v2, 384 dims), feature `local`
//! - OpenAI embeddings (text-embedding-ada-002, text-embedding-3-small/large)
//! - Feature hashing ("hashing", "hashing-<dims>"), offline and deterministic
//!
//! Model names starting with `text-embedding-` select OpenAI (requires
//! OPENAI_API_KEY); anything else is loaded as a local Hugging Face model.

mod hashing;
#[cfg(feature = "local")]
mod local;
mod openai;

pub use hashing::{HashingEmbedder, HASHING_MODEL};
#[cfg(feature = "local")]
pub use local::LocalEmbedder;
pub use openai::OpenAIEmbedder;

use crate::types::{DatabaseError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Default local model.
pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Source of vector embeddings for text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for multiple texts, in input order.
    ///
    /// This is the preferred method for efficiency.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::EmbeddingError("No embedding generated".to_string()))
    }

    /// Embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Model name, recorded with each collection.
    fn model_name(&self) -> &str;
}

/// Build a provider for a model name.
///
/// - "text-embedding-3-small" / "-3-large" / "-ada-002" → OpenAI (requires OPENAI_API_KEY)
/// - "hashing" / "hashing-<dims>" → [`HashingEmbedder`]
/// - Anything else → local embed_anything model (downloads to the model cache)
pub async fn provider_for_model(model_name: &str) -> Result<Arc<dyn EmbeddingProvider>> {
    provider_with_lookup(model_name, |key| std::env::var(key).ok()).await
}

/// Like [`provider_for_model`], reading credentials through `lookup`.
pub async fn provider_with_lookup<F>(model_name: &str, lookup: F) -> Result<Arc<dyn EmbeddingProvider>>
where
    F: Fn(&str) -> Option<String>,
{
    if model_name.starts_with("text-embedding-") {
        let api_key = lookup("OPENAI_API_KEY").ok_or_else(|| {
            DatabaseError::EmbeddingError(
                "OPENAI_API_KEY environment variable required for OpenAI models".to_string(),
            )
        })?;
        return Ok(Arc::new(OpenAIEmbedder::new(api_key, model_name.to_string())?));
    }

    if let Some(hashing) = HashingEmbedder::from_model_name(model_name) {
        return Ok(Arc::new(hashing));
    }

    local_provider(model_name).await
}

#[cfg(feature = "local")]
async fn local_provider(model_name: &str) -> Result<Arc<dyn EmbeddingProvider>> {
    Ok(Arc::new(LocalEmbedder::new(model_name).await?))
}

#[cfg(not(feature = "local"))]
async fn local_provider(model_name: &str) -> Result<Arc<dyn EmbeddingProvider>> {
    Err(DatabaseError::EmbeddingError(format!(
        "Local model '{}' requested but vectordb was built without the `local` feature",
        model_name
    )))
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![4.0, 5.0, 6.0];
        let c = vec![-1.0, -2.0, -3.0];

        assert!(cosine_similarity(&a, &b) > 0.9);
        assert!(cosine_similarity(&a, &c) < -0.9);
        assert_eq!(cosine_similarity(&a, &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_openai_model_requires_key() {
        match provider_with_lookup("text-embedding-3-small", |_| None).await {
            Err(DatabaseError::EmbeddingError(msg)) => assert!(msg.contains("OPENAI_API_KEY")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("provider created without API key"),
        }
    }

    #[tokio::test]
    async fn test_openai_model_with_key() {
        let provider = provider_with_lookup("text-embedding-3-small", |key| {
            (key == "OPENAI_API_KEY").then(|| "sk-test".to_string())
        })
        .await
        .unwrap();
        assert_eq!(provider.dimensions(), 1536);
        assert_eq!(provider.model_name(), "text-embedding-3-small");
    }

    #[tokio::test]
    async fn test_hashing_model_selected_by_name() {
        let provider = provider_for_model("hashing-16").await.unwrap();
        assert_eq!(provider.dimensions(), 16);
        assert_eq!(provider.model_name(), "hashing-16");
    }

    #[tokio::test]
    #[ignore] // Downloads all-MiniLM-L6-v2
    async fn test_default_local_model() {
        let provider = provider_for_model(DEFAULT_MODEL).await.expect("Failed to load model");
        assert_eq!(provider.dimensions(), 384);

        let embedding = provider.embed("Hello, world!").await.expect("Failed to embed");
        assert_eq!(embedding.len(), 384);
    }
}
