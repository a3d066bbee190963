//! OpenAI embedding provider with batch support.

use super::EmbeddingProvider;
use crate::types::{DatabaseError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// OpenAI API base URL
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI limit: 2048 texts per request
const BATCH_SIZE: usize = 2048;

/// OpenAI embedding request
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

/// OpenAI embedding response
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// OpenAI embedding provider.
pub struct OpenAIEmbedder {
    client: Client,
    api_key: String,
    model: String,
    dimensions: usize,
    base_url: String,
}

impl OpenAIEmbedder {
    /// Create new OpenAI embedding provider.
    ///
    /// # Dimensions
    /// - text-embedding-ada-002: 1536
    /// - text-embedding-3-small: 1536
    /// - text-embedding-3-large: 3072
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let dimensions = match model.as_str() {
            "text-embedding-ada-002" => 1536,
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            _ => {
                return Err(DatabaseError::EmbeddingError(format!(
                    "Unknown OpenAI model: {}. Supported: text-embedding-ada-002, text-embedding-3-small, text-embedding-3-large",
                    model
                )))
            }
        };

        Ok(Self {
            client: Client::new(),
            api_key,
            model,
            dimensions,
            base_url: OPENAI_API_BASE.to_string(),
        })
    }

    /// Point the client at a compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Embed a single chunk (up to 2048 texts).
    async fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            input: texts,
            model: &self.model,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DatabaseError::EmbeddingError(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DatabaseError::EmbeddingError(format!(
                "OpenAI API error {}: {}",
                status, error_text
            )));
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| DatabaseError::EmbeddingError(format!("Failed to parse response: {}", e)))?;

        if embedding_response.data.len() != texts.len() {
            return Err(DatabaseError::EmbeddingError(format!(
                "OpenAI returned {} embeddings for {} inputs",
                embedding_response.data.len(),
                texts.len()
            )));
        }

        // Sort by index to maintain order
        let mut data = embedding_response.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            debug!(model = %self.model, count = chunk.len(), "Requesting OpenAI embeddings");
            all_embeddings.extend(self.embed_chunk(chunk).await?);
        }

        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_dimensions() {
        let small = OpenAIEmbedder::new("key".into(), "text-embedding-3-small".into()).unwrap();
        assert_eq!(small.dimensions(), 1536);

        let large = OpenAIEmbedder::new("key".into(), "text-embedding-3-large".into()).unwrap();
        assert_eq!(large.dimensions(), 3072);
        assert_eq!(large.model_name(), "text-embedding-3-large");

        assert!(OpenAIEmbedder::new("key".into(), "text-embedding-4".into()).is_err());
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        // Unroutable base URL: any request would fail
        let embedder = OpenAIEmbedder::new("key".into(), "text-embedding-3-small".into())
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let embeddings = embedder.embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires OPENAI_API_KEY
    async fn test_openai_embed_batch() {
        let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");
        let embedder = OpenAIEmbedder::new(api_key, "text-embedding-3-small".to_string())
            .expect("Failed to create embedder");

        let texts = vec![
            "Rust is a systems programming language".to_string(),
            "Python is great for data science".to_string(),
        ];

        let embeddings = embedder.embed_batch(&texts).await.expect("Failed to embed batch");
        assert_eq!(embeddings.len(), 2);
        for emb in &embeddings {
            assert_eq!(emb.len(), 1536);
        }
    }
}
