//! Local embeddings via embed_anything.

use super::EmbeddingProvider;
use crate::types::{DatabaseError, Result};
use async_trait::async_trait;
use embed_anything::embed_query;
use embed_anything::embeddings::embed::{Embedder, TextEmbedder};
use embed_anything::embeddings::local::bert::BertEmbedder;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// BERT-family sentence embedder running in-process.
pub struct LocalEmbedder {
    embedder: Arc<Embedder>,
    dimensions: usize,
    model_name: String,
}

impl LocalEmbedder {
    /// Get model cache directory (~/.vectordb/models/).
    fn model_cache_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| DatabaseError::EmbeddingError("HOME not set".to_string()))?;
        let cache_dir = PathBuf::from(home).join(".vectordb").join("models");

        std::fs::create_dir_all(&cache_dir)
            .map_err(|e| DatabaseError::EmbeddingError(format!("Failed to create cache dir: {}", e)))?;

        Ok(cache_dir)
    }

    /// Load a Hugging Face model, downloading it on first use.
    ///
    /// The vector size is taken from a sample embedding, so any BERT-family
    /// model reports its real dimensions.
    pub async fn new(model_name: &str) -> Result<Self> {
        // Use ~/.vectordb/models unless HF_HOME is set
        if std::env::var("HF_HOME").is_err() {
            if let Ok(cache_dir) = Self::model_cache_dir() {
                std::env::set_var("HF_HOME", cache_dir);
            }
        }

        info!(model = model_name, "Loading local embedding model");

        let bert_embedder = BertEmbedder::new(model_name.to_string(), None, None)
            .map_err(|e| DatabaseError::EmbeddingError(format!("Failed to load model: {}", e)))?;

        let embedder = Embedder::Text(TextEmbedder::Bert(Box::new(bert_embedder)));
        let dimensions = Self::embed_with(&embedder, &["dimension check"])
            .await?
            .first()
            .map(Vec::len)
            .ok_or_else(|| DatabaseError::EmbeddingError(format!("Model '{}' produced no embedding", model_name)))?;

        if dimensions == 0 {
            return Err(DatabaseError::EmbeddingError(format!(
                "Model '{}' produced an empty embedding",
                model_name
            )));
        }

        info!(model = model_name, dimensions, "Local embedding model ready");

        Ok(Self {
            embedder: Arc::new(embedder),
            dimensions,
            model_name: model_name.to_string(),
        })
    }

    async fn embed_with(embedder: &Embedder, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let embeddings = embed_query(texts, embedder, None)
            .await
            .map_err(|e| DatabaseError::EmbeddingError(format!("Embedding failed: {}", e)))?;

        embeddings
            .into_iter()
            .map(|emb| {
                emb.embedding
                    .to_dense()
                    .map_err(|e| DatabaseError::EmbeddingError(format!("Dense conversion failed: {}", e)))
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let text_refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        Self::embed_with(&self.embedder, &text_refs).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
