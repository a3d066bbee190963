//! Feature-hashing embedder.
//!
//! Bag-of-words vectors built by hashing lowercase tokens into a fixed
//! number of signed buckets, then L2-normalizing. No model download; texts
//! sharing words land close together. Used offline and in tests.

use super::EmbeddingProvider;
use crate::types::Result;
use async_trait::async_trait;

/// Model name prefix selecting this embedder.
pub const HASHING_MODEL: &str = "hashing";

/// Deterministic hashing embedder.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    model_name: String,
}

impl HashingEmbedder {
    /// Create embedder producing `dimensions`-long vectors (at least 1).
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(1);
        Self {
            dimensions,
            model_name: format!("{}-{}", HASHING_MODEL, dimensions),
        }
    }

    /// Parse "hashing" or "hashing-<dims>"; defaults to 384 dims.
    pub fn from_model_name(model_name: &str) -> Option<Self> {
        let rest = model_name.strip_prefix(HASHING_MODEL)?;
        if rest.is_empty() {
            return Some(Self::new(384));
        }
        rest.strip_prefix('-')?.parse().ok().map(Self::new)
    }

    /// Embed synchronously.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
        {
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let bucket = u64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]) as usize
                % self.dimensions;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_sync(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::cosine_similarity;

    #[test]
    fn test_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed_sync("Cloud services revenue");
        let b = embedder.embed_sync("cloud SERVICES, revenue!");

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_words_are_closer() {
        let embedder = HashingEmbedder::new(384);
        let query = embedder.embed_sync("latency of the microservice architecture");
        let near = embedder.embed_sync("The new microservice architecture improves latency");
        let far = embedder.embed_sync("Marketing campaigns targeting Gen Z");

        assert!(cosine_similarity(&query, &near) > cosine_similarity(&query, &far));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(8);
        assert!(embedder.embed_sync("  ,. ").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_from_model_name() {
        assert_eq!(HashingEmbedder::from_model_name("hashing").unwrap().dimensions(), 384);
        assert_eq!(HashingEmbedder::from_model_name("hashing-32").unwrap().model_name(), "hashing-32");
        assert!(HashingEmbedder::from_model_name("hashing-abc").is_none());
        assert!(HashingEmbedder::from_model_name("all-MiniLM-L6-v2").is_none());
    }
}
