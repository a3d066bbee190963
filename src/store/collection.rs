//! Collection descriptors.

use super::DistanceMetric;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted description of a collection, fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    /// Embedding model the collection was built with
    pub model: String,
    pub dimensions: usize,
    pub metric: DistanceMetric,
    pub created_at: DateTime<Utc>,
}

impl CollectionInfo {
    pub fn new(name: &str, model: &str, dimensions: usize, metric: DistanceMetric) -> Self {
        Self {
            name: name.to_string(),
            model: model.to_string(),
            dimensions,
            metric,
            created_at: Utc::now(),
        }
    }
}
