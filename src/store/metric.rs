//! Distance metrics.

use crate::embeddings::cosine_similarity;
use crate::types::DatabaseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Distance function of a collection. Lower distance means closer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// 1 - cosine similarity
    #[default]
    Cosine,
    /// Squared euclidean distance
    L2,
    /// 1 - dot product
    #[serde(rename = "ip")]
    InnerProduct,
}

impl DistanceMetric {
    /// Distance between two equal-length vectors.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
            DistanceMetric::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            DistanceMetric::InnerProduct => 1.0 - a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>(),
        }
    }

    /// Map a distance to a relevance score (higher is closer).
    pub fn relevance(&self, distance: f32) -> f32 {
        match self {
            DistanceMetric::Cosine | DistanceMetric::InnerProduct => 1.0 - distance,
            DistanceMetric::L2 => 1.0 / (1.0 + distance),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::L2 => "l2",
            DistanceMetric::InnerProduct => "ip",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "l2" | "euclidean" => Ok(DistanceMetric::L2),
            "ip" | "inner_product" | "dot" => Ok(DistanceMetric::InnerProduct),
            other => Err(DatabaseError::ConfigError(format!(
                "Unknown distance metric '{}'. Supported: cosine, l2, ip",
                other
            ))),
        }
    }
}
