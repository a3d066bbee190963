//! Document types.

use crate::types::{DatabaseError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Scalar metadata attached to a document, keyed by attribute name.
///
/// Ordered so that the serialized form is canonical.
pub type Metadata = BTreeMap<String, Value>;

/// A unit of text to be embedded, with its filterable attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Free-text content
    pub page_content: String,

    /// Filter attributes (string, number or bool values only)
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Create document with empty metadata.
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: Metadata::new(),
        }
    }

    /// Add a metadata attribute.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Check that every metadata value is a scalar.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in &self.metadata {
            let reason = match value {
                Value::String(_) | Value::Bool(_) | Value::Number(_) => continue,
                Value::Null => "null is not allowed",
                Value::Array(_) => "arrays are not allowed",
                Value::Object(_) => "nested objects are not allowed",
            };
            return Err(DatabaseError::InvalidMetadata {
                key: key.clone(),
                reason: reason.to_string(),
            });
        }
        Ok(())
    }

    /// Deterministic ID for this document within a collection.
    ///
    /// Hash of collection name, content and canonical metadata JSON, first
    /// 16 bytes taken as a UUID. Identical documents map to the same ID.
    pub fn content_id(&self, collection: &str) -> Result<Uuid> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(collection.as_bytes());
        hasher.update(&[0]);
        hasher.update(self.page_content.as_bytes());
        hasher.update(&[0]);
        hasher.update(&serde_json::to_vec(&self.metadata)?);

        let hash = hasher.finalize();
        let mut uuid_bytes = [0u8; 16];
        uuid_bytes.copy_from_slice(&hash.as_bytes()[0..16]);
        Ok(Uuid::from_bytes(uuid_bytes))
    }

    /// Metadata value as display text (strings unquoted).
    pub fn metadata_str(&self, key: &str) -> Option<String> {
        self.metadata.get(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Document as persisted in a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Document ID
    pub id: Uuid,

    #[serde(flatten)]
    pub document: Document,

    /// Ingestion timestamp
    pub created_at: DateTime<Utc>,
}

impl StoredDocument {
    /// Wrap a document with its ID, stamped now.
    pub fn new(id: Uuid, document: Document) -> Self {
        Self {
            id,
            document,
            created_at: Utc::now(),
        }
    }
}

/// Search hit: document plus its distance to the query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    pub id: Uuid,
    pub document: Document,
    /// Distance under the collection metric (lower is closer)
    pub distance: f32,
    /// Relevance derived from distance (higher is closer)
    pub relevance: f32,
}
