//! Store configuration.
//!
//! Resolution order: built-in defaults, then the JSON config file
//! (`~/.vectordb/config.json` unless a path is given), then environment:
//! - VECTORDB_PATH: persist directory
//! - VECTORDB_COLLECTION: collection name
//! - VECTORDB_EMBEDDING: embedding model name
//! - VECTORDB_METRIC: cosine | l2 | ip

use crate::embeddings::DEFAULT_MODEL;
use crate::store::{DistanceMetric, DEFAULT_COLLECTION};
use crate::types::{DatabaseError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default persist directory, relative to the working directory.
pub const DEFAULT_PERSIST_DIRECTORY: &str = "chroma_data/";

/// Vector store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the RocksDB files.
    pub persist_directory: PathBuf,
    /// Collection name.
    pub collection: String,
    /// Embedding model name.
    pub embedding_model: String,
    /// Distance metric for new collections.
    pub metric: DistanceMetric,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            persist_directory: PathBuf::from(DEFAULT_PERSIST_DIRECTORY),
            collection: DEFAULT_COLLECTION.to_string(),
            embedding_model: DEFAULT_MODEL.to_string(),
            metric: DistanceMetric::default(),
        }
    }
}

impl StoreConfig {
    /// Get default config directory (~/.vectordb/).
    pub fn config_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| DatabaseError::ConfigError("HOME not set".to_string()))?;
        Ok(PathBuf::from(home).join(".vectordb"))
    }

    /// Get default config file path (~/.vectordb/config.json).
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load configuration from `path`, or the default file if it exists,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::config_file() {
                Ok(file) if file.exists() => Self::from_file(&file)?,
                _ => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DatabaseError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| DatabaseError::ConfigError(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Apply overrides from a variable lookup (the environment in [`load`](Self::load)).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("VECTORDB_PATH") {
            self.persist_directory = PathBuf::from(path);
        }
        if let Some(collection) = lookup("VECTORDB_COLLECTION") {
            self.collection = collection;
        }
        if let Some(model) = lookup("VECTORDB_EMBEDDING") {
            self.embedding_model = model;
        }
        if let Some(metric) = lookup("VECTORDB_METRIC") {
            self.metric = metric.parse()?;
        }
        Ok(())
    }
}
