//! vectordb - embedded document vector store.
//!
//! Documents (text plus scalar metadata) are embedded, persisted to RocksDB
//! and retrieved by similarity, optionally narrowed by a metadata filter.
//!
//! ```no_run
//! use vectordb::{embeddings, filter::Predicate, Document, VectorStore};
//! use serde_json::json;
//!
//! # async fn example() -> vectordb::Result<()> {
//! let embedder = embeddings::provider_for_model("sentence-transformers/all-MiniLM-L6-v2").await?;
//! let docs = vec![Document::new("Q4 revenue grew 15%").with("access_level", "Executive")];
//! let store = VectorStore::from_documents(docs, embedder, "chroma_data/").await?;
//!
//! let filter = Predicate::from_where(&json!({"access_level": "Executive"}))?;
//! let hits = store.similarity_search("financial results", 1, Some(&filter)).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod demo;
pub mod embeddings;
pub mod filter;
pub mod storage;
pub mod store;
mod types;

pub use store::{CollectionInfo, DistanceMetric, SearchRequest, VectorStore};
pub use types::{DatabaseError, Document, Metadata, Result, ScoredDocument, StoredDocument};
