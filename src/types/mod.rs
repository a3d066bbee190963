//! Core types for the vector store.

pub mod document;
pub mod error;

pub use document::{Document, Metadata, ScoredDocument, StoredDocument};
pub use error::{DatabaseError, Result};
