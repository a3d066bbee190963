//! RocksDB storage layer.

mod batch;
mod db;
pub mod keys;

pub use batch::BatchBuilder;
pub use db::{Storage, CF_COLLECTIONS, CF_DOCUMENTS, CF_EMBEDDINGS};
