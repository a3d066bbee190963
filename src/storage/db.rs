//! RocksDB wrapper.

use crate::types::{DatabaseError, Result};
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, DB};
use std::path::Path;
use std::sync::Arc;

use super::batch::BatchBuilder;

/// Column family names
pub const CF_COLLECTIONS: &str = "collections";
pub const CF_DOCUMENTS: &str = "documents";
pub const CF_EMBEDDINGS: &str = "embeddings";

const COLUMN_FAMILIES: [&str; 3] = [CF_COLLECTIONS, CF_DOCUMENTS, CF_EMBEDDINGS];

/// RocksDB storage wrapper.
#[derive(Clone)]
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open database at path, creating it if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        std::fs::create_dir_all(path.as_ref())?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        // Small, read-heavy workload
        opts.set_level_compaction_dynamic_level_bytes(true);
        opts.set_max_background_jobs(2);

        let cf_descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get column family handle.
    pub(crate) fn cf_handle(&self, cf_name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(cf_name)
            .ok_or_else(|| DatabaseError::InternalError(format!("CF not found: {}", cf_name)))
    }

    /// Get value from column family.
    pub fn get(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf_handle(cf_name)?;
        Ok(self.db.get_cf(cf, key)?)
    }

    /// Put value into column family.
    pub fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.cf_handle(cf_name)?;
        Ok(self.db.put_cf(cf, key, value)?)
    }

    /// Create write batch.
    pub fn batch(&self) -> BatchBuilder<'_> {
        BatchBuilder::new(self)
    }

    /// Write batch atomically.
    pub fn write_batch(&self, batch: BatchBuilder<'_>) -> Result<()> {
        Ok(self.db.write(batch.into_inner())?)
    }

    /// Values of every key starting with `prefix`, in key order.
    pub fn values_with_prefix(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<Box<[u8]>>> {
        let cf = self.cf_handle(cf_name)?;
        let mut values = Vec::new();

        for item in self.db.iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward)) {
            let (key, value) = item?;
            // Keys are sorted, so the first non-matching key ends the scan
            if !key.starts_with(prefix) {
                break;
            }
            values.push(value);
        }

        Ok(values)
    }

    /// Flush memtables of every column family to SST files.
    pub fn flush(&self) -> Result<()> {
        for name in COLUMN_FAMILIES {
            let cf = self.cf_handle(name)?;
            self.db.flush_cf(cf)?;
        }
        Ok(())
    }
}
