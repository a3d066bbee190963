//! Write batch operations.

use super::Storage;
use crate::types::Result;
use rocksdb::WriteBatch;

/// Atomic write batch builder.
pub struct BatchBuilder<'a> {
    storage: &'a Storage,
    inner: WriteBatch,
}

impl<'a> BatchBuilder<'a> {
    /// Create new batch against a storage handle.
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            inner: WriteBatch::default(),
        }
    }

    /// Add put operation.
    pub fn put(&mut self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.storage.cf_handle(cf_name)?;
        self.inner.put_cf(cf, key, value);
        Ok(())
    }

    /// Add delete operation.
    pub fn delete(&mut self, cf_name: &str, key: &[u8]) -> Result<()> {
        let cf = self.storage.cf_handle(cf_name)?;
        self.inner.delete_cf(cf, key);
        Ok(())
    }

    /// Whether no operations are queued.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get inner batch.
    pub fn into_inner(self) -> WriteBatch {
        self.inner
    }
}
