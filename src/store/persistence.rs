//! Sled-backed document store

use crate::error::StorageError;
use crate::store::DocumentStore;
use std::path::Path;

/// Sled-based implementation of DocumentStore
pub struct SledDocumentStore {
    db: sled::Db,
}

fn backend_error(action: &str, e: sled::Error) -> StorageError {
    match e {
        sled::Error::Io(io) => StorageError::IoError(io),
        other => StorageError::Backend(format!("Failed to {}: {}", action, other)),
    }
}

impl SledDocumentStore {
    /// Open (or create) a sled database at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| backend_error("open sled database", e))?;
        Ok(Self { db })
    }
}

impl DocumentStore for SledDocumentStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let value = self
            .db
            .get(key.as_bytes())
            .map_err(|e| backend_error("read document", e))?;
        Ok(value.map(|v| v.to_vec()))
    }

    /// Writes are flushed before returning; every commit is durable.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.db
            .insert(key.as_bytes(), value)
            .map_err(|e| backend_error("write document", e))?;
        self.db
            .flush()
            .map_err(|e| backend_error("flush document store", e))?;
        Ok(())
    }
}
