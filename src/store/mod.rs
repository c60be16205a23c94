//! Document Store
//!
//! The whole codex is persisted as one JSON blob under a fixed key in a
//! key-value store. `DocumentStore` is the byte-level seam; `BookRepository`
//! owns the encoding and the load-time validation.

pub mod persistence;

pub use persistence::SledDocumentStore;

use crate::book::{codex_template, Book, FIRST_SECTION_TITLE};
use crate::error::StorageError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_DOCUMENT_KEY: &str = "aletheia-engine-codex-v1";

/// Key-value byte store interface
pub trait DocumentStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;
}

/// In-process store, used by tests and as a scratch backend.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.entries.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Decode a persisted codex.
///
/// Accepts only a JSON array of sections whose first section carries the
/// template's first title; anything else is treated as foreign data.
pub fn decode_book(bytes: &[u8]) -> Option<Book> {
    let book: Book = serde_json::from_slice(bytes).ok()?;
    match book.section(0) {
        Some(first) if first.title == FIRST_SECTION_TITLE => Some(book),
        _ => None,
    }
}

pub fn encode_book(book: &Book) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(book).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Load/save of the codex under one key.
#[derive(Clone)]
pub struct BookRepository {
    store: Arc<dyn DocumentStore>,
    key: String,
}

impl BookRepository {
    pub fn new(store: Arc<dyn DocumentStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn with_default_key(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(store, DEFAULT_DOCUMENT_KEY)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Persisted codex, or the built-in template when nothing usable is stored.
    pub fn load(&self) -> Book {
        match self.store.get(&self.key) {
            Ok(Some(bytes)) => match decode_book(&bytes) {
                Some(book) => {
                    debug!(key = %self.key, pages = book.page_count(), "Loaded persisted codex");
                    book
                }
                None => {
                    warn!(key = %self.key, "Persisted codex is not recognised, starting from the template");
                    codex_template()
                }
            },
            Ok(None) => codex_template(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read persisted codex, starting from the template");
                codex_template()
            }
        }
    }

    pub fn save(&self, book: &Book) -> Result<(), StorageError> {
        let bytes = encode_book(book)?;
        self.store.set(&self.key, &bytes)
    }
}
