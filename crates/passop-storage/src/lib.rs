//! Document store abstraction for `PassOP`.
//!
//! This crate defines the [`DocumentStore`] trait: a single flat collection
//! of JSON documents addressed by a store-assigned `_id`. It knows nothing
//! about passwords; the typed repository in `passop-core` sits on top.
//!
//! Three implementations are provided:
//!
//! - [`MemoryBackend`]: in-memory, for tests and local development
//! - [`RocksDbBackend`]: embedded persistence, backed by `RocksDB` (feature `rocksdb-backend`)
//! - [`PostgresBackend`]: `JSONB` documents in PostgreSQL (feature `postgres-backend`)

mod error;
mod memory;
#[cfg(feature = "postgres-backend")]
mod postgres_backend;
#[cfg(feature = "rocksdb-backend")]
mod rocksdb_backend;

pub use error::StorageError;
pub use memory::MemoryBackend;
#[cfg(feature = "postgres-backend")]
pub use postgres_backend::PostgresBackend;
#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_backend::RocksDbBackend;

use serde_json::{Map, Value};

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

/// Name of the store-assigned identifier field.
pub const ID_FIELD: &str = "_id";

/// A pluggable document collection.
///
/// Filters are equality matches on top-level fields, the same shape a
/// document database accepts: a document matches when every field of the
/// filter is present in the document with an equal value. An empty filter
/// matches every document.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Return every document in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] or [`StorageError::Decode`] if the
    /// backend fails.
    async fn find_all(&self) -> Result<Vec<Document>, StorageError>;

    /// Insert a document and return it as stored.
    ///
    /// The store always assigns a fresh `_id`, replacing any `_id` the
    /// caller supplied.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the underlying backend fails.
    async fn insert_one(&self, doc: Document) -> Result<Document, StorageError>;

    /// Remove the first document matching `filter`.
    ///
    /// Returns the number of removed documents (`0` or `1`).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Delete`] if the underlying backend fails.
    async fn delete_one(&self, filter: &Document) -> Result<u64, StorageError>;

    /// Merge `set` into the first document matching `filter`.
    ///
    /// Returns the updated document, or `None` if nothing matched. The
    /// `_id` field is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the underlying backend fails.
    async fn update_one(
        &self,
        filter: &Document,
        set: &Document,
    ) -> Result<Option<Document>, StorageError>;

    /// Flush and release backend resources.
    ///
    /// Called once at shutdown. The default does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Close`] if the backend fails to shut down
    /// cleanly.
    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Generate a new document identifier.
///
/// UUID v7 ids sort in creation order, which keeps key-ordered backends in
/// insertion order.
#[must_use]
pub fn new_document_id() -> String {
    uuid::Uuid::now_v7().as_simple().to_string()
}

/// Check whether `doc` matches every field of `filter`.
#[must_use]
pub fn matches(doc: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, expected)| doc.get(key) == Some(expected))
}

/// Merge the fields of `set` into `doc`, leaving `_id` untouched.
pub fn apply_set(doc: &mut Document, set: &Document) {
    for (key, value) in set {
        if key == ID_FIELD {
            continue;
        }
        doc.insert(key.clone(), value.clone());
    }
}

/// Stamp a fresh `_id` onto `doc`.
pub(crate) fn assign_id(mut doc: Document) -> (String, Document) {
    let id = new_document_id();
    doc.insert(ID_FIELD.to_owned(), Value::String(id.clone()));
    (id, doc)
}
