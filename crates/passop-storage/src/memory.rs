//! In-memory document store.
//!
//! Documents live in a `Vec` behind a `RwLock`, in insertion order. Nothing
//! is persisted; all data is lost when the process exits. Use this for unit
//! tests, integration tests, and `memory://` development servers.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{apply_set, assign_id, matches, Document, DocumentStore, StorageError};

/// An in-memory document collection.
///
/// Thread-safe and async-compatible. Clones share the same collection.
///
/// # Examples
///
/// ```
/// # use passop_storage::{Document, DocumentStore, MemoryBackend};
/// # #[tokio::main]
/// # async fn main() {
/// let backend = MemoryBackend::new();
/// let stored = backend.insert_one(Document::new()).await.unwrap();
/// assert!(stored.contains_key("_id"));
/// assert_eq!(backend.find_all().await.unwrap().len(), 1);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    docs: Arc<RwLock<Vec<Document>>>,
}

impl MemoryBackend {
    /// Create a new empty in-memory collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryBackend {
    async fn find_all(&self) -> Result<Vec<Document>, StorageError> {
        Ok(self.docs.read().await.clone())
    }

    async fn insert_one(&self, doc: Document) -> Result<Document, StorageError> {
        let (_, doc) = assign_id(doc);
        self.docs.write().await.push(doc.clone());
        Ok(doc)
    }

    async fn delete_one(&self, filter: &Document) -> Result<u64, StorageError> {
        let mut docs = self.docs.write().await;
        match docs.iter().position(|d| matches(d, filter)) {
            Some(idx) => {
                docs.remove(idx);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn update_one(
        &self,
        filter: &Document,
        set: &Document,
    ) -> Result<Option<Document>, StorageError> {
        let mut docs = self.docs.write().await;
        Ok(docs.iter_mut().find(|d| matches(d, filter)).map(|d| {
            apply_set(d, set);
            d.clone()
        }))
    }
}
