//! Typed password record repository.
//!
//! [`PasswordStore`] is the record store the API service talks to. It wraps
//! an injected [`DocumentStore`] connection (there is no process-wide
//! handle) and adds the record-level rules: deletes need match criteria,
//! updates replace exactly the three content fields and fail with
//! [`StoreError::NotFound`] when nothing matches, and listings can be scoped
//! to one owner.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use passop_storage::{Document, DocumentStore, ID_FIELD};

use crate::error::StoreError;
use crate::record::RecordFields;

/// JSON key of the owning user's identifier.
pub const OWNER_FIELD: &str = "userId";

/// The record store.
///
/// Cheap to clone; clones share the underlying connection.
#[derive(Clone)]
pub struct PasswordStore {
    docs: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for PasswordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordStore").finish_non_exhaustive()
    }
}

/// A filter matching the record with the given `_id`.
#[must_use]
pub fn id_filter(id: &str) -> Document {
    let mut filter = Document::new();
    filter.insert(ID_FIELD.to_owned(), Value::String(id.to_owned()));
    filter
}

/// Restrict `filter` to documents owned by `owner`.
pub fn scope_to_owner(filter: &mut Document, owner: &str) {
    filter.insert(OWNER_FIELD.to_owned(), Value::String(owner.to_owned()));
}

impl PasswordStore {
    /// Wrap an open document store connection.
    #[must_use]
    pub fn new(docs: Arc<dyn DocumentStore>) -> Self {
        Self { docs }
    }

    /// Return all records, or only those owned by `owner` when given.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend fails.
    pub async fn list(&self, owner: Option<&str>) -> Result<Vec<Document>, StoreError> {
        let mut docs = self.docs.find_all().await?;
        if let Some(owner) = owner {
            docs.retain(|d| d.get(OWNER_FIELD).and_then(Value::as_str) == Some(owner));
        }
        debug!(count = docs.len(), scoped = owner.is_some(), "listed records");
        Ok(docs)
    }

    /// Insert a record as given and return it with its assigned `_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend fails.
    pub async fn insert(&self, doc: Document) -> Result<Document, StoreError> {
        let stored = self.docs.insert_one(doc).await?;
        debug!(id = ?stored.get(ID_FIELD), "inserted record");
        Ok(stored)
    }

    /// Remove at most one record matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyFilter`] if `filter` has no fields, or
    /// [`StoreError::Storage`] if the backend fails.
    pub async fn delete(&self, filter: &Document) -> Result<u64, StoreError> {
        if filter.is_empty() {
            return Err(StoreError::EmptyFilter);
        }
        let deleted = self.docs.delete_one(filter).await?;
        debug!(id = ?filter.get(ID_FIELD), deleted, "deleted record");
        Ok(deleted)
    }

    /// Replace the content fields of the record matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no record matches, or
    /// [`StoreError::Storage`] if the backend fails.
    pub async fn update(
        &self,
        filter: &Document,
        fields: &RecordFields,
    ) -> Result<Document, StoreError> {
        let updated = self.docs.update_one(filter, &fields.to_document()).await?;
        updated.ok_or_else(|| StoreError::NotFound {
            id: filter
                .get(ID_FIELD)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
        })
    }

    /// Close the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the backend does not shut down
    /// cleanly.
    pub async fn close(&self) -> Result<(), StoreError> {
        self.docs.close().await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use passop_storage::MemoryBackend;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => Document::new(),
        }
    }

    fn make_store() -> PasswordStore {
        PasswordStore::new(Arc::new(MemoryBackend::new()))
    }

    async fn seed(store: &PasswordStore, user: &str, site: &str) -> String {
        let stored = store
            .insert(doc(json!({
                "site": site, "username": "a", "password": "p1", "userId": user
            })))
            .await
            .unwrap();
        stored[ID_FIELD].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn list_is_unscoped_without_owner() {
        let store = make_store();
        seed(&store, "u1", "a.com").await;
        seed(&store, "u2", "b.com").await;
        assert_eq!(store.list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn list_scoped_to_owner() {
        let store = make_store();
        seed(&store, "u1", "a.com").await;
        seed(&store, "u2", "b.com").await;

        let docs = store.list(Some("u1")).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["site"], json!("a.com"));
    }

    #[tokio::test]
    async fn delete_rejects_empty_filter() {
        let store = make_store();
        seed(&store, "u1", "a.com").await;

        let err = store.delete(&Document::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::EmptyFilter));
        assert_eq!(store.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_by_id() {
        let store = make_store();
        let id = seed(&store, "u1", "a.com").await;

        assert_eq!(store.delete(&id_filter(&id)).await.unwrap(), 1);
        assert!(store.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn owner_scoped_delete_skips_foreign_records() {
        let store = make_store();
        let id = seed(&store, "u1", "a.com").await;

        let mut filter = id_filter(&id);
        scope_to_owner(&mut filter, "u2");
        assert_eq!(store.delete(&filter).await.unwrap(), 0);
        assert_eq!(store.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_replaces_content_fields() {
        let store = make_store();
        let id = seed(&store, "u1", "a.com").await;

        let updated = store
            .update(&id_filter(&id), &RecordFields::new("b.com", "b", "p2"))
            .await
            .unwrap();

        assert_eq!(updated[ID_FIELD], json!(id));
        assert_eq!(updated["userId"], json!("u1"));
        assert_eq!(updated["site"], json!("b.com"));
        assert_eq!(updated["password"], json!("p2"));
        assert_eq!(store.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let store = make_store();
        let err = store
            .update(&id_filter("ghost"), &RecordFields::new("s", "u", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { ref id } if id == "ghost"));
    }
}
