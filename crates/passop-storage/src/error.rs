//! Storage error types.
//!
//! Every error variant carries enough context to diagnose the problem
//! without a debugger. Document contents are never included, only the
//! collection name and document id.

/// Errors that can occur during document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to open or connect to the backend.
    #[error("failed to open storage at '{location}': {reason}")]
    Open { location: String, reason: String },

    /// Failed to read documents from the collection.
    #[error("failed to read collection '{collection}': {reason}")]
    Read { collection: String, reason: String },

    /// Failed to insert or update a document.
    #[error("failed to write document '{id}': {reason}")]
    Write { id: String, reason: String },

    /// Failed to remove a document.
    #[error("failed to delete document '{id}': {reason}")]
    Delete { id: String, reason: String },

    /// A document could not be serialized for storage.
    #[error("failed to encode document '{id}': {reason}")]
    Encode { id: String, reason: String },

    /// A stored value is not a valid JSON object.
    #[error("failed to decode stored document '{key}': {reason}")]
    Decode { key: String, reason: String },

    /// The backend did not shut down cleanly.
    #[error("failed to close storage: {reason}")]
    Close { reason: String },
}
