//! Error types for `passop-core`.
//!
//! Each error variant carries enough context to diagnose the problem without
//! a debugger. Secret values are never included, only field names and
//! record identifiers.

use passop_storage::StorageError;

use crate::record::Field;

/// A record failed field validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A content field was missing, empty, or whitespace.
    #[error("{field} must not be empty")]
    EmptyField { field: Field },

    /// An update did not name the record to change.
    #[error("record id must not be empty")]
    MissingId,
}

/// Errors from the typed record repository.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record matched the update criteria.
    #[error("no password record matches id '{id}'")]
    NotFound { id: String },

    /// Delete was called without any match criteria.
    #[error("delete requires at least one match field")]
    EmptyFilter,

    /// The underlying document store returned an error.
    #[error("record store error: {0}")]
    Storage(#[from] StorageError),
}
