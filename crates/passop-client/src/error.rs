//! Error types for the `PassOP` client.

use passop_core::error::ValidationError;

/// Errors surfaced by the API client and the [`Manager`](crate::Manager).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No user is signed in.
    #[error("not signed in")]
    NotAuthenticated,

    /// The identity provider key is not configured.
    #[error("missing publishable key: set PASSOP_PUBLISHABLE_KEY")]
    MissingPublishableKey,

    /// The form failed validation before any request was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// `confirm_delete` was called with no delete pending.
    #[error("no delete is pending")]
    NothingPending,

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The request never completed.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a body the client could not interpret.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The system clipboard rejected the write.
    #[error("clipboard error: {0}")]
    Clipboard(String),
}
