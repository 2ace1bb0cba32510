//! Shared application state for the `PassOP` server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. It owns the record store connection, which is
//! opened before the listener binds and closed after graceful shutdown.

use passop_core::store::PasswordStore;

/// Shared application state passed to all HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The password record store.
    pub store: PasswordStore,
    /// Whether the `X-User-Id` header scopes reads and writes.
    pub scope_to_owner: bool,
}

impl AppState {
    #[must_use]
    pub fn new(store: PasswordStore, scope_to_owner: bool) -> Self {
        Self {
            store,
            scope_to_owner,
        }
    }
}
