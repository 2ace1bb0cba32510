//! Core library for `PassOP`.
//!
//! Contains the password record model, field validation, the typed record
//! repository that sits on top of a `passop-storage` document collection,
//! and the JSON wire types shared by the HTTP server and the client. This
//! crate knows nothing about HTTP frameworks or terminals.

pub mod api;
pub mod error;
pub mod record;
pub mod store;

pub use passop_storage::Document;
