//! `PassOP` client.
//!
//! The client side of the password manager: an HTTP client for the API
//! service, the [`Manager`] that holds form, list, edit, delete, and copy
//! state, and pure text views over that state. The `passop` binary drives
//! it from the terminal.

pub mod api;
pub mod clipboard;
pub mod controller;
pub mod error;
pub mod notify;
pub mod session;
pub mod view;

pub use api::{HttpApi, PasswordApi};
pub use controller::Manager;
pub use error::ClientError;
pub use session::{IdentityConfig, Session};
