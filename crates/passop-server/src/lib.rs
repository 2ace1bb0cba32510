//! `PassOP` HTTP server.
//!
//! Wires the record store and the HTTP routes into a running Axum server.
//! The whole password API lives on the root path `/`; `/health` is a
//! liveness probe.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
