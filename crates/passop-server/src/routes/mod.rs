//! HTTP route handlers for `PassOP`.
//!
//! Routes are organized by concern:
//! - `passwords`: list, save, delete, and update records at `/`
//! - `health`: liveness probe at `/health`

pub mod health;
pub mod passwords;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use passop_core::api::USER_ID_HEADER;

use crate::state::AppState;

/// Upper bound on password requests handled at once.
pub const MAX_IN_FLIGHT: usize = 256;

/// Build the Axum router with all routes and middleware.
pub fn app(state: Arc<AppState>) -> Router {
    // The browser front end is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static(USER_ID_HEADER),
        ]);

    let password_routes = passwords::router()
        .layer(tower::limit::ConcurrencyLimitLayer::new(MAX_IN_FLIGHT));

    Router::new()
        .merge(password_routes)
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}
