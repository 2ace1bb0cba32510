//! HTTP error types for the `PassOP` server.
//!
//! Maps domain errors from `passop-core` into HTTP responses. Every error
//! produces a JSON body with `success: false`, a machine-readable `error`
//! kind, and a human-readable `message`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use passop_core::api::{ErrorBody, MSG_INVALID, MSG_NOT_FOUND, MSG_SERVER_ERROR};
use passop_core::error::{StoreError, ValidationError};

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Client sent invalid input.
    BadRequest(String),
    /// The request body was missing, malformed, or not the expected shape.
    /// Keeps the status axum chose for the rejection.
    InvalidBody { status: StatusCode, message: String },
    /// The record to change does not exist.
    NotFound(String),
    /// Internal server error. The detail is logged, never returned.
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::InvalidBody { status, message } => (status, "invalid_body", message),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    MSG_SERVER_ERROR.to_owned(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error: error_type.to_owned(),
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(MSG_NOT_FOUND.to_owned()),
            StoreError::EmptyFilter => Self::BadRequest(err.to_string()),
            StoreError::Storage(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(_: ValidationError) -> Self {
        Self::BadRequest(MSG_INVALID.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use passop_storage::StorageError;

    async fn body_of(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_uses_fixed_message() {
        let (status, body) = body_of(
            StoreError::NotFound {
                id: "r1".to_owned(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.success);
        assert_eq!(body.message, "Not found");
    }

    #[tokio::test]
    async fn validation_maps_to_invalid_data() {
        let (status, body) = body_of(ValidationError::MissingId.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "bad_request");
        assert_eq!(body.message, "Invalid data");
    }

    #[tokio::test]
    async fn internal_errors_hide_detail() {
        let err = StoreError::Storage(StorageError::Read {
            collection: "passwords".to_owned(),
            reason: "connection reset".to_owned(),
        });
        let (status, body) = body_of(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Server error");
    }
}
