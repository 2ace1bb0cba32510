//! Password routes: everything on `/`.
//!
//! Each handler is a single pass-through to the record store:
//! - `GET    /`: all records (scoped to `X-User-Id` when enabled)
//! - `POST   /`: insert the body as given
//! - `DELETE /`: remove one record matching the body
//! - `PUT    /`: replace the content fields of record `id`

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{debug, info};

use passop_core::api::{
    ApiResponse, DeleteResult, UpdateRequest, MSG_DELETED, MSG_INVALID, MSG_SAVED, MSG_UPDATED,
    USER_ID_HEADER,
};
use passop_core::error::StoreError;
use passop_core::store::{id_filter, scope_to_owner};
use passop_core::Document;

use crate::error::AppError;
use crate::state::AppState;

/// Build the password router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/",
        get(list_passwords)
            .post(save_password)
            .delete(delete_password)
            .put(update_password),
    )
}

/// The caller's user id, if owner scoping is on and the header is present.
///
/// The header is trusted as-is; it is not an authentication mechanism.
fn caller(state: &AppState, headers: &HeaderMap) -> Option<String> {
    if !state.scope_to_owner {
        return None;
    }
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// List password records.
async fn list_passwords(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Document>>, AppError> {
    let owner = caller(&state, &headers);
    let docs = state.store.list(owner.as_deref()).await?;
    Ok(Json(docs))
}

/// Save a password record. Fields are not validated here.
async fn save_password(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    let Json(body) = body?;
    let stored = state.store.insert(body).await?;
    info!(id = ?stored.get("_id"), "password saved");
    Ok(Json(ApiResponse::ok(stored, MSG_SAVED)))
}

/// Delete the first record matching the body's fields.
async fn delete_password(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    filter: Result<Json<Document>, JsonRejection>,
) -> Result<Json<ApiResponse<DeleteResult>>, AppError> {
    let Json(mut filter) = filter?;
    // Checked before scoping: `{userId}` alone must not match an arbitrary record.
    if filter.is_empty() {
        return Err(StoreError::EmptyFilter.into());
    }
    if let Some(owner) = caller(&state, &headers) {
        scope_to_owner(&mut filter, &owner);
    }

    let deleted_count = state.store.delete(&filter).await?;
    info!(id = ?filter.get("_id"), deleted_count, "password delete");
    Ok(Json(ApiResponse::ok(
        DeleteResult { deleted_count },
        MSG_DELETED,
    )))
}

/// Replace site, username, and password of an existing record.
async fn update_password(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    // Any unreadable update body is invalid data, same as a missing field.
    let Json(body) = body.map_err(|rejection| {
        debug!(reason = %rejection.body_text(), "update body rejected");
        AppError::BadRequest(MSG_INVALID.to_owned())
    })?;
    let (id, fields) = body.into_parts()?;

    let mut filter = id_filter(&id);
    if let Some(owner) = caller(&state, &headers) {
        scope_to_owner(&mut filter, &owner);
    }

    let updated = state.store.update(&filter, &fields).await?;
    info!(id = %id, "password updated");
    Ok(Json(ApiResponse::ok(updated, MSG_UPDATED)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use passop_core::store::PasswordStore;
    use passop_storage::MemoryBackend;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn make_app(scope_to_owner: bool) -> Router {
        let store = PasswordStore::new(Arc::new(MemoryBackend::new()));
        crate::routes::app(Arc::new(AppState::new(store, scope_to_owner)))
    }

    async fn call(
        app: &Router,
        method: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri("/");
        if let Some(user) = user {
            req = req.header(USER_ID_HEADER, user);
        }
        let req = match body {
            Some(body) => req
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn save(app: &Router, user: &str, site: &str) -> String {
        let (status, body) = call(
            app,
            "POST",
            Some(user),
            Some(json!({"site": site, "username": "a", "password": "p1", "userId": user})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["result"]["_id"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn get_on_empty_store_returns_empty_array() {
        let app = make_app(true);
        let (status, body) = call(&app, "GET", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn post_returns_envelope_with_stored_record() {
        let app = make_app(true);
        let (status, body) = call(
            &app,
            "POST",
            None,
            Some(json!({"site": "example.com", "username": "a", "password": "p1", "userId": "u1"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["message"], json!("password saved successfully"));
        assert_eq!(body["result"]["site"], json!("example.com"));
        assert!(body["result"]["_id"].is_string());
    }

    #[tokio::test]
    async fn post_does_not_validate_fields() {
        let app = make_app(true);
        let (status, body) = call(&app, "POST", None, Some(json!({"site": ""}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));

        let (_, list) = call(&app, "GET", None, None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn post_rejects_non_object_body() {
        let app = make_app(true);
        let (status, body) = call(&app, "POST", None, Some(json!(["not", "a", "record"]))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("invalid_body"));
        assert!(body["message"].is_string());

        let (_, list) = call(&app, "GET", None, None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn get_without_header_is_unscoped() {
        let app = make_app(true);
        save(&app, "u1", "a.com").await;
        save(&app, "u2", "b.com").await;

        let (_, list) = call(&app, "GET", None, None).await;
        assert_eq!(list.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn get_with_header_is_scoped_to_owner() {
        let app = make_app(true);
        save(&app, "u1", "a.com").await;
        save(&app, "u2", "b.com").await;

        let (_, list) = call(&app, "GET", Some("u1"), None).await;
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["site"], json!("a.com"));
    }

    #[tokio::test]
    async fn scoping_disabled_ignores_header() {
        let app = make_app(false);
        save(&app, "u1", "a.com").await;
        save(&app, "u2", "b.com").await;

        let (_, list) = call(&app, "GET", Some("u1"), None).await;
        assert_eq!(list.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_by_id() {
        let app = make_app(true);
        let id = save(&app, "u1", "a.com").await;

        let (status, body) = call(
            &app,
            "DELETE",
            Some("u1"),
            Some(json!({"_id": id, "userId": "u1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["result"]["deletedCount"], json!(1));
        assert_eq!(body["message"], json!("password deleted successfully"));

        let (_, list) = call(&app, "GET", None, None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn delete_of_foreign_record_removes_nothing() {
        let app = make_app(true);
        let id = save(&app, "u1", "a.com").await;

        let (status, body) = call(&app, "DELETE", Some("u2"), Some(json!({"_id": id}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["deletedCount"], json!(0));

        let (_, list) = call(&app, "GET", None, None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_with_empty_body_is_rejected() {
        let app = make_app(true);
        save(&app, "u1", "a.com").await;

        let (status, body) = call(&app, "DELETE", Some("u1"), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));

        let (_, list) = call(&app, "GET", None, None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn put_updates_record_in_place() {
        let app = make_app(true);
        let id = save(&app, "u1", "example.com").await;

        let (status, body) = call(
            &app,
            "PUT",
            Some("u1"),
            Some(json!({"id": id, "site": "example.com", "username": "a", "password": "p2"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("Password updated successfully"));
        assert_eq!(body["result"]["_id"], json!(id));
        assert_eq!(body["result"]["password"], json!("p2"));
        assert_eq!(body["result"]["userId"], json!("u1"));

        let (_, list) = call(&app, "GET", None, None).await;
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["password"], json!("p2"));
    }

    #[tokio::test]
    async fn put_with_missing_field_is_invalid() {
        let app = make_app(true);
        let id = save(&app, "u1", "example.com").await;

        let (status, body) = call(
            &app,
            "PUT",
            None,
            Some(json!({"id": id, "site": "example.com", "username": "a"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"success": false, "error": "bad_request", "message": "Invalid data"}));
    }

    #[tokio::test]
    async fn put_with_wrongly_typed_body_is_invalid() {
        let app = make_app(true);
        let invalid = json!({"success": false, "error": "bad_request", "message": "Invalid data"});

        for body in [
            json!({"id": 5, "site": "s", "username": "u", "password": "p"}),
            json!({"id": "a", "_id": "a", "site": "s", "username": "u", "password": "p"}),
            json!("not a record"),
        ] {
            let (status, response) = call(&app, "PUT", None, Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response, invalid);
        }

        let (status, response) = call(&app, "PUT", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response, invalid);
    }

    #[tokio::test]
    async fn delete_without_body_gets_error_envelope() {
        let app = make_app(true);
        save(&app, "u1", "a.com").await;

        let (status, body) = call(&app, "DELETE", Some("u1"), None).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("invalid_body"));

        let (_, list) = call(&app, "GET", None, None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_json_gets_error_envelope() {
        let app = make_app(true);
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from("{\"site\": "))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("invalid_body"));
    }

    #[tokio::test]
    async fn put_unknown_id_is_not_found() {
        let app = make_app(true);
        let (status, body) = call(
            &app,
            "PUT",
            None,
            Some(json!({"id": "ghost", "site": "s", "username": "u", "password": "p"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], json!("Not found"));
    }

    #[tokio::test]
    async fn put_on_foreign_record_is_not_found() {
        let app = make_app(true);
        let id = save(&app, "u1", "example.com").await;

        let (status, _) = call(
            &app,
            "PUT",
            Some("u2"),
            Some(json!({"id": id, "site": "s", "username": "u", "password": "p"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = make_app(true);
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
