//! HTTP client for the `PassOP` API.
//!
//! [`PasswordApi`] is the seam the [`Manager`](crate::Manager) talks through;
//! [`HttpApi`] is the real implementation over `reqwest`. Every request
//! targets the root path `/` and carries the signed-in user's id in the
//! `X-User-Id` header.

use serde::de::DeserializeOwned;
use serde_json::Value;

use passop_core::api::{
    ApiResponse, CreateRequest, DeleteRequest, DeleteResult, ErrorBody, UpdateRequest,
    USER_ID_HEADER,
};
use passop_core::record::RecordFields;

use crate::error::ClientError;

/// Operations the client performs against the API service.
#[async_trait::async_trait]
pub trait PasswordApi: Send + Sync {
    /// Fetch every record the server returns for `user_id`.
    ///
    /// Records come back as raw documents; the caller decides which are
    /// well-formed and owned by the user.
    async fn list(&self, user_id: &str) -> Result<Vec<Value>, ClientError>;

    /// Create a record owned by `user_id` and return it as stored.
    async fn create(&self, user_id: &str, fields: &RecordFields) -> Result<Value, ClientError>;

    /// Replace the content fields of record `id` and return the updated
    /// record.
    async fn update(
        &self,
        user_id: &str,
        id: &str,
        fields: &RecordFields,
    ) -> Result<Value, ClientError>;

    /// Delete record `id`, returning the number of records removed.
    async fn delete(&self, user_id: &str, id: &str) -> Result<u64, ClientError>;
}

/// [`PasswordApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Client for the service at `base_url` (e.g. `http://localhost:3000`).
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self) -> String {
        format!("{}/", self.base_url)
    }
}

/// Unwrap the `result` of a success envelope.
fn into_result<T>(envelope: ApiResponse<T>) -> Result<T, ClientError> {
    envelope
        .result
        .ok_or_else(|| ClientError::Decode(format!("response without result: {}", envelope.message)))
}

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body).map_or_else(
            |_| {
                if body.is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_owned()
                } else {
                    body.clone()
                }
            },
            |err| err.message,
        );
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(message));
        }
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

#[async_trait::async_trait]
impl PasswordApi for HttpApi {
    async fn list(&self, user_id: &str) -> Result<Vec<Value>, ClientError> {
        let resp = self
            .http
            .get(self.url())
            .header(USER_ID_HEADER, user_id)
            .send()
            .await?;
        handle_response(resp).await
    }

    async fn create(&self, user_id: &str, fields: &RecordFields) -> Result<Value, ClientError> {
        let body = CreateRequest {
            fields: fields.clone(),
            user_id: user_id.to_owned(),
        };
        let resp = self
            .http
            .post(self.url())
            .header(USER_ID_HEADER, user_id)
            .json(&body)
            .send()
            .await?;
        into_result(handle_response::<ApiResponse<Value>>(resp).await?)
    }

    async fn update(
        &self,
        user_id: &str,
        id: &str,
        fields: &RecordFields,
    ) -> Result<Value, ClientError> {
        let resp = self
            .http
            .put(self.url())
            .header(USER_ID_HEADER, user_id)
            .json(&UpdateRequest::new(id, fields, user_id))
            .send()
            .await?;
        into_result(handle_response::<ApiResponse<Value>>(resp).await?)
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<u64, ClientError> {
        let body = DeleteRequest {
            id: id.to_owned(),
            user_id: user_id.to_owned(),
        };
        let resp = self
            .http
            .delete(self.url())
            .header(USER_ID_HEADER, user_id)
            .json(&body)
            .send()
            .await?;
        let result: DeleteResult = into_result(handle_response(resp).await?)?;
        Ok(result.deleted_count)
    }
}
