//! JSON wire types shared by the server and the client.
//!
//! All operations live on the root path `/`. Mutating operations answer with
//! an [`ApiResponse`] envelope (`{success, result, message}`); failures carry
//! an [`ErrorBody`] with `success: false`.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::record::{Field, RecordFields};

/// Header carrying the signed-in user's identifier.
pub const USER_ID_HEADER: &str = "x-user-id";

pub const MSG_SAVED: &str = "password saved successfully";
pub const MSG_DELETED: &str = "password deleted successfully";
pub const MSG_UPDATED: &str = "Password updated successfully";
pub const MSG_INVALID: &str = "Invalid data";
pub const MSG_NOT_FOUND: &str = "Not found";
pub const MSG_SERVER_ERROR: &str = "Server error";

/// Success envelope for POST, PUT, and DELETE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `result`.
    #[must_use]
    pub fn ok(result: T, message: &str) -> Self {
        Self {
            success: true,
            result: Some(result),
            message: message.to_owned(),
        }
    }
}

/// Error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    /// Machine-readable error kind (`bad_request`, `not_found`, ...).
    #[serde(default)]
    pub error: String,
    pub message: String,
}

/// Result payload of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub deleted_count: u64,
}

/// Body the client sends to create a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    #[serde(flatten)]
    pub fields: RecordFields,
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// Body the client sends to delete a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// Body of an update. Every field is optional on the wire so that a missing
/// field is reported as invalid data rather than a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl UpdateRequest {
    /// Build a full update for record `id`.
    #[must_use]
    pub fn new(id: &str, fields: &RecordFields, user_id: &str) -> Self {
        Self {
            id: Some(id.to_owned()),
            site: Some(fields.site.clone()),
            username: Some(fields.username.clone()),
            password: Some(fields.password.clone()),
            user_id: Some(user_id.to_owned()),
        }
    }

    /// Split into the target id and the replacement fields.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the id or any content field is
    /// missing or empty.
    pub fn into_parts(self) -> Result<(String, RecordFields), ValidationError> {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .ok_or(ValidationError::MissingId)?;

        let take = |value: Option<String>, field: Field| {
            value
                .filter(|v| !v.is_empty())
                .ok_or(ValidationError::EmptyField { field })
        };

        let fields = RecordFields {
            site: take(self.site, Field::Site)?,
            username: take(self.username, Field::Username)?,
            password: take(self.password, Field::Password)?,
        };

        Ok((id, fields))
    }
}
