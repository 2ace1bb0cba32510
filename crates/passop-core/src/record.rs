//! Password records and their content fields.
//!
//! A [`PasswordRecord`] is what the client works with: a stored document
//! with its store-assigned `_id`, its owner, and the three content fields.
//! [`RecordFields`] is the editable triple on its own: the form state on
//! the client and the `$set` payload of an update on the server.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use passop_storage::Document;

use crate::error::ValidationError;

/// One of the three editable fields of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Site,
    Username,
    Password,
}

impl Field {
    /// All content fields, in form order.
    pub const ALL: [Self; 3] = [Self::Site, Self::Username, Self::Password];

    /// The JSON key of this field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Site => "site",
            Self::Username => "username",
            Self::Password => "password",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "site" => Ok(Self::Site),
            "username" | "user" => Ok(Self::Username),
            "password" | "pass" => Ok(Self::Password),
            other => Err(format!("unknown field: {other}")),
        }
    }
}

/// The editable content of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub site: String,
    pub username: String,
    pub password: String,
}

impl RecordFields {
    /// Build a field triple.
    #[must_use]
    pub fn new(
        site: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            site: site.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reject the triple if any field is empty or whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] naming the first blank field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match Field::ALL.into_iter().find(|f| self.get(*f).trim().is_empty()) {
            Some(field) => Err(ValidationError::EmptyField { field }),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Site => &self.site,
            Field::Username => &self.username,
            Field::Password => &self.password,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Site => &mut self.site,
            Field::Username => &mut self.username,
            Field::Password => &mut self.password,
        };
        *slot = value.into();
    }

    /// Reset all fields to empty.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The fields as a document, suitable as an update's `$set`.
    #[must_use]
    pub fn to_document(&self) -> Document {
        Field::ALL
            .into_iter()
            .map(|f| (f.as_str().to_owned(), Value::String(self.get(f).to_owned())))
            .collect()
    }
}

/// A stored password record as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordRecord {
    /// Store-assigned identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Identifier of the owning user.
    #[serde(rename = "userId")]
    pub user_id: String,
    pub site: String,
    pub username: String,
    /// Stored in plain text.
    pub password: String,
}

impl PasswordRecord {
    /// Parse a stored document, returning `None` if it is not a well-formed
    /// record (missing fields, wrong types, or an empty content field).
    #[must_use]
    pub fn from_document(doc: Value) -> Option<Self> {
        serde_json::from_value::<Self>(doc)
            .ok()
            .filter(Self::is_complete)
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Whether all three content fields are non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        Field::ALL.into_iter().all(|f| !self.get(f).is_empty())
    }

    #[must_use]
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Site => &self.site,
            Field::Username => &self.username,
            Field::Password => &self.password,
        }
    }

    #[must_use]
    pub fn fields(&self) -> RecordFields {
        RecordFields::new(&self.site, &self.username, &self.password)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validate_accepts_filled_fields() {
        assert!(RecordFields::new("example.com", "a", "p1").validate().is_ok());
    }

    #[test]
    fn validate_rejects_whitespace() {
        let err = RecordFields::new("example.com", "   ", "p1")
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptyField {
                field: Field::Username
            }
        );
    }

    #[test]
    fn validate_reports_first_blank_field() {
        let err = RecordFields::default().validate().unwrap_err();
        assert_eq!(err, ValidationError::EmptyField { field: Field::Site });
    }

    #[test]
    fn set_and_clear() {
        let mut fields = RecordFields::default();
        fields.set(Field::Password, "hunter2");
        assert_eq!(fields.get(Field::Password), "hunter2");
        fields.clear();
        assert_eq!(fields, RecordFields::default());
    }

    #[test]
    fn to_document_has_only_content_fields() {
        let doc = RecordFields::new("s", "u", "p").to_document();
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.get("site"), Some(&json!("s")));
        assert_eq!(doc.get("password"), Some(&json!("p")));
    }

    #[test]
    fn field_parses_aliases() {
        assert_eq!("user".parse::<Field>().unwrap(), Field::Username);
        assert_eq!("PASSWORD".parse::<Field>().unwrap(), Field::Password);
        assert!("notes".parse::<Field>().is_err());
    }

    #[test]
    fn record_uses_wire_field_names() {
        let record = PasswordRecord::from_document(json!({
            "_id": "r1",
            "userId": "u1",
            "site": "example.com",
            "username": "a",
            "password": "p1",
            "extra": true
        }))
        .unwrap();
        assert_eq!(record.id, "r1");
        assert!(record.is_owned_by("u1"));
        assert!(!record.is_owned_by("u2"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["_id"], json!("r1"));
        assert_eq!(value["userId"], json!("u1"));
    }

    #[test]
    fn incomplete_documents_are_rejected() {
        assert!(PasswordRecord::from_document(json!({
            "_id": "r1", "userId": "u1", "site": "", "username": "a", "password": "p"
        }))
        .is_none());
        assert!(PasswordRecord::from_document(json!({
            "_id": "r1", "site": "s", "username": "a", "password": "p"
        }))
        .is_none());
        assert!(PasswordRecord::from_document(json!("not an object")).is_none());
    }
}
