//! The password manager's client-side state and actions.
//!
//! [`Manager`] owns everything the views render: the session, the form, the
//! fetched records, the edit and delete flows, the copy marker, and the
//! notification queue. Each action awaits at most one request and reconciles
//! local state from the server's answer; the last response wins.
//!
//! Form flow: `Idle -> Editing -> Idle` (save or cancel).
//! Delete flow: `Idle -> PendingDelete -> Idle` (confirm or cancel).

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use passop_core::record::{Field, PasswordRecord, RecordFields};

use crate::api::PasswordApi;
use crate::clipboard::{Clipboard, CopyFeedback, CopyMarker};
use crate::error::ClientError;
use crate::notify::Notifications;
use crate::session::Session;

pub const MSG_FILL_ALL_FIELDS: &str = "Please fill in all fields before saving!";
pub const MSG_SIGN_IN_TO_SAVE: &str = "Please sign in to save passwords.";
pub const MSG_SAVED: &str = "Password saved successfully!";
pub const MSG_UPDATED: &str = "Password updated successfully!";
pub const MSG_DELETED: &str = "Password deleted successfully!";
pub const MSG_COPIED: &str = "Copied to clipboard!";
pub const MSG_NOT_FOUND_FOR_EDIT: &str = "Password not found for editing.";
pub const MSG_LOAD_FAILED: &str = "Failed to load passwords.";
pub const MSG_SAVE_FAILED: &str = "Failed to save password.";
pub const MSG_DELETE_FAILED: &str = "Failed to delete password.";
pub const MSG_COPY_FAILED: &str = "Failed to copy to clipboard.";

/// Client state controller.
pub struct Manager {
    api: Arc<dyn PasswordApi>,
    clipboard: Box<dyn Clipboard>,
    session: Session,
    form: RecordFields,
    records: Vec<PasswordRecord>,
    editing: Option<String>,
    pending_delete: Option<String>,
    show_password: bool,
    copy: CopyFeedback,
    notifications: Notifications,
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("session", &self.session)
            .field("records", &self.records.len())
            .field("editing", &self.editing)
            .field("pending_delete", &self.pending_delete)
            .finish_non_exhaustive()
    }
}

impl Manager {
    #[must_use]
    pub fn new(api: Arc<dyn PasswordApi>, clipboard: Box<dyn Clipboard>, session: Session) -> Self {
        Self {
            api,
            clipboard,
            session,
            form: RecordFields::default(),
            records: Vec::new(),
            editing: None,
            pending_delete: None,
            show_password: false,
            copy: CopyFeedback::new(),
            notifications: Notifications::new(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn form(&self) -> &RecordFields {
        &self.form
    }

    #[must_use]
    pub fn records(&self) -> &[PasswordRecord] {
        &self.records
    }

    #[must_use]
    pub fn record(&self, id: &str) -> Option<&PasswordRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    #[must_use]
    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    #[must_use]
    pub fn show_password(&self) -> bool {
        self.show_password
    }

    #[must_use]
    pub fn copy_feedback(&self) -> &CopyFeedback {
        &self.copy
    }

    #[must_use]
    pub fn copied(&self) -> Option<CopyMarker> {
        self.copy.current()
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    #[must_use]
    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Apply a session change reported by the identity provider.
    ///
    /// Whenever the signed-in user changes, including on sign-out, all
    /// fetched records and any in-progress flow are dropped.
    pub fn set_session(&mut self, session: Session) {
        if session.user_id() != self.session.user_id() {
            self.records.clear();
            self.editing = None;
            self.pending_delete = None;
            self.form.clear();
        }
        self.session = session;
    }

    /// Fetch the signed-in user's records.
    ///
    /// Only well-formed records owned by the user are kept, whatever the
    /// server returns.
    ///
    /// # Errors
    ///
    /// Returns the transport or API error; the list is cleared and an error
    /// notification is queued.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        let user_id = match &self.session {
            Session::SignedIn { user_id } => user_id.clone(),
            Session::SignedOut => {
                self.records.clear();
                return Ok(());
            }
            Session::Loading => return Ok(()),
        };

        match self.api.list(&user_id).await {
            Ok(docs) => {
                let total = docs.len();
                self.records = docs
                    .into_iter()
                    .filter_map(PasswordRecord::from_document)
                    .filter(|r| r.is_owned_by(&user_id))
                    .collect();
                debug!(total, kept = self.records.len(), "loaded records");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to load records");
                self.records.clear();
                self.notifications.error(MSG_LOAD_FAILED);
                Err(e)
            }
        }
    }

    // ── Form ─────────────────────────────────────────────────────────

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.form.set(field, value);
    }

    pub fn toggle_password_visibility(&mut self) {
        self.show_password = !self.show_password;
    }

    /// Save the form: update when editing, create otherwise.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotAuthenticated`] when signed out
    /// - [`ClientError::Validation`] when a field is blank; nothing is sent
    /// - any transport or API error; local state is left unchanged
    pub async fn save(&mut self) -> Result<(), ClientError> {
        let Some(user_id) = self.session.user_id().map(str::to_owned) else {
            self.notifications.error(MSG_SIGN_IN_TO_SAVE);
            return Err(ClientError::NotAuthenticated);
        };

        if let Err(e) = self.form.validate() {
            self.notifications.error(MSG_FILL_ALL_FIELDS);
            return Err(e.into());
        }

        match self.editing.clone() {
            Some(id) => {
                let doc = self.api.update(&user_id, &id, &self.form).await;
                let record = self.accept(doc)?;
                match self.records.iter_mut().find(|r| r.id == record.id) {
                    Some(slot) => *slot = record,
                    None => self.records.push(record),
                }
                self.editing = None;
                self.form.clear();
                self.notifications.info(MSG_UPDATED);
            }
            None => {
                let doc = self.api.create(&user_id, &self.form).await;
                let record = self.accept(doc)?;
                self.records.push(record);
                self.form.clear();
                self.notifications.success(MSG_SAVED);
            }
        }
        Ok(())
    }

    /// Turn a write response into a record, queuing the failure toast on
    /// error.
    fn accept(&mut self, doc: Result<Value, ClientError>) -> Result<PasswordRecord, ClientError> {
        let parsed = doc.and_then(|doc| {
            PasswordRecord::from_document(doc)
                .ok_or_else(|| ClientError::Decode("server returned a malformed record".to_owned()))
        });
        if let Err(e) = &parsed {
            warn!(error = %e, "failed to save record");
            self.notifications.error(MSG_SAVE_FAILED);
        }
        parsed
    }

    /// Load record `id` into the form and enter editing.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if no loaded record has that id.
    pub fn edit(&mut self, id: &str) -> Result<(), ClientError> {
        let Some(record) = self.record(id) else {
            self.notifications.error(MSG_NOT_FOUND_FOR_EDIT);
            return Err(ClientError::NotFound(id.to_owned()));
        };
        self.form = record.fields();
        self.editing = Some(id.to_owned());
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.form.clear();
    }

    // ── Delete ───────────────────────────────────────────────────────

    /// Mark `id` for deletion, pending confirmation.
    pub fn request_delete(&mut self, id: &str) {
        self.pending_delete = Some(id.to_owned());
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the pending record, then re-fetch.
    ///
    /// The pending state ends whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NothingPending`] without a pending delete,
    /// [`ClientError::NotAuthenticated`] when signed out, or the transport
    /// or API error.
    pub async fn confirm_delete(&mut self) -> Result<(), ClientError> {
        let Some(id) = self.pending_delete.take() else {
            return Err(ClientError::NothingPending);
        };
        let Some(user_id) = self.session.user_id().map(str::to_owned) else {
            return Err(ClientError::NotAuthenticated);
        };

        match self.api.delete(&user_id, &id).await {
            Ok(deleted) => {
                debug!(id = %id, deleted, "deleted record");
                self.records.retain(|r| r.id != id);
                if self.editing.as_deref() == Some(id.as_str()) {
                    self.cancel_edit();
                }
                self.notifications.success(MSG_DELETED);
                // A failed refresh is already reported by `load`.
                let _ = self.load().await;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, id = %id, "failed to delete record");
                self.notifications.error(MSG_DELETE_FAILED);
                Err(e)
            }
        }
    }

    // ── Copy ─────────────────────────────────────────────────────────

    /// Copy one field of record `id` to the clipboard and mark the cell.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] for an unknown id, or
    /// [`ClientError::Clipboard`] if the write fails.
    pub fn copy(&mut self, id: &str, field: Field) -> Result<(), ClientError> {
        let Some(value) = self.record(id).map(|r| r.get(field).to_owned()) else {
            return Err(ClientError::NotFound(id.to_owned()));
        };

        if let Err(e) = self.clipboard.set_text(&value) {
            self.notifications.error(MSG_COPY_FAILED);
            return Err(e);
        }

        self.copy.mark(CopyMarker {
            id: id.to_owned(),
            field,
        });
        self.notifications.info(MSG_COPIED);
        Ok(())
    }
}
