//! Sign-in state as reported by the identity provider.
//!
//! Authentication itself is delegated: the client only learns whether a
//! user is signed in and, if so, their identifier.

use crate::error::ClientError;

/// Sign-in state of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// The identity provider has not reported yet.
    Loading,
    SignedOut,
    SignedIn { user_id: String },
}

impl Session {
    /// A signed-in session for `user_id`, or signed-out when it is absent or
    /// blank.
    #[must_use]
    pub fn from_user_id(user_id: Option<String>) -> Self {
        match user_id {
            Some(id) if !id.trim().is_empty() => Self::SignedIn {
                user_id: id.trim().to_owned(),
            },
            _ => Self::SignedOut,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::SignedIn { user_id } => Some(user_id),
            Self::Loading | Self::SignedOut => None,
        }
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }
}

/// Client-side identity provider settings.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    pub publishable_key: String,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("publishable_key", &"[redacted]")
            .finish()
    }
}

impl IdentityConfig {
    /// Build the configuration, failing fast when the key is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingPublishableKey`] if `publishable_key`
    /// is absent or blank.
    pub fn new(publishable_key: Option<String>) -> Result<Self, ClientError> {
        publishable_key
            .filter(|k| !k.trim().is_empty())
            .map(|publishable_key| Self { publishable_key })
            .ok_or(ClientError::MissingPublishableKey)
    }
}
