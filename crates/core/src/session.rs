use std::fmt;

use thiserror::Error;

use crate::model::UserId;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    #[error("no user is signed in")]
    NotSignedIn,
}

/// Identity issued by the auth provider for the signed-in user.
#[derive(Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: UserId,
    /// Bearer token forwarded to the hosted record store.
    pub access_token: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<String>,
}

impl UserIdentity {
    #[must_use]
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            access_token: None,
            display_name: None,
            role: None,
        }
    }

    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_profile(mut self, name: impl Into<String>, role: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self.role = Some(role.into());
        self
    }
}

// Keep tokens out of logs.
impl fmt::Debug for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserIdentity")
            .field("id", &self.id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .finish()
    }
}

/// Auth state handed explicitly to every operation that needs a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<UserIdentity>,
}

impl Session {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn signed_in(user: UserIdentity) -> Self {
        Self { user: Some(user) }
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    /// The signed-in user, or `AuthError::NotSignedIn`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` for an anonymous session.
    pub fn require_user(&self) -> Result<&UserIdentity, AuthError> {
        self.user.as_ref().ok_or(AuthError::NotSignedIn)
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn sign_out(&mut self) {
        self.user = None;
    }
}
