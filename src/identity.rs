//! Anonymous player identity.
//!
//! Every client gets a stable uid before it can act. There are no accounts. The
//! uid is public (every session view lists it), so resuming goes through a
//! separate private token that only the owning client ever receives.

use crate::types::UserId;

pub trait IdentityProvider: Send + Sync {
    fn current_user_id(&self) -> UserId;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymousIdentity {
    uid: UserId,
    resume_token: String,
}

impl AnonymousIdentity {
    /// Fresh uid paired with the given private token
    pub fn new(resume_token: impl Into<String>) -> Self {
        Self {
            uid: ulid::Ulid::new().to_string(),
            resume_token: resume_token.into(),
        }
    }

    /// Identity recovered from a stored token record
    pub fn restore(uid: impl Into<UserId>, resume_token: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            resume_token: resume_token.into(),
        }
    }

    /// Secret to present on reconnect. Never put this in a session view.
    pub fn resume_token(&self) -> &str {
        &self.resume_token
    }
}

impl IdentityProvider for AnonymousIdentity {
    fn current_user_id(&self) -> UserId {
        self.uid.clone()
    }
}

/// Shape check for client-supplied tokens before they are used as a document id
pub fn is_well_formed_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphanumeric())
}
