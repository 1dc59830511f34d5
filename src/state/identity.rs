use super::{AppState, ServiceError, ServiceResult};
use crate::identity::{is_well_formed_token, AnonymousIdentity, IdentityProvider};
use crate::store::{Precondition, StoreError};
use serde_json::{json, Value};

const MAX_TOKEN_ATTEMPTS: u32 = 4;

impl AppState {
    /// Mint a uid and record its private resume token
    pub async fn issue_identity(&self) -> ServiceResult<AnonymousIdentity> {
        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let identity = AnonymousIdentity::new(self.store.new_document_id());
            let data = json!({
                "uid": identity.current_user_id(),
                "issuedAt": chrono::Utc::now(),
            });

            match self
                .store
                .create_document(
                    &self.identities,
                    Some(identity.resume_token()),
                    data,
                    Precondition::Absent,
                )
                .await
            {
                Ok(_) => {
                    tracing::debug!("Issued identity {}", identity.current_user_id());
                    return Ok(identity);
                }
                Err(StoreError::VersionConflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Contention {
            code: String::new(),
            attempts: MAX_TOKEN_ATTEMPTS,
        })
    }

    /// The identity behind a resume token. Missing, malformed or unknown tokens
    /// get a fresh identity; a public uid is never accepted in place of a token.
    pub async fn resume_identity(&self, token: Option<&str>) -> ServiceResult<AnonymousIdentity> {
        let token = token.map(str::trim).filter(|t| !t.is_empty());

        if let Some(token) = token {
            if !is_well_formed_token(token) {
                tracing::debug!("Ignoring malformed resume token");
            } else if let Some(doc) = self.store.get_document(&self.identities, token).await? {
                match doc.data.get("uid").and_then(Value::as_str) {
                    Some(uid) => {
                        tracing::debug!("Resumed identity {}", uid);
                        return Ok(AnonymousIdentity::restore(uid, token));
                    }
                    None => tracing::warn!("Identity record without a uid, issuing a new one"),
                }
            } else {
                tracing::debug!("Unknown resume token, issuing a new identity");
            }
        }

        self.issue_identity().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_resumes_same_uid() {
        let state = AppState::in_memory();
        let issued = state.issue_identity().await.unwrap();

        let resumed = state
            .resume_identity(Some(issued.resume_token()))
            .await
            .unwrap();
        assert_eq!(resumed, issued);
    }

    #[tokio::test]
    async fn test_public_uid_does_not_resume() {
        let state = AppState::in_memory();
        let issued = state.issue_identity().await.unwrap();

        let other = state
            .resume_identity(Some(&issued.current_user_id()))
            .await
            .unwrap();
        assert_ne!(other.current_user_id(), issued.current_user_id());
        assert_ne!(other.resume_token(), issued.resume_token());
    }

    #[tokio::test]
    async fn test_missing_or_bad_tokens_get_fresh_identities() {
        let state = AppState::in_memory();
        for token in [None, Some(""), Some("   "), Some("not/a/token"), Some("unknown")] {
            let identity = state.resume_identity(token).await.unwrap();
            assert!(is_well_formed_token(identity.resume_token()));
            let again = state
                .resume_identity(Some(identity.resume_token()))
                .await
                .unwrap();
            assert_eq!(again.current_user_id(), identity.current_user_id());
        }
    }
}
