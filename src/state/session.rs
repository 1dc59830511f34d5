use super::{AppState, ServiceError, ServiceResult};
use crate::game;
use crate::store::{Precondition, StoreError};
use crate::types::*;

/// Fresh codes to try before giving up on finding an unused one
const MAX_CODE_ATTEMPTS: u32 = 16;

impl AppState {
    /// Create a session in the lobby with the caller as host
    pub async fn create_session(
        &self,
        host_uid: &str,
        host_name: &str,
    ) -> ServiceResult<VersionedSession> {
        // Validates the name before any code is drawn
        let mut session = game::create_session("", host_uid, host_name)?;

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = game::normalize_code(&self.store.new_document_id());
            session.code = code.clone();
            let data = serde_json::to_value(&session).map_err(ServiceError::Corrupt)?;

            match self
                .store
                .create_document(self.collection(), Some(&code), data, Precondition::Absent)
                .await
            {
                Ok(_) => {
                    tracing::info!("Session {} created by {}", code, host_uid);
                    return self.get_session(&code).await;
                }
                Err(StoreError::VersionConflict { .. }) => {
                    tracing::debug!("Session code {} already taken, drawing another", code);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Contention {
            code: String::new(),
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    pub async fn join_session(
        &self,
        code: &str,
        uid: &str,
        name: &str,
    ) -> ServiceResult<VersionedSession> {
        let joined = self
            .update_session(code, |s, _, _| game::join_session(s, uid, name))
            .await?;
        tracing::info!(
            "{} in session {} ({} players)",
            uid,
            joined.session.code,
            joined.session.players.len()
        );
        Ok(joined)
    }

    pub async fn start_game(&self, code: &str, actor_uid: &str) -> ServiceResult<VersionedSession> {
        self.update_session(code, |s, words, rng| {
            game::start_game(s, actor_uid, words, rng)
        })
        .await
    }

    pub async fn submit_word(
        &self,
        code: &str,
        actor_uid: &str,
        word: &str,
    ) -> ServiceResult<VersionedSession> {
        self.update_session(code, |s, _, _| game::submit_word(s, actor_uid, word))
            .await
    }

    pub async fn cast_vote(
        &self,
        code: &str,
        actor_uid: &str,
        target_uid: &str,
    ) -> ServiceResult<VersionedSession> {
        let voted = self
            .update_session(code, |s, _, _| game::cast_vote(s, actor_uid, target_uid))
            .await?;
        if let Some(winner) = voted.session.winner {
            tracing::info!(
                "Session {} finished: {:?} win, voted out {:?}",
                voted.session.code,
                winner,
                voted.session.voted_out_uid
            );
        }
        Ok(voted)
    }

    pub async fn play_again(&self, code: &str, actor_uid: &str) -> ServiceResult<VersionedSession> {
        self.update_session(code, |s, words, rng| {
            game::play_again(s, actor_uid, words, rng)
        })
        .await
    }
}
