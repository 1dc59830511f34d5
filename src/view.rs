//! What one player is allowed to see of a session.
//!
//! The stored session holds every secret. Before it goes over the wire it is
//! projected for the viewer: the imposter never gets the secret word, and other
//! players' roles stay hidden until the game is finished.

use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub uid: UserId,
    pub name: String,
    pub is_host: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub has_voted: bool,
    /// This player's word, once submitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub code: SessionCode,
    pub version: u64,
    pub status: SessionStatus,
    pub players: Vec<PlayerView>,
    pub words: Vec<WordEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_word: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_player_uid: Option<UserId>,
    pub vote_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_role: Option<Role>,
    pub is_host: bool,
    pub is_my_turn: bool,
    pub has_voted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voted_out_uid: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imposter_uid: Option<UserId>,
}

impl SessionView {
    /// Project `versioned` for `viewer`. `None` views as an outsider.
    pub fn for_viewer(versioned: &VersionedSession, viewer: Option<&str>) -> Self {
        let session = &versioned.session;
        let finished = session.status == SessionStatus::Finished;
        let me = viewer.and_then(|uid| session.player(uid));
        let my_role = me.and_then(|p| p.role);

        let secret_word = match (session.status, my_role) {
            (SessionStatus::Lobby, _) => None,
            (_, Some(Role::Crew)) => session.secret_word.clone(),
            (SessionStatus::Finished, _) => session.secret_word.clone(),
            _ => None,
        };

        let players = session
            .players
            .iter()
            .map(|p| {
                let is_me = me.is_some_and(|m| m.uid == p.uid);
                PlayerView {
                    uid: p.uid.clone(),
                    name: p.name.clone(),
                    is_host: p.is_host,
                    role: if finished || is_me { p.role } else { None },
                    has_voted: session.has_voted(&p.uid),
                    word: session
                        .words
                        .iter()
                        .find(|w| w.uid == p.uid)
                        .map(|w| w.word.clone()),
                }
            })
            .collect();

        let current_player_uid = match session.status {
            SessionStatus::Playing => session.current_player_uid.clone(),
            _ => None,
        };
        let is_my_turn = match (&current_player_uid, me) {
            (Some(current), Some(me)) => *current == me.uid,
            _ => false,
        };

        Self {
            code: session.code.clone(),
            version: versioned.version,
            status: session.status,
            players,
            words: session.words.clone(),
            secret_word,
            current_player_uid,
            vote_count: session.votes.len(),
            my_role,
            is_host: me.is_some_and(|p| p.is_host),
            is_my_turn,
            has_voted: me.is_some_and(|p| session.has_voted(&p.uid)),
            winner: session.winner,
            voted_out_uid: session.voted_out_uid.clone(),
            imposter_uid: if finished {
                session.imposter().map(|p| p.uid.clone())
            } else {
                None
            },
        }
    }
}
