use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque ID types
pub type SessionCode = String;
pub type UserId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Lobby,
    Playing,
    Voting,
    Finished,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Imposter,
    Crew,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Winner {
    Crew,
    Imposter,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub uid: UserId,
    pub name: String,
    pub is_host: bool,
    /// Unassigned while the session sits in the lobby
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// One submitted word, stored in turn order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordEntry {
    pub uid: UserId,
    pub name: String,
    pub word: String,
}

/// The shared session document. Field names follow the stored document shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "gameId")]
    pub code: SessionCode,
    pub status: SessionStatus,
    pub players: Vec<Player>,
    #[serde(default)]
    pub secret_word: Option<String>,
    #[serde(default)]
    pub current_player_uid: Option<UserId>,
    #[serde(default)]
    pub words: Vec<WordEntry>,
    /// voter uid -> voted-for uid
    #[serde(default)]
    pub votes: HashMap<UserId, UserId>,
    #[serde(default)]
    pub winner: Option<Winner>,
    #[serde(default)]
    pub voted_out_uid: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn player(&self, uid: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.uid == uid)
    }

    pub fn has_player(&self, uid: &str) -> bool {
        self.player(uid).is_some()
    }

    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }

    pub fn is_host(&self, uid: &str) -> bool {
        self.host().is_some_and(|h| h.uid == uid)
    }

    pub fn imposter(&self) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.role == Some(Role::Imposter))
    }

    pub fn has_voted(&self, uid: &str) -> bool {
        self.votes.contains_key(uid)
    }
}

/// A session together with the store version it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedSession {
    pub version: u64,
    pub session: Session,
}
