use super::{require_text, GameError, GameResult};
use crate::types::*;
use std::collections::HashMap;

/// Length of the human-shareable session code
pub const CODE_LENGTH: usize = 6;

/// Turn a store-generated id (or a code typed by a player) into the canonical code form
pub fn normalize_code(raw: &str) -> SessionCode {
    raw.trim()
        .chars()
        .take(CODE_LENGTH)
        .collect::<String>()
        .to_uppercase()
}

/// New session in the lobby with the host as its only player
pub fn create_session(code: &str, host_uid: &str, host_name: &str) -> GameResult<Session> {
    let name = require_text(host_name, "host name")?;

    Ok(Session {
        code: normalize_code(code),
        status: SessionStatus::Lobby,
        players: vec![Player {
            uid: host_uid.to_string(),
            name,
            is_host: true,
            role: None,
        }],
        secret_word: None,
        current_player_uid: None,
        words: Vec::new(),
        votes: HashMap::new(),
        winner: None,
        voted_out_uid: None,
        created_at: chrono::Utc::now(),
    })
}

/// Append a non-host player. Joining again with a known uid returns the session unchanged.
pub fn join_session(session: &Session, uid: &str, name: &str) -> GameResult<Session> {
    if session.has_player(uid) {
        return Ok(session.clone());
    }
    if session.status != SessionStatus::Lobby {
        return Err(GameError::SessionNotJoinable);
    }
    let name = require_text(name, "name")?;

    let mut next = session.clone();
    next.players.push(Player {
        uid: uid.to_string(),
        name,
        is_host: false,
        role: None,
    });
    Ok(next)
}
