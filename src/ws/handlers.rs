//! WebSocket message dispatch
//!
//! Turns a client message into one `AppState` call. Authorization and phase
//! rules live in the game engine; this layer only knows which session the
//! connection is attached to.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{AppState, ServiceResult};
use crate::types::*;
use crate::view::SessionView;
use std::sync::Arc;

use super::{host, player, Connection};

/// Macro to get the attached session code or return early with an error
macro_rules! require_session {
    ($conn:expr) => {
        match $conn.code.clone() {
            Some(code) => code,
            None => {
                return Some(ServerMessage::error(
                    "NO_SESSION",
                    "Create or join a session first",
                ));
            }
        }
    };
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    conn: &mut Connection,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::CreateSession { name } => player::handle_create(state, conn, name).await,

        ClientMessage::JoinSession { code, name } => {
            player::handle_join(state, conn, code, name).await
        }

        ClientMessage::Leave => {
            if let Some(code) = conn.code.take() {
                tracing::info!("{} left session {}", conn.uid, code);
            }
            Some(ServerMessage::Left)
        }

        ClientMessage::SubmitWord { word } => {
            let code = require_session!(conn);
            player::handle_submit_word(state, conn, &code, word).await
        }

        ClientMessage::CastVote { target_uid } => {
            let code = require_session!(conn);
            player::handle_cast_vote(state, conn, &code, target_uid).await
        }

        ClientMessage::StartGame => {
            let code = require_session!(conn);
            host::handle_start_game(state, conn, &code).await
        }

        ClientMessage::PlayAgain => {
            let code = require_session!(conn);
            host::handle_play_again(state, conn, &code).await
        }
    }
}

/// Session view for the connection, or the error as a client message
pub(super) fn respond(
    conn: &Connection,
    result: ServiceResult<VersionedSession>,
) -> Option<ServerMessage> {
    match result {
        Ok(versioned) => Some(ServerMessage::Session {
            view: SessionView::for_viewer(&versioned, Some(&conn.uid)),
        }),
        Err(e) => {
            tracing::debug!("Rejected action from {}: {}", conn.uid, e);
            Some(ServerMessage::error(e.code(), e.to_string()))
        }
    }
}
