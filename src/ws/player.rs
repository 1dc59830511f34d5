//! Player message handlers
//!
//! Creating and joining sessions, submitting words and voting.

use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::UserId;
use std::sync::Arc;

use super::handlers::respond;
use super::Connection;

pub async fn handle_create(
    state: &Arc<AppState>,
    conn: &mut Connection,
    name: String,
) -> Option<ServerMessage> {
    let result = state.create_session(&conn.uid, &name).await;
    if let Ok(ref created) = result {
        conn.code = Some(created.session.code.clone());
    }
    respond(conn, result)
}

pub async fn handle_join(
    state: &Arc<AppState>,
    conn: &mut Connection,
    code: String,
    name: String,
) -> Option<ServerMessage> {
    tracing::info!("{} joining session {}", conn.uid, code);
    let result = state.join_session(&code, &conn.uid, &name).await;
    if let Ok(ref joined) = result {
        conn.code = Some(joined.session.code.clone());
    }
    respond(conn, result)
}

pub async fn handle_submit_word(
    state: &Arc<AppState>,
    conn: &Connection,
    code: &str,
    word: String,
) -> Option<ServerMessage> {
    respond(conn, state.submit_word(code, &conn.uid, &word).await)
}

pub async fn handle_cast_vote(
    state: &Arc<AppState>,
    conn: &Connection,
    code: &str,
    target_uid: UserId,
) -> Option<ServerMessage> {
    tracing::debug!("{} votes for {} in {}", conn.uid, target_uid, code);
    respond(conn, state.cast_vote(code, &conn.uid, &target_uid).await)
}
