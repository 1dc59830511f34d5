//! Host message handlers
//!
//! The engine rejects these with NOT_AUTHORIZED when the sender is not the host.

use crate::protocol::ServerMessage;
use crate::state::AppState;
use std::sync::Arc;

use super::handlers::respond;
use super::Connection;

pub async fn handle_start_game(
    state: &Arc<AppState>,
    conn: &Connection,
    code: &str,
) -> Option<ServerMessage> {
    tracing::info!("Start requested for session {} by {}", code, conn.uid);
    respond(conn, state.start_game(code, &conn.uid).await)
}

pub async fn handle_play_again(
    state: &Arc<AppState>,
    conn: &Connection,
    code: &str,
) -> Option<ServerMessage> {
    tracing::info!("Rematch requested for session {} by {}", code, conn.uid);
    respond(conn, state.play_again(code, &conn.uid).await)
}
