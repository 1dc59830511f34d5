pub mod handlers;
mod host;
mod player;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::identity::IdentityProvider;
use crate::protocol::{ClientMessage, ServerMessage, PROTOCOL_VERSION};
use crate::state::{decode, AppState};
use crate::store::{Document, Subscription};
use crate::types::{SessionCode, UserId, VersionedSession};
use crate::view::SessionView;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Private resume token from an earlier `welcome`
    pub token: Option<String>,
}

/// Per-socket state: who is talking and which session they are attached to
#[derive(Debug, Clone)]
pub struct Connection {
    pub uid: UserId,
    pub code: Option<SessionCode>,
}

impl Connection {
    pub fn new(identity: &dyn IdentityProvider) -> Self {
        Self {
            uid: identity.current_user_id(),
            code: None,
        }
    }
}

/// Change feed of the session a connection is attached to
struct SessionFeed {
    code: SessionCode,
    sub: Subscription,
    /// Newest version the client has been sent
    last_sent: u64,
}

impl SessionFeed {
    /// Record `version` as sent if it is newer than anything the client has
    fn advance(&mut self, version: u64) -> bool {
        if version > self.last_sent {
            self.last_sent = version;
            true
        } else {
            false
        }
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

async fn send_json(sender: &mut SplitSink<WebSocket, Message>, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            true
        }
    }
}

fn session_message(versioned: &VersionedSession, conn: &Connection) -> ServerMessage {
    ServerMessage::Session {
        view: SessionView::for_viewer(versioned, Some(&conn.uid)),
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, params: WsQuery, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let identity = match state.resume_identity(params.token.as_deref()).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::error!("Failed to establish identity: {}", e);
            let _ = send_json(&mut sender, &ServerMessage::error(e.code(), e.to_string())).await;
            return;
        }
    };
    let mut conn = Connection::new(&identity);
    tracing::info!("WebSocket connected: uid={}", conn.uid);

    let welcome = ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        uid: conn.uid.clone(),
        token: identity.resume_token().to_string(),
        server_now: chrono::Utc::now().to_rfc3339(),
    };
    if !send_json(&mut sender, &welcome).await {
        tracing::error!("Failed to send welcome message");
        return;
    }

    let mut feed: Option<SessionFeed> = None;

    loop {
        tokio::select! {
            // Pushed session changes
            pushed = async {
                match &mut feed {
                    Some(feed) => feed.sub.recv().await,
                    None => std::future::pending::<Option<Document>>().await,
                }
            } => {
                let Some(doc) = pushed else {
                    feed = None;
                    continue;
                };
                let Some(current) = feed.as_mut() else {
                    continue;
                };
                if !current.advance(doc.version) {
                    continue;
                }
                match decode(&doc) {
                    Ok(versioned) => {
                        if !send_json(&mut sender, &session_message(&versioned, &conn)).await {
                            break;
                        }
                    }
                    Err(e) => tracing::error!("Dropping unreadable session push: {}", e),
                }
            }

            // Handle client messages
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message from {}: {}", conn.uid, text);

                        let response = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                handlers::handle_message(client_msg, &mut conn, &state).await
                            }
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                Some(ServerMessage::error(
                                    "PARSE_ERROR",
                                    format!("Invalid message format: {}", e),
                                ))
                            }
                        };

                        let latest = follow(&state, &conn, &mut feed).await;

                        let mut outgoing = Vec::with_capacity(2);
                        match response {
                            Some(ServerMessage::Session { view }) => {
                                // A push may already have carried this version or a newer one
                                let fresh = feed
                                    .as_mut()
                                    .map(|f| f.advance(view.version))
                                    .unwrap_or(true);
                                if fresh {
                                    outgoing.push(ServerMessage::Session { view });
                                }
                            }
                            Some(other) => outgoing.push(other),
                            None => {}
                        }
                        if let (Some(latest), Some(current)) = (latest, feed.as_mut()) {
                            if current.advance(latest.version) {
                                outgoing.push(session_message(&latest, &conn));
                            }
                        }

                        let mut failed = false;
                        for msg in &outgoing {
                            if !send_json(&mut sender, msg).await {
                                tracing::error!("Failed to send response");
                                failed = true;
                                break;
                            }
                        }
                        if failed {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    if let Some(mut feed) = feed {
        feed.sub.unsubscribe();
    }
    tracing::info!("WebSocket connection closed for uid={}", conn.uid);
}

/// Follow the session the connection is attached to.
///
/// On a switch the new subscription is opened first and the session read
/// afterwards; the returned snapshot covers every write made before the
/// subscription existed, including ones that raced with the client's own action.
async fn follow(
    state: &AppState,
    conn: &Connection,
    feed: &mut Option<SessionFeed>,
) -> Option<VersionedSession> {
    let current = feed.as_ref().map(|f| &f.code);
    if current == conn.code.as_ref() {
        return None;
    }

    if let Some(mut old) = feed.take() {
        old.sub.unsubscribe();
    }
    let code = conn.code.as_ref()?;

    let sub = match state.subscribe(code).await {
        Ok(sub) => sub,
        Err(e) => {
            tracing::error!("Failed to subscribe to session {}: {}", code, e);
            return None;
        }
    };
    *feed = Some(SessionFeed {
        code: code.clone(),
        sub,
        last_sent: 0,
    });

    match state.get_session(code).await {
        Ok(latest) => Some(latest),
        Err(e) => {
            tracing::error!("Failed to read session {} after subscribing: {}", code, e);
            None
        }
    }
}
