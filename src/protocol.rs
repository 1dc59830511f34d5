use crate::types::*;
use crate::view::SessionView;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateSession {
        name: String,
    },
    JoinSession {
        code: SessionCode,
        name: String,
    },
    /// Host-only
    StartGame,
    SubmitWord {
        word: String,
    },
    CastVote {
        target_uid: UserId,
    },
    /// Host-only, after a game has finished
    PlayAgain,
    /// Stop receiving updates for the current session
    Leave,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        /// Public id, the one other players see in views
        uid: UserId,
        /// Private; pass back as `?token=` when reconnecting
        token: String,
        server_now: String,
    },
    /// Current session as this connection may see it
    Session {
        view: SessionView,
    },
    Left,
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            msg: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_tags() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"t":"join_session","code":"abc123","name":"Bob"}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::JoinSession { ref code, ref name } if code == "abc123" && name == "Bob"
        ));

        let msg: ClientMessage = serde_json::from_str(r#"{"t":"start_game"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::StartGame));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"t":"cast_vote","target_uid":"u2"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::CastVote { ref target_uid } if target_uid == "u2"));
    }

    #[test]
    fn test_unknown_message_rejected() {
        let result = serde_json::from_str::<ClientMessage>(r#"{"t":"skip_turn"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_value(ServerMessage::error("NOT_YOUR_TURN", "wait")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"t": "error", "code": "NOT_YOUR_TURN", "msg": "wait"})
        );
    }
}
