use super::{require_text, GameError, GameResult};
use crate::types::*;

/// Current player submits their word. The turn passes to the next player in join
/// order, and the last word of the round moves the session into voting.
pub fn submit_word(session: &Session, actor_uid: &str, word: &str) -> GameResult<Session> {
    if session.status != SessionStatus::Playing
        || session.current_player_uid.as_deref() != Some(actor_uid)
    {
        return Err(GameError::NotYourTurn);
    }
    let word = require_text(word, "word")?;

    let position = session
        .players
        .iter()
        .position(|p| p.uid == actor_uid)
        .ok_or_else(|| GameError::NotInSession(actor_uid.to_string()))?;
    let player = &session.players[position];

    let mut next = session.clone();
    next.words.push(WordEntry {
        uid: player.uid.clone(),
        name: player.name.clone(),
        word,
    });

    let following = &session.players[(position + 1) % session.players.len()];
    next.current_player_uid = Some(following.uid.clone());

    if next.words.len() == next.players.len() {
        next.status = SessionStatus::Voting;
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fixtures;

    #[test]
    fn test_submit_appends_and_advances() {
        let session = fixtures::playing(&["Alice", "Bob", "Carol"], 0, 2);

        let next = submit_word(&session, "p0", "  crunchy ").unwrap();

        assert_eq!(
            next.words,
            vec![WordEntry {
                uid: "p0".to_string(),
                name: "Alice".to_string(),
                word: "crunchy".to_string(),
            }]
        );
        assert_eq!(next.current_player_uid.as_deref(), Some("p1"));
        assert_eq!(next.status, SessionStatus::Playing);
    }

    #[test]
    fn test_out_of_turn_rejected_without_change() {
        let session = fixtures::playing(&["Alice", "Bob", "Carol"], 0, 2);
        let before = session.clone();

        assert_eq!(
            submit_word(&session, "p1", "red"),
            Err(GameError::NotYourTurn)
        );
        assert_eq!(
            submit_word(&session, "stranger", "red"),
            Err(GameError::NotYourTurn)
        );
        assert_eq!(session, before);
    }

    #[test]
    fn test_empty_word_rejected() {
        let session = fixtures::playing(&["Alice", "Bob"], 0, 1);
        let result = submit_word(&session, "p0", "   ");
        assert!(matches!(result, Err(GameError::InvalidInput(_))));
    }

    #[test]
    fn test_full_round_moves_to_voting() {
        let names = ["Alice", "Bob", "Carol", "Dave"];
        let mut session = fixtures::playing(&names, 0, 3);

        for i in 0..names.len() {
            assert_eq!(session.status, SessionStatus::Playing);
            let uid = format!("p{}", i);
            session = submit_word(&session, &uid, "clue").unwrap();
        }

        assert_eq!(session.status, SessionStatus::Voting);
        assert_eq!(session.words.len(), session.players.len());
        let order: Vec<_> = session.words.iter().map(|w| w.uid.as_str()).collect();
        assert_eq!(order, ["p0", "p1", "p2", "p3"]);
        // Pointer wrapped back to the first player
        assert_eq!(session.current_player_uid.as_deref(), Some("p0"));
    }

    #[test]
    fn test_no_second_word_once_voting() {
        let session = fixtures::voting(&["Alice", "Bob"], 0);
        assert_eq!(
            submit_word(&session, "p0", "again"),
            Err(GameError::NotYourTurn)
        );
    }

    #[test]
    fn test_lobby_rejects_words() {
        let session = fixtures::lobby(&["Alice", "Bob"]);
        assert_eq!(
            submit_word(&session, "p0", "early"),
            Err(GameError::NotYourTurn)
        );
    }
}
