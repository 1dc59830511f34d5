//! Session state machine.
//!
//! Every operation is a pure function from `(&Session, actor, input)` to a new
//! `Session` or a [`GameError`]. Nothing here touches the store, so callers can
//! replay a transition against a fresher snapshot as often as they need.
//!
//! ```text
//! lobby --start_game--> playing --submit_word x N--> voting --cast_vote x N--> finished
//!                          ^                                                      |
//!                          +---------------------- play_again --------------------+
//! ```

mod lobby;
mod round;
mod turn;
mod vote;

pub use lobby::{create_session, join_session, normalize_code, CODE_LENGTH};
pub use round::{play_again, start_game, MIN_PLAYERS};
pub use turn::submit_word;
pub use vote::{cast_vote, tally, Tally};

use crate::types::{SessionStatus, UserId};
use std::collections::VecDeque;

pub type GameResult<T> = Result<T, GameError>;

/// Rejections returned by the state machine. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session is no longer accepting players")]
    SessionNotJoinable,

    #[error("Only the host can do that")]
    NotAuthorized,

    #[error("Need at least {} players, have {have}", MIN_PLAYERS)]
    NotEnoughPlayers { have: usize },

    #[error("It is not your turn")]
    NotYourTurn,

    #[error("Action not allowed while session is {status:?}")]
    InvalidPhase { status: SessionStatus },

    #[error("You have already voted")]
    AlreadyVoted,

    #[error("No player {0} in this session")]
    InvalidTarget(UserId),

    #[error("{0} is not a player in this session")]
    NotInSession(UserId),

    #[error("Session {0} not found")]
    NotFound(String),
}

impl GameError {
    /// Stable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            GameError::InvalidInput(_) => "INVALID_INPUT",
            GameError::SessionNotJoinable => "SESSION_NOT_JOINABLE",
            GameError::NotAuthorized => "NOT_AUTHORIZED",
            GameError::NotEnoughPlayers { .. } => "NOT_ENOUGH_PLAYERS",
            GameError::NotYourTurn => "NOT_YOUR_TURN",
            GameError::InvalidPhase { .. } => "INVALID_PHASE",
            GameError::AlreadyVoted => "ALREADY_VOTED",
            GameError::InvalidTarget(_) => "INVALID_TARGET",
            GameError::NotInSession(_) => "NOT_IN_SESSION",
            GameError::NotFound(_) => "NOT_FOUND",
        }
    }
}

/// Uniform random choice, injectable so draws can be reproduced.
pub trait RandomSource {
    /// Index in `0..len`. Callers never pass zero.
    fn pick_index(&mut self, len: usize) -> usize;
}

impl<R: rand::RngCore> RandomSource for R {
    fn pick_index(&mut self, len: usize) -> usize {
        use rand::Rng;
        self.random_range(0..len)
    }
}

/// Replays a fixed list of indices, wrapping each into range. Once exhausted it
/// keeps returning 0.
///
/// `start_game` and `play_again` draw the secret word first, then the imposter.
#[derive(Debug, Clone, Default)]
pub struct FixedPicks {
    picks: VecDeque<usize>,
}

impl FixedPicks {
    pub fn new(picks: impl IntoIterator<Item = usize>) -> Self {
        Self {
            picks: picks.into_iter().collect(),
        }
    }
}

impl RandomSource for FixedPicks {
    fn pick_index(&mut self, len: usize) -> usize {
        self.picks.pop_front().map(|i| i % len).unwrap_or(0)
    }
}

/// Trimmed copy of `text`, or `InvalidInput` naming `what` when nothing is left.
pub(crate) fn require_text(text: &str, what: &str) -> GameResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GameError::InvalidInput(format!("{} must not be empty", what)));
    }
    Ok(trimmed.to_string())
}
