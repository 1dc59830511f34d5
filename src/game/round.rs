use super::{GameError, GameResult, RandomSource};
use crate::types::*;
use crate::words::WordBank;

pub const MIN_PLAYERS: usize = 2;

/// Host starts the first game from the lobby
pub fn start_game<R: RandomSource + ?Sized>(
    session: &Session,
    actor_uid: &str,
    bank: &WordBank,
    rng: &mut R,
) -> GameResult<Session> {
    if !session.is_host(actor_uid) {
        return Err(GameError::NotAuthorized);
    }
    if session.status != SessionStatus::Lobby {
        return Err(GameError::InvalidPhase {
            status: session.status,
        });
    }
    if session.players.len() < MIN_PLAYERS {
        return Err(GameError::NotEnoughPlayers {
            have: session.players.len(),
        });
    }

    Ok(deal(session, bank, rng))
}

/// Host restarts a finished game with the same players
pub fn play_again<R: RandomSource + ?Sized>(
    session: &Session,
    actor_uid: &str,
    bank: &WordBank,
    rng: &mut R,
) -> GameResult<Session> {
    if !session.is_host(actor_uid) {
        return Err(GameError::NotAuthorized);
    }
    if session.status != SessionStatus::Finished {
        return Err(GameError::InvalidPhase {
            status: session.status,
        });
    }

    Ok(deal(session, bank, rng))
}

/// Draw a secret word, then one imposter, and reset the round.
fn deal<R: RandomSource + ?Sized>(session: &Session, bank: &WordBank, rng: &mut R) -> Session {
    let secret_word = bank.pick_random_word(rng).to_string();
    let imposter_index = rng.pick_index(session.players.len());

    let mut next = session.clone();
    for (index, player) in next.players.iter_mut().enumerate() {
        player.role = Some(if index == imposter_index {
            Role::Imposter
        } else {
            Role::Crew
        });
    }
    next.secret_word = Some(secret_word);
    next.current_player_uid = next.players.first().map(|p| p.uid.clone());
    next.status = SessionStatus::Playing;
    next.words.clear();
    next.votes.clear();
    next.winner = None;
    next.voted_out_uid = None;
    next
}
