use super::{GameError, GameResult};
use crate::types::*;
use std::collections::HashMap;

/// Outcome of counting a full set of votes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    pub voted_out_uid: Option<UserId>,
    pub winner: Winner,
}

/// Record one vote. The final vote tallies and finishes the session in the same update.
pub fn cast_vote(session: &Session, actor_uid: &str, target_uid: &str) -> GameResult<Session> {
    if session.status != SessionStatus::Voting {
        return Err(GameError::InvalidPhase {
            status: session.status,
        });
    }
    if !session.has_player(actor_uid) {
        return Err(GameError::NotInSession(actor_uid.to_string()));
    }
    if session.has_voted(actor_uid) {
        return Err(GameError::AlreadyVoted);
    }
    if !session.has_player(target_uid) {
        return Err(GameError::InvalidTarget(target_uid.to_string()));
    }

    let mut next = session.clone();
    next.votes
        .insert(actor_uid.to_string(), target_uid.to_string());

    if next.votes.len() == next.players.len() {
        let outcome = tally(&next.votes, &next.players);
        next.voted_out_uid = outcome.voted_out_uid;
        next.winner = Some(outcome.winner);
        next.status = SessionStatus::Finished;
    }
    Ok(next)
}

/// Count votes per target. Only a strict leader is voted out; a shared top count
/// eliminates nobody. The crew wins only by voting out the imposter.
pub fn tally(votes: &HashMap<UserId, UserId>, players: &[Player]) -> Tally {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for target in votes.values() {
        *counts.entry(target.as_str()).or_insert(0) += 1;
    }

    let top = counts.values().copied().max().unwrap_or(0);
    let mut leaders = counts.iter().filter(|(_, count)| **count == top);
    let voted_out_uid = match (leaders.next(), leaders.next()) {
        (Some((uid, _)), None) => Some(uid.to_string()),
        _ => None,
    };

    let imposter_uid = players
        .iter()
        .find(|p| p.role == Some(Role::Imposter))
        .map(|p| p.uid.as_str());

    let winner = match (&voted_out_uid, imposter_uid) {
        (Some(out), Some(imposter)) if out == imposter => Winner::Crew,
        _ => Winner::Imposter,
    };

    Tally {
        voted_out_uid,
        winner,
    }
}
