//! The match aggregate and its lifecycle status.

use crate::code::Code;
use crate::evaluator::GuessResult;
use crate::player::{Player, PlayerId, Players};
use crate::room::RoomId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle status of a room.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum MatchStatus {
    /// One player seated, waiting for an opponent.
    Waiting,
    /// Two players seated; secrets may be submitted.
    FullRoom,
    /// Guesses are being exchanged.
    Playing,
    /// A player guessed the opponent's code.
    Finished,
}

impl MatchStatus {
    /// Returns true if a command may move a room from `self` to `next`.
    ///
    /// No status is terminal: a restart brings any room back to
    /// [`MatchStatus::FullRoom`].
    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        use MatchStatus::*;
        matches!(
            (self, next),
            (Waiting, FullRoom)
                | (Playing, Playing)
                | (Playing, Finished)
                | (FullRoom, Playing)
                | (_, FullRoom)
        )
    }
}

/// Secret each player must guess, keyed by the guesser.
pub type Secrets = BTreeMap<PlayerId, Code>;

/// Chronological guess results, keyed by the guesser.
pub type GuessHistory = BTreeMap<PlayerId, Vec<GuessResult>>;

/// A room and everything stored about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    /// Public invite code and storage key.
    pub room_id: RoomId,
    /// Seated players (one or two).
    pub players: Players,
    /// Code each player must guess.
    pub secrets: Secrets,
    /// Guesses made so far, per player.
    pub guess_history: GuessHistory,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Player whose guess is accepted next.
    pub turn_owner: PlayerId,
}

impl Match {
    /// Opens a room holding only its creator.
    pub fn open(room_id: RoomId, creator: Player) -> Self {
        let turn_owner = creator.id.clone();
        let mut players = Players::new();
        players.insert(creator.id.clone(), creator);

        Self {
            room_id,
            players,
            secrets: Secrets::new(),
            guess_history: GuessHistory::new(),
            status: MatchStatus::Waiting,
            turn_owner,
        }
    }
}

/// Every match field except the guess history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSetup {
    /// Seated players.
    pub players: Players,
    /// Code each player must guess.
    pub secrets: Secrets,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Player whose guess is accepted next.
    pub turn_owner: PlayerId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_reaches_full_room_from_anywhere() {
        for status in [
            MatchStatus::Waiting,
            MatchStatus::FullRoom,
            MatchStatus::Playing,
            MatchStatus::Finished,
        ] {
            assert!(status.can_transition_to(MatchStatus::FullRoom));
        }
    }

    #[test]
    fn finished_only_follows_playing() {
        assert!(MatchStatus::Playing.can_transition_to(MatchStatus::Finished));
        assert!(!MatchStatus::FullRoom.can_transition_to(MatchStatus::Finished));
        assert!(!MatchStatus::Finished.can_transition_to(MatchStatus::Playing));
        assert!(!MatchStatus::Waiting.can_transition_to(MatchStatus::Playing));
    }

    #[test]
    fn status_names_round_trip_through_strings() {
        assert_eq!(MatchStatus::FullRoom.as_ref(), "FullRoom");
        assert_eq!("Playing".parse::<MatchStatus>().unwrap(), MatchStatus::Playing);
    }
}
