//! Values returned by match service commands.

use bulls_cows_core::{GuessHistory, GuessResult, Match, MatchStatus, Player, PlayerId, Players, RoomId};
use derive_getters::Getters;
use derive_new::new;
use serde::Serialize;

/// A seat in a room: returned on create and join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, new)]
pub struct RoomTicket {
    room_id: RoomId,
    player: Player,
}

/// Outcome of starting a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, new)]
pub struct GameStarted {
    is_turn_of: PlayerId,
}

/// Outcome of an accepted guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, new)]
pub struct GuessOutcome {
    is_winner: bool,
    result: GuessResult,
    is_turn_of: PlayerId,
    guesses: GuessHistory,
}

/// Public view of a room. Secrets are never included, only who has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct MatchView {
    room_id: RoomId,
    players: Players,
    status: MatchStatus,
    is_turn_of: PlayerId,
    guesses: GuessHistory,
    secrets_set: Vec<PlayerId>,
}

impl From<Match> for MatchView {
    fn from(game: Match) -> Self {
        Self {
            secrets_set: game.secrets.into_keys().collect(),
            room_id: game.room_id,
            players: game.players,
            status: game.status,
            is_turn_of: game.turn_owner,
            guesses: game.guess_history,
        }
    }
}
