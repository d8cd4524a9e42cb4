//! Match persistence: the repository port and its in-memory adapter.

mod error;
mod memory;
mod repository;

pub use error::RepositoryError;
pub use memory::{DEFAULT_ROOM_TTL_SECS, InMemoryMatchStore};
pub use repository::MatchRepository;

/// Independently addressable attribute of a stored match.
///
/// The names are the keys each attribute is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
pub enum Field {
    /// Seated players.
    Players,
    /// Code each player must guess.
    #[strum(serialize = "OpponentsCombinations")]
    Secrets,
    /// Guess results per player.
    #[strum(serialize = "Guesses")]
    GuessHistory,
    /// Lifecycle status.
    Status,
    /// Player whose guess is accepted next.
    #[strum(serialize = "IsTurnOf")]
    TurnOwner,
}
