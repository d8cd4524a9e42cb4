//! The storage port the match service depends on.

use async_trait::async_trait;
use bulls_cows_core::{
    GuessHistory, Match, MatchSetup, MatchStatus, Player, PlayerId, Players, RoomId, Secrets,
};

use crate::store::RepositoryError;

/// Field-level access to stored matches.
///
/// Reads and writes touch only the named fields, so each command loads and
/// persists no more than it needs. Every read of an absent or expired room
/// fails with [`RepositoryError::NotFound`]; so does every write, which
/// never recreates a record.
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Stores a new room holding `creator` and gives it a bounded lifetime.
    async fn create_match(&self, creator: Player) -> Result<Match, RepositoryError>;

    /// Loads the seated players.
    async fn get_players(&self, room_id: &RoomId) -> Result<Players, RepositoryError>;

    /// Replaces the players and marks the room [`MatchStatus::FullRoom`].
    async fn set_players_and_mark_full(
        &self,
        room_id: &RoomId,
        players: &Players,
    ) -> Result<(), RepositoryError>;

    /// Loads the lifecycle status.
    async fn get_status(&self, room_id: &RoomId) -> Result<MatchStatus, RepositoryError>;

    /// Replaces the secrets.
    async fn set_secrets(&self, room_id: &RoomId, secrets: &Secrets)
    -> Result<(), RepositoryError>;

    /// Loads players and secrets together.
    async fn get_players_and_secrets(
        &self,
        room_id: &RoomId,
    ) -> Result<(Players, Secrets), RepositoryError>;

    /// Loads every field except the guess history.
    async fn get_players_secrets_status_turn(
        &self,
        room_id: &RoomId,
    ) -> Result<MatchSetup, RepositoryError>;

    /// Loads the whole match.
    async fn get_all_fields(&self, room_id: &RoomId) -> Result<Match, RepositoryError>;

    /// Replaces status and turn owner.
    async fn set_status_and_turn(
        &self,
        room_id: &RoomId,
        status: MatchStatus,
        turn_owner: &PlayerId,
    ) -> Result<(), RepositoryError>;

    /// Replaces guess history and turn owner, finishing the match when
    /// `is_winner` is set.
    async fn set_guess_history_and_turn(
        &self,
        room_id: &RoomId,
        guess_history: &GuessHistory,
        turn_owner: &PlayerId,
        is_winner: bool,
    ) -> Result<(), RepositoryError>;

    /// Succeeds if a live record exists for the room.
    async fn exists(&self, room_id: &RoomId) -> Result<(), RepositoryError>;

    /// Clears secrets and history, returns the room to
    /// [`MatchStatus::FullRoom`] and renews its lifetime.
    async fn restart(&self, room_id: &RoomId) -> Result<(), RepositoryError>;
}
