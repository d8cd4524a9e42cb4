//! Match orchestration.
//!
//! [`MatchService`] loads the fields a command needs through the
//! [`MatchRepository`] port, runs the core rules, and persists what changed.
//! Commands that read then write hold the room's lock for the whole
//! sequence, so concurrent commands on one room apply one at a time.

mod locks;
mod responses;

pub use locks::RoomLocks;
pub use responses::{GameStarted, GuessOutcome, MatchView, RoomTicket};

use bulls_cows_core::{
    CodeRules, MatchStatus, Player, PlayerId, RoomId, admit_player, apply_guess, assign_secret,
    choose_starting_player, ensure_accepting_secrets,
};
use tracing::{debug, info, instrument};

use crate::error::ServiceError;
use crate::store::MatchRepository;

/// Public API for running matches.
#[derive(Debug)]
pub struct MatchService<R> {
    repository: R,
    rules: CodeRules,
    locks: RoomLocks,
}

impl<R: MatchRepository> MatchService<R> {
    /// Creates a service over `repository` that validates codes with `rules`.
    #[instrument(skip(repository))]
    pub fn new(repository: R, rules: CodeRules) -> Self {
        info!(alphabet = %rules.alphabet(), "Creating match service");
        Self {
            repository,
            rules,
            locks: RoomLocks::new(),
        }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Returns the code rules applied to secrets and guesses.
    pub fn rules(&self) -> CodeRules {
        self.rules
    }

    /// Opens a room for `username`, who becomes its first player.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Storage`] if the room cannot be stored.
    #[instrument(skip(self))]
    pub async fn create_room(&self, username: String) -> Result<RoomTicket, ServiceError> {
        let creator = Player::new(username);
        let game = self.repository.create_match(creator.clone()).await?;
        info!(room_id = %game.room_id, player_id = %creator.id, "Room created");
        Ok(RoomTicket::new(game.room_id, creator))
    }

    /// Seats `username` as the second player of a waiting room.
    ///
    /// # Errors
    ///
    /// `MatchNotFound` for an unknown room, `RoomFull` unless exactly one
    /// player is seated.
    #[instrument(skip_all, fields(room_id = %room_id, username = %username))]
    pub async fn join_room(
        &self,
        room_id: &RoomId,
        username: String,
    ) -> Result<RoomTicket, ServiceError> {
        let _guard = self.locks.acquire(room_id).await;

        let mut players = self.repository.get_players(room_id).await?;
        let player = admit_player(&mut players, username)?;
        self.repository
            .set_players_and_mark_full(room_id, &players)
            .await?;

        info!(player_id = %player.id, status = %MatchStatus::FullRoom, "Player joined");
        Ok(RoomTicket::new(room_id.clone(), player))
    }

    /// Sets the code the opponent of `player_id` must guess.
    ///
    /// Submitting again before the game starts replaces the earlier code.
    ///
    /// # Errors
    ///
    /// `InvalidCombination` for a malformed code, `MatchNotFound` for an
    /// unknown room or player, `RoomNotReady` unless the room is full and
    /// not yet playing.
    #[instrument(skip_all, fields(room_id = %room_id, player_id = %player_id))]
    pub async fn set_combination(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        combination: &str,
    ) -> Result<(), ServiceError> {
        let code = self.rules.validate(combination)?;
        let _guard = self.locks.acquire(room_id).await;

        let status = self.repository.get_status(room_id).await?;
        ensure_accepting_secrets(status)?;

        let (players, mut secrets) = self.repository.get_players_and_secrets(room_id).await?;
        let guesser = assign_secret(&players, &mut secrets, player_id, code)?;
        self.repository.set_secrets(room_id, &secrets).await?;

        info!(guesser = %guesser, secrets = secrets.len(), "Combination set");
        Ok(())
    }

    /// Starts play, choosing the first guesser at random.
    ///
    /// # Errors
    ///
    /// `MatchNotFound` for an unknown room, `RoomNotReady` unless the room
    /// is full, `CombinationsMissing` until both players set a code.
    #[instrument(skip_all, fields(room_id = %room_id))]
    pub async fn start_game(&self, room_id: &RoomId) -> Result<GameStarted, ServiceError> {
        let _guard = self.locks.acquire(room_id).await;

        let setup = self
            .repository
            .get_players_secrets_status_turn(room_id)
            .await?;
        let first = choose_starting_player(&setup, &mut rand::rng())?;
        self.repository
            .set_status_and_turn(room_id, MatchStatus::Playing, &first)
            .await?;

        info!(is_turn_of = %first, status = %MatchStatus::Playing, "Game started");
        Ok(GameStarted::new(first))
    }

    /// Scores a guess by `player_id` and passes the turn.
    ///
    /// # Errors
    ///
    /// `InvalidCombination` for a malformed guess, `MatchNotFound` for an
    /// unknown room or player, `MatchNotStarted` outside of play,
    /// `NotYourTurn` for the waiting player.
    #[instrument(skip_all, fields(room_id = %room_id, player_id = %player_id))]
    pub async fn make_guess(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        guess: &str,
    ) -> Result<GuessOutcome, ServiceError> {
        let code = self.rules.validate(guess)?;
        let _guard = self.locks.acquire(room_id).await;

        let mut game = self.repository.get_all_fields(room_id).await?;
        let result = apply_guess(&mut game, player_id, code)?;
        let is_winner = result.is_winning();
        self.repository
            .set_guess_history_and_turn(room_id, &game.guess_history, &game.turn_owner, is_winner)
            .await?;

        if is_winner {
            info!(winner = %player_id, status = %game.status, "Match won");
        } else {
            debug!(bulls = result.bulls(), cows = result.cows(), "Guess recorded");
        }
        Ok(GuessOutcome::new(
            is_winner,
            result,
            game.turn_owner,
            game.guess_history,
        ))
    }

    /// Clears secrets and guesses so the same players can play again.
    ///
    /// # Errors
    ///
    /// `MatchNotFound` for an unknown room.
    #[instrument(skip_all, fields(room_id = %room_id))]
    pub async fn restart_game(&self, room_id: &RoomId) -> Result<(), ServiceError> {
        let _guard = self.locks.acquire(room_id).await;

        self.repository.exists(room_id).await?;
        self.repository.restart(room_id).await?;

        info!(status = %MatchStatus::FullRoom, "Game restarted");
        Ok(())
    }

    /// Returns the public view of a room.
    ///
    /// # Errors
    ///
    /// `MatchNotFound` for an unknown room.
    #[instrument(skip_all, fields(room_id = %room_id))]
    pub async fn get_match(&self, room_id: &RoomId) -> Result<MatchView, ServiceError> {
        let game = self.repository.get_all_fields(room_id).await?;
        debug!(status = %game.status, "Match viewed");
        Ok(MatchView::from(game))
    }
}
