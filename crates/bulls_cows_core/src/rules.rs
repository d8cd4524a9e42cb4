//! Match state machine.
//!
//! Each rule takes only the fields its command needs, checks the
//! preconditions in a fixed order and either mutates those fields or
//! returns the first [`MatchError`] that applies. Callers persist whatever
//! the rule touched.

use crate::code::Code;
use crate::error::MatchError;
use crate::evaluator::{GuessResult, evaluate};
use crate::game::{Match, MatchSetup, MatchStatus, Secrets};
use crate::player::{Player, PlayerId, Players};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, instrument};

/// Returns the id of the other player in a two-player room.
pub fn opponent_of<'a>(players: &'a Players, player_id: &PlayerId) -> Option<&'a PlayerId> {
    players.keys().find(|id| *id != player_id)
}

/// Seats a second player in a waiting room.
///
/// # Errors
///
/// [`MatchError::RoomFull`] unless exactly one player is seated.
#[instrument(skip(players), fields(seated = players.len()))]
pub fn admit_player(players: &mut Players, username: String) -> Result<Player, MatchError> {
    if players.len() != 1 {
        return Err(MatchError::RoomFull);
    }

    let player = Player::new(username);
    players.insert(player.id.clone(), player.clone());
    debug!(player_id = %player.id, "Player admitted");
    Ok(player)
}

/// Checks that secrets may be submitted in `status`.
///
/// # Errors
///
/// [`MatchError::RoomNotReady`] unless the room is [`MatchStatus::FullRoom`].
pub fn ensure_accepting_secrets(status: MatchStatus) -> Result<(), MatchError> {
    if status == MatchStatus::FullRoom {
        Ok(())
    } else {
        Err(MatchError::RoomNotReady)
    }
}

/// Records `code` as the secret the author's opponent must guess.
///
/// A repeated submission by the same author replaces the earlier one.
/// Returns the id of the player who will guess `code`.
///
/// # Errors
///
/// [`MatchError::MatchNotFound`] if the author is not seated,
/// [`MatchError::RoomNotReady`] if there is no opponent yet.
#[instrument(skip_all, fields(author = %author))]
pub fn assign_secret(
    players: &Players,
    secrets: &mut Secrets,
    author: &PlayerId,
    code: Code,
) -> Result<PlayerId, MatchError> {
    if !players.contains_key(author) {
        return Err(MatchError::MatchNotFound);
    }

    let guesser = opponent_of(players, author)
        .ok_or(MatchError::RoomNotReady)?
        .clone();
    secrets.insert(guesser.clone(), code);
    debug!(guesser = %guesser, secrets = secrets.len(), "Secret assigned");
    Ok(guesser)
}

/// Picks which player guesses first, uniformly at random.
///
/// # Errors
///
/// [`MatchError::RoomNotReady`] unless the room is full with exactly two
/// players, [`MatchError::CombinationsMissing`] unless both players have a
/// secret to guess.
#[instrument(skip_all, fields(status = %setup.status))]
pub fn choose_starting_player<R: Rng + ?Sized>(
    setup: &MatchSetup,
    rng: &mut R,
) -> Result<PlayerId, MatchError> {
    if setup.status != MatchStatus::FullRoom || setup.players.len() != 2 {
        return Err(MatchError::RoomNotReady);
    }

    let both_set = setup.secrets.len() == 2
        && setup.players.keys().all(|id| setup.secrets.contains_key(id));
    if !both_set {
        return Err(MatchError::CombinationsMissing);
    }

    debug_assert!(setup.status.can_transition_to(MatchStatus::Playing));

    let ids: Vec<&PlayerId> = setup.players.keys().collect();
    let chosen = ids
        .choose(rng)
        .map(|id| (*id).clone())
        .ok_or(MatchError::RoomNotReady)?;
    debug!(turn_owner = %chosen, "Starting player chosen");
    Ok(chosen)
}

/// Scores a guess and advances the match.
///
/// On success the result is appended to the guesser's history, the turn
/// passes to the opponent and a winning guess finishes the match.
///
/// # Errors
///
/// Checked in order: [`MatchError::MatchNotFound`] for an unknown player,
/// [`MatchError::MatchNotStarted`] outside of play,
/// [`MatchError::NotYourTurn`] for the waiting player, and
/// [`MatchError::MatchNotStarted`] again if the guesser has no secret.
/// Nothing is mutated on error.
#[instrument(skip_all, fields(room_id = %game.room_id, player_id = %player_id))]
pub fn apply_guess(
    game: &mut Match,
    player_id: &PlayerId,
    guess: Code,
) -> Result<GuessResult, MatchError> {
    if !game.players.contains_key(player_id) {
        return Err(MatchError::MatchNotFound);
    }
    if game.status != MatchStatus::Playing {
        return Err(MatchError::MatchNotStarted);
    }
    if game.turn_owner != *player_id {
        return Err(MatchError::NotYourTurn);
    }

    let target = *game
        .secrets
        .get(player_id)
        .ok_or(MatchError::MatchNotStarted)?;
    let next = opponent_of(&game.players, player_id)
        .ok_or(MatchError::MatchNotStarted)?
        .clone();

    let result = evaluate(&guess, &target);

    game.guess_history
        .entry(player_id.clone())
        .or_default()
        .push(result.clone());
    game.turn_owner = next;

    if result.is_winning() {
        debug_assert!(game.status.can_transition_to(MatchStatus::Finished));
        game.status = MatchStatus::Finished;
    }

    debug!(
        bulls = result.bulls(),
        cows = result.cows(),
        is_winning = result.is_winning(),
        next_turn = %game.turn_owner,
        "Guess applied"
    );
    Ok(result)
}
