//! Domain errors raised by the match rules.

use crate::code::CodeError;
use derive_more::{Display, Error, From};

/// A command the current match state does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum MatchError {
    /// A submitted secret or guess breaks the code rules.
    #[display("invalid combination: {_0}")]
    #[from]
    InvalidCombination(CodeError),

    /// The room does not exist, or the player is not seated in it.
    #[display("match not found")]
    MatchNotFound,

    /// The room already has two players.
    #[display("can not add another player to this room")]
    RoomFull,

    /// The room must hold two players and not be playing.
    #[display("match is being played already or room is not completed")]
    RoomNotReady,

    /// Start was requested before both secrets were submitted.
    #[display("can not start game until players set combinations")]
    CombinationsMissing,

    /// A guess arrived outside of play, or with no secret to guess.
    #[display("match has not started yet or has finished already")]
    MatchNotStarted,

    /// A guess arrived from the player who is not the turn owner.
    #[display("this is not your turn")]
    NotYourTurn,
}
