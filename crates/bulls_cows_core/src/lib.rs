//! Pure Bulls and Cows match logic.
//!
//! Nothing in this crate performs I/O. The server crate loads match fields
//! from storage, hands them to the rules here, and persists whatever changed.
//!
//! - **Codes**: validated 4-symbol sequences with no repeated symbol
//! - **Evaluator**: scores a guess against a secret (bulls, cows, misses)
//! - **Match**: the room aggregate, its players and lifecycle status
//! - **Rules**: the state machine guarding every command

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod code;
mod error;
mod evaluator;
mod game;
mod player;
mod room;
mod rules;

pub use code::{Alphabet, CODE_LENGTH, Code, CodeError, CodeRules};
pub use error::MatchError;
pub use evaluator::{Classification, GuessResult, SymbolMark, evaluate};
pub use game::{GuessHistory, Match, MatchSetup, MatchStatus, Secrets};
pub use player::{Player, PlayerId, Players};
pub use room::{ROOM_ID_LENGTH, RoomId, RoomIdError};
pub use rules::{
    admit_player, apply_guess, assign_secret, choose_starting_player, ensure_accepting_secrets,
    opponent_of,
};
