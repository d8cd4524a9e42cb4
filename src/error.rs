//! Service error taxonomy.

use bulls_cows_core::{CodeError, MatchError};
use derive_more::{Display, Error};

use crate::store::RepositoryError;

/// The eight kinds of failure a command can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
pub enum ErrorKind {
    /// Submitted code breaks the code rules.
    InvalidCombination,
    /// Room absent, expired, or player not seated in it.
    MatchNotFound,
    /// Room already holds two players.
    RoomFull,
    /// Room is not full, or is being played.
    RoomNotReady,
    /// Start requested before both secrets were set.
    CombinationsMissing,
    /// Guess outside of play.
    MatchNotStarted,
    /// Guess by the waiting player.
    NotYourTurn,
    /// Storage failed.
    StorageFailure,
}

/// Failure returned by every [`MatchService`](crate::MatchService) command.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ServiceError {
    /// The command was rejected by the match rules.
    #[display("{_0}")]
    Match(MatchError),
    /// The storage layer failed.
    #[display("{_0}")]
    Storage(RepositoryError),
}

impl ServiceError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Match(MatchError::InvalidCombination(_)) => ErrorKind::InvalidCombination,
            Self::Match(MatchError::MatchNotFound) => ErrorKind::MatchNotFound,
            Self::Match(MatchError::RoomFull) => ErrorKind::RoomFull,
            Self::Match(MatchError::RoomNotReady) => ErrorKind::RoomNotReady,
            Self::Match(MatchError::CombinationsMissing) => ErrorKind::CombinationsMissing,
            Self::Match(MatchError::MatchNotStarted) => ErrorKind::MatchNotStarted,
            Self::Match(MatchError::NotYourTurn) => ErrorKind::NotYourTurn,
            Self::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

impl From<MatchError> for ServiceError {
    fn from(err: MatchError) -> Self {
        Self::Match(err)
    }
}

impl From<CodeError> for ServiceError {
    fn from(err: CodeError) -> Self {
        Self::Match(MatchError::InvalidCombination(err))
    }
}

// An absent record is a missing match, not a storage fault.
impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        if err.is_not_found() {
            Self::Match(MatchError::MatchNotFound)
        } else {
            Self::Storage(err)
        }
    }
}
