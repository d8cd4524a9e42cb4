//! Storage error types.

use bulls_cows_core::RoomId;
use derive_more::{Display, Error};
use tracing::instrument;

use crate::store::Field;

/// Failure reported by a [`MatchRepository`](crate::MatchRepository).
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum RepositoryError {
    /// No live record exists for the room (never created, or expired).
    #[display("room {room_id} not found")]
    NotFound {
        /// Room that was looked up.
        room_id: RoomId,
    },

    /// A stored field could not be decoded.
    #[display("corrupt field {field} in room {room_id}: {message} at {file}:{line}")]
    Corrupt {
        /// Room holding the field.
        room_id: RoomId,
        /// Field that failed to decode.
        field: Field,
        /// Decoder message.
        message: String,
        /// Source file where the error was raised.
        file: &'static str,
        /// Line number where the error was raised.
        line: u32,
    },

    /// The storage backend itself failed.
    #[display("storage backend error: {message} at {file}:{line}")]
    Backend {
        /// Error message.
        message: String,
        /// Source file where the error was raised.
        file: &'static str,
        /// Line number where the error was raised.
        line: u32,
    },
}

impl RepositoryError {
    /// Creates a not-found error for `room_id`.
    pub fn not_found(room_id: &RoomId) -> Self {
        Self::NotFound {
            room_id: room_id.clone(),
        }
    }

    /// Creates a decode error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn corrupt(room_id: &RoomId, field: Field, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self::Corrupt {
            room_id: room_id.clone(),
            field,
            message: message.into(),
            file: loc.file(),
            line: loc.line(),
        }
    }

    /// Creates a backend error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn backend(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self::Backend {
            message: message.into(),
            file: loc.file(),
            line: loc.line(),
        }
    }

    /// Returns true for [`RepositoryError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
