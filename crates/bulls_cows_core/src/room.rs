//! Public room identifiers.

use derive_more::{Display, Error};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;

/// Length of every room id.
pub const ROOM_ID_LENGTH: usize = 7;

/// A 7-character alphanumeric invite code, also used as the storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Draws a new random room id from `rng`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let id = (0..ROOM_ID_LENGTH)
            .map(|_| char::from(rng.sample(Alphanumeric)))
            .collect();
        Self(id)
    }

    /// Parses a room id received from a client.
    ///
    /// # Errors
    ///
    /// Returns [`RoomIdError`] unless the input is exactly seven ASCII
    /// letters or digits.
    pub fn parse(candidate: &str) -> Result<Self, RoomIdError> {
        let well_formed = candidate.len() == ROOM_ID_LENGTH
            && candidate.chars().all(|c| c.is_ascii_alphanumeric());

        if well_formed {
            Ok(Self(candidate.to_string()))
        } else {
            Err(RoomIdError {
                candidate: candidate.to_string(),
            })
        }
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A room id that is not seven alphanumeric characters.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("room id '{candidate}' must be 7 alphanumeric characters")]
pub struct RoomIdError {
    /// The rejected input.
    pub candidate: String,
}
