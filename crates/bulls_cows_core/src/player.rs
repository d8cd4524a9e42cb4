//! Match participants.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque unique player token.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A player seated in a room. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player's unique id.
    pub id: PlayerId,
    /// Display name.
    pub username: String,
}

impl Player {
    /// Creates a player with a freshly generated id.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: PlayerId::generate(),
            username: username.into(),
        }
    }
}

/// Players of one room, keyed by id.
pub type Players = BTreeMap<PlayerId, Player>;
