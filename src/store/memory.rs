//! In-memory match store.
//!
//! Each room is a flat record of string fields keyed `room:<id>`, the way a
//! key-value hash would hold it. Map-valued fields are JSON, status and turn
//! owner are plain strings. Every record carries an expiry instant; expired
//! records read as absent until [`InMemoryMatchStore::purge_expired`] drops
//! them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bulls_cows_core::{
    GuessHistory, Match, MatchSetup, MatchStatus, Player, PlayerId, Players, RoomId, Secrets,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::store::{Field, MatchRepository, RepositoryError};

/// Lifetime given to a room when none is configured.
pub const DEFAULT_ROOM_TTL_SECS: i64 = 3600;

const KEY_PREFIX: &str = "room:";
const MAX_ID_ATTEMPTS: usize = 8;

fn key(room_id: &RoomId) -> String {
    format!("{KEY_PREFIX}{room_id}")
}

#[derive(Debug, Clone)]
struct StoredRoom {
    fields: HashMap<Field, String>,
    expires_at: DateTime<Utc>,
}

impl StoredRoom {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Match repository backed by a process-local map.
///
/// Cloning is cheap and clones share the same rooms.
#[derive(Debug, Clone)]
pub struct InMemoryMatchStore {
    rooms: Arc<Mutex<HashMap<String, StoredRoom>>>,
    ttl: TimeDelta,
}

impl Default for InMemoryMatchStore {
    fn default() -> Self {
        Self::new(TimeDelta::seconds(DEFAULT_ROOM_TTL_SECS))
    }
}

impl InMemoryMatchStore {
    /// Creates an empty store whose rooms live for `ttl` after creation or
    /// restart.
    #[instrument]
    pub fn new(ttl: TimeDelta) -> Self {
        info!(ttl_secs = ttl.num_seconds(), "Creating in-memory match store");
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Returns the lifetime given to new and restarted rooms.
    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Drops every expired record and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Backend`] if the room table is poisoned.
    #[instrument(skip(self))]
    pub fn purge_expired(&self) -> Result<usize, RepositoryError> {
        let now = Utc::now();
        let mut rooms = self.rooms()?;
        let before = rooms.len();
        rooms.retain(|_, room| room.is_live(now));
        let purged = before - rooms.len();
        if purged > 0 {
            info!(purged, remaining = rooms.len(), "Purged expired rooms");
        }
        Ok(purged)
    }

    fn rooms(&self) -> Result<MutexGuard<'_, HashMap<String, StoredRoom>>, RepositoryError> {
        self.rooms
            .lock()
            .map_err(|e| RepositoryError::backend(format!("room table poisoned: {e}")))
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, RepositoryError> {
        now.checked_add_signed(self.ttl).ok_or_else(|| {
            RepositoryError::backend(format!("room lifetime out of range: {}", self.ttl))
        })
    }

    fn insert_new(&self, creator: Player) -> Result<Match, RepositoryError> {
        let now = Utc::now();
        let expires_at = self.expiry_from(now)?;
        let mut rooms = self.rooms()?;
        let room_id = free_room_id(&rooms, now)?;

        let game = Match::open(room_id, creator);
        let fields = HashMap::from([
            (Field::Players, encode(&game.room_id, Field::Players, &game.players)?),
            (Field::Status, game.status.as_ref().to_string()),
            (Field::TurnOwner, game.turn_owner.to_string()),
        ]);
        rooms.insert(
            key(&game.room_id),
            StoredRoom { fields, expires_at },
        );
        Ok(game)
    }

    fn read(
        &self,
        room_id: &RoomId,
        wanted: &[Field],
    ) -> Result<HashMap<Field, Option<String>>, RepositoryError> {
        let rooms = self.rooms()?;
        let room = rooms
            .get(&key(room_id))
            .filter(|room| room.is_live(Utc::now()))
            .ok_or_else(|| RepositoryError::not_found(room_id))?;

        Ok(wanted
            .iter()
            .map(|field| (*field, room.fields.get(field).cloned()))
            .collect())
    }

    fn write(&self, room_id: &RoomId, values: Vec<(Field, String)>) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms()?;
        let room = rooms
            .get_mut(&key(room_id))
            .filter(|room| room.is_live(Utc::now()))
            .ok_or_else(|| RepositoryError::not_found(room_id))?;

        room.fields.extend(values);
        Ok(())
    }
}

/// Draws room ids until one is not held by a live record.
fn free_room_id(
    rooms: &HashMap<String, StoredRoom>,
    now: DateTime<Utc>,
) -> Result<RoomId, RepositoryError> {
    let mut rng = rand::rng();
    for attempt in 1..=MAX_ID_ATTEMPTS {
        let room_id = RoomId::generate(&mut rng);
        if rooms.get(&key(&room_id)).is_some_and(|room| room.is_live(now)) {
            warn!(room_id = %room_id, attempt, "Room id collision, drawing again");
            continue;
        }
        return Ok(room_id);
    }

    Err(RepositoryError::backend(format!(
        "no free room id after {MAX_ID_ATTEMPTS} attempts"
    )))
}

fn encode<T: Serialize>(room_id: &RoomId, field: Field, value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::corrupt(room_id, field, e.to_string()))
}

/// Decodes a JSON map field; an unset field decodes as empty.
fn decode_map<T: DeserializeOwned + Default>(
    room_id: &RoomId,
    field: Field,
    raw: Option<&String>,
) -> Result<T, RepositoryError> {
    match raw {
        None => Ok(T::default()),
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| RepositoryError::corrupt(room_id, field, e.to_string())),
    }
}

fn decode_status(room_id: &RoomId, raw: Option<&String>) -> Result<MatchStatus, RepositoryError> {
    let raw = raw.ok_or_else(|| RepositoryError::corrupt(room_id, Field::Status, "missing"))?;
    raw.parse()
        .map_err(|e: strum::ParseError| RepositoryError::corrupt(room_id, Field::Status, e.to_string()))
}

fn decode_turn(room_id: &RoomId, raw: Option<&String>) -> Result<PlayerId, RepositoryError> {
    raw.map(|raw| PlayerId::from(raw.as_str()))
        .ok_or_else(|| RepositoryError::corrupt(room_id, Field::TurnOwner, "missing"))
}

#[async_trait]
impl MatchRepository for InMemoryMatchStore {
    #[instrument(skip_all, fields(player_id = %creator.id))]
    async fn create_match(&self, creator: Player) -> Result<Match, RepositoryError> {
        let game = self.insert_new(creator)?;
        info!(room_id = %game.room_id, "Room stored");
        Ok(game)
    }

    #[instrument(skip_all, fields(room_id = %room_id))]
    async fn get_players(&self, room_id: &RoomId) -> Result<Players, RepositoryError> {
        let fields = self.read(room_id, &[Field::Players])?;
        let players: Players = decode_map(room_id, Field::Players, fields[&Field::Players].as_ref())?;
        debug!(count = players.len(), "Players loaded");
        Ok(players)
    }

    #[instrument(skip_all, fields(room_id = %room_id, count = players.len()))]
    async fn set_players_and_mark_full(
        &self,
        room_id: &RoomId,
        players: &Players,
    ) -> Result<(), RepositoryError> {
        self.write(
            room_id,
            vec![
                (Field::Players, encode(room_id, Field::Players, players)?),
                (Field::Status, MatchStatus::FullRoom.as_ref().to_string()),
            ],
        )
    }

    #[instrument(skip_all, fields(room_id = %room_id))]
    async fn get_status(&self, room_id: &RoomId) -> Result<MatchStatus, RepositoryError> {
        let fields = self.read(room_id, &[Field::Status])?;
        let status = decode_status(room_id, fields[&Field::Status].as_ref())?;
        debug!(%status, "Status loaded");
        Ok(status)
    }

    #[instrument(skip_all, fields(room_id = %room_id, count = secrets.len()))]
    async fn set_secrets(
        &self,
        room_id: &RoomId,
        secrets: &Secrets,
    ) -> Result<(), RepositoryError> {
        self.write(
            room_id,
            vec![(Field::Secrets, encode(room_id, Field::Secrets, secrets)?)],
        )
    }

    #[instrument(skip_all, fields(room_id = %room_id))]
    async fn get_players_and_secrets(
        &self,
        room_id: &RoomId,
    ) -> Result<(Players, Secrets), RepositoryError> {
        let fields = self.read(room_id, &[Field::Players, Field::Secrets])?;
        let players = decode_map(room_id, Field::Players, fields[&Field::Players].as_ref())?;
        let secrets = decode_map(room_id, Field::Secrets, fields[&Field::Secrets].as_ref())?;
        Ok((players, secrets))
    }

    #[instrument(skip_all, fields(room_id = %room_id))]
    async fn get_players_secrets_status_turn(
        &self,
        room_id: &RoomId,
    ) -> Result<MatchSetup, RepositoryError> {
        let fields = self.read(
            room_id,
            &[Field::Players, Field::Secrets, Field::Status, Field::TurnOwner],
        )?;
        Ok(MatchSetup {
            players: decode_map(room_id, Field::Players, fields[&Field::Players].as_ref())?,
            secrets: decode_map(room_id, Field::Secrets, fields[&Field::Secrets].as_ref())?,
            status: decode_status(room_id, fields[&Field::Status].as_ref())?,
            turn_owner: decode_turn(room_id, fields[&Field::TurnOwner].as_ref())?,
        })
    }

    #[instrument(skip_all, fields(room_id = %room_id))]
    async fn get_all_fields(&self, room_id: &RoomId) -> Result<Match, RepositoryError> {
        let fields = self.read(
            room_id,
            &[
                Field::Players,
                Field::Secrets,
                Field::GuessHistory,
                Field::Status,
                Field::TurnOwner,
            ],
        )?;
        let game = Match {
            room_id: room_id.clone(),
            players: decode_map(room_id, Field::Players, fields[&Field::Players].as_ref())?,
            secrets: decode_map(room_id, Field::Secrets, fields[&Field::Secrets].as_ref())?,
            guess_history: decode_map(
                room_id,
                Field::GuessHistory,
                fields[&Field::GuessHistory].as_ref(),
            )?,
            status: decode_status(room_id, fields[&Field::Status].as_ref())?,
            turn_owner: decode_turn(room_id, fields[&Field::TurnOwner].as_ref())?,
        };
        debug!(status = %game.status, "Match loaded");
        Ok(game)
    }

    #[instrument(skip_all, fields(room_id = %room_id, status = %status, turn_owner = %turn_owner))]
    async fn set_status_and_turn(
        &self,
        room_id: &RoomId,
        status: MatchStatus,
        turn_owner: &PlayerId,
    ) -> Result<(), RepositoryError> {
        self.write(
            room_id,
            vec![
                (Field::Status, status.as_ref().to_string()),
                (Field::TurnOwner, turn_owner.to_string()),
            ],
        )
    }

    #[instrument(skip_all, fields(room_id = %room_id, turn_owner = %turn_owner, is_winner = is_winner))]
    async fn set_guess_history_and_turn(
        &self,
        room_id: &RoomId,
        guess_history: &GuessHistory,
        turn_owner: &PlayerId,
        is_winner: bool,
    ) -> Result<(), RepositoryError> {
        let mut values = vec![
            (
                Field::GuessHistory,
                encode(room_id, Field::GuessHistory, guess_history)?,
            ),
            (Field::TurnOwner, turn_owner.to_string()),
        ];
        if is_winner {
            values.push((Field::Status, MatchStatus::Finished.as_ref().to_string()));
        }
        self.write(room_id, values)
    }

    #[instrument(skip_all, fields(room_id = %room_id))]
    async fn exists(&self, room_id: &RoomId) -> Result<(), RepositoryError> {
        self.read(room_id, &[]).map(|_| ())
    }

    #[instrument(skip_all, fields(room_id = %room_id))]
    async fn restart(&self, room_id: &RoomId) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let expires_at = self.expiry_from(now)?;
        let mut rooms = self.rooms()?;
        let room = rooms
            .get_mut(&key(room_id))
            .filter(|room| room.is_live(now))
            .ok_or_else(|| RepositoryError::not_found(room_id))?;

        room.fields.remove(&Field::Secrets);
        room.fields.remove(&Field::GuessHistory);
        room.fields
            .insert(Field::Status, MatchStatus::FullRoom.as_ref().to_string());
        room.expires_at = expires_at;
        debug!(expires_at = %room.expires_at, "Room restarted");
        Ok(())
    }
}
