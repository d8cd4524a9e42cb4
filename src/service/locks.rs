//! Per-room mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use bulls_cows_core::RoomId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

/// Lazily created async lock per room.
///
/// Entries nobody holds or waits on are pruned whenever a lock is handed
/// out, so the table only grows with the number of busy rooms.
#[derive(Debug, Default)]
pub struct RoomLocks {
    table: Mutex<HashMap<RoomId, Arc<AsyncMutex<()>>>>,
}

impl RoomLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `room_id`.
    ///
    /// Access lasts until the returned guard is dropped.
    pub async fn acquire(&self, room_id: &RoomId) -> OwnedMutexGuard<()> {
        let lock = {
            // The table holds no invariant a panicking holder could break.
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(table.entry(room_id.clone()).or_default())
        };
        trace!(room_id = %room_id, "Waiting for room lock");
        lock.lock_owned().await
    }

    /// Number of rooms currently tracked.
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no room is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
