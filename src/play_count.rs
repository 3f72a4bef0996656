//! Rationed game attempts ("chances"), persisted under `playCount`.

use tracing::{debug, warn};

use crate::error::GameResult;
use crate::storage::{KeyValueStore, PLAY_COUNT_KEY};

pub struct PlayCounts {
    initial: u32,
}

impl PlayCounts {
    pub fn new(initial: u32) -> Self {
        Self { initial }
    }

    /// Stored count, or the initial allotment when nothing (or garbage) is stored.
    pub fn get<S: KeyValueStore + ?Sized>(&self, store: &S) -> u32 {
        match store.get_item(PLAY_COUNT_KEY) {
            None => self.initial,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(n) => n.clamp(0, u32::MAX as i64) as u32,
                Err(_) => {
                    warn!(value = %raw, "unreadable play count, using initial allotment");
                    self.initial
                }
            },
        }
    }

    /// Persist `count`, clamped at zero.
    pub fn set<S: KeyValueStore + ?Sized>(&self, store: &mut S, count: i64) -> GameResult<u32> {
        let clamped = count.clamp(0, u32::MAX as i64) as u32;
        store.set_item(PLAY_COUNT_KEY, &clamped.to_string())?;
        debug!(count = clamped, "play count stored");
        Ok(clamped)
    }

    pub fn decrement<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> GameResult<u32> {
        let current = self.get(store) as i64;
        self.set(store, current - 1)
    }

    pub fn increment<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> GameResult<u32> {
        let current = self.get(store) as i64;
        self.set(store, current + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn unset_count_uses_initial_allotment() {
        let store = MemoryStore::new();
        assert_eq!(PlayCounts::new(3).get(&store), 3);
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        let mut store = MemoryStore::new();
        let plays = PlayCounts::new(3);
        assert_eq!(plays.set(&mut store, -5).unwrap(), 0);
        assert_eq!(store.get_item(PLAY_COUNT_KEY).as_deref(), Some("0"));
        assert_eq!(plays.decrement(&mut store).unwrap(), 0);
        assert_eq!(plays.get(&store), 0);
    }

    #[test]
    fn increment_and_decrement_round_trip_through_storage() {
        let mut store = MemoryStore::new();
        let plays = PlayCounts::new(3);
        assert_eq!(plays.decrement(&mut store).unwrap(), 2);
        assert_eq!(plays.increment(&mut store).unwrap(), 3);
        assert_eq!(plays.increment(&mut store).unwrap(), 4);
    }

    #[test]
    fn garbage_falls_back_to_initial() {
        let mut store = MemoryStore::new();
        store.set_item(PLAY_COUNT_KEY, "lots").unwrap();
        assert_eq!(PlayCounts::new(2).get(&store), 2);
    }
}
