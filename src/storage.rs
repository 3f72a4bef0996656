//! Key/value persistence. In the browser this is `localStorage`; natively an
//! in-memory map stands in.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::GameResult;

pub const PLAY_COUNT_KEY: &str = "playCount";
pub const RANKINGS_KEY: &str = "rankings";
pub const SHARE_COMPLETED_KEY: &str = "shareCompleted";

pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str) -> GameResult<()>;
    fn remove_item(&mut self, key: &str);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> GameResult<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}

/// Decode a JSON value stored under `key`. A corrupt value is logged and
/// treated as absent so a bad write never locks the player out.
pub fn load_json<S: KeyValueStore + ?Sized, T: DeserializeOwned>(store: &S, key: &str) -> Option<T> {
    let raw = store.get_item(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, %err, "ignoring unreadable stored value");
            None
        }
    }
}

pub fn save_json<S: KeyValueStore + ?Sized, T: Serialize>(store: &mut S, key: &str, value: &T) -> GameResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set_item(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_json_reads_as_missing() {
        let mut store = MemoryStore::new();
        store.set_item(RANKINGS_KEY, "[{broken").unwrap();
        let loaded: Option<Vec<u32>> = load_json(&store, RANKINGS_KEY);
        assert!(loaded.is_none());
    }

    #[test]
    fn json_values_survive_a_save() {
        let mut store = MemoryStore::new();
        save_json(&mut store, "k", &vec![3u32, 1, 2]).unwrap();
        assert_eq!(store.get_item("k").as_deref(), Some("[3,1,2]"));
        store.remove_item("k");
        assert!(store.get_item("k").is_none());
    }
}
