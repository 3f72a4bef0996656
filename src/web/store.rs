use gloo::storage::{LocalStorage, Storage};

use crate::error::{GameError, GameResult};
use crate::storage::KeyValueStore;

/// `window.localStorage`, read and written as raw strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserStore;

impl KeyValueStore for BrowserStore {
    fn get_item(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn set_item(&mut self, key: &str, value: &str) -> GameResult<()> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|e| GameError::Storage(format!("{e:?}")))
    }

    fn remove_item(&mut self, key: &str) {
        LocalStorage::delete(key);
    }
}
