//! Share-for-a-chance loop around the messaging SDK.

use tracing::info;

use crate::config::ShareText;
use crate::error::{GameError, GameResult};
use crate::play_count::PlayCounts;
use crate::storage::{KeyValueStore, SHARE_COMPLETED_KEY};

/// Link card sent through the SDK.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub link: String,
    pub button_title: String,
}

impl SharePayload {
    pub fn for_page(text: &ShareText, page_url: &str) -> Self {
        Self {
            title: text.title.clone(),
            description: text.description.clone(),
            image_url: format!("{}{}", page_url, text.image_path),
            link: page_url.to_string(),
            button_title: text.button_title.clone(),
        }
    }
}

/// The messaging SDK as the game uses it.
#[allow(async_fn_in_trait)]
pub trait ShareSdk {
    fn init(&mut self, app_key: &str) -> GameResult<()>;
    fn is_initialized(&self) -> bool;
    /// Resolves once the user completes or abandons the share sheet.
    async fn send_link(&self, payload: &SharePayload) -> GameResult<()>;
}

pub struct ShareRewards {
    one_time: bool,
}

impl ShareRewards {
    pub fn new(one_time: bool) -> Self {
        Self { one_time }
    }

    pub fn already_used<S: KeyValueStore + ?Sized>(&self, store: &S) -> bool {
        self.one_time && store.get_item(SHARE_COMPLETED_KEY).as_deref() == Some("true")
    }

    /// Checks to run before opening the share sheet.
    pub fn check<S: KeyValueStore + ?Sized, K: ShareSdk + ?Sized>(&self, store: &S, sdk: &K) -> GameResult<()> {
        if self.already_used(store) {
            return Err(GameError::ShareAlreadyUsed);
        }
        if !sdk.is_initialized() {
            return Err(GameError::ShareUnavailable);
        }
        Ok(())
    }

    /// Credit one chance for a completed share. Returns the new count.
    pub fn grant<S: KeyValueStore + ?Sized>(&self, store: &mut S, plays: &PlayCounts) -> GameResult<u32> {
        if self.already_used(store) {
            return Err(GameError::ShareAlreadyUsed);
        }
        let count = plays.increment(store)?;
        if self.one_time {
            store.set_item(SHARE_COMPLETED_KEY, "true")?;
        }
        info!(count, "share reward granted");
        Ok(count)
    }
}
