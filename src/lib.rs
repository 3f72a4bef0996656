//! Number Hunt core crate.
//!
//! Five timed rounds of clicking numbered cells in ascending order on a
//! growing grid. Everything except `web` is plain Rust so the rules, timers,
//! rankings and share rewards run under `cargo test` on the host. The browser
//! layer (DOM, localStorage, fetch, Kakao SDK) compiles only for wasm32 and
//! exposes a single `NumberHunt` handle to the page.

pub mod config;
pub mod error;
pub mod game;
pub mod grid;
pub mod notice;
pub mod play_count;
pub mod ranking;
pub mod remote;
pub mod round;
pub mod share;
pub mod storage;
pub mod timer;

#[cfg(target_arch = "wasm32")]
mod web;

pub use config::{GameConfig, PlayGating, ROUND_COUNT, TimerMode};
pub use error::{GameError, GameResult};
pub use game::Game;
pub use notice::{Notice, NoticeLog, Notifier};
pub use round::{ClickOutcome, Phase, RoundStart};
pub use timer::{Tick, format_mm_ss};

#[cfg(target_arch = "wasm32")]
pub use web::{BrowserStore, FrameLoop, NumberHunt};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    web::logging::init();
}

/// Build the game from an optional JSON config and wire it to the page.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start_app(config_json: Option<String>) -> Result<NumberHunt, JsValue> {
    NumberHunt::new(config_json)
}
