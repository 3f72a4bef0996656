//! Browser front end: DOM wiring around one shared `Game`.
//!
//! The page provides the static markup (grid container, buttons, message box,
//! modals) and constructs a `NumberHunt`. Every listener and timer callback
//! holds a `Weak` to the same `App`, so dropping the handle tears the game down.

mod http;
mod kakao;
pub mod logging;
mod store;
mod timer_handle;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, window};

use http::HttpEndpoint;
use kakao::KakaoSdk;
pub use store::BrowserStore;
pub use timer_handle::FrameLoop;
use timer_handle::TimerHandle;

use crate::config::{GameConfig, TimerMode};
use crate::error::GameError;
use crate::game::Game;
use crate::notice::{Notice, Notifier};
use crate::ranking::RankingSource;
use crate::remote::RankingEndpoint;
use crate::round::ClickOutcome;
use crate::share::ShareSdk;
use crate::timer::{Tick, TimerSlot, format_mm_ss};

const COUNTDOWN_POLL_MS: u32 = 200;

type WebGame = Game<BrowserStore, DomNotifier>;
type Shared = Rc<RefCell<App>>;

/// Shows notices in `#message-box` and hides them after their duration.
pub struct DomNotifier {
    config: GameConfig,
    hide: Option<Timeout>,
}

impl DomNotifier {
    pub fn new(config: GameConfig) -> Self {
        Self { config, hide: None }
    }
}

impl Notifier for DomNotifier {
    fn notify(&mut self, notice: Notice) {
        let Some(el) = element("message-box") else { return };
        el.set_text_content(Some(notice.text()));
        let _ = el.class_list().add_1("show");
        let ms = self.config.notice_duration_ms(notice);
        // Replacing the timeout cancels the previous hide.
        self.hide = Some(Timeout::new(ms, move || {
            let _ = el.class_list().remove_1("show");
        }));
    }
}

struct App {
    game: WebGame,
    timer: TimerSlot<TimerHandle>,
    endpoint: Option<Rc<HttpEndpoint>>,
    sdk: Rc<KakaoSdk>,
    pending_reset: Option<Timeout>,
    listeners: Vec<EventListener>,
}

/// Handle the page keeps for the lifetime of the game.
#[wasm_bindgen]
pub struct NumberHunt {
    app: Shared,
}

#[wasm_bindgen]
impl NumberHunt {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<NumberHunt, JsValue> {
        let config = match config_json {
            Some(raw) => GameConfig::from_json(&raw),
            None => Ok(GameConfig::default()),
        }
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let mut sdk = KakaoSdk;
        if let Some(key) = &config.share_app_key {
            if let Err(err) = sdk.init(key) {
                warn!(%err, "sharing disabled");
            }
        }
        let endpoint = config.ranking_url.as_deref().map(|url| Rc::new(HttpEndpoint::new(url)));
        let notifier = DomNotifier::new(config.clone());
        let app = Rc::new(RefCell::new(App {
            game: Game::new(config, BrowserStore, notifier),
            timer: TimerSlot::new(),
            endpoint,
            sdk: Rc::new(sdk),
            pending_reset: None,
            listeners: Vec::new(),
        }));
        let listeners = wire_controls(&app)?;
        app.borrow_mut().listeners = listeners;
        render_idle(&app.borrow().game);
        Ok(NumberHunt { app })
    }

    pub fn start(&self) {
        start_game(&self.app);
    }

    pub fn click(&self, number: u32) {
        click_cell(&self.app, number);
    }

    pub fn share(&self) {
        share_for_play(&self.app);
    }

    #[wasm_bindgen(js_name = showRankings)]
    pub fn show_rankings(&self) {
        show_rankings(&self.app);
    }

    #[wasm_bindgen(getter, js_name = playCount)]
    pub fn play_count(&self) -> u32 {
        self.app.borrow().game.play_count()
    }
}

fn wire_controls(app: &Shared) -> Result<Vec<EventListener>, JsValue> {
    let doc = document().ok_or_else(|| JsValue::from_str("no document"))?;
    let mut listeners = Vec::new();

    let buttons: [(&str, fn(&Shared)); 3] = [
        ("start-btn", start_game),
        ("share-btn", share_for_play),
        ("ranking-btn", show_rankings),
    ];
    for (id, action) in buttons {
        if let Some(button) = doc.get_element_by_id(id) {
            let weak = Rc::downgrade(app);
            listeners.push(EventListener::new(&button, "click", move |_| {
                if let Some(app) = weak.upgrade() {
                    action(&app);
                }
            }));
        }
    }

    // One delegated listener for every cell of every round.
    if let Some(grid) = doc.get_element_by_id("grid-container") {
        let weak = Rc::downgrade(app);
        listeners.push(EventListener::new(&grid, "click", move |event| {
            let Some(number) = clicked_number(event) else { return };
            if let Some(app) = weak.upgrade() {
                click_cell(&app, number);
            }
        }));
    }

    wire_modal(&doc, "rules-modal", &mut listeners);
    wire_modal(&doc, "ranking-modal", &mut listeners);
    if let Some(rules) = doc.get_element_by_id("rules-modal") {
        let _ = rules.class_list().remove_1("hidden");
    }
    Ok(listeners)
}

/// Close on the `.close` button or a click on the backdrop.
fn wire_modal(doc: &Document, id: &str, listeners: &mut Vec<EventListener>) {
    let Some(modal) = doc.get_element_by_id(id) else { return };
    if let Ok(Some(close)) = doc.query_selector(&format!("#{id} .close")) {
        let m = modal.clone();
        listeners.push(EventListener::new(&close, "click", move |_| {
            let _ = m.class_list().add_1("hidden");
        }));
    }
    let m = modal.clone();
    listeners.push(EventListener::new(&modal, "click", move |event| {
        let on_backdrop = event
            .target()
            .map(|t| JsValue::from(t) == JsValue::from(m.clone()))
            .unwrap_or(false);
        if on_backdrop {
            let _ = m.class_list().add_1("hidden");
        }
    }));
}

fn clicked_number(event: &Event) -> Option<u32> {
    let target: Element = event.target()?.dyn_into().ok()?;
    let cell = target.closest(".grid-cell").ok()??;
    cell.get_attribute("data-number")?.parse().ok()
}

fn start_game(shared: &Shared) {
    let Ok(mut guard) = shared.try_borrow_mut() else { return };
    let app = &mut *guard;
    app.pending_reset = None;
    match app.game.start(now_ms()) {
        Ok(start) => {
            render_round(&app.game);
            begin_timer(app, shared, start.epoch);
        }
        Err(err) => debug!(%err, "start refused"),
    }
    render_play_count(&app.game);
}

fn click_cell(shared: &Shared, number: u32) {
    let Ok(mut guard) = shared.try_borrow_mut() else { return };
    let app = &mut *guard;
    match app.game.click(number, now_ms()) {
        Ok(ClickOutcome::Accepted { number }) => mark_clicked(number),
        Ok(ClickOutcome::RoundCleared { next }) => {
            render_round(&app.game);
            begin_timer(app, shared, next.epoch);
        }
        Ok(ClickOutcome::GameComplete { elapsed_secs }) => {
            app.timer.clear();
            set_text("timer", &format_mm_ss(elapsed_secs));
            record_finish(app, shared, elapsed_secs);
            schedule_reset(app, shared);
        }
        Ok(ClickOutcome::Ignored) | Err(_) => {}
    }
}

fn begin_timer(app: &mut App, shared: &Shared, epoch: u64) {
    let weak = Rc::downgrade(shared);
    let handle = match app.game.config().timer_mode {
        TimerMode::Countdown => TimerHandle::interval(COUNTDOWN_POLL_MS, move || on_tick(&weak, epoch, now_ms())),
        TimerMode::Stopwatch => TimerHandle::frame_loop(move |ts| on_tick(&weak, epoch, ts)),
    };
    app.timer.replace(handle);
    set_text("timer", &app.game.rounds().timer().initial_display(now_ms()));
}

fn on_tick(weak: &Weak<RefCell<App>>, epoch: u64, now: f64) {
    let Some(shared) = weak.upgrade() else { return };
    let Ok(mut guard) = shared.try_borrow_mut() else { return };
    let app = &mut *guard;
    match app.game.tick(epoch, now) {
        Ok(Tick::Display(text)) => set_text("timer", &text),
        Ok(_) => {}
        Err(GameError::Timeout { .. }) => {
            app.timer.clear();
            set_text("timer", "0");
            schedule_reset(app, &shared);
        }
        Err(err) => debug!(%err, "tick error"),
    }
}

fn schedule_reset(app: &mut App, shared: &Shared) {
    let weak = Rc::downgrade(shared);
    let delay = app.game.config().reset_delay_ms;
    app.pending_reset = Some(Timeout::new(delay, move || {
        let Some(shared) = weak.upgrade() else { return };
        let Ok(mut app) = shared.try_borrow_mut() else { return };
        app.timer.clear();
        app.game.reset();
        render_idle(&app.game);
    }));
}

fn record_finish(app: &mut App, shared: &Shared, secs: u32) {
    let Some(win) = window() else { return };
    let row = app.game.claim_score(secs, &iso_timestamp(), &display_date(), |prompt| {
        win.prompt_with_message_and_default(prompt, "").ok().flatten()
    });
    let Some(row) = row else { return };
    let Some(endpoint) = app.endpoint.clone() else {
        app.game.finish_upload(Ok(()), now_ms());
        return;
    };
    let weak = Rc::downgrade(shared);
    wasm_bindgen_futures::spawn_local(async move {
        let uploaded = endpoint.push(&row).await;
        let Some(shared) = weak.upgrade() else { return };
        match shared.try_borrow_mut() {
            Ok(mut app) => app.game.finish_upload(uploaded, now_ms()),
            Err(_) => warn!("game busy, upload result dropped"),
        };
    });
}

fn show_rankings(shared: &Shared) {
    let request = {
        let Ok(mut app) = shared.try_borrow_mut() else { return };
        let now = now_ms();
        if app.game.rankings_cache().fresh(now).is_some() {
            None
        } else if let Some(endpoint) = app.endpoint.clone() {
            // A pending request renders the view when it lands.
            let Some(requested_at) = app.game.rankings_cache().begin_request(now) else { return };
            Some((endpoint, requested_at))
        } else {
            None
        }
    };
    let Some((endpoint, requested_at)) = request else {
        render_rankings(&shared.borrow().game);
        return;
    };
    let weak = Rc::downgrade(shared);
    wasm_bindgen_futures::spawn_local(async move {
        let result = endpoint.fetch().await;
        let Some(shared) = weak.upgrade() else { return };
        let Ok(mut app) = shared.try_borrow_mut() else { return };
        let report = app.game.rankings_cache().store(result, requested_at);
        app.game.note_fetch(&report);
        render_rankings(&app.game);
    });
}

fn share_for_play(shared: &Shared) {
    let (sdk, payload) = {
        let Ok(mut app) = shared.try_borrow_mut() else { return };
        let sdk = app.sdk.clone();
        if app.game.check_share(&*sdk).is_err() {
            return;
        }
        let payload = app.game.share_payload(&page_url());
        (sdk, payload)
    };
    let weak = Rc::downgrade(shared);
    wasm_bindgen_futures::spawn_local(async move {
        let sent = sdk.send_link(&payload).await;
        let Some(shared) = weak.upgrade() else { return };
        let Ok(mut app) = shared.try_borrow_mut() else { return };
        if let Err(err) = app.game.finish_share(sent) {
            debug!(%err, "share not rewarded");
        }
        render_play_count(&app.game);
    });
}

// --- Rendering ---------------------------------------------------------------

fn render_idle(game: &WebGame) {
    set_text("timer", "0");
    set_text("round-number", "1");
    render_play_count(game);
}

fn render_play_count(game: &WebGame) {
    set_text("play-count-display", &game.play_count().to_string());
}

fn render_round(game: &WebGame) {
    let Some(doc) = document() else { return };
    let Some(container) = doc.get_element_by_id("grid-container") else { return };
    let grid = game.rounds().grid();
    let style = grid.style();
    set_text("round-number", &game.rounds().state().round.to_string());
    container.set_inner_html("");
    let _ = container.set_attribute(
        "style",
        &format!("grid-template-columns: repeat({}, 1fr);", grid.size),
    );
    for cell in &grid.cells {
        let Ok(div) = doc.create_element("div") else { continue };
        let _ = div.class_list().add_1("grid-cell");
        if cell.consumed {
            let _ = div.class_list().add_1("clicked");
        }
        div.set_text_content(Some(&cell.number.to_string()));
        let _ = div.set_attribute("data-number", &cell.number.to_string());
        let _ = div.set_attribute(
            "style",
            &format!("padding:{}px; font-size:{}px;", style.padding_px, style.font_px),
        );
        let _ = container.append_child(&div);
    }
}

fn mark_clicked(number: u32) {
    let Some(doc) = document() else { return };
    let selector = format!(".grid-cell[data-number=\"{number}\"]");
    if let Ok(Some(cell)) = doc.query_selector(&selector) {
        let _ = cell.class_list().add_1("clicked");
    }
}

fn render_rankings(game: &WebGame) {
    let Some(doc) = document() else { return };
    let (source, rows) = game.ranking_view();
    set_text(
        "ranking-source",
        match source {
            RankingSource::Global => "Global ranking",
            RankingSource::Local => "This device",
        },
    );
    if let Some(list) = doc.get_element_by_id("ranking-list") {
        list.set_inner_html("");
        for row in rows {
            let Ok(li) = doc.create_element("li") else { continue };
            li.set_text_content(Some(&format!("{}. {}  {}  {}", row.rank, row.name, row.time, row.date)));
            let _ = list.append_child(&li);
        }
    }
    if let Some(modal) = doc.get_element_by_id("ranking-modal") {
        let _ = modal.class_list().remove_1("hidden");
    }
}

// --- Browser helpers ---------------------------------------------------------

fn document() -> Option<Document> {
    window()?.document()
}

fn element(id: &str) -> Option<Element> {
    document()?.get_element_by_id(id)
}

fn set_text(id: &str, text: &str) {
    if let Some(el) = element(id) {
        el.set_text_content(Some(text));
    }
}

fn now_ms() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

fn page_url() -> String {
    window()
        .and_then(|w| w.location().href().ok())
        .unwrap_or_default()
}

fn iso_timestamp() -> String {
    js_sys::Date::new_0().to_iso_string().into()
}

fn display_date() -> String {
    js_sys::Date::new_0()
        .to_locale_date_string("default", &JsValue::UNDEFINED)
        .into()
}
