//! The one game instance the page talks to. It owns the round controller, the
//! stores and the notice sink; nothing lives in globals.
//!
//! Network and SDK calls come in two shapes. The `async` helpers
//! (`submit_score`, `refresh_rankings`, `share`) run a whole exchange while
//! borrowing the game. The browser cannot hold a borrow across an await, so it
//! uses the split steps instead: `record_score`/`finish_upload`,
//! `rankings_cache`, `check_share`/`finish_share`.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::config::{GameConfig, PlayGating};
use crate::error::{GameError, GameResult};
use crate::notice::{Notice, Notifier};
use crate::play_count::PlayCounts;
use crate::ranking::{LocalRankings, RankingRow, RankingSource, ranking_rows};
use crate::remote::{FetchReport, RankingCache, RankingEndpoint, RemoteRankingEntry, fetch_cached};
use crate::round::{ClickOutcome, RoundController, RoundStart};
use crate::share::{SharePayload, ShareRewards, ShareSdk};
use crate::storage::KeyValueStore;
use crate::timer::{Tick, format_mm_ss};

pub struct Game<S: KeyValueStore, N: Notifier> {
    config: GameConfig,
    store: S,
    notifier: N,
    plays: PlayCounts,
    rounds: RoundController,
    local: LocalRankings,
    remote: RankingCache,
    rewards: ShareRewards,
    rng: StdRng,
}

impl<S: KeyValueStore, N: Notifier> Game<S, N> {
    pub fn new(config: GameConfig, store: S, notifier: N) -> Self {
        Self::with_rng(config, store, notifier, StdRng::from_entropy())
    }

    pub fn with_rng(config: GameConfig, store: S, notifier: N, rng: StdRng) -> Self {
        Self {
            plays: PlayCounts::new(config.initial_plays),
            rounds: RoundController::new(&config),
            local: LocalRankings::new(config.ranking_capacity, config.dedupe_names),
            remote: RankingCache::new(config.ranking_cache_ms),
            rewards: ShareRewards::new(config.one_time_share),
            config,
            store,
            notifier,
            rng,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn rounds(&self) -> &RoundController {
        &self.rounds
    }

    pub fn play_count(&self) -> u32 {
        self.plays.get(&self.store)
    }

    pub fn set_play_count(&mut self, count: i64) -> GameResult<u32> {
        self.plays.set(&mut self.store, count)
    }

    /// Start (or restart) a game. Gated play spends one chance.
    pub fn start(&mut self, now_ms: f64) -> GameResult<RoundStart> {
        if self.config.gating == PlayGating::Consume {
            if self.plays.get(&self.store) == 0 {
                return self.fail(GameError::NoChancesRemaining);
            }
            let left = match self.plays.decrement(&mut self.store) {
                Ok(left) => left,
                Err(err) => return self.fail(err),
            };
            info!(left, "chance spent");
        }
        Ok(self.rounds.begin(now_ms, &mut self.rng))
    }

    pub fn click(&mut self, number: u32, now_ms: f64) -> GameResult<ClickOutcome> {
        match self.rounds.submit_click(number, now_ms, &mut self.rng) {
            Ok(outcome) => {
                if let ClickOutcome::GameComplete { .. } = outcome {
                    self.notifier.notify(Notice::GameComplete);
                }
                Ok(outcome)
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn tick(&mut self, epoch: u64, now_ms: f64) -> GameResult<Tick> {
        match self.rounds.tick(epoch, now_ms) {
            Ok(tick) => Ok(tick),
            Err(err) => self.fail(err),
        }
    }

    pub fn reset(&mut self) {
        self.rounds.reset();
    }

    /// Save a finished time on the device and return the row to upload.
    pub fn record_score(&mut self, name: &str, secs: u32, timestamp: &str, date: &str) -> GameResult<RemoteRankingEntry> {
        if let Err(err) = self.local.add(&mut self.store, name, secs, timestamp) {
            return self.fail(err);
        }
        Ok(RemoteRankingEntry::new(name.trim(), secs, date))
    }

    /// Ask for a ranking name until a usable one is given, then record the
    /// score. `ask` gets the prompt text and returns `None` when the player
    /// declines, which skips the ranking.
    pub fn claim_score(
        &mut self,
        secs: u32,
        timestamp: &str,
        date: &str,
        mut ask: impl FnMut(&str) -> Option<String>,
    ) -> Option<RemoteRankingEntry> {
        let mut prompt = format!("Cleared in {}! Enter a name for the ranking:", format_mm_ss(secs));
        loop {
            let name = ask(&prompt)?;
            match self.record_score(&name, secs, timestamp, date) {
                Ok(row) => return Some(row),
                Err(GameError::InvalidName) => {
                    prompt = "A name is required for the ranking. Enter a name:".to_string();
                }
                Err(_) => return None,
            }
        }
    }

    /// Settle an upload started after `record_score`. A failure only means the
    /// score stayed local.
    pub fn finish_upload(&mut self, result: GameResult<()>, now_ms: f64) {
        match result {
            Ok(()) => {
                self.remote.invalidate(now_ms);
                self.notifier.notify(Notice::ScoreSaved);
            }
            Err(err) => {
                warn!(%err, "score kept locally only");
                self.notifier.notify(Notice::SavedLocallyOnly);
            }
        }
    }

    pub fn rankings_cache(&mut self) -> &mut RankingCache {
        &mut self.remote
    }

    /// Warn about a failed fetch that fell back to cached rows.
    pub fn note_fetch(&mut self, report: &FetchReport) {
        if report.error.is_some() {
            self.notifier.notify(Notice::RankingOffline);
        }
    }

    /// Rows for the ranking view: global when known, device-local otherwise.
    pub fn ranking_view(&self) -> (RankingSource, Vec<RankingRow>) {
        let local = self.local.load(&self.store);
        ranking_rows(self.remote.last_known(), &local, self.config.ranking_capacity)
    }

    pub fn share_payload(&self, page_url: &str) -> SharePayload {
        SharePayload::for_page(&self.config.share, page_url)
    }

    pub fn check_share<K: ShareSdk + ?Sized>(&mut self, sdk: &K) -> GameResult<()> {
        match self.rewards.check(&self.store, sdk) {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err),
        }
    }

    /// Settle a share sheet. Success credits one chance.
    pub fn finish_share(&mut self, result: GameResult<()>) -> GameResult<u32> {
        if let Err(err) = result {
            return self.fail(err);
        }
        match self.rewards.grant(&mut self.store, &self.plays) {
            Ok(count) => {
                self.notifier.notify(Notice::ShareRewarded);
                Ok(count)
            }
            Err(err) => self.fail(err),
        }
    }

    pub async fn submit_score<E: RankingEndpoint + ?Sized>(
        &mut self,
        endpoint: &E,
        name: &str,
        secs: u32,
        timestamp: &str,
        date: &str,
        now_ms: f64,
    ) -> GameResult<()> {
        let row = self.record_score(name, secs, timestamp, date)?;
        let uploaded = endpoint.push(&row).await;
        self.finish_upload(uploaded, now_ms);
        Ok(())
    }

    pub async fn refresh_rankings<E: RankingEndpoint + ?Sized>(&mut self, endpoint: &E, now_ms: f64) -> FetchReport {
        let report = fetch_cached(endpoint, &mut self.remote, now_ms).await;
        self.note_fetch(&report);
        report
    }

    pub async fn share<K: ShareSdk + ?Sized>(&mut self, sdk: &K, page_url: &str) -> GameResult<u32> {
        self.check_share(sdk)?;
        let payload = self.share_payload(page_url);
        let sent = sdk.send_link(&payload).await;
        self.finish_share(sent)
    }

    fn fail<T>(&mut self, err: GameError) -> GameResult<T> {
        self.notifier.notify(err.notice());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeLog;
    use crate::storage::MemoryStore;

    fn game(config: GameConfig) -> Game<MemoryStore, NoticeLog> {
        Game::with_rng(config, MemoryStore::new(), NoticeLog::default(), StdRng::seed_from_u64(3))
    }

    #[test]
    fn gated_starts_drain_chances_then_refuse() {
        let mut g = game(GameConfig::default());
        assert_eq!(g.play_count(), 3);
        g.start(0.0).unwrap();
        assert_eq!(g.play_count(), 2);
        g.start(0.0).unwrap();
        g.start(0.0).unwrap();
        assert_eq!(g.play_count(), 0);
        assert_eq!(g.start(0.0), Err(GameError::NoChancesRemaining));
        assert_eq!(g.play_count(), 0);
        assert_eq!(g.notifier().last(), Some(Notice::NoChancesRemaining));
    }

    #[test]
    fn refused_start_leaves_round_state_alone() {
        let mut g = game(GameConfig::default());
        g.set_play_count(1).unwrap();
        g.start(0.0).unwrap();
        g.click(1, 0.0).unwrap();
        assert!(g.start(0.0).is_err());
        assert_eq!(g.rounds().state().user, vec![1]);
        assert!(g.rounds().is_active());
    }

    #[test]
    fn unlimited_play_never_spends_chances() {
        let mut g = game(GameConfig { gating: PlayGating::Unlimited, ..GameConfig::default() });
        g.set_play_count(0).unwrap();
        for _ in 0..5 {
            g.start(0.0).unwrap();
        }
        assert_eq!(g.play_count(), 0);
    }

    #[test]
    fn wrong_click_shows_notice_without_losing_progress() {
        let mut g = game(GameConfig::default());
        g.start(0.0).unwrap();
        assert!(g.click(2, 0.0).is_err());
        assert!(g.rounds().state().user.is_empty());
        assert_eq!(g.notifier().last(), Some(Notice::WrongClick));
    }

    #[test]
    fn timeout_is_announced() {
        let mut g = game(GameConfig::default());
        let start = g.start(0.0).unwrap();
        assert_eq!(g.tick(start.epoch, 5_000.0), Err(GameError::Timeout { round: 1 }));
        assert_eq!(g.notifier().last(), Some(Notice::Timeout));
    }

    #[test]
    fn failed_share_grants_nothing() {
        let mut g = game(GameConfig::default());
        g.set_play_count(0).unwrap();
        let res = g.finish_share(Err(GameError::ShareFailed("cancelled".into())));
        assert!(res.is_err());
        assert_eq!(g.play_count(), 0);
        assert_eq!(g.finish_share(Ok(())), Ok(1));
        assert_eq!(g.notifier().last(), Some(Notice::ShareRewarded));
    }

    #[test]
    fn restart_mid_game_goes_back_to_round_one() {
        let mut g = game(GameConfig::default());
        g.start(0.0).unwrap();
        for n in 1..=4 {
            g.click(n, 100.0).unwrap();
        }
        let round_two = g.rounds().timer().epoch();
        assert_eq!(g.rounds().state().round, 2);
        g.click(1, 200.0).unwrap();
        g.click(2, 200.0).unwrap();

        g.start(300.0).unwrap();
        assert_eq!(g.play_count(), 1);
        assert_eq!(g.rounds().state().round, 1);
        assert_eq!(g.rounds().state().grid_size, 2);
        assert!(g.rounds().state().user.is_empty());
        assert_eq!(g.tick(round_two, 400.0), Ok(Tick::Stale));
    }

    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get_item(&self, key: &str) -> Option<String> {
            self.0.get_item(key)
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> GameResult<()> {
            Err(GameError::Storage("quota exceeded".into()))
        }

        fn remove_item(&mut self, key: &str) {
            self.0.remove_item(key);
        }
    }

    #[test]
    fn unwritable_chance_count_is_reported() {
        let mut g = Game::with_rng(
            GameConfig::default(),
            ReadOnlyStore(MemoryStore::new()),
            NoticeLog::default(),
            StdRng::seed_from_u64(3),
        );
        assert!(matches!(g.start(0.0), Err(GameError::Storage(_))));
        assert_eq!(g.notifier().last(), Some(Notice::Internal));
        assert!(!g.rounds().is_active());
    }

    #[test]
    fn blank_name_is_asked_again() {
        let mut g = game(GameConfig::default());
        let mut answers = vec![Some("  ".to_string()), Some(" mina ".to_string())].into_iter();
        let mut prompts = Vec::new();
        let row = g.claim_score(47, "t", "d", |prompt| {
            prompts.push(prompt.to_string());
            answers.next().flatten()
        });
        assert_eq!(row.map(|r| r.name), Some("mina".to_string()));
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("00:47"));
        assert_eq!(g.notifier().notices, vec![Notice::InvalidName]);
    }

    #[test]
    fn declined_name_skips_the_ranking() {
        let mut g = game(GameConfig::default());
        assert_eq!(g.claim_score(47, "t", "d", |_| None), None);
        assert!(g.ranking_view().1.is_empty());
    }
}
