//! Tunables for a game session.
//!
//! Every field has a default, so the page may pass a partial JSON object (or
//! nothing at all) to `start_app`. Defaults reproduce the classic game: three
//! free chances, a per-round countdown, a ten-entry ranking.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};
use crate::notice::Notice;

pub const ROUND_COUNT: u8 = 5;

/// How the round timer behaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Each round has its own time limit; running out ends the attempt.
    #[default]
    Countdown,
    /// Counts up from the first click-able moment; the total is the ranking score.
    Stopwatch,
}

/// Whether starting a game consumes a chance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlayGating {
    #[default]
    Consume,
    Unlimited,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareText {
    pub title: String,
    pub description: String,
    pub button_title: String,
    /// Appended to the page URL to form the thumbnail URL.
    pub image_path: String,
}

impl Default for ShareText {
    fn default() -> Self {
        Self {
            title: "Number Hunt".to_string(),
            description: "Find the numbers in order! Can you beat my time?".to_string(),
            button_title: "Play".to_string(),
            image_path: "image.png".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub timer_mode: TimerMode,
    /// Countdown seconds for rounds 1..=5.
    pub round_time_limits: Vec<u32>,
    pub gating: PlayGating,
    pub initial_plays: u32,
    pub ranking_capacity: usize,
    /// Keep one entry per name (best time). Off keeps every submission.
    pub dedupe_names: bool,
    /// Remote ranking endpoint. `None` keeps rankings local.
    pub ranking_url: Option<String>,
    pub ranking_cache_ms: f64,
    pub share_app_key: Option<String>,
    pub one_time_share: bool,
    /// Delay before the board resets after a timeout or a win.
    pub reset_delay_ms: u32,
    pub notice_ms: u32,
    pub long_notice_ms: u32,
    pub share: ShareText,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            timer_mode: TimerMode::Countdown,
            round_time_limits: vec![5, 7, 15, 25, 30],
            gating: PlayGating::Consume,
            initial_plays: 3,
            ranking_capacity: 10,
            dedupe_names: true,
            ranking_url: None,
            ranking_cache_ms: 30_000.0,
            share_app_key: None,
            one_time_share: false,
            reset_delay_ms: 3_000,
            notice_ms: 2_000,
            long_notice_ms: 3_000,
            share: ShareText::default(),
        }
    }
}

impl GameConfig {
    pub fn from_json(raw: &str) -> GameResult<Self> {
        let cfg: GameConfig =
            serde_json::from_str(raw).map_err(|e| GameError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> GameResult<()> {
        if self.timer_mode == TimerMode::Countdown
            && self.round_time_limits.len() < ROUND_COUNT as usize
        {
            return Err(GameError::Config(format!(
                "round_time_limits needs {} entries, got {}",
                ROUND_COUNT,
                self.round_time_limits.len()
            )));
        }
        if self.round_time_limits.iter().any(|&s| s == 0) {
            return Err(GameError::Config("round time limits must be positive".into()));
        }
        if self.ranking_capacity == 0 {
            return Err(GameError::Config("ranking_capacity must be at least 1".into()));
        }
        Ok(())
    }

    /// Countdown seconds for a 1-based round. Falls back to the last entry.
    pub fn time_limit(&self, round: u8) -> u32 {
        let idx = (round.max(1) - 1) as usize;
        self.round_time_limits
            .get(idx)
            .or(self.round_time_limits.last())
            .copied()
            .unwrap_or(30)
    }

    pub fn notice_duration_ms(&self, notice: Notice) -> u32 {
        if notice.is_long() { self.long_notice_ms } else { self.notice_ms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = GameConfig::from_json(r#"{"timer_mode":"stopwatch","gating":"unlimited"}"#)
            .unwrap();
        assert_eq!(cfg.timer_mode, TimerMode::Stopwatch);
        assert_eq!(cfg.gating, PlayGating::Unlimited);
        assert_eq!(cfg.initial_plays, 3);
        assert_eq!(cfg.ranking_capacity, 10);
    }

    #[test]
    fn short_countdown_table_is_rejected() {
        let err = GameConfig::from_json(r#"{"round_time_limits":[5,7]}"#).unwrap_err();
        assert!(matches!(err, GameError::Config(_)));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(GameConfig::from_json("{nope"), Err(GameError::Config(_))));
    }

    #[test]
    fn time_limits_follow_round_table() {
        let cfg = GameConfig::default();
        let limits: Vec<u32> = (1..=5).map(|r| cfg.time_limit(r)).collect();
        assert_eq!(limits, vec![5, 7, 15, 25, 30]);
        assert_eq!(cfg.notice_duration_ms(Notice::Timeout), 3_000);
        assert_eq!(cfg.notice_duration_ms(Notice::WrongClick), 2_000);
    }
}
