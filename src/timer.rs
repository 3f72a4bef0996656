//! Round timing.
//!
//! `RoundTimer` is the clock logic (countdown or stopwatch) driven by
//! timestamps in milliseconds, the same `performance.now()` values the
//! browser hands to frame callbacks. It never owns a browser handle; the
//! caller keeps one in a `TimerSlot`, which guarantees the previous source is
//! cancelled before a new one is installed.
//!
//! Every start and cancel bumps an epoch. Ticks carry the epoch they were
//! scheduled with, so a callback from a cancelled source that still fires is
//! reported as `Tick::Stale` and ignored.

use tracing::debug;

use crate::config::TimerMode;

pub fn format_mm_ss(total_secs: u32) -> String {
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    format!("{:02}:{:02}", mins, secs)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Scheduled by a source that has since been cancelled or replaced.
    Stale,
    /// Still within the same displayed second.
    Unchanged,
    /// New text for the timer display.
    Display(String),
    /// Countdown reached zero. The timer is stopped.
    Expired,
}

#[derive(Debug)]
pub struct RoundTimer {
    mode: TimerMode,
    epoch: u64,
    running: bool,
    game_start_ms: f64,
    round_start_ms: f64,
    limit_secs: u32,
    last_shown: Option<u32>,
    starts: u32,
}

impl RoundTimer {
    pub fn new(mode: TimerMode) -> Self {
        Self {
            mode,
            epoch: 0,
            running: false,
            game_start_ms: 0.0,
            round_start_ms: 0.0,
            limit_secs: 0,
            last_shown: None,
            starts: 0,
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// How many times a round timer has been started since construction.
    pub fn starts(&self) -> u32 {
        self.starts
    }

    /// Anchor the stopwatch. Called once per game, before round 1.
    pub fn begin_game(&mut self, now_ms: f64) {
        self.game_start_ms = now_ms;
    }

    /// Start timing a round, cancelling whatever ran before. Returns the epoch
    /// that ticks for this round must carry.
    pub fn start_round(&mut self, limit_secs: u32, now_ms: f64) -> u64 {
        self.cancel();
        self.epoch += 1;
        self.running = true;
        self.round_start_ms = now_ms;
        self.limit_secs = limit_secs;
        self.last_shown = None;
        self.starts += 1;
        debug!(epoch = self.epoch, limit_secs, mode = ?self.mode, "round timer started");
        self.epoch
    }

    /// Stop ticking. Safe to call any number of times.
    pub fn cancel(&mut self) {
        if self.running {
            self.running = false;
            self.epoch += 1;
            debug!(epoch = self.epoch, "round timer cancelled");
        }
    }

    /// Whole seconds since the game started.
    pub fn elapsed_secs(&self, now_ms: f64) -> u32 {
        whole_secs(now_ms - self.game_start_ms)
    }

    /// Text to show right after `start_round`.
    pub fn initial_display(&self, now_ms: f64) -> String {
        match self.mode {
            TimerMode::Countdown => self.limit_secs.to_string(),
            TimerMode::Stopwatch => format_mm_ss(self.elapsed_secs(now_ms)),
        }
    }

    pub fn tick(&mut self, epoch: u64, now_ms: f64) -> Tick {
        if epoch != self.epoch || !self.running {
            return Tick::Stale;
        }
        match self.mode {
            TimerMode::Countdown => {
                let elapsed = whole_secs(now_ms - self.round_start_ms);
                let remaining = self.limit_secs.saturating_sub(elapsed);
                if remaining == 0 {
                    self.cancel();
                    return Tick::Expired;
                }
                self.show(remaining, remaining.to_string())
            }
            TimerMode::Stopwatch => {
                let elapsed = self.elapsed_secs(now_ms);
                self.show(elapsed, format_mm_ss(elapsed))
            }
        }
    }

    fn show(&mut self, secs: u32, text: String) -> Tick {
        if self.last_shown == Some(secs) {
            Tick::Unchanged
        } else {
            self.last_shown = Some(secs);
            Tick::Display(text)
        }
    }
}

fn whole_secs(ms: f64) -> u32 {
    if ms <= 0.0 { 0 } else { (ms / 1000.0).floor() as u32 }
}

/// A live ticking source (interval, animation-frame loop, or a test double).
pub trait Cancel {
    fn cancel(&mut self);
}

/// Holds at most one ticking source.
#[derive(Debug)]
pub struct TimerSlot<H: Cancel> {
    handle: Option<H>,
}

impl<H: Cancel> Default for TimerSlot<H> {
    fn default() -> Self {
        Self { handle: None }
    }
}

impl<H: Cancel> TimerSlot<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handle`, cancelling the previous one first.
    pub fn replace(&mut self, handle: H) {
        self.clear();
        self.handle = Some(handle);
    }

    /// Cancel the current source, if any.
    pub fn clear(&mut self) {
        if let Some(mut old) = self.handle.take() {
            old.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }
}
