//! Round progression: five grids of growing size, clicked in ascending order.

use rand::Rng;
use tracing::{debug, info};

use crate::config::{GameConfig, ROUND_COUNT, TimerMode};
use crate::error::{GameError, GameResult};
use crate::grid::{Grid, target_sequence};
use crate::timer::{RoundTimer, Tick};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active { round: u8 },
    Complete { elapsed_secs: u32 },
}

/// Progress through the current round. `user` is always a prefix of `target`.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    pub round: u8,
    pub grid_size: u8,
    pub target: Vec<u32>,
    pub user: Vec<u32>,
    pub active: bool,
    pub start_ms: Option<f64>,
}

impl GameState {
    fn idle() -> Self {
        Self {
            round: 1,
            grid_size: 2,
            target: target_sequence(2),
            user: Vec::new(),
            active: false,
            start_ms: None,
        }
    }

    pub fn next_expected(&self) -> Option<u32> {
        self.target.get(self.user.len()).copied()
    }
}

/// What the UI needs to lay out a freshly started round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundStart {
    pub round: u8,
    pub grid_size: u8,
    /// Epoch the timer ticks for this round must carry.
    pub epoch: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// No game running.
    Ignored,
    Accepted { number: u32 },
    RoundCleared { next: RoundStart },
    GameComplete { elapsed_secs: u32 },
}

pub struct RoundController {
    state: GameState,
    grid: Grid,
    timer: RoundTimer,
    phase: Phase,
    config: GameConfig,
}

impl RoundController {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            state: GameState::idle(),
            grid: Grid { size: 2, cells: Vec::new() },
            timer: RoundTimer::new(config.timer_mode),
            phase: Phase::Idle,
            config: config.clone(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn timer(&self) -> &RoundTimer {
        &self.timer
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// Reset to round 1 and start timing. Any running round is abandoned.
    pub fn begin<R: Rng + ?Sized>(&mut self, now_ms: f64, rng: &mut R) -> RoundStart {
        self.timer.cancel();
        self.state = GameState::idle();
        self.state.active = true;
        self.state.start_ms = Some(now_ms);
        self.timer.begin_game(now_ms);
        info!("game started");
        self.enter_round(1, now_ms, rng)
    }

    /// Feed one cell click. Out-of-order clicks return `WrongClick` and leave
    /// progress untouched.
    pub fn submit_click<R: Rng + ?Sized>(
        &mut self,
        number: u32,
        now_ms: f64,
        rng: &mut R,
    ) -> GameResult<ClickOutcome> {
        if !self.state.active {
            return Ok(ClickOutcome::Ignored);
        }
        let Some(expected) = self.state.next_expected() else {
            return Ok(ClickOutcome::Ignored);
        };
        if number != expected {
            debug!(expected, got = number, "wrong click");
            return Err(GameError::WrongClick { expected, got: number });
        }
        self.state.user.push(number);
        self.grid.consume(number);
        if self.state.user.len() == self.state.target.len() {
            return Ok(self.advance_round(now_ms, rng));
        }
        Ok(ClickOutcome::Accepted { number })
    }

    /// Close the current round and open the next one, or finish the game
    /// after the last round.
    pub fn advance_round<R: Rng + ?Sized>(&mut self, now_ms: f64, rng: &mut R) -> ClickOutcome {
        self.timer.cancel();
        let next = self.state.round + 1;
        if next > ROUND_COUNT {
            let elapsed_secs = self.timer.elapsed_secs(now_ms);
            self.state.active = false;
            self.phase = Phase::Complete { elapsed_secs };
            info!(elapsed_secs, "all rounds cleared");
            return ClickOutcome::GameComplete { elapsed_secs };
        }
        ClickOutcome::RoundCleared { next: self.enter_round(next, now_ms, rng) }
    }

    /// Forward a timer callback. A countdown that runs out ends the attempt.
    pub fn tick(&mut self, epoch: u64, now_ms: f64) -> GameResult<Tick> {
        let tick = self.timer.tick(epoch, now_ms);
        if tick == Tick::Expired {
            let round = self.state.round;
            self.state.active = false;
            self.phase = Phase::Idle;
            info!(round, "round timed out");
            return Err(GameError::Timeout { round });
        }
        Ok(tick)
    }

    /// Back to the idle screen. Safe to call from any phase, repeatedly.
    pub fn reset(&mut self) {
        self.timer.cancel();
        self.state.active = false;
        self.state.user.clear();
        self.phase = Phase::Idle;
    }

    fn enter_round<R: Rng + ?Sized>(&mut self, round: u8, now_ms: f64, rng: &mut R) -> RoundStart {
        let grid_size = round + 1;
        self.state.round = round;
        self.state.grid_size = grid_size;
        self.state.target = target_sequence(grid_size);
        self.state.user.clear();
        self.grid = Grid::generate(grid_size, rng);
        self.phase = Phase::Active { round };
        let limit = match self.timer.mode() {
            TimerMode::Countdown => self.config.time_limit(round),
            TimerMode::Stopwatch => 0,
        };
        let epoch = self.timer.start_round(limit, now_ms);
        debug!(round, grid_size, "round entered");
        RoundStart { round, grid_size, epoch }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn controller(mode: TimerMode) -> (RoundController, StdRng) {
        let cfg = GameConfig { timer_mode: mode, ..GameConfig::default() };
        (RoundController::new(&cfg), StdRng::seed_from_u64(42))
    }

    fn clear_round(ctl: &mut RoundController, now: f64, rng: &mut StdRng) -> ClickOutcome {
        let target = ctl.state().target.clone();
        let mut last = ClickOutcome::Ignored;
        for n in target {
            last = ctl.submit_click(n, now, rng).unwrap();
        }
        last
    }

    #[test]
    fn every_round_has_growing_ascending_target() {
        let (mut ctl, mut rng) = controller(TimerMode::Stopwatch);
        ctl.begin(0.0, &mut rng);
        for round in 1..=5u8 {
            let size = round + 1;
            assert_eq!(ctl.state().round, round);
            assert_eq!(ctl.state().grid_size, size);
            assert_eq!(ctl.state().target, (1..=(size as u32).pow(2)).collect::<Vec<_>>());
            assert_eq!(ctl.grid().len(), (size as usize).pow(2));
            clear_round(&mut ctl, 0.0, &mut rng);
        }
        assert!(matches!(ctl.phase(), Phase::Complete { .. }));
    }

    #[test]
    fn first_round_then_advance_to_three_by_three() {
        let (mut ctl, mut rng) = controller(TimerMode::Countdown);
        let start = ctl.begin(0.0, &mut rng);
        assert_eq!(start.grid_size, 2);
        assert_eq!(ctl.state().target, vec![1, 2, 3, 4]);

        let err = ctl.submit_click(2, 100.0, &mut rng).unwrap_err();
        assert_eq!(err, GameError::WrongClick { expected: 1, got: 2 });
        assert!(ctl.state().user.is_empty());

        let out = clear_round(&mut ctl, 200.0, &mut rng);
        let ClickOutcome::RoundCleared { next } = out else { panic!("expected round clear, got {out:?}") };
        assert_eq!(next.round, 2);
        assert_eq!(next.grid_size, 3);
        assert_eq!(ctl.state().target, (1..=9).collect::<Vec<_>>());
        assert!(ctl.state().user.is_empty());
    }

    #[test]
    fn wrong_click_keeps_progress() {
        let (mut ctl, mut rng) = controller(TimerMode::Countdown);
        ctl.begin(0.0, &mut rng);
        ctl.submit_click(1, 0.0, &mut rng).unwrap();
        ctl.submit_click(2, 0.0, &mut rng).unwrap();
        assert!(ctl.submit_click(4, 0.0, &mut rng).is_err());
        assert_eq!(ctl.state().user, vec![1, 2]);
        assert_eq!(ctl.state().next_expected(), Some(3));
    }

    #[test]
    fn completion_advances_once_and_restarts_timer_once() {
        let (mut ctl, mut rng) = controller(TimerMode::Countdown);
        ctl.begin(0.0, &mut rng);
        assert_eq!(ctl.timer().starts(), 1);
        clear_round(&mut ctl, 0.0, &mut rng);
        assert_eq!(ctl.timer().starts(), 2);
        assert_eq!(ctl.state().round, 2);
        // A repeat of the last number is now just out of order for round 2.
        assert!(ctl.submit_click(4, 0.0, &mut rng).is_err());
        assert_eq!(ctl.state().round, 2);
        assert_eq!(ctl.timer().starts(), 2);
    }

    #[test]
    fn clicks_are_ignored_when_idle() {
        let (mut ctl, mut rng) = controller(TimerMode::Countdown);
        assert_eq!(ctl.submit_click(1, 0.0, &mut rng), Ok(ClickOutcome::Ignored));
        assert!(ctl.state().user.is_empty());
    }

    #[test]
    fn countdown_expiry_ends_the_attempt() {
        let (mut ctl, mut rng) = controller(TimerMode::Countdown);
        let start = ctl.begin(0.0, &mut rng);
        assert_eq!(ctl.tick(start.epoch, 1_000.0), Ok(Tick::Display("4".into())));
        assert_eq!(ctl.tick(start.epoch, 5_000.0), Err(GameError::Timeout { round: 1 }));
        assert_eq!(ctl.phase(), Phase::Idle);
        assert_eq!(ctl.submit_click(1, 5_100.0, &mut rng), Ok(ClickOutcome::Ignored));
    }

    #[test]
    fn stale_ticks_from_previous_round_are_ignored() {
        let (mut ctl, mut rng) = controller(TimerMode::Countdown);
        let first = ctl.begin(0.0, &mut rng);
        clear_round(&mut ctl, 1_000.0, &mut rng);
        assert_eq!(ctl.tick(first.epoch, 9_000.0), Ok(Tick::Stale));
        assert_eq!(ctl.state().round, 2);
    }

    #[test]
    fn stopwatch_reports_total_elapsed_on_completion() {
        let (mut ctl, mut rng) = controller(TimerMode::Stopwatch);
        ctl.begin(10_000.0, &mut rng);
        let mut last = ClickOutcome::Ignored;
        for _ in 0..5 {
            last = clear_round(&mut ctl, 57_400.0, &mut rng);
        }
        assert_eq!(last, ClickOutcome::GameComplete { elapsed_secs: 47 });
        assert_eq!(ctl.phase(), Phase::Complete { elapsed_secs: 47 });
    }

    #[test]
    fn reset_is_idempotent() {
        let (mut ctl, mut rng) = controller(TimerMode::Countdown);
        ctl.begin(0.0, &mut rng);
        ctl.reset();
        ctl.reset();
        assert_eq!(ctl.phase(), Phase::Idle);
        assert!(!ctl.timer().is_running());
    }
}
