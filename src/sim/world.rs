/// LevelState: everything about one attempt at one level.
///
/// Created by the level controller when an attempt starts and
/// dropped when it ends. Owned by the controller and lent to the
/// step function, so there is no global avatar state.
///
/// ## Time
///
/// All timestamps are `Duration`s since an arbitrary monotonic
/// origin chosen by the shell's clock. Only differences are used:
///   - `elapsed       = now - started_at`     (level timer)
///   - `idle duration = now - last_move_at`   (anti-idle timer)

use std::fmt;
use std::time::Duration;

use crate::config::{Rules, TimingConfig};
use crate::domain::emotion::Emotion;
use crate::domain::grid::{Grid, Pos};
use crate::domain::obstacles::ObstacleSet;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Avatar {
    Light,
    Shadow,
}

impl fmt::Display for Avatar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Avatar::Light => f.write_str("Light"),
            Avatar::Shadow => f.write_str("Shadow"),
        }
    }
}

/// Attempt state machine. Everything but `Running` is terminal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Running,
    Succeeded,
    FailedCollision(Avatar),
    FailedIdle,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        self != Phase::Running
    }

    pub fn is_success(self) -> bool {
        self == Phase::Succeeded
    }
}

pub struct LevelState {
    // ── Level parameters ──
    pub level: u32,
    pub emotion: Emotion,
    pub grid: Grid,
    pub timing: TimingConfig,
    pub obstacles: ObstacleSet,

    // ── Avatars ──
    pub light: Pos,
    pub shadow: Pos,

    // ── State machine ──
    pub phase: Phase,
    pub tick: u64,

    // ── Timers ──
    pub started_at: Duration,
    pub last_move_at: Duration,
    /// Light position when movement was last detected.
    pub last_light: Pos,
    pub elapsed: Duration,
    pub idle_for: Duration,
}

impl LevelState {
    /// Fresh attempt: avatars on their start cells, timers at `now`.
    pub fn new(level: u32, emotion: Emotion, rules: &Rules, obstacles: ObstacleSet, now: Duration) -> Self {
        let grid = rules.grid;
        let light = grid.light_start();
        LevelState {
            level,
            emotion,
            grid,
            timing: rules.timing,
            obstacles,
            light,
            shadow: grid.shadow_start(),
            phase: Phase::Running,
            tick: 0,
            started_at: now,
            last_move_at: now,
            last_light: light,
            elapsed: Duration::ZERO,
            idle_for: Duration::ZERO,
        }
    }

    /// Whole seconds shown on the HUD.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.as_secs()
    }

    pub fn remaining(&self) -> Duration {
        self.timing.level_duration.saturating_sub(self.elapsed)
    }

    /// True once the player has been still for more than half the idle timeout.
    pub fn idle_warning(&self) -> bool {
        self.phase == Phase::Running && self.idle_for * 2 > self.timing.idle_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_attempt_starts_at_fixed_cells() {
        let rules = Rules::default();
        let s = LevelState::new(2, Emotion::Neutral, &rules, ObstacleSet::empty(), Duration::from_secs(5));
        assert_eq!(s.light, Pos::new(1, 1));
        assert_eq!(s.shadow, Pos::new(1, 8));
        assert_eq!(s.last_light, s.light);
        assert_eq!(s.phase, Phase::Running);
        assert_eq!(s.started_at, Duration::from_secs(5));
        assert_eq!(s.last_move_at, Duration::from_secs(5));
        assert_eq!(s.remaining(), Duration::from_secs(30));
    }

    #[test]
    fn terminal_phases() {
        assert!(!Phase::Running.is_terminal());
        assert!(Phase::Succeeded.is_terminal());
        assert!(Phase::FailedIdle.is_terminal());
        assert!(Phase::FailedCollision(Avatar::Shadow).is_terminal());
        assert!(Phase::Succeeded.is_success());
        assert!(!Phase::FailedIdle.is_success());
    }

    #[test]
    fn idle_warning_after_half_timeout() {
        let rules = Rules::default();
        let mut s = LevelState::new(1, Emotion::Neutral, &rules, ObstacleSet::empty(), Duration::ZERO);
        s.idle_for = Duration::from_millis(1500);
        assert!(!s.idle_warning());
        s.idle_for = Duration::from_millis(1600);
        assert!(s.idle_warning());
        s.phase = Phase::FailedIdle;
        assert!(!s.idle_warning());
    }
}
