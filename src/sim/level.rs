/// Level controller: runs attempts and sequences levels.
///
/// ## Flow
///   1. Ask the player how they feel → emotion (once per run)
///   2. Level N: generate obstacles, build a fresh `LevelState`
///   3. Tick loop: wait one frame → poll input → `step` → present
///   4. Terminal phase → end-of-level message (held ~2s)
///   5. Success advances to N+1 with the same emotion; failure stops
///
/// The controller only talks to the outside world through `Shell`,
/// so the whole loop runs headless in tests with a simulated clock.

use std::io;
use std::time::Duration;

use rand::Rng;

use crate::config::Rules;
use crate::domain::emotion::Emotion;
use crate::domain::grid::DirInput;
use crate::domain::obstacles::{self, GenerateError};
use crate::domain::sentiment::SentimentClassifier;
use super::event::GameEvent;
use super::step::step;
use super::world::{Avatar, LevelState, Phase};

pub const MOOD_PROMPT: &str = "How do you feel today? Type & press Enter:";

/// Colour family for end-of-level messages.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tone {
    Success,
    Failure,
    Warning,
}

/// The presentation side of the game: input, drawing, pacing, time.
///
/// A quit request never comes back through this trait: the shell
/// tears itself down and ends the process on the spot.
pub trait Shell {
    /// Monotonic time since an arbitrary origin.
    fn now(&self) -> Duration;

    /// Blocking line capture; returns the text on confirm.
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;

    /// Current state of the direction keys.
    fn poll_input(&mut self) -> DirInput;

    /// Block until `interval` after the previous frame.
    fn wait_frame(&mut self, interval: Duration);

    fn present(&mut self, state: &LevelState) -> io::Result<()>;

    /// Show `text` alone on screen for `hold`.
    fn show_message(&mut self, text: &str, tone: Tone, hold: Duration) -> io::Result<()>;

    /// Per-tick events, for sound. Default: ignore.
    fn on_events(&mut self, _events: &[GameEvent]) {}
}

#[derive(thiserror::Error, Debug)]
pub enum GameError {
    /// Level parameters exceed the play region; fatal.
    #[error("cannot build level")]
    Generate(#[from] GenerateError),
    #[error("terminal I/O failed")]
    Io(#[from] io::Error),
}

/// How one attempt ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LevelReport {
    pub level: u32,
    pub phase: Phase,
    pub ticks: u64,
    pub elapsed: Duration,
}

impl LevelReport {
    pub fn succeeded(&self) -> bool {
        self.phase.is_success()
    }
}

/// How the whole run ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GameSummary {
    pub emotion: Emotion,
    pub levels_cleared: u32,
    pub last: LevelReport,
}

/// Prompt for the player's mood and bucket it.
pub fn ask_emotion<S, C>(shell: &mut S, classifier: &C) -> io::Result<Emotion>
where
    S: Shell + ?Sized,
    C: SentimentClassifier + ?Sized,
{
    let text = shell.read_line(MOOD_PROMPT)?;
    let emotion = classifier.classify(&text);
    log::info!("mood {text:?} → {emotion}");
    Ok(emotion)
}

/// Message and tone shown when an attempt ends.
pub fn outcome_message(phase: Phase, level: u32) -> (String, Tone) {
    match phase {
        Phase::Succeeded => (format!("Level {level} complete!"), Tone::Success),
        Phase::FailedCollision(Avatar::Light) => {
            (format!("Light bot hit obstacle! Level {level} failed."), Tone::Failure)
        }
        Phase::FailedCollision(Avatar::Shadow) => {
            (format!("Shadow bot hit obstacle! Level {level} failed."), Tone::Failure)
        }
        Phase::FailedIdle => (format!("Inactive too long! Level {level} failed."), Tone::Warning),
        Phase::Running => (format!("Level {level}"), Tone::Warning),
    }
}

/// Play one attempt at `level` until it reaches a terminal phase.
pub fn run_level<S, R>(
    shell: &mut S,
    rng: &mut R,
    rules: &Rules,
    level: u32,
    emotion: Emotion,
) -> Result<LevelReport, GameError>
where
    S: Shell + ?Sized,
    R: Rng + ?Sized,
{
    let obstacles = obstacles::generate(&rules.grid, &rules.obstacles, level, emotion, rng)?;
    let interval = rules.timing.frame_interval(level);
    log::info!(
        "level {level} ({emotion}): {} obstacles, {} ticks/s",
        obstacles.len(),
        rules.timing.speed(level)
    );

    let mut state = LevelState::new(level, emotion, rules, obstacles, shell.now());

    loop {
        shell.wait_frame(interval);
        let input = shell.poll_input();
        let result = step(&mut state, input, shell.now());
        shell.on_events(&result.events);
        for event in &result.events {
            if let GameEvent::Collision { avatar, at } = event {
                log::info!("{avatar} bot hit obstacle at {at}");
            }
        }
        if result.phase.is_terminal() {
            break;
        }
        shell.present(&state)?;
    }

    log::info!("level {level} ended after {} ticks: {:?}", state.tick, state.phase);
    let (text, tone) = outcome_message(state.phase, level);
    shell.show_message(&text, tone, rules.timing.message_hold)?;

    Ok(LevelReport {
        level,
        phase: state.phase,
        ticks: state.tick,
        elapsed: state.elapsed,
    })
}

/// Level 1, 2, 3, ... until an attempt fails. No level cap: the run
/// only ends on failure (or on an over-capacity level, as an error).
pub fn run_game<S, R>(
    shell: &mut S,
    rng: &mut R,
    rules: &Rules,
    emotion: Emotion,
) -> Result<GameSummary, GameError>
where
    S: Shell + ?Sized,
    R: Rng + ?Sized,
{
    match rules.obstacles.max_playable_level(&rules.grid, emotion) {
        Some(max) => log::info!("{emotion} run: levels up to {max} fit the grid"),
        None => log::warn!("{emotion} run: level 1 does not fit the grid"),
    }

    let mut level = 1;
    loop {
        let report = run_level(shell, rng, rules, level, emotion)?;
        if !report.succeeded() {
            return Ok(GameSummary { emotion, levels_cleared: level - 1, last: report });
        }
        level = level.saturating_add(1);
    }
}
