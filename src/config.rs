/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to the built-in rules if the file is missing or incomplete.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::grid::Grid;
use crate::domain::obstacles::ObstacleRules;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub rules: Rules,
    pub gamepad: GamepadConfig,
    /// Fixed RNG seed for reproducible layouts; `None` = OS entropy.
    pub seed: Option<u64>,
    /// Extra or overriding sentiment words.
    pub sentiment_words: HashMap<String, f32>,
}

/// Everything the engine and level controller need to play a level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rules {
    pub grid: Grid,
    pub timing: TimingConfig,
    pub obstacles: ObstacleRules,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingConfig {
    pub level_duration: Duration,
    pub idle_timeout: Duration,
    pub base_speed: u32,   // ticks/s at level 1
    pub max_speed: u32,    // cap, reached after a few levels
    pub message_hold: Duration,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

impl TimingConfig {
    /// Ticks per second for `level`: `min(max, base + level - 1)`.
    pub fn speed(&self, level: u32) -> u32 {
        self.base_speed
            .saturating_add(level.saturating_sub(1))
            .min(self.max_speed)
    }

    /// Wall-clock length of one tick at `level`.
    pub fn frame_interval(&self, level: u32) -> Duration {
        Duration::from_secs(1) / self.speed(level).max(1)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            level_duration: Duration::from_secs(default_level_secs()),
            idle_timeout: Duration::from_secs(default_idle_secs()),
            base_speed: default_base_speed(),
            max_speed: default_max_speed(),
            message_hold: Duration::from_millis(default_message_hold()),
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            grid: Grid::default(),
            timing: TimingConfig::default(),
            obstacles: ObstacleRules::default(),
        }
    }
}

/// Longest end-of-level message hold accepted from config.
pub const MAX_MESSAGE_HOLD: Duration = Duration::from_secs(60);

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum ConfigError {
    #[error("grid {cols}x{rows} is too small (need at least {}x{})", Grid::MIN_COLS, Grid::MIN_ROWS)]
    GridTooSmall { cols: i32, rows: i32 },
    #[error("timing.base_speed and timing.max_speed must be > 0")]
    ZeroSpeed,
    #[error("timing.message_hold_ms = {0} exceeds {max} ms", max = MAX_MESSAGE_HOLD.as_millis())]
    MessageHoldTooLong(u128),
}

impl Rules {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.grid.is_playable() {
            return Err(ConfigError::GridTooSmall { cols: self.grid.cols, rows: self.grid.rows });
        }
        if self.timing.base_speed == 0 || self.timing.max_speed == 0 {
            return Err(ConfigError::ZeroSpeed);
        }
        if self.timing.message_hold > MAX_MESSAGE_HOLD {
            return Err(ConfigError::MessageHoldTooLong(self.timing.message_hold.as_millis()));
        }
        Ok(())
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    grid: TomlGrid,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    obstacles: TomlObstacles,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    sentiment: TomlSentiment,
}

#[derive(Deserialize, Debug)]
struct TomlGrid {
    #[serde(default = "default_cols")]
    cols: i32,
    #[serde(default = "default_rows")]
    rows: i32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_level_secs")]
    level_secs: u64,
    #[serde(default = "default_idle_secs")]
    idle_secs: u64,
    #[serde(default = "default_base_speed")]
    base_speed: u32,
    #[serde(default = "default_max_speed")]
    max_speed: u32,
    #[serde(default = "default_message_hold")]
    message_hold_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlObstacles {
    #[serde(default = "default_negative")]
    negative: usize,
    #[serde(default = "default_neutral")]
    neutral: usize,
    #[serde(default = "default_positive")]
    positive: usize,
    #[serde(default = "default_per_level")]
    per_level: usize,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlSentiment {
    #[serde(default)]
    words: HashMap<String, f32>,
}

// ── Defaults ──

fn default_cols() -> i32 { 15 }
fn default_rows() -> i32 { 10 }

fn default_level_secs() -> u64 { 30 }
fn default_idle_secs() -> u64 { 3 }
fn default_base_speed() -> u32 { 10 }
fn default_max_speed() -> u32 { 15 }
fn default_message_hold() -> u64 { 2000 }

fn default_negative() -> usize { 5 }
fn default_neutral() -> usize { 10 }
fn default_positive() -> usize { 15 }
fn default_per_level() -> usize { 3 }

fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlGrid {
    fn default() -> Self {
        TomlGrid { cols: default_cols(), rows: default_rows() }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            level_secs: default_level_secs(),
            idle_secs: default_idle_secs(),
            base_speed: default_base_speed(),
            max_speed: default_max_speed(),
            message_hold_ms: default_message_hold(),
        }
    }
}

impl Default for TomlObstacles {
    fn default() -> Self {
        TomlObstacles {
            negative: default_negative(),
            neutral: default_neutral(),
            positive: default_positive(),
            per_level: default_per_level(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad { confirm: default_confirm(), cancel: default_cancel() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        load_from(&candidate_dirs())
    }

    /// Parse a config document without touching the filesystem.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(Self::from_toml)
    }

    fn from_toml(cfg: TomlConfig) -> Self {
        GameConfig {
            rules: Rules {
                grid: Grid::new(cfg.grid.cols, cfg.grid.rows),
                timing: TimingConfig {
                    level_duration: Duration::from_secs(cfg.timing.level_secs),
                    idle_timeout: Duration::from_secs(cfg.timing.idle_secs),
                    base_speed: cfg.timing.base_speed,
                    max_speed: cfg.timing.max_speed,
                    message_hold: Duration::from_millis(cfg.timing.message_hold_ms),
                },
                obstacles: ObstacleRules {
                    negative: cfg.obstacles.negative,
                    neutral: cfg.obstacles.neutral,
                    positive: cfg.obstacles.positive,
                    per_level: cfg.obstacles.per_level,
                },
            },
            gamepad: GamepadConfig {
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
            },
            seed: cfg.general.seed,
            sentiment_words: cfg.sentiment.words,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default())
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds its config.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_from(search_dirs: &[PathBuf]) -> GameConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match GameConfig::parse(&text) {
                Ok(cfg) => {
                    log::info!("loaded {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    log::warn!("config.toml parse error: {e}");
                    log::warn!("using default settings");
                    return GameConfig::default();
                }
            },
            Err(e) => {
                log::warn!("could not read {}: {e}", path.display());
            }
        }
    }
    log::debug!("no config.toml found, using defaults");
    GameConfig::default()
}
