/// Keyboard state tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement while a key is held (level-triggered)
///   - Taps shorter than a frame still registering for one poll
///   - Line editing keys for the mood prompt
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::grid::DirInput;
use super::prompt::PromptKey;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key Constants ──

pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
pub const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys pressed since the last `take_directions()`.
    latched: HashSet<KeyCode>,

    /// Prompt keys typed during the most recent drain.
    typed: Vec<PromptKey>,

    /// Raw key events collected during drain, for quit handling.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            latched: HashSet::with_capacity(8),
            typed: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Safe to call many times per frame.
    pub fn drain_events(&mut self) {
        self.typed.clear();
        self.raw_events.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        self.expire(Instant::now());
    }

    fn record(&mut self, key: KeyEvent, at: Instant) {
        self.raw_events.push(key);
        if let Some(pk) = PromptKey::from_key(&key) {
            self.typed.push(pk);
        }

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Enhancement not confirmed; rely on timeout-based expiry
            }
            _ => {
                self.last_active.insert(key.code, at);
                self.latched.insert(key.code);
            }
        }
    }

    /// Expire keys that have timed out (fallback for terminals without Release).
    fn expire(&mut self, now: Instant) {
        if !self.honor_release {
            self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.contains_key(&code)
    }

    fn any_active(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c) || self.latched.contains(c))
    }

    /// Direction keys held now or tapped since the previous call.
    pub fn take_directions(&mut self) -> DirInput {
        let dirs = DirInput {
            up: self.any_active(KEYS_UP),
            down: self.any_active(KEYS_DOWN),
            left: self.any_active(KEYS_LEFT),
            right: self.any_active(KEYS_RIGHT),
        };
        self.latched.clear();
        dirs
    }

    /// Forget held and latched keys (after typing, between screens).
    pub fn reset(&mut self) {
        self.last_active.clear();
        self.latched.clear();
    }

    /// Prompt keys typed during the last drain.
    pub fn typed(&self) -> &[PromptKey] {
        &self.typed
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    /// Was any of these keys pressed during the last drain?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        self.raw_events
            .iter()
            .any(|k| k.kind != KeyEventKind::Release && codes.contains(&k.code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release)
    }

    #[test]
    fn held_key_is_level_triggered() {
        let mut kb = InputState::new();
        let t0 = Instant::now();
        kb.record(press(KeyCode::Up), t0);
        assert!(kb.take_directions().up);
        // still within hold timeout, no new event
        kb.expire(t0 + Duration::from_millis(100));
        assert!(kb.take_directions().up);
        kb.expire(t0 + Duration::from_millis(200));
        assert!(!kb.take_directions().up);
    }

    #[test]
    fn tap_registers_once_with_release_reporting() {
        let mut kb = InputState::new();
        kb.honor_release = true;
        kb.record(press(KeyCode::Char('d')), Instant::now());
        kb.record(release(KeyCode::Char('d')), Instant::now());
        assert!(!kb.is_held(KeyCode::Char('d')));
        assert!(kb.take_directions().right);
        assert!(!kb.take_directions().right);
    }

    #[test]
    fn release_ignored_without_enhancement() {
        let mut kb = InputState::new();
        kb.record(press(KeyCode::Left), Instant::now());
        kb.record(release(KeyCode::Left), Instant::now());
        assert!(kb.is_held(KeyCode::Left));
    }

    #[test]
    fn wasd_and_arrows_combine() {
        let mut kb = InputState::new();
        let now = Instant::now();
        kb.record(press(KeyCode::Char('w')), now);
        kb.record(press(KeyCode::Right), now);
        assert_eq!(kb.take_directions(), DirInput { up: true, right: true, ..DirInput::NONE });
    }

    #[test]
    fn reset_drops_typed_letters() {
        let mut kb = InputState::new();
        kb.record(press(KeyCode::Char('s')), Instant::now());
        kb.reset();
        assert_eq!(kb.take_directions(), DirInput::NONE);
    }

    #[test]
    fn typed_keys_and_quit_detection() {
        let mut kb = InputState::new();
        let now = Instant::now();
        kb.record(press(KeyCode::Char('q')), now);
        kb.record(press(KeyCode::Backspace), now);
        assert_eq!(kb.typed(), &[PromptKey::Char('q'), PromptKey::Backspace]);
        assert!(kb.any_pressed(KEYS_QUIT));
        assert!(!kb.ctrl_c_pressed());
        kb.record(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), now);
        assert!(kb.ctrl_c_pressed());
    }
}
