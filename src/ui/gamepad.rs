/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Move
///   Start / A             →  Confirm mood prompt
///   Select                →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::grid::DirInput;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (face + meta buttons).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    Start,
    Select,
}

const BTN_COUNT: usize = 6;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::Start, Btn::A],
            cancel: vec![Btn::Select],
        }
    }
}

/// D-pad or stick as four digital directions.
#[derive(Clone, Copy, Debug, Default)]
struct Dirs {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Edge flags: pressed since the last `update()`.
    just_pressed: [bool; BTN_COUNT],
    dpad: Dirs,
    /// D-pad presses since the last `take_directions()`.
    dpad_latch: Dirs,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick: (f32, f32),

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                log::warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            just_pressed: [false; BTN_COUNT],
            dpad: Dirs::default(),
            dpad_latch: Dirs::default(),
            stick: (0.0, 0.0),
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Tracker with no backend attached; only mapping logic is live.
    #[cfg(test)]
    fn offline() -> Self {
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            just_pressed: [false; BTN_COUNT],
            dpad: Dirs::default(),
            dpad_latch: Dirs::default(),
            stick: (0.0, 0.0),
            action_map: ActionMap::default(),
            connected: false,
        }
    }

    /// Load button mapping from config. Unknown names are skipped;
    /// an empty result keeps the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let confirm = parse_list(&cfg.confirm);
        if !confirm.is_empty() {
            self.action_map.confirm = confirm;
        }
        let cancel = parse_list(&cfg.cancel);
        if !cancel.is_empty() {
            self.action_map.cancel = cancel;
        }
    }

    pub fn update(&mut self) {
        self.just_pressed = [false; BTN_COUNT];

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick.0 = value,
                        Axis::LeftStickY => self.stick.1 = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        match gilrs_btn {
            Button::DPadUp => self.set_dpad(|d| &mut d.up, held),
            Button::DPadDown => self.set_dpad(|d| &mut d.down, held),
            Button::DPadLeft => self.set_dpad(|d| &mut d.left, held),
            Button::DPadRight => self.set_dpad(|d| &mut d.right, held),
            other if held => {
                if let Some(btn) = Btn::from_gilrs(other) {
                    self.just_pressed[btn_index(btn)] = true;
                }
            }
            _ => {}
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn set_dpad(&mut self, pick: fn(&mut Dirs) -> &mut bool, held: bool) {
        *pick(&mut self.dpad) = held;
        if held {
            *pick(&mut self.dpad_latch) = true;
        }
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.just_pressed[btn_index(b)])
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }

    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }

    /// D-pad (held or tapped since the previous call) and left stick
    /// merged into direction input.
    pub fn take_directions(&mut self) -> DirInput {
        let (sx, sy) = self.stick;
        let (pad, tap) = (self.dpad, self.dpad_latch);
        self.dpad_latch = Dirs::default();
        DirInput {
            up: pad.up || tap.up || sy > STICK_DEADZONE,
            down: pad.down || tap.down || sy < -STICK_DEADZONE,
            left: pad.left || tap.left || sx < -STICK_DEADZONE,
            right: pad.right || tap.right || sx > STICK_DEADZONE,
        }
    }

    // ── Internal ──

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.just_pressed = [false; BTN_COUNT];
        self.dpad = Dirs::default();
        self.dpad_latch = Dirs::default();
        self.stick = (0.0, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_names_parse_case_insensitively() {
        assert_eq!(Btn::from_name("start"), Some(Btn::Start));
        assert_eq!(Btn::from_name("South"), Some(Btn::A));
        assert_eq!(Btn::from_name("back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("L3"), None);
    }

    #[test]
    fn config_overrides_and_empty_keeps_default() {
        let mut gp = GamepadState::offline();
        gp.load_button_config(&GamepadConfig {
            confirm: vec!["B".into(), "nonsense".into()],
            cancel: vec!["nonsense".into()],
        });
        assert_eq!(gp.action_map.confirm, vec![Btn::B]);
        assert_eq!(gp.action_map.cancel, vec![Btn::Select]);
    }

    #[test]
    fn stick_deadzone() {
        let mut gp = GamepadState::offline();
        gp.stick = (0.2, 0.9);
        assert_eq!(gp.take_directions(), DirInput::UP);
        gp.stick = (-0.5, -0.1);
        assert_eq!(gp.take_directions(), DirInput::LEFT);
        gp.release_all();
        assert_eq!(gp.take_directions(), DirInput::NONE);
    }

    #[test]
    fn dpad_tap_between_polls_registers_once() {
        let mut gp = GamepadState::offline();
        gp.set_dpad(|d| &mut d.right, true);
        gp.set_dpad(|d| &mut d.right, false);
        gp.update();
        assert_eq!(gp.take_directions(), DirInput::RIGHT);
        assert_eq!(gp.take_directions(), DirInput::NONE);
    }

    #[test]
    fn held_dpad_stays_active() {
        let mut gp = GamepadState::offline();
        gp.set_dpad(|d| &mut d.up, true);
        assert_eq!(gp.take_directions(), DirInput::UP);
        assert_eq!(gp.take_directions(), DirInput::UP);
    }

    #[test]
    fn just_pressed_clears_on_update() {
        let mut gp = GamepadState::offline();
        gp.just_pressed[btn_index(Btn::Select)] = true;
        assert!(gp.cancel_pressed());
        gp.update();
        assert!(!gp.cancel_pressed());
    }
}
