/// Terminal shell: the real `Shell` behind the level controller.
///
/// Owns the renderer, keyboard and gamepad trackers and the sound
/// engine. Input is drained in short sleeps while waiting for the next
/// frame, so taps between frames still register and quit is always
/// responsive.
///
/// Quit (Esc, q, Ctrl+C, gamepad cancel) restores the terminal and
/// exits the process immediately. In the mood prompt `q` is text.

use std::io;
use std::time::{Duration, Instant};

use crate::config::GamepadConfig;
use crate::domain::grid::DirInput;
use crate::sim::event::GameEvent;
use crate::sim::level::{Shell, Tone};
use crate::sim::world::LevelState;
use super::gamepad::GamepadState;
use super::input::InputState;
use super::prompt::TextPrompt;
use super::renderer::Renderer;
use super::sound::{EventSfx, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// `start + wait`, saturating to `start` when the sum overflows `Instant`.
fn deadline(start: Instant, wait: Duration) -> Instant {
    start.checked_add(wait).unwrap_or(start)
}

pub struct TerminalShell {
    renderer: Renderer,
    kb: InputState,
    gp: GamepadState,
    sound: Option<SoundEngine>,
    sfx: EventSfx,
    origin: Instant,
    last_frame: Instant,
}

impl TerminalShell {
    /// Take over the terminal. Call `cleanup` before exiting.
    pub fn init(gamepad: &GamepadConfig) -> io::Result<Self> {
        let mut renderer = Renderer::new();
        let enhanced = renderer.init()?;

        let mut kb = InputState::new();
        kb.honor_release = enhanced;

        let mut gp = GamepadState::new();
        gp.load_button_config(gamepad);
        if gp.connected {
            log::info!("gamepad detected");
        }

        let now = Instant::now();
        Ok(TerminalShell {
            renderer,
            kb,
            gp,
            sound: SoundEngine::new(),
            sfx: EventSfx::new(),
            origin: now,
            last_frame: now,
        })
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        self.renderer.cleanup()
    }

    fn pump(&mut self) {
        self.kb.drain_events();
        self.gp.update();
    }

    /// Quit keys seen in the last pump. `q` only counts outside the prompt.
    fn quit_requested(&self, typing: bool) -> bool {
        if self.kb.ctrl_c_pressed() || self.gp.cancel_pressed() {
            return true;
        }
        if typing {
            self.kb.any_pressed(&[crossterm::event::KeyCode::Esc])
        } else {
            self.kb.any_pressed(super::input::KEYS_QUIT)
        }
    }

    fn abort(&mut self) -> ! {
        log::info!("quit requested");
        if let Err(e) = self.renderer.cleanup() {
            eprintln!("Terminal cleanup failed: {e}");
        }
        std::process::exit(0)
    }

    /// Pump input until `deadline`, honouring quit.
    fn idle_until(&mut self, deadline: Instant) {
        loop {
            self.pump();
            if self.quit_requested(false) {
                self.abort();
            }
            if Instant::now() >= deadline {
                return;
            }
            std::thread::sleep(FRAME_SLEEP);
        }
    }
}

impl Shell for TerminalShell {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        let mut line = TextPrompt::new();
        loop {
            self.pump();
            if self.quit_requested(true) {
                self.abort();
            }

            let mut done = self.kb.typed().iter().find_map(|&k| line.apply(k));
            if done.is_none() && self.gp.confirm_pressed() {
                done = Some(line.text().to_string());
            }
            if let Some(text) = done {
                if let Some(sfx) = &self.sound {
                    sfx.play_confirm();
                }
                // letters typed into the prompt must not become moves
                self.kb.reset();
                self.last_frame = Instant::now();
                return Ok(text);
            }

            self.renderer.draw_prompt(prompt, line.text())?;
            std::thread::sleep(FRAME_SLEEP);
        }
    }

    fn poll_input(&mut self) -> DirInput {
        self.kb.take_directions().union(self.gp.take_directions())
    }

    fn wait_frame(&mut self, interval: Duration) {
        self.idle_until(deadline(self.last_frame, interval));
        self.last_frame = Instant::now();
    }

    fn present(&mut self, state: &LevelState) -> io::Result<()> {
        self.renderer.draw_level(state)
    }

    fn show_message(&mut self, text: &str, tone: Tone, hold: Duration) -> io::Result<()> {
        self.renderer.draw_message(text, tone)?;
        self.idle_until(deadline(Instant::now(), hold));
        self.kb.reset();
        self.last_frame = Instant::now();
        Ok(())
    }

    fn on_events(&mut self, events: &[GameEvent]) {
        self.sfx.play(self.sound.as_ref(), events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_adds_normal_waits() {
        let t0 = Instant::now();
        assert_eq!(deadline(t0, Duration::from_millis(100)), t0 + Duration::from_millis(100));
    }

    #[test]
    fn deadline_survives_overflow() {
        let t0 = Instant::now();
        assert_eq!(deadline(t0, Duration::MAX), t0);
    }
}
