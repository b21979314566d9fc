/// Line editor for the mood prompt.
///
/// Pure buffer logic: the shell feeds it keystrokes and redraws.
/// Tests drive it with a list of simulated keys via `capture`.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PromptKey {
    Char(char),
    Backspace,
    Enter,
}

impl PromptKey {
    /// Map a terminal key event. Releases and control chords are ignored.
    pub fn from_key(key: &KeyEvent) -> Option<PromptKey> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return None;
        }
        match key.code {
            KeyCode::Enter => Some(PromptKey::Enter),
            KeyCode::Backspace => Some(PromptKey::Backspace),
            KeyCode::Char(c) => Some(PromptKey::Char(c)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TextPrompt {
    buffer: String,
    done: bool,
}

impl TextPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one key. Returns the finished line on `Enter`.
    pub fn apply(&mut self, key: PromptKey) -> Option<String> {
        if self.done {
            return None;
        }
        match key {
            PromptKey::Char(c) if !c.is_control() => self.buffer.push(c),
            PromptKey::Char(_) => {}
            PromptKey::Backspace => {
                self.buffer.pop();
            }
            PromptKey::Enter => {
                self.done = true;
                return Some(self.buffer.clone());
            }
        }
        None
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }
}

/// Run a key sequence through a fresh prompt; `None` if never confirmed.
#[cfg(test)]
pub fn capture<I: IntoIterator<Item = PromptKey>>(keys: I) -> Option<String> {
    let mut prompt = TextPrompt::new();
    keys.into_iter().find_map(|k| prompt.apply(k))
}
