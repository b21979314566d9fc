/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into the `front` buffer (array of Cell)
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Three screens: the level view, the mood prompt and a full-screen
/// message. Composing is pure buffer work, so screens are testable
/// without a terminal.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::grid::Pos;
use crate::sim::level::Tone;
use crate::sim::world::LevelState;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every "empty" terminal cell, so gaps
    /// between rows match the cell colour on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Write a string centered on row `y`.
    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        let x = self.width.saturating_sub(len) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const LIGHT_FIELD: Color = Color::Rgb { r: 235, g: 235, b: 235 };
const SHADOW_FIELD: Color = Color::Rgb { r: 45, g: 45, b: 55 };
const LIGHT_BOT: Color = Color::Rgb { r: 0, g: 0, b: 255 };
const SHADOW_BOT: Color = Color::Rgb { r: 0, g: 0, b: 139 };
const OBSTACLE: Color = Color::Rgb { r: 255, g: 0, b: 0 };
const PROMPT_INPUT: Color = Color::Rgb { r: 0, g: 200, b: 0 };

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Success => Color::Rgb { r: 0, g: 200, b: 0 },
        Tone::Failure => Color::Rgb { r: 255, g: 0, b: 0 },
        Tone::Warning => Color::Rgb { r: 255, g: 100, b: 0 },
    }
}

// ── Renderer ──

/// Each grid cell is 2 terminal columns wide so cells look square.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    enhanced: bool,
    /// Rows in the light half of the grid being drawn.
    half_rows: i32,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            enhanced: false,
            half_rows: 0,
        }
    }

    /// Enter raw mode and the alternate screen. Returns whether the
    /// terminal will report key release events.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            self.enhanced = execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .is_ok();
        }
        log::debug!("keyboard release events: {}", self.enhanced);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(self.enhanced)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
            self.enhanced = false;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn draw_level(&mut self, s: &LevelState) -> io::Result<()> {
        self.begin_frame()?;
        self.compose_level(s);
        self.end_frame()
    }

    pub fn draw_prompt(&mut self, prompt: &str, text: &str) -> io::Result<()> {
        self.begin_frame()?;
        self.compose_prompt(prompt, text);
        self.end_frame()
    }

    pub fn draw_message(&mut self, text: &str, tone: Tone) -> io::Result<()> {
        self.begin_frame()?;
        self.compose_message(text, tone);
        self.end_frame()
    }

    fn begin_frame(&mut self) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }
        self.front.clear();
        Ok(())
    }

    fn end_frame(&mut self) -> io::Result<()> {
        self.flush_diff()?;
        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colours; ResetColor would fall back to the
        // terminal default and leave line artifacts.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_level(&mut self, s: &LevelState) {
        let grid = s.grid;

        // ── HUD row ──
        self.front.fill_row(HUD_ROW, HUD_BG);
        let hud = format!(" Level {} | Time: {}s", s.level, s.elapsed_secs());
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
        let mood = format!("Mood: {} ", s.emotion.label());
        let field_w = grid.cols as usize * CELL_W;
        let mood_x = field_w.saturating_sub(mood.len()).max(hud.len() + 2);
        self.front.put_str(mood_x, HUD_ROW, &mood, Color::Rgb { r: 180, g: 180, b: 255 }, HUD_BG);

        // ── Field ──
        let half = grid.rows / 2;
        self.half_rows = half;
        for gy in 0..grid.rows {
            let bg = if gy < half { LIGHT_FIELD } else { SHADOW_FIELD };
            for gx in 0..grid.cols {
                self.put_grid_cell(Pos::new(gx, gy), ' ', Color::White, bg);
            }
        }
        for &p in s.obstacles.light().iter().chain(s.obstacles.shadow()) {
            self.put_grid_cell(p, '▓', OBSTACLE, OBSTACLE);
        }
        self.put_grid_cell(s.light, '█', LIGHT_BOT, LIGHT_BOT);
        self.put_grid_cell(s.shadow, '█', SHADOW_BOT, SHADOW_BOT);

        // ── Divider between the halves ──
        let divider_row = MAP_ROW + half.max(0) as usize;
        for x in 0..field_w {
            self.front.set(x, divider_row, Cell::new('─', Color::White, Color::Reset));
        }

        // ── Status lines ──
        let below = MAP_ROW + grid.rows as usize + 2;
        if s.idle_warning() {
            let left = s.timing.idle_timeout.saturating_sub(s.idle_for);
            let warn = format!(" Move! Idle timeout in {:.1}s ", left.as_secs_f32());
            self.front.put_str(0, below, &warn, Color::Black, tone_color(Tone::Warning));
        } else if s.remaining().as_secs() < crate::sim::event::COUNTDOWN_SECS {
            let left = format!(" {}s left ", s.remaining().as_secs() + 1);
            self.front.put_str(0, below, &left, Color::Rgb { r: 255, g: 220, b: 50 }, Color::Reset);
        }
        let help = " ←→↑↓ / WASD: Move   ESC/Q: Quit";
        self.front.put_str(0, below + 1, help, Color::DarkGrey, Color::Reset);
    }

    /// Paint grid cell `p` (2 terminal columns) below the HUD.
    fn put_grid_cell(&mut self, p: Pos, ch: char, fg: Color, bg: Color) {
        if p.x < 0 || p.y < 0 {
            return;
        }
        let col = p.x as usize * CELL_W;
        let row = self.grid_row(p.y);
        for dx in 0..CELL_W {
            self.front.set(col + dx, row, Cell::new(ch, fg, bg));
        }
    }

    /// Screen row of grid row `y`; the shadow half sits below the divider.
    fn grid_row(&self, y: i32) -> usize {
        let below_divider = y >= self.half_rows;
        MAP_ROW + y as usize + usize::from(below_divider)
    }

    fn compose_prompt(&mut self, prompt: &str, text: &str) {
        let mid = self.front.height / 2;
        self.front.put_centered(mid.saturating_sub(1), prompt, Color::White, Color::Reset);

        let line = format!("{text}_");
        let x = self.front.width.saturating_sub(prompt.chars().count()) / 2;
        self.front.put_str(x, mid + 1, &line, PROMPT_INPUT, Color::Reset);

        let hint = "Enter: confirm   Esc: quit";
        self.front.put_centered(mid + 3, hint, Color::DarkGrey, Color::Reset);
    }

    fn compose_message(&mut self, text: &str, tone: Tone) {
        let mid = self.front.height / 2;
        self.front.put_centered(mid, text, tone_color(tone), Color::Reset);
    }
}
