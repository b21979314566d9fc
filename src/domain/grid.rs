/// Grid geometry: positions, bounds, the two start cells and
/// the light→shadow reflection.
///
/// Coordinates are signed so that a move off the edge can be
/// expressed before clamping brings it back in bounds.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Pos { x, y }
    }

    /// Translate by a delta (no clamping).
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Pos { x: self.x + dx, y: self.y + dy }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Instantaneous state of the four direction keys (level-triggered).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DirInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DirInput {
    #[cfg(test)]
    pub const NONE: DirInput = DirInput { up: false, down: false, left: false, right: false };
    #[cfg(test)]
    pub const UP: DirInput = DirInput { up: true, down: false, left: false, right: false };
    #[cfg(test)]
    pub const DOWN: DirInput = DirInput { up: false, down: true, left: false, right: false };
    #[cfg(test)]
    pub const LEFT: DirInput = DirInput { up: false, down: false, left: true, right: false };
    #[cfg(test)]
    pub const RIGHT: DirInput = DirInput { up: false, down: false, left: false, right: true };

    /// Horizontal delta: right − left. Opposing keys cancel.
    pub fn dx(self) -> i32 {
        self.right as i32 - self.left as i32
    }

    /// Vertical delta for the light avatar: down − up.
    pub fn dy(self) -> i32 {
        self.down as i32 - self.up as i32
    }

    pub fn any(self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Merge two sources (keyboard + gamepad).
    pub fn union(self, other: DirInput) -> DirInput {
        DirInput {
            up: self.up || other.up,
            down: self.down || other.down,
            left: self.left || other.left,
            right: self.right || other.right,
        }
    }
}

/// Play-field dimensions. The upper half belongs to light,
/// the lower half to shadow.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Grid {
    pub cols: i32,
    pub rows: i32,
}

impl Grid {
    pub const MIN_COLS: i32 = 2;
    pub const MIN_ROWS: i32 = 4;

    pub const fn new(cols: i32, rows: i32) -> Self {
        Grid { cols, rows }
    }

    pub fn contains(&self, p: Pos) -> bool {
        p.x >= 0 && p.x < self.cols && p.y >= 0 && p.y < self.rows
    }

    /// Clamp each axis independently into the grid.
    pub fn clamp(&self, p: Pos) -> Pos {
        Pos {
            x: p.x.clamp(0, self.cols - 1),
            y: p.y.clamp(0, self.rows - 1),
        }
    }

    /// Point reflection across the horizontal divider: `(x, ROWS-1-y)`.
    pub fn reflect(&self, p: Pos) -> Pos {
        Pos { x: p.x, y: self.rows - 1 - p.y }
    }

    pub fn light_start(&self) -> Pos {
        Pos::new(1, 1)
    }

    pub fn shadow_start(&self) -> Pos {
        Pos::new(1, self.rows - 2)
    }

    /// Last row (inclusive) of the obstacle sampling region.
    /// Leaves a one-row margin above the divider.
    pub fn sampling_max_y(&self) -> i32 {
        self.rows / 2 - 2
    }

    /// Every cell obstacles may occupy, row-major. The light start
    /// cell is excluded.
    pub fn sampling_cells(&self) -> Vec<Pos> {
        let start = self.light_start();
        (0..=self.sampling_max_y())
            .flat_map(|y| (0..self.cols).map(move |x| Pos::new(x, y)))
            .filter(|&p| p != start)
            .collect()
    }

    /// Number of distinct cells available to the obstacle generator.
    pub fn sampling_capacity(&self) -> usize {
        let rows = (self.sampling_max_y() + 1).max(0) as usize;
        let total = rows * self.cols.max(0) as usize;
        let start = self.light_start();
        if start.y <= self.sampling_max_y() && start.x < self.cols {
            total - 1
        } else {
            total
        }
    }

    /// Minimum size for both start cells and one sampling row to exist.
    pub fn is_playable(&self) -> bool {
        self.cols >= Self::MIN_COLS && self.rows >= Self::MIN_ROWS
    }
}

impl Default for Grid {
    fn default() -> Self {
        Grid::new(15, 10)
    }
}
