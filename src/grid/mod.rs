//! Grid primitives shared by both generators.
//!
//! Row-major 2D grids of tile labels, the four cardinal directions the
//! propagator and grammar move in, and the transforms pattern extraction
//! needs (rotation, reflection, toric windows, center crop).

pub mod flood;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Signed cell coordinate (row, col).
///
/// Signed because grammar locations go negative before normalization and
/// neighbor math steps off grid edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    pub row: i32,
    pub col: i32,
}

impl Location {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// The adjacent location one step in `dir`.
    pub fn step(self, dir: Dir) -> Self {
        self + dir.delta()
    }
}

impl Add for Location {
    type Output = Location;

    fn add(self, other: Location) -> Location {
        Location::new(self.row + other.row, self.col + other.col)
    }
}

impl Sub for Location {
    type Output = Location;

    fn sub(self, other: Location) -> Location {
        Location::new(self.row - other.row, self.col - other.col)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The four cardinal directions, ordered so `opposite` is index reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dir {
    Top,
    Left,
    Right,
    Bottom,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Top, Dir::Left, Dir::Right, Dir::Bottom];
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        match self {
            Dir::Top => 0,
            Dir::Left => 1,
            Dir::Right => 2,
            Dir::Bottom => 3,
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index]
    }

    pub fn opposite(self) -> Self {
        Self::ALL[3 - self.index()]
    }

    /// Offset of one step in this direction, in (row, col) terms.
    pub fn delta(self) -> Location {
        match self {
            Dir::Top => Location::new(-1, 0),
            Dir::Left => Location::new(0, -1),
            Dir::Right => Location::new(0, 1),
            Dir::Bottom => Location::new(1, 0),
        }
    }

    /// True for Top/Bottom (movement along rows).
    pub fn is_vertical(self) -> bool {
        matches!(self, Dir::Top | Dir::Bottom)
    }
}

/// Row-major rectangular grid stored in a single allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid<T> {
    pub height: usize,
    pub width: usize,
    data: Vec<T>,
}

impl<T> Grid<T> {
    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn in_bounds(&self, loc: Location) -> bool {
        loc.row >= 0
            && loc.col >= 0
            && (loc.row as usize) < self.height
            && (loc.col as usize) < self.width
    }

    /// Reference to cell (row, col). Panics when out of range.
    pub fn get(&self, row: usize, col: usize) -> &T {
        assert!(row < self.height && col < self.width, "grid access out of range");
        &self.data[col + row * self.width]
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        assert!(row < self.height && col < self.width, "grid access out of range");
        &mut self.data[col + row * self.width]
    }

    /// Bounds-checked access by signed location.
    pub fn at(&self, loc: Location) -> Option<&T> {
        if self.in_bounds(loc) {
            Some(self.get(loc.row as usize, loc.col as usize))
        } else {
            None
        }
    }

    pub fn at_mut(&mut self, loc: Location) -> Option<&mut T> {
        if self.in_bounds(loc) {
            Some(self.get_mut(loc.row as usize, loc.col as usize))
        } else {
            None
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks(self.width.max(1))
    }
}

impl<T: Copy> Grid<T> {
    /// Value at `loc`, or `default` when out of range.
    pub fn get_or(&self, loc: Location, default: T) -> T {
        self.at(loc).copied().unwrap_or(default)
    }
}

impl<T: Clone> Grid<T> {
    pub fn filled(height: usize, width: usize, value: T) -> Self {
        Self {
            height,
            width,
            data: vec![value; height * width],
        }
    }

    pub fn from_fn(height: usize, width: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(height * width);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Self { height, width, data }
    }

    /// Build from literal rows. Returns None for ragged or empty input.
    pub fn from_rows(rows: &[Vec<T>]) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        if height == 0 || width == 0 || rows.iter().any(|r| r.len() != width) {
            return None;
        }
        let mut data = Vec::with_capacity(height * width);
        for row in rows {
            data.extend_from_slice(row);
        }
        Some(Self { height, width, data })
    }

    /// The grid mirrored along its vertical axis.
    pub fn reflected(&self) -> Self {
        Self::from_fn(self.height, self.width, |r, c| {
            self.get(r, self.width - 1 - c).clone()
        })
    }

    /// The grid rotated 90 degrees anticlockwise.
    pub fn rotated(&self) -> Self {
        Self::from_fn(self.width, self.height, |r, c| {
            self.get(c, self.width - 1 - r).clone()
        })
    }

    /// Sub-grid of size (height, width) anchored at (top, left).
    /// The source is treated as toric: windows wrap around the edges.
    pub fn sub_grid(&self, top: usize, left: usize, height: usize, width: usize) -> Self {
        Self::from_fn(height, width, |r, c| {
            self.get((top + r) % self.height, (left + c) % self.width).clone()
        })
    }

    /// Drop `margin` cells from every side. Panics when the grid is too small.
    pub fn center_crop(&self, margin: usize) -> Self {
        assert!(
            self.height > margin * 2 && self.width > margin * 2,
            "center_crop margin exceeds grid size"
        );
        Self::from_fn(self.height - margin * 2, self.width - margin * 2, |r, c| {
            self.get(r + margin, c + margin).clone()
        })
    }
}

impl Grid<char> {
    /// Build a label grid from text lines. Returns None for ragged or empty
    /// input.
    pub fn from_lines(lines: &[&str]) -> Option<Self> {
        let rows: Vec<Vec<char>> = lines.iter().map(|l| l.chars().collect()).collect();
        Self::from_rows(&rows)
    }
}

impl fmt::Display for Grid<char> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for ch in row {
                write!(f, "{}", ch)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
