//! Tile geometry: integer cells, continuous points, and the 8 step directions.
//!
//! Cells sit on integer coordinates and a cell's centre is the point with the
//! same coordinates, so `Cell(3, 4)` and `Point(3.0, 4.0)` name the same spot.
//! Distances are measured in tile units.
//!
//! # Step costs
//!
//! The fine search prices a step as `weight × factor` with integer factors
//! approximating the tile geometry:
//!
//! | Step       | Factor | Ratio   |
//! |------------|--------|---------|
//! | Orthogonal | 5      | 1.0     |
//! | Diagonal   | 7      | 1.4 (≈√2) |

use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Cost factor of an orthogonal step.
pub const ORTHOGONAL_STEP: u32 = 5;

/// Cost factor of a diagonal step.
pub const DIAGONAL_STEP: u32 = 7;

// ── Direction ─────────────────────────────────────────────────────────────────

/// One of the 8 grid step directions, clockwise from north.
///
/// North is `-y`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    /// `(dx, dy)` of one step in this direction.
    #[inline]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::N => (0, -1),
            Direction::NE => (1, -1),
            Direction::E => (1, 0),
            Direction::SE => (1, 1),
            Direction::S => (0, 1),
            Direction::SW => (-1, 1),
            Direction::W => (-1, 0),
            Direction::NW => (-1, -1),
        }
    }

    /// Inverse of [`offset`](Self::offset).  Returns `None` for `(0, 0)` or
    /// offsets longer than one step.
    pub fn from_offset(dx: i32, dy: i32) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| d.offset() == (dx, dy))
    }

    /// Position in [`Direction::ALL`]; used to index per-direction arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn is_diagonal(self) -> bool {
        matches!(self, Direction::NE | Direction::SE | Direction::SW | Direction::NW)
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        Direction::ALL[(self.index() + 4) % 8]
    }

    /// Integer cost factor: [`ORTHOGONAL_STEP`] or [`DIAGONAL_STEP`].
    #[inline]
    pub fn step_factor(self) -> u32 {
        if self.is_diagonal() { DIAGONAL_STEP } else { ORTHOGONAL_STEP }
    }
}

// ── Cell ──────────────────────────────────────────────────────────────────────

/// Integer tile coordinate.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step in `dir`.
    #[inline]
    pub fn step(self, dir: Direction) -> Cell {
        let (dx, dy) = dir.offset();
        Cell::new(self.x + dx, self.y + dy)
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Cell {
        Cell::new(self.x + dx, self.y + dy)
    }

    /// Chebyshev (king-move) distance.
    #[inline]
    pub fn chebyshev(self, other: Cell) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Geometric octile distance in tile units:
    /// `max + (√2 − 1)·min` of the axis deltas.
    #[inline]
    pub fn octile(self, other: Cell) -> f32 {
        octile((self.x - other.x).abs(), (self.y - other.y).abs())
    }

    /// Octile distance priced with the integer step factors
    /// (`5·max + 2·min`).  This is the exact cost of an unobstructed
    /// weight-1 walk and the base of the A* heuristic.
    #[inline]
    pub fn step_distance(self, other: Cell) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        let (hi, lo) = if dx > dy { (dx, dy) } else { (dy, dx) };
        ORTHOGONAL_STEP * hi + (DIAGONAL_STEP - ORTHOGONAL_STEP) * lo
    }

    /// Direction of a single step from `self` to `other`, if adjacent.
    #[inline]
    pub fn direction_to(self, other: Cell) -> Option<Direction> {
        Direction::from_offset(other.x - self.x, other.y - self.y)
    }

    /// Centre point of the cell.
    #[inline]
    pub fn center(self) -> Point {
        Point::new(self.x as f32, self.y as f32)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// Geometric octile distance for axis deltas `dx`, `dy` (both non-negative).
#[inline]
pub fn octile(dx: i32, dy: i32) -> f32 {
    let (hi, lo) = if dx > dy { (dx, dy) } else { (dy, dx) };
    hi as f32 + (std::f32::consts::SQRT_2 - 1.0) * lo as f32
}

// ── Point ─────────────────────────────────────────────────────────────────────

/// Continuous world position in tile units.
#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// The cell containing this point (nearest cell centre).
    #[inline]
    pub fn cell(self) -> Cell {
        Cell::new(self.x.round() as i32, self.y.round() as i32)
    }

    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        (other - self).length()
    }

    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    pub fn normalized(self) -> Point {
        let len = self.length();
        if len <= f32::EPSILON {
            Point::default()
        } else {
            Point::new(self.x / len, self.y / len)
        }
    }

    /// Left-hand perpendicular `(-y, x)`.
    #[inline]
    pub fn perp(self) -> Point {
        Point::new(-self.y, self.x)
    }

    #[inline]
    pub fn lerp(self, other: Point, t: f32) -> Point {
        self + (other - self) * t
    }
}

impl Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;
    #[inline]
    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl From<Cell> for Point {
    fn from(c: Cell) -> Self {
        c.center()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}
