//! The fine terrain grid and its builder.
//!
//! # Data layout
//!
//! Per-cell attributes are stored as parallel row-major arrays indexed by
//! `y * width + x`:
//!
//! | Array          | Type                  | Meaning                              |
//! |----------------|-----------------------|--------------------------------------|
//! | `weights`      | `u8`                  | Base step weight; `0` = impassable   |
//! | `flags`        | [`TerrainFlags`]      | Water / ocean / town / river / road  |
//! | `heights`      | `i16`                 | Elevation used for slope checks      |
//! | `water_region` | `u16`                 | Connected water body id (`0` = none) |
//! | `river_flow`   | `Option<(i8, i8)>`    | Baked downstream offset              |
//!
//! The grid is immutable once built.  A new frame's terrain is a new
//! `TerrainGrid`, swapped in whole by the engine.

use bitflags::bitflags;

use tn_core::{Cell, Direction, Point};

bitflags! {
    /// Terrain classification bits for one cell.
    #[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
    pub struct TerrainFlags: u8 {
        const WATER = 0b0000_0001;
        const OCEAN = 0b0000_0010;
        const TOWN  = 0b0000_0100;
        const RIVER = 0b0000_1000;
        const ROAD  = 0b0001_0000;
    }
}

impl TerrainFlags {
    /// Parse a `|`-separated flag list such as `"road|town"`.
    ///
    /// Unknown names are returned as `Err(name)`.
    pub fn parse_list(s: &str) -> Result<TerrainFlags, String> {
        let mut flags = TerrainFlags::empty();
        for part in s.split('|').map(str::trim).filter(|p| !p.is_empty()) {
            flags |= match part.to_ascii_lowercase().as_str() {
                "water" => TerrainFlags::WATER,
                "ocean" => TerrainFlags::OCEAN | TerrainFlags::WATER,
                "town" => TerrainFlags::TOWN,
                "river" => TerrainFlags::RIVER,
                "road" => TerrainFlags::ROAD,
                _ => return Err(part.to_string()),
            };
        }
        Ok(flags)
    }
}

// ── Bounds ────────────────────────────────────────────────────────────────────

/// Inclusive axis-aligned cell rectangle.  Used for search windows.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Bounds {
    pub min: Cell,
    pub max: Cell,
}

impl Bounds {
    pub fn new(min: Cell, max: Cell) -> Self {
        Self { min, max }
    }

    /// Smallest bounds containing both cells.
    pub fn spanning(a: Cell, b: Cell) -> Self {
        Self {
            min: Cell::new(a.x.min(b.x), a.y.min(b.y)),
            max: Cell::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Square window of half-width `radius` around `center`.
    pub fn around(center: Cell, radius: i32) -> Self {
        Self {
            min: center.offset(-radius, -radius),
            max: center.offset(radius, radius),
        }
    }

    #[inline]
    pub fn contains(&self, c: Cell) -> bool {
        c.x >= self.min.x && c.x <= self.max.x && c.y >= self.min.y && c.y <= self.max.y
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.max.x - self.min.x + 1
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.max.y - self.min.y + 1
    }

    pub fn area(&self) -> usize {
        if self.max.x < self.min.x || self.max.y < self.min.y {
            0
        } else {
            self.width() as usize * self.height() as usize
        }
    }

    /// Row-major index of `c` inside the bounds.  Caller checks `contains`.
    #[inline]
    pub fn local_index(&self, c: Cell) -> usize {
        ((c.y - self.min.y) * self.width() + (c.x - self.min.x)) as usize
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: Cell::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Cell::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn expand(&self, n: i32) -> Bounds {
        Bounds {
            min: self.min.offset(-n, -n),
            max: self.max.offset(n, n),
        }
    }
}

// ── TerrainGrid ───────────────────────────────────────────────────────────────

/// Fine per-tile terrain.
///
/// All arrays are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`TerrainGridBuilder`].
#[derive(Clone, Debug)]
pub struct TerrainGrid {
    width:  i32,
    height: i32,

    pub weights:      Vec<u8>,
    pub flags:        Vec<TerrainFlags>,
    pub heights:      Vec<i16>,
    pub water_region: Vec<u16>,
    pub river_flow:   Vec<Option<(i8, i8)>>,
}

impl TerrainGrid {
    // ── Dimensions ────────────────────────────────────────────────────────

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.weights.len()
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(Cell::new(0, 0), Cell::new(self.width - 1, self.height - 1))
    }

    #[inline]
    pub fn in_bounds(&self, c: Cell) -> bool {
        c.x >= 0 && c.x < self.width && c.y >= 0 && c.y < self.height
    }

    /// Row-major index of `c`, or `None` outside the grid.
    #[inline]
    pub fn index(&self, c: Cell) -> Option<usize> {
        self.in_bounds(c).then(|| (c.y * self.width + c.x) as usize)
    }

    #[inline]
    pub fn cell_at(&self, index: usize) -> Cell {
        let i = index as i32;
        Cell::new(i % self.width, i / self.width)
    }

    /// Nearest in-bounds cell.
    pub fn clamp(&self, c: Cell) -> Cell {
        Cell::new(c.x.clamp(0, self.width - 1), c.y.clamp(0, self.height - 1))
    }

    /// Nearest in-bounds point.
    pub fn clamp_point(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(0.0, (self.width - 1) as f32),
            p.y.clamp(0.0, (self.height - 1) as f32),
        )
    }

    pub fn clamp_bounds(&self, b: Bounds) -> Bounds {
        Bounds::new(self.clamp(b.min), self.clamp(b.max))
    }

    // ── Cell attributes (out-of-bounds reads as impassable) ───────────────

    #[inline]
    pub fn weight(&self, c: Cell) -> u8 {
        self.index(c).map_or(0, |i| self.weights[i])
    }

    #[inline]
    pub fn flags(&self, c: Cell) -> TerrainFlags {
        self.index(c).map_or(TerrainFlags::empty(), |i| self.flags[i])
    }

    #[inline]
    pub fn height_at(&self, c: Cell) -> i16 {
        self.index(c).map_or(0, |i| self.heights[i])
    }

    #[inline]
    pub fn water_region(&self, c: Cell) -> u16 {
        self.index(c).map_or(0, |i| self.water_region[i])
    }

    #[inline]
    pub fn river_flow(&self, c: Cell) -> Option<(i8, i8)> {
        self.index(c).and_then(|i| self.river_flow[i])
    }

    #[inline]
    pub fn is_passable(&self, c: Cell) -> bool {
        self.weight(c) > 0
    }

    #[inline]
    pub fn is_water(&self, c: Cell) -> bool {
        self.flags(c).intersects(TerrainFlags::WATER | TerrainFlags::OCEAN)
    }

    #[inline]
    pub fn is_town(&self, c: Cell) -> bool {
        self.flags(c).contains(TerrainFlags::TOWN)
    }

    /// Passable by a land-only mover.
    #[inline]
    pub fn is_walkable(&self, c: Cell) -> bool {
        self.is_passable(c) && !self.is_water(c)
    }

    /// Height difference climbed when stepping from `from` to `to`.
    #[inline]
    pub fn slope(&self, from: Cell, to: Cell) -> u16 {
        (self.height_at(to) as i32 - self.height_at(from) as i32).unsigned_abs() as u16
    }

    /// A diagonal step may not squeeze between two blocked orthogonal
    /// neighbours.  Orthogonal steps always pass.
    pub fn corner_clear(&self, from: Cell, dir: Direction, passable: impl Fn(Cell) -> bool) -> bool {
        if !dir.is_diagonal() {
            return true;
        }
        let (dx, dy) = dir.offset();
        passable(from.offset(dx, 0)) && passable(from.offset(0, dy))
    }

    /// Land-only step cost ignoring every mover-specific modifier:
    /// `weight(to) × factor`, or `None` for blocked, water, too-steep, or
    /// corner-cutting steps.  Used to precompute the high-level grid.
    pub fn base_step_cost(&self, from: Cell, dir: Direction, max_slope: u16) -> Option<u32> {
        let to = from.step(dir);
        if !self.is_walkable(to) || self.slope(from, to) > max_slope {
            return None;
        }
        if !self.corner_clear(from, dir, |c| self.is_walkable(c)) {
            return None;
        }
        Some(self.weight(to) as u32 * dir.step_factor())
    }
}

// ── TerrainGridBuilder ────────────────────────────────────────────────────────

/// Construct a [`TerrainGrid`] cell by cell, then call [`build`](Self::build).
///
/// Every cell starts open: weight 1, no flags, height 0.
///
/// # Example
///
/// ```
/// use tn_core::Cell;
/// use tn_terrain::TerrainGridBuilder;
///
/// let mut b = TerrainGridBuilder::new(4, 4);
/// b.block(Cell::new(1, 1));
/// b.set_road(Cell::new(0, 0));
/// let grid = b.build();
/// assert!(!grid.is_passable(Cell::new(1, 1)));
/// ```
pub struct TerrainGridBuilder {
    grid: TerrainGrid,
}

impl TerrainGridBuilder {
    pub fn new(width: i32, height: i32) -> Self {
        let n = (width.max(0) * height.max(0)) as usize;
        Self {
            grid: TerrainGrid {
                width:        width.max(0),
                height:       height.max(0),
                weights:      vec![1; n],
                flags:        vec![TerrainFlags::empty(); n],
                heights:      vec![0; n],
                water_region: vec![0; n],
                river_flow:   vec![None; n],
            },
        }
    }

    pub fn width(&self) -> i32 {
        self.grid.width
    }

    pub fn height(&self) -> i32 {
        self.grid.height
    }

    /// Set the base weight.  Out-of-bounds writes are ignored and return
    /// `false`.
    pub fn set_weight(&mut self, c: Cell, weight: u8) -> bool {
        match self.grid.index(c) {
            Some(i) => {
                self.grid.weights[i] = weight;
                true
            }
            None => false,
        }
    }

    pub fn block(&mut self, c: Cell) -> bool {
        self.set_weight(c, 0)
    }

    pub fn add_flags(&mut self, c: Cell, flags: TerrainFlags) -> bool {
        match self.grid.index(c) {
            Some(i) => {
                self.grid.flags[i] |= flags;
                true
            }
            None => false,
        }
    }

    pub fn set_height(&mut self, c: Cell, h: i16) -> bool {
        match self.grid.index(c) {
            Some(i) => {
                self.grid.heights[i] = h;
                true
            }
            None => false,
        }
    }

    /// Mark `c` as water belonging to `region`.
    pub fn set_water(&mut self, c: Cell, region: u16) -> bool {
        match self.grid.index(c) {
            Some(i) => {
                self.grid.flags[i] |= TerrainFlags::WATER;
                self.grid.water_region[i] = region;
                true
            }
            None => false,
        }
    }

    /// Mark `c` as river with the given downstream offset.
    pub fn set_river(&mut self, c: Cell, flow: (i8, i8)) -> bool {
        match self.grid.index(c) {
            Some(i) => {
                self.grid.flags[i] |= TerrainFlags::RIVER;
                self.grid.river_flow[i] = (flow != (0, 0)).then_some(flow);
                true
            }
            None => false,
        }
    }

    pub fn set_road(&mut self, c: Cell) -> bool {
        self.add_flags(c, TerrainFlags::ROAD)
    }

    pub fn set_town(&mut self, c: Cell) -> bool {
        self.add_flags(c, TerrainFlags::TOWN)
    }

    /// Apply `f` to every in-bounds cell of `bounds`.
    pub fn fill(&mut self, bounds: Bounds, mut f: impl FnMut(&mut Self, Cell)) {
        for y in bounds.min.y..=bounds.max.y {
            for x in bounds.min.x..=bounds.max.x {
                let c = Cell::new(x, y);
                if self.grid.in_bounds(c) {
                    f(self, c);
                }
            }
        }
    }

    pub fn build(self) -> TerrainGrid {
        self.grid
    }
}
