//! The coarse high-level grid and its rib graph.
//!
//! # Aggregation
//!
//! The fine grid is cut into `block_size × block_size` blocks.  Each block
//! gets a **representative cell** (the walkable cell nearest its centre) and
//! 8 cached edge weights: the fine-grid cost from its representative to each
//! neighbouring block's representative, found with a bounded flood fill over
//! the surrounding 3 × 3 blocks.
//!
//! # Ribs
//!
//! Portals and shortcuts do not fit the block lattice, so each one becomes a
//! rib node with a small edge list:
//!
//! ```text
//! Block(b) ──rib──▶ Portal(p) ──rib──▶ Block(b')
//!                        └────rib──▶ Portal(q)   (portal link)
//! ```
//!
//! Block → rib-node edges live in `block_ribs`, so coarse search expands a
//! block's 8 lattice edges plus its ribs.

use tn_core::{Cell, Direction, PortalId, ShortcutId};

use crate::flood::flood;
use crate::grid::{Bounds, TerrainGrid};
use crate::portal::{PortalGraph, ShortcutSet};

/// Cached weight meaning "no edge in this direction".
pub const NO_EDGE: u32 = u32::MAX;

/// Parameters for [`HighGrid::build`].
#[derive(Copy, Clone, Debug)]
pub struct HighGridParams {
    /// Fine cells per block edge.
    pub block_size: i32,
    /// Steepest climb allowed while precomputing edge weights.
    pub max_slope:  u16,
}

impl Default for HighGridParams {
    fn default() -> Self {
        Self { block_size: 8, max_slope: 4 }
    }
}

/// Identity of a node in the coarse search graph.  `Block` holds a coarse
/// (block) coordinate, not a fine cell.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum HighNode {
    Block(Cell),
    Portal(PortalId),
    Shortcut(ShortcutId),
}

/// One edge of the rib graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rib {
    pub to:   HighNode,
    pub cost: u32,
}

#[derive(Copy, Clone, Debug)]
pub struct HighCell {
    /// Walkable fine cell standing in for the block, `None` if the block has
    /// no walkable cell at all.
    pub rep:     Option<Cell>,
    /// Cost to each neighbour block's representative, indexed by
    /// [`Direction::index`].
    pub weights: [u32; 8],
}

pub struct HighGrid {
    block_size:    i32,
    width:         i32,
    height:        i32,
    cells:         Vec<HighCell>,
    block_ribs:    Vec<Vec<Rib>>,
    portal_ribs:   Vec<Vec<Rib>>,
    shortcut_ribs: Vec<Vec<Rib>>,
}

impl HighGrid {
    /// Aggregate `grid` into blocks and precompute every cached weight.
    ///
    /// With the `parallel` feature the per-block flood fills run on Rayon's
    /// thread pool; results are identical either way.
    pub fn build(
        grid:      &TerrainGrid,
        portals:   &PortalGraph,
        shortcuts: &ShortcutSet,
        params:    HighGridParams,
    ) -> HighGrid {
        let bs = params.block_size.max(1);
        let width = (grid.width() + bs - 1) / bs;
        let height = (grid.height() + bs - 1) / bs;
        let count = (width * height) as usize;

        let mut high = HighGrid {
            block_size: bs,
            width,
            height,
            cells: Vec::with_capacity(count),
            block_ribs: vec![Vec::new(); count],
            portal_ribs: vec![Vec::new(); portals.len()],
            shortcut_ribs: vec![Vec::new(); shortcuts.len()],
        };

        // ── Representatives ───────────────────────────────────────────────
        let reps: Vec<Option<Cell>> = (0..count)
            .map(|i| high.pick_representative(grid, high.block_at(i)))
            .collect();

        // ── Lattice edge weights ──────────────────────────────────────────
        let weights_for = |i: usize| -> [u32; 8] {
            let mut w = [NO_EDGE; 8];
            let block = high.block_at(i);
            let Some(rep) = reps[i] else { return w };
            let window = grid.clamp_bounds(high.block_bounds(block).expand(bs));
            let field = flood(rep, window, u32::MAX, |c, d| {
                grid.base_step_cost(c, d, params.max_slope)
            });
            for dir in Direction::ALL {
                let nb = block.step(dir);
                if let Some(nb_rep) = high.index(nb).and_then(|j| reps[j]) {
                    w[dir.index()] = field.cost_to(nb_rep).unwrap_or(NO_EDGE);
                }
            }
            w
        };

        #[cfg(not(feature = "parallel"))]
        let weights: Vec<[u32; 8]> = (0..count).map(weights_for).collect();

        #[cfg(feature = "parallel")]
        let weights: Vec<[u32; 8]> = {
            use rayon::prelude::*;
            (0..count).into_par_iter().map(weights_for).collect()
        };

        high.cells = reps
            .into_iter()
            .zip(weights)
            .map(|(rep, weights)| HighCell { rep, weights })
            .collect();

        // ── Ribs ──────────────────────────────────────────────────────────
        for portal in portals.iter() {
            let entry = portal.entry_cost();
            for &cell in &portal.cells {
                let Some(cost) = high.rep_cost_to(grid, cell, params.max_slope) else { continue };
                let block = high.block_of(cell);
                high.add_rib_pair(HighNode::Block(block), HighNode::Portal(portal.id), cost + entry);
            }
            for link in &portal.links {
                upsert_rib(
                    &mut high.portal_ribs[portal.id.index()],
                    Rib { to: HighNode::Portal(link.to), cost: link.cost },
                );
            }
        }

        for lane in shortcuts.iter() {
            let half = lane.cost / 2;
            for cell in [lane.from, lane.to] {
                let Some(cost) = high.rep_cost_to(grid, cell, params.max_slope) else { continue };
                let block = high.block_of(cell);
                high.add_rib_pair(HighNode::Block(block), HighNode::Shortcut(lane.id), cost + half);
            }
        }

        high
    }

    // ── Geometry ──────────────────────────────────────────────────────────

    #[inline]
    pub fn block_size(&self) -> i32 {
        self.block_size
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn block_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn in_bounds(&self, block: Cell) -> bool {
        block.x >= 0 && block.x < self.width && block.y >= 0 && block.y < self.height
    }

    #[inline]
    pub fn index(&self, block: Cell) -> Option<usize> {
        self.in_bounds(block).then(|| (block.y * self.width + block.x) as usize)
    }

    #[inline]
    pub fn block_at(&self, index: usize) -> Cell {
        let i = index as i32;
        Cell::new(i % self.width, i / self.width)
    }

    /// The block containing fine cell `c`.
    #[inline]
    pub fn block_of(&self, c: Cell) -> Cell {
        Cell::new(c.x.div_euclid(self.block_size), c.y.div_euclid(self.block_size))
    }

    /// Fine-cell bounds of `block` (not clamped to the fine grid).
    pub fn block_bounds(&self, block: Cell) -> Bounds {
        let min = Cell::new(block.x * self.block_size, block.y * self.block_size);
        Bounds::new(min, min.offset(self.block_size - 1, self.block_size - 1))
    }

    // ── Cached data ───────────────────────────────────────────────────────

    #[inline]
    pub fn cell(&self, block: Cell) -> Option<&HighCell> {
        self.index(block).map(|i| &self.cells[i])
    }

    #[inline]
    pub fn rep(&self, block: Cell) -> Option<Cell> {
        self.cell(block).and_then(|c| c.rep)
    }

    /// `true` if fine cell `c` is its block's representative, i.e. a search
    /// starting or ending there needs no weight patch.
    pub fn is_rep(&self, c: Cell) -> bool {
        self.rep(self.block_of(c)) == Some(c)
    }

    #[inline]
    pub fn weight(&self, block: Cell, dir: Direction) -> u32 {
        self.cell(block).map_or(NO_EDGE, |c| c.weights[dir.index()])
    }

    /// Copy of every block's cached weights, for a mutable search overlay.
    pub fn weights_snapshot(&self) -> Vec<[u32; 8]> {
        self.cells.iter().map(|c| c.weights).collect()
    }

    pub fn ribs(&self, node: HighNode) -> &[Rib] {
        let list = match node {
            HighNode::Block(b) => self.index(b).map(|i| &self.block_ribs[i]),
            HighNode::Portal(p) => self.portal_ribs.get(p.index()),
            HighNode::Shortcut(s) => self.shortcut_ribs.get(s.index()),
        };
        list.map_or(&[], Vec::as_slice)
    }

    // ── Build helpers ─────────────────────────────────────────────────────

    /// Walkable cell of `block` closest to the block centre.  Ties break on
    /// `(y, x)` so the choice is deterministic.
    fn pick_representative(&self, grid: &TerrainGrid, block: Cell) -> Option<Cell> {
        let bounds = grid.clamp_bounds(self.block_bounds(block));
        let center = Cell::new(
            block.x * self.block_size + (self.block_size - 1) / 2,
            block.y * self.block_size + (self.block_size - 1) / 2,
        );
        let mut best: Option<(u32, Cell)> = None;
        for y in bounds.min.y..=bounds.max.y {
            for x in bounds.min.x..=bounds.max.x {
                let c = Cell::new(x, y);
                if !grid.is_walkable(c) {
                    continue;
                }
                let d = c.step_distance(center);
                if best.is_none_or(|(bd, bc)| (d, c.y, c.x) < (bd, bc.y, bc.x)) {
                    best = Some((d, c));
                }
            }
        }
        best.map(|(_, c)| c)
    }

    /// Fine cost from the representative of `target`'s block to `target`.
    /// `target` itself need not be walkable (portal cells on cliff tops are
    /// reached through the portal, not the lattice), so the last step onto it
    /// is priced at its weight alone.
    fn rep_cost_to(&self, grid: &TerrainGrid, target: Cell, max_slope: u16) -> Option<u32> {
        let block = self.block_of(target);
        let rep = self.rep(block)?;
        if rep == target {
            return Some(0);
        }
        let window = grid.clamp_bounds(self.block_bounds(block).expand(1));
        let field = flood(rep, window, u32::MAX, |c, d| {
            let to = c.step(d);
            if to == target && grid.is_passable(to) {
                Some(grid.weight(to) as u32 * d.step_factor())
            } else {
                grid.base_step_cost(c, d, max_slope)
            }
        });
        field.cost_to(target)
    }

    fn add_rib_pair(&mut self, block: HighNode, node: HighNode, cost: u32) {
        let HighNode::Block(b) = block else { return };
        let Some(bi) = self.index(b) else { return };
        upsert_rib(&mut self.block_ribs[bi], Rib { to: node, cost });
        let back = Rib { to: block, cost };
        match node {
            HighNode::Portal(p) => upsert_rib(&mut self.portal_ribs[p.index()], back),
            HighNode::Shortcut(s) => upsert_rib(&mut self.shortcut_ribs[s.index()], back),
            HighNode::Block(_) => {}
        }
    }
}

/// Insert `rib`, keeping only the cheapest edge per target.
fn upsert_rib(list: &mut Vec<Rib>, rib: Rib) {
    match list.iter_mut().find(|r| r.to == rib.to) {
        Some(existing) => existing.cost = existing.cost.min(rib.cost),
        None => list.push(rib),
    }
}
