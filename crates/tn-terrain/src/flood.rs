//! Bounded local Dijkstra flood fill over the fine grid.
//!
//! Used in two places: precomputing the high-level grid's cached edge weights
//! (with [`TerrainGrid::base_step_cost`]) and the search's grid weight patch
//! (with the mover-aware cost model).  The caller supplies the step cost, so
//! this module knows nothing about movers.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tn_core::{Cell, Direction};

use crate::grid::Bounds;

/// Costs from one origin to every cell of a bounded window.
pub struct FloodField {
    bounds: Bounds,
    costs:  Vec<u32>,
}

impl FloodField {
    /// Cost from the origin to `c`, or `None` if `c` is outside the window or
    /// was not reached.
    #[inline]
    pub fn cost_to(&self, c: Cell) -> Option<u32> {
        if !self.bounds.contains(c) {
            return None;
        }
        let cost = self.costs[self.bounds.local_index(c)];
        (cost != u32::MAX).then_some(cost)
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

/// Dijkstra from `origin` restricted to `bounds`.
///
/// `step_cost(from, dir)` returns the cost of one step or `None` if the step
/// is not allowed.  Expansion stops once `max_cost` is exceeded.
pub fn flood(
    origin:    Cell,
    bounds:    Bounds,
    max_cost:  u32,
    step_cost: impl Fn(Cell, Direction) -> Option<u32>,
) -> FloodField {
    let mut costs = vec![u32::MAX; bounds.area()];
    if !bounds.contains(origin) {
        return FloodField { bounds, costs };
    }

    costs[bounds.local_index(origin)] = 0;

    // Secondary key on the cell keeps tie-breaking deterministic.
    let mut heap: BinaryHeap<Reverse<(u32, Cell)>> = BinaryHeap::new();
    heap.push(Reverse((0, origin)));

    while let Some(Reverse((cost, cell))) = heap.pop() {
        // Skip stale heap entries.
        if cost > costs[bounds.local_index(cell)] {
            continue;
        }
        for dir in Direction::ALL {
            let next = cell.step(dir);
            if !bounds.contains(next) {
                continue;
            }
            let Some(step) = step_cost(cell, dir) else { continue };
            let new_cost = cost.saturating_add(step);
            if new_cost > max_cost {
                continue;
            }
            let slot = &mut costs[bounds.local_index(next)];
            if new_cost < *slot {
                *slot = new_cost;
                heap.push(Reverse((new_cost, next)));
            }
        }
    }

    FloodField { bounds, costs }
}
