//! Grid weight patch.
//!
//! Cached coarse weights run between block representatives.  A search that
//! starts or ends elsewhere in a block would be priced as if it started at
//! the representative, so before the coarse search the up-to-8 edges touching
//! the real start (outgoing) or goal (incoming) are recomputed with a local
//! flood fill using the mover's own cost model.  The originals are saved and
//! written back by [`WeightPatch::restore`].
//!
//! Patches must be restored in reverse order of application: the goal patch
//! may overwrite an edge the start patch already changed.

use tracing::trace;

use tn_core::{Cell, Direction};
use tn_terrain::{Bounds, HighGrid, NO_EDGE, flood};

use crate::cost::CostModel;

/// Saved overlay entries, restored when the search ends.
#[derive(Debug, Default)]
pub struct WeightPatch {
    saved: Vec<(usize, [u32; 8])>,
}

impl WeightPatch {
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    /// Re-price the outgoing edges of `start`'s block as costs from `start`
    /// itself.  No-op when `start` is the block's representative.
    pub fn start(
        cost:       &CostModel<'_>,
        overlay:    &mut [[u32; 8]],
        start:      Cell,
        multiplier: i32,
    ) -> WeightPatch {
        let high = &cost.map().high;
        let mut patch = WeightPatch::default();
        if high.is_rep(start) {
            return patch;
        }
        let block = high.block_of(start);
        let Some(bi) = high.index(block).filter(|&i| i < overlay.len()) else { return patch };
        let field = local_flood(cost, high, start, multiplier);

        let mut weights = [NO_EDGE; 8];
        for dir in Direction::ALL {
            if let Some(rep) = high.rep(block.step(dir)) {
                weights[dir.index()] = field.cost_to(rep).unwrap_or(NO_EDGE);
            }
        }
        patch.save(overlay, bi);
        overlay[bi] = weights;
        trace!(%start, %block, "patched start edges");
        patch
    }

    /// Re-price the edges entering `dest`'s block from each neighbour as costs
    /// to `dest` itself.  No-op when `dest` is the block's representative.
    pub fn dest(
        cost:       &CostModel<'_>,
        overlay:    &mut [[u32; 8]],
        dest:       Cell,
        multiplier: i32,
    ) -> WeightPatch {
        let high = &cost.map().high;
        let mut patch = WeightPatch::default();
        if high.is_rep(dest) {
            return patch;
        }
        let block = high.block_of(dest);
        let field = local_flood(cost, high, dest, multiplier);

        for dir in Direction::ALL {
            let nb = block.step(dir);
            let (Some(ni), Some(rep)) = (high.index(nb).filter(|&i| i < overlay.len()), high.rep(nb)) else {
                continue;
            };
            patch.save(overlay, ni);
            overlay[ni][dir.opposite().index()] = field.cost_to(rep).unwrap_or(NO_EDGE);
        }
        trace!(%dest, %block, "patched goal edges");
        patch
    }

    fn save(&mut self, overlay: &[[u32; 8]], i: usize) {
        self.saved.push((i, overlay[i]));
    }

    /// Write the saved entries back, newest first.
    pub fn restore(self, overlay: &mut [[u32; 8]]) {
        for (i, weights) in self.saved.into_iter().rev() {
            if let Some(slot) = overlay.get_mut(i) {
                *slot = weights;
            }
        }
    }
}

/// Flood from `origin` over a window of `multiplier × block_size` cells in
/// every direction.  Step costs are treated as symmetric for incoming edges.
fn local_flood(cost: &CostModel<'_>, high: &HighGrid, origin: Cell, multiplier: i32) -> tn_terrain::FloodField {
    let reach = multiplier.max(1) * high.block_size();
    let window = cost.grid().clamp_bounds(Bounds::around(origin, reach));
    flood(origin, window, u32::MAX, |c, d| cost.step_cost(c, d))
}
