//! Mover-aware fine edge costs.
//!
//! A grid step costs `weight(to) × factor` (orthogonal 5, diagonal 7) times
//! the product of every modifier that applies:
//!
//! | Condition                                   | Multiplier                                   |
//! |---------------------------------------------|----------------------------------------------|
//! | climbing `d ≤ max_slope`                    | `1 + slope_avoidance · d / max_slope`        |
//! | road → road                                 | `1 − road_stickiness`                        |
//! | land → river                                | `1 + river_avoidance`                        |
//! | land → water, or water region change        | `enter_water_weight_mod`                     |
//!
//! Steeper climbs, corner cuts, and water for land-only movers are blocked.
//! Every allowed step costs at least 1.

use tn_core::{Cell, Direction, ORTHOGONAL_STEP, Point, PortalId};
use tn_terrain::{AreaKind, Entrant, Portal, TerrainFlags, TerrainGrid, TerrainMap};

use crate::context::SearchContext;

/// Cost model bound to one request's context.
#[derive(Copy, Clone)]
pub struct CostModel<'a> {
    ctx: SearchContext<'a>,
}

impl<'a> CostModel<'a> {
    pub fn new(ctx: SearchContext<'a>) -> Self {
        Self { ctx }
    }

    #[inline]
    pub fn context(&self) -> SearchContext<'a> {
        self.ctx
    }

    #[inline]
    pub fn map(&self) -> &'a TerrainMap {
        self.ctx.map
    }

    #[inline]
    pub fn grid(&self) -> &'a TerrainGrid {
        &self.ctx.map.grid
    }

    /// `true` if the mover may stand on `c`.
    #[inline]
    pub fn passable(&self, c: Cell) -> bool {
        let grid = self.grid();
        grid.is_passable(c) && (self.ctx.constraints.allow_water || !grid.is_water(c))
    }

    /// Cost of one grid step from `from` in `dir`, or `None` if blocked.
    pub fn step_cost(&self, from: Cell, dir: Direction) -> Option<u32> {
        let grid = self.grid();
        let s = self.ctx.settings;
        let to = from.step(dir);
        if !self.passable(to) {
            return None;
        }
        let slope = grid.slope(from, to);
        if slope > s.max_slope {
            return None;
        }
        if !grid.corner_clear(from, dir, |c| self.passable(c)) {
            return None;
        }

        let mut mul = 1.0_f32;
        if slope > 0 {
            mul *= 1.0 + s.slope_avoidance * slope as f32 / s.max_slope.max(1) as f32;
        }
        let (ff, tf) = (grid.flags(from), grid.flags(to));
        if ff.contains(TerrainFlags::ROAD) && tf.contains(TerrainFlags::ROAD) {
            mul *= 1.0 - s.road_stickiness;
        }
        if tf.contains(TerrainFlags::RIVER) && !ff.contains(TerrainFlags::RIVER) {
            mul *= 1.0 + s.river_avoidance;
        }
        if grid.is_water(to)
            && (!grid.is_water(from) || grid.water_region(from) != grid.water_region(to))
        {
            mul *= s.enter_water_weight_mod;
        }

        let base = grid.weight(to) as u32 * dir.step_factor();
        Some(scale(base, mul))
    }

    /// River pseudo-step: follow the baked flow offset of `from` at a
    /// discount.  Only for movers allowed on water.
    pub fn river_step(&self, from: Cell) -> Option<(Cell, u32)> {
        if !self.ctx.constraints.allow_water {
            return None;
        }
        let (dx, dy) = self.grid().river_flow(from)?;
        let to = from.offset(dx as i32, dy as i32);
        if to == from || !self.passable(to) {
            return None;
        }
        let base = self.grid().weight(to) as u32 * from.step_distance(to);
        Some((to, scale(base, self.ctx.settings.river_flow_factor)))
    }

    /// `true` if the mover may step into `portal`, having just left a portal
    /// of kind `previous`.
    pub fn can_enter(&self, portal: &Portal, previous: Option<AreaKind>) -> bool {
        let c = self.ctx.constraints;
        portal.can_enter(&Entrant { faction: c.faction, radius: c.radius, previous })
    }

    /// Cost of stepping into `portal`, with ladder-occupancy modifiers.
    pub fn portal_cost(&self, portal: &Portal) -> u32 {
        let base = portal.entry_cost();
        if portal.kind != AreaKind::Ladder {
            return base;
        }
        let c = self.ctx.constraints;
        let s = self.ctx.settings;
        if c.climbing == Some(portal.id) {
            return scale(base, s.ladder_self_mod);
        }
        match self.ctx.reservations.portal_occupant(portal.id) {
            Some(occupant) if occupant != c.entity => scale(base, s.ladder_occupied_mod),
            _ => base,
        }
    }

    /// Cost of leaving a portal onto attached cell `to`.
    pub fn portal_exit_cost(&self, to: Cell) -> Option<u32> {
        self.passable(to)
            .then(|| self.grid().weight(to) as u32 * ORTHOGONAL_STEP)
    }

    #[inline]
    pub fn shortcuts_allowed(&self) -> bool {
        self.ctx.constraints.allow_water
    }

    pub fn portal(&self, id: PortalId) -> Option<&'a Portal> {
        self.ctx.map.portals.get(id)
    }

    // ── Heuristics ────────────────────────────────────────────────────────

    /// Weighted octile estimate from `p` to `goal`, in step-cost units.
    #[inline]
    pub fn estimate(&self, p: Point, goal: Point) -> u32 {
        let d = p.cell().step_distance(goal.cell());
        scale_zero(d, self.ctx.settings.heuristic_weight)
    }

    /// Flee estimate: how much farther than `range` from `threat` is still
    /// to go, `max(0, range − octile)`, in step-cost units.
    #[inline]
    pub fn flee_estimate(&self, p: Point, threat: Point, range: f32) -> u32 {
        let d = p.cell().octile(threat.cell());
        let left = (range - d).max(0.0);
        (left * ORTHOGONAL_STEP as f32 * self.ctx.settings.heuristic_weight).round() as u32
    }
}

/// `base × mul`, rounded, never below 1.
#[inline]
fn scale(base: u32, mul: f32) -> u32 {
    ((base as f32 * mul).round() as u32).max(1)
}

/// `base × mul`, rounded; may be 0.
#[inline]
fn scale_zero(base: u32, mul: f32) -> u32 {
    (base as f32 * mul).round() as u32
}
