//! Unreserved-point resolution.
//!
//! When a destination cell is blocked or already claimed, the resolver walks
//! outward from it ring by ring (Chebyshev distance 0, 1, 2, …) up to a fixed
//! window and returns the nearest cell that is passable and claimable.
//!
//! Town cells are refused on the first sweep and only accepted on a second
//! sweep if the first found nothing, so movers do not pile into towns just
//! because the open field next to them is crowded.

use tracing::debug;

use tn_core::{Cell, EntityId, Point};
use tn_terrain::TerrainGrid;

use crate::grid::ReservationGrid;

/// The mover asking for a free point.
#[derive(Copy, Clone, Debug)]
pub struct Claimant {
    pub entity:   EntityId,
    pub priority: u8,
    pub radius:   f32,
}

/// A free point near the requested destination.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Resolved {
    pub point: Point,
    /// Distance from the requested destination to `point`.
    pub moved: f32,
}

/// `true` if `dest` cannot be used as-is: its cell fails `passable` or the
/// point is claimed by someone who does not yield to `who`.
pub fn needs_resolution(
    grid:         &TerrainGrid,
    reservations: &ReservationGrid,
    dest:         Point,
    who:          &Claimant,
    passable:     impl Fn(Cell) -> bool,
) -> bool {
    let cell = dest.cell();
    !grid.in_bounds(cell)
        || !passable(cell)
        || !reservations.can_reserve(dest, who.entity, who.priority, who.radius)
}

/// Nearest free cell centre within `window` rings of `dest`, or `None`.
///
/// Within one ring, candidates are ordered by straight-line distance to
/// `dest` and then by `(y, x)`, so the answer is deterministic.
pub fn resolve_unreserved(
    grid:         &TerrainGrid,
    reservations: &ReservationGrid,
    dest:         Point,
    who:          &Claimant,
    window:       i32,
    passable:     impl Fn(Cell) -> bool,
) -> Option<Resolved> {
    let origin = grid.clamp(dest.cell());

    for allow_town in [false, true] {
        for ring in 0..=window.max(0) {
            let mut candidates: Vec<(f32, Cell)> = ring_cells(origin, ring)
                .filter(|&c| grid.in_bounds(c))
                .filter(|&c| allow_town || !grid.is_town(c))
                .map(|c| (c.center().distance(dest), c))
                .collect();
            candidates.sort_by(|a, b| {
                a.0.total_cmp(&b.0)
                    .then(a.1.y.cmp(&b.1.y))
                    .then(a.1.x.cmp(&b.1.x))
            });

            let hit = candidates.into_iter().find(|&(_, c)| {
                passable(c) && reservations.can_reserve(c.center(), who.entity, who.priority, who.radius)
            });
            if let Some((moved, cell)) = hit {
                debug!(from = %origin, to = %cell, ring, allow_town, "destination resolved");
                return Some(Resolved { point: cell.center(), moved });
            }
        }
    }
    debug!(at = %origin, window, "no unreserved point in window");
    None
}

/// Cells at exactly Chebyshev distance `r` from `c`, row by row.
fn ring_cells(c: Cell, r: i32) -> impl Iterator<Item = Cell> {
    (-r..=r).flat_map(move |dy| {
        (-r..=r)
            .filter(move |&dx| dx.abs() == r || dy.abs() == r)
            .map(move |dx| c.offset(dx, dy))
    })
}
