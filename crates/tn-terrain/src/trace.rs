//! Straight-line traces over the fine grid.
//!
//! Traces sample the segment every quarter tile and map each sample to the
//! cell containing it.  Consecutive samples that move diagonally must not cut
//! a blocked corner.  A trace with a clearance radius also checks the two
//! parallel lines offset by `±radius`.

use tn_core::{Cell, Point};

use crate::grid::{TerrainFlags, TerrainGrid};

/// Sample spacing along a traced segment, in tiles.
const SAMPLE_STEP: f32 = 0.25;

/// Call `visit` for every distinct cell the segment `a → b` passes through,
/// in order.  Stops early and returns `false` as soon as `visit` does.
fn walk_cells(a: Point, b: Point, mut visit: impl FnMut(Cell, Option<Cell>) -> bool) -> bool {
    let len = a.distance(b);
    let steps = ((len / SAMPLE_STEP).ceil() as usize).max(1);
    let mut prev: Option<Cell> = None;
    for i in 0..=steps {
        let cell = a.lerp(b, i as f32 / steps as f32).cell();
        if prev == Some(cell) {
            continue;
        }
        if !visit(cell, prev) {
            return false;
        }
        prev = Some(cell);
    }
    true
}

/// `true` if every cell along `a → b` passes `passable` and no diagonal
/// transition cuts a blocked corner.
pub fn line_clear(grid: &TerrainGrid, a: Point, b: Point, passable: &impl Fn(Cell) -> bool) -> bool {
    walk_cells(a, b, |cell, prev| {
        if !passable(cell) {
            return false;
        }
        match prev.and_then(|p| p.direction_to(cell).map(|d| (p, d))) {
            Some((p, d)) => grid.corner_clear(p, d, passable),
            // Samples jumped more than one cell: only possible for degenerate
            // float input, treat as blocked.
            None if prev.is_some() => false,
            None => true,
        }
    })
}

/// [`line_clear`] at a clearance radius: the centre line and the two lines
/// offset sideways by `±radius` must all be clear.
pub fn trace_clear(
    grid:     &TerrainGrid,
    a:        Point,
    b:        Point,
    radius:   f32,
    passable: &impl Fn(Cell) -> bool,
) -> bool {
    if !line_clear(grid, a, b, passable) {
        return false;
    }
    if radius <= 0.0 || a == b {
        return true;
    }
    let side = (b - a).normalized().perp() * radius;
    line_clear(grid, a + side, b + side, passable) && line_clear(grid, a - side, b - side, passable)
}

/// `true` if the segment passes through a river cell that is neither
/// endpoint's cell.
pub fn crosses_river(grid: &TerrainGrid, a: Point, b: Point) -> bool {
    let (ca, cb) = (a.cell(), b.cell());
    !walk_cells(a, b, |cell, _| {
        cell == ca || cell == cb || !grid.flags(cell).contains(TerrainFlags::RIVER)
    })
}

/// Direct reachability: the segment is clear and river-free when traced from
/// both ends.  Tracing both ways makes the result symmetric even where
/// rounding of the samples differs per direction.
pub fn direct_reachable(grid: &TerrainGrid, a: Point, b: Point, passable: &impl Fn(Cell) -> bool) -> bool {
    line_clear(grid, a, b, passable)
        && line_clear(grid, b, a, passable)
        && !crosses_river(grid, a, b)
        && !crosses_river(grid, b, a)
}

/// Distance from `origin` along unit vector `dir` to the first cell failing
/// `passable`, capped at `max`.
pub fn free_distance(origin: Point, dir: Point, max: f32, passable: &impl Fn(Cell) -> bool) -> f32 {
    let mut travelled = 0.0;
    while travelled < max {
        let next = travelled + SAMPLE_STEP;
        if !passable((origin + dir * next).cell()) {
            return travelled;
        }
        travelled = next;
    }
    max
}
