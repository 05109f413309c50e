//! Geometric post-processing of an assembled path.
//!
//! # Passes
//!
//! 1. **Optimize** — between consecutive anchors, jump from each kept point
//!    to the farthest later point reachable by a clearance trace.
//! 2. **Smooth** — pull each free interior point toward
//!    `(prev + 2·p + next) / 4` when both adjoining traces stay clear.
//! 3. **Clearance** — measure free space on both sides of each interior
//!    point, offset it away from a too-close obstacle, blur the offsets, and
//!    apply those that land on passable cells.
//!
//! Anchors are the endpoints, every connector, and the points on either side
//! of a connector.

use tracing::trace;

use tn_core::{Cell, Point};
use tn_terrain::TerrainGrid;
use tn_terrain::trace::{crosses_river, free_distance, trace_clear};

use crate::point::PathPoint;

pub struct Shaper<'a> {
    grid:         &'a TerrainGrid,
    passable:     &'a dyn Fn(Cell) -> bool,
    radius:       f32,
    /// Reject straight segments that cross a river the search walked around.
    avoid_rivers: bool,
}

impl<'a> Shaper<'a> {
    pub fn new(grid: &'a TerrainGrid, passable: &'a dyn Fn(Cell) -> bool, radius: f32) -> Self {
        Self { grid, passable, radius: radius.max(0.0), avoid_rivers: true }
    }

    pub fn avoid_rivers(mut self, avoid: bool) -> Self {
        self.avoid_rivers = avoid;
        self
    }

    /// Full pipeline: optimize, `smooth_passes` rounds of smoothing, then
    /// clearance with `blur_passes` blur iterations.
    pub fn shape(&self, points: &[PathPoint], smooth_passes: u32, blur_passes: u32) -> Vec<PathPoint> {
        let mut out = self.optimize(points);
        for _ in 0..smooth_passes {
            self.smooth(&mut out);
        }
        self.clearance(&mut out, blur_passes);
        trace!(before = points.len(), after = out.len(), "path shaped");
        out
    }

    fn segment_clear(&self, a: Point, b: Point) -> bool {
        trace_clear(self.grid, a, b, self.radius, &self.passable)
            && !(self.avoid_rivers && crosses_river(self.grid, a, b))
    }

    // ── Optimize ──────────────────────────────────────────────────────────

    pub fn optimize(&self, points: &[PathPoint]) -> Vec<PathPoint> {
        if points.len() < 3 {
            return points.to_vec();
        }
        let anchors = anchor_mask(points);
        let last = points.len() - 1;
        let mut out = Vec::with_capacity(points.len());
        out.push(points[0]);

        let mut i = 0;
        while i < last {
            let stop = (i + 1..=last).find(|&k| anchors[k]).unwrap_or(last);
            let mut j = stop;
            while j > i + 1 && !self.segment_clear(points[i].pos, points[j].pos) {
                j -= 1;
            }
            out.push(points[j]);
            i = j;
        }
        out
    }

    // ── Smooth ────────────────────────────────────────────────────────────

    /// One in-place smoothing sweep.
    pub fn smooth(&self, points: &mut [PathPoint]) {
        if points.len() < 3 {
            return;
        }
        let anchors = anchor_mask(points);
        for i in 1..points.len() - 1 {
            if anchors[i] {
                continue;
            }
            let (prev, next) = (points[i - 1].pos, points[i + 1].pos);
            let p = points[i].pos;
            let moved = Point::new(
                (prev.x + 2.0 * p.x + next.x) / 4.0,
                (prev.y + 2.0 * p.y + next.y) / 4.0,
            );
            if self.segment_clear(prev, moved) && self.segment_clear(moved, next) {
                points[i].pos = moved;
            }
        }
    }

    // ── Clearance ─────────────────────────────────────────────────────────

    pub fn clearance(&self, points: &mut [PathPoint], blur_passes: u32) {
        let n = points.len();
        if n < 3 || self.radius <= 0.0 {
            return;
        }
        let cap = 2.0 * self.radius + 1.0;
        let anchors = anchor_mask(points);
        let mut offsets = vec![Point::default(); n];

        for i in 1..n - 1 {
            if anchors[i] {
                continue;
            }
            let dir = (points[i + 1].pos - points[i - 1].pos).normalized();
            if dir == Point::default() {
                continue;
            }
            let normal = dir.perp();
            let p = points[i].pos;
            let left = free_distance(p, normal, cap, &self.passable);
            let right = free_distance(p, normal * -1.0, cap, &self.passable);
            let (closer, farther, away) = if left < right {
                (left, right, normal * -1.0)
            } else {
                (right, left, normal)
            };
            if closer >= self.radius {
                continue;
            }
            // Never past the middle of the free span.
            let shift = (self.radius - closer).min((farther - closer) / 2.0);
            offsets[i] = away * shift;
        }

        for _ in 0..blur_passes {
            let src = offsets.clone();
            for i in 1..n - 1 {
                if anchors[i] {
                    continue;
                }
                offsets[i] = (src[i - 1] + src[i] * 2.0 + src[i + 1]) * 0.25;
            }
        }

        for ((point, offset), anchored) in points.iter_mut().zip(offsets).zip(anchors) {
            if anchored || offset == Point::default() {
                continue;
            }
            let moved = point.pos + offset;
            if (self.passable)(moved.cell()) {
                point.pos = moved;
            }
        }
    }
}

/// Points no pass may drop: both endpoints, connectors, and the points on
/// either side of a connector.
fn anchor_mask(points: &[PathPoint]) -> Vec<bool> {
    let n = points.len();
    (0..n)
        .map(|i| {
            i == 0
                || i == n - 1
                || points[i].is_connector()
                || points[i - 1].is_connector()
                || points[i + 1].is_connector()
        })
        .collect()
}
