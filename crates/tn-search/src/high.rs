//! Incremental coarse A* over high-grid blocks and the rib graph.
//!
//! Lattice edges read a per-search overlay of the cached block weights, so a
//! [`WeightPatch`](crate::patch::WeightPatch) can re-price the edges around
//! an off-grid start or goal without touching the shared terrain.
//!
//! Edge weight for a step into block `b`:
//!
//! ```text
//! cached × reservation_multiplier(b) × (1 + ai_threat_avoidance_mod · threat(b))
//! ```
//!
//! The threat term only applies when the request opts into threat
//! avoidance.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::warn;

use tn_core::{Cell, Direction, Point};
use tn_terrain::{HighGrid, HighNode, NO_EDGE, TerrainMap};

use crate::cost::CostModel;
use crate::low::LowStatus;
use crate::stamp::StampedSlots;

#[derive(Copy, Clone, Default)]
struct HighSlot {
    g:      u32,
    parent: Option<HighNode>,
    closed: bool,
}

/// One node of a coarse route and the coarse cost to reach it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Waypoint {
    pub node: HighNode,
    pub cost: u32,
}

pub struct HighSearch {
    slots:      StampedSlots<HighSlot>,
    open:       BinaryHeap<Reverse<(u32, u32, HighNode)>>,
    overlay:    Vec<[u32; 8]>,
    width:      i32,
    blocks:     usize,
    portals:    usize,
    goal:       Cell,
    goal_point: Point,
    found:      bool,
    expanded:   u32,
    status:     LowStatus,
}

impl Default for HighSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl HighSearch {
    pub fn new() -> Self {
        Self {
            slots:      StampedSlots::new(0),
            open:       BinaryHeap::new(),
            overlay:    Vec::new(),
            width:      0,
            blocks:     0,
            portals:    0,
            goal:       Cell::default(),
            goal_point: Point::default(),
            found:      false,
            expanded:   0,
            status:     LowStatus::Idle,
        }
    }

    /// Adopt `map`'s coarse grid: copy its cached weights into the overlay
    /// and size the slot array.  Call again after the terrain changes.
    pub fn bind(&mut self, map: &TerrainMap) {
        self.overlay = map.high.weights_snapshot();
        self.width = map.high.width();
        self.blocks = map.high.block_count();
        self.portals = map.portals.len();
        self.slots.resize(self.blocks + self.portals + map.shortcuts.len());
    }

    pub fn overlay(&self) -> &[[u32; 8]] {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut [[u32; 8]] {
        &mut self.overlay
    }

    #[inline]
    fn slot(&self, node: HighNode) -> Option<usize> {
        match node {
            HighNode::Block(b) => {
                let i = (b.y * self.width + b.x) as usize;
                (b.x >= 0 && b.x < self.width && b.y >= 0 && i < self.blocks).then_some(i)
            }
            HighNode::Portal(p) => (p.index() < self.portals).then(|| self.blocks + p.index()),
            HighNode::Shortcut(s) => Some(self.blocks + self.portals + s.index()),
        }
    }

    /// Begin a coarse search from block `start` to block `goal`.  `goal_point`
    /// is the fine destination, used for the heuristic.
    pub fn start(&mut self, cost: &CostModel<'_>, start: Cell, goal: Cell, goal_point: Point) {
        if self.blocks != cost.map().high.block_count() {
            self.bind(cost.map());
        }
        self.slots.next_version();
        self.open.clear();
        self.goal = goal;
        self.goal_point = goal_point;
        self.found = false;
        self.expanded = 0;
        self.status = LowStatus::Running;

        let node = HighNode::Block(start);
        let Some(i) = self.slot(node) else {
            self.status = LowStatus::Exhausted;
            return;
        };
        self.slots.set(i, HighSlot { g: 0, parent: None, closed: false });
        let h = self.heuristic(cost, node);
        self.open.push(Reverse((h, h, node)));
    }

    /// Expand up to `budget` coarse nodes.
    pub fn step(&mut self, cost: &CostModel<'_>, budget: u32) -> LowStatus {
        if self.status != LowStatus::Running {
            return self.status;
        }
        let mut done = 0;
        let mut edges: Vec<(HighNode, u32)> = Vec::with_capacity(16);
        while done < budget {
            let Some(Reverse((_, _, node))) = self.open.pop() else {
                self.status = LowStatus::Exhausted;
                return self.status;
            };
            let Some(i) = self.slot(node) else { continue };
            let Some(&n) = self.slots.get(i) else {
                warn!(?node, "popped a coarse node with a stale stamp; skipping");
                continue;
            };
            if n.closed {
                continue;
            }
            if let Some(slot) = self.slots.get_mut(i) {
                slot.closed = true;
            }
            done += 1;
            self.expanded += 1;

            if node == HighNode::Block(self.goal) {
                self.found = true;
                self.status = LowStatus::Found;
                return self.status;
            }

            edges.clear();
            self.edges(cost, node, &mut edges);
            for &(to, w) in &edges {
                let Some(j) = self.slot(to) else { continue };
                let g = n.g.saturating_add(w);
                if let Some(m) = self.slots.get(j) {
                    if m.closed || m.g <= g {
                        continue;
                    }
                }
                self.slots.set(j, HighSlot { g, parent: Some(node), closed: false });
                let h = self.heuristic(cost, to);
                self.open.push(Reverse((g.saturating_add(h), h, to)));
            }
        }
        self.status
    }

    fn edges(&self, cost: &CostModel<'_>, node: HighNode, out: &mut Vec<(HighNode, u32)>) {
        let map = cost.map();
        let high = &map.high;
        if let HighNode::Block(b) = node {
            if let Some(bi) = self.slot(node) {
                for dir in Direction::ALL {
                    let w = self.overlay[bi][dir.index()];
                    if w == NO_EDGE {
                        continue;
                    }
                    let nb = b.step(dir);
                    if high.in_bounds(nb) {
                        out.push((HighNode::Block(nb), self.adjust(cost, high, nb, w)));
                    }
                }
            }
        }

        for rib in high.ribs(node) {
            let allowed = match rib.to {
                HighNode::Portal(p) => cost.portal(p).is_some_and(|p| cost.can_enter(p, None)),
                HighNode::Shortcut(_) => cost.shortcuts_allowed(),
                HighNode::Block(_) => true,
            };
            if allowed {
                out.push((rib.to, rib.cost.max(1)));
            }
        }
    }

    /// Apply the reservation and threat multipliers to a lattice edge into
    /// block `to`.
    fn adjust(&self, cost: &CostModel<'_>, high: &HighGrid, to: Cell, w: u32) -> u32 {
        let ctx = cost.context();
        let center = high.rep(to).map_or_else(|| block_center(high, to), Cell::center);
        let mut mul = ctx.reservations.reservation_multiplier(
            center,
            ctx.constraints.entity,
            ctx.settings.reservation_penalty,
        );
        if ctx.constraints.avoid_threat {
            mul *= 1.0 + ctx.settings.ai_threat_avoidance_mod * ctx.threat.sample(to).max(0.0);
        }
        ((w as f32 * mul).round() as u32).max(1)
    }

    fn heuristic(&self, cost: &CostModel<'_>, node: HighNode) -> u32 {
        let map = cost.map();
        let p = match node {
            HighNode::Block(b) => map.high.rep(b).map_or_else(|| block_center(&map.high, b), Cell::center),
            HighNode::Portal(p) => map.portals.get(p).map_or(self.goal_point, |p| p.position),
            HighNode::Shortcut(s) => map
                .shortcuts
                .get(s)
                .map_or(self.goal_point, |l| l.from.center().lerp(l.to.center(), 0.5)),
        };
        cost.estimate(p, self.goal_point)
    }

    // ── Results ───────────────────────────────────────────────────────────

    #[inline]
    pub fn status(&self) -> LowStatus {
        self.status
    }

    #[inline]
    pub fn expanded(&self) -> u32 {
        self.expanded
    }

    /// Coarse route from the start block to the goal block, inclusive.
    /// Empty unless the search succeeded.
    pub fn route(&self) -> Vec<Waypoint> {
        if !self.found {
            return Vec::new();
        }
        let mut route = Vec::new();
        let mut cur = Some(HighNode::Block(self.goal));
        while let Some(node) = cur {
            let Some(slot) = self.slot(node).and_then(|i| self.slots.get(i)) else { break };
            if route.len() > self.slots.len() {
                warn!("coarse parent chain does not terminate; truncating");
                break;
            }
            route.push(Waypoint { node, cost: slot.g });
            cur = slot.parent;
        }
        route.reverse();
        route
    }
}

fn block_center(high: &HighGrid, block: Cell) -> Point {
    let b = high.block_bounds(block);
    Point::new(
        (b.min.x + b.max.x) as f32 / 2.0,
        (b.min.y + b.max.y) as f32 / 2.0,
    )
}
