//! Incremental fine A* over grid cells, portals, and shortcuts.
//!
//! # Node graph
//!
//! ```text
//! Cell ──8 dirs──▶ Cell
//! Cell ──river flow──▶ Cell          (water movers, discounted)
//! Cell ──entry──▶ Portal ──link──▶ Portal ──exit──▶ Cell
//! Cell ──half lane──▶ Shortcut ──half lane──▶ Cell   (water movers)
//! ```
//!
//! Node bookkeeping lives in one [`StampedSlots`] array laid out as
//! `[cells | portals | shortcuts]`, reused across searches.
//!
//! The search runs in slices: [`LowSearch::step`] expands at most `budget`
//! nodes and returns, so the scheduler can interleave it with other work.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::warn;

use tn_core::{Cell, Direction, NodeRef, Point, PortalId};
use tn_terrain::trace::direct_reachable;
use tn_terrain::{AreaKind, Bounds, TerrainMap};

use crate::cost::CostModel;
use crate::stamp::StampedSlots;

/// What a fine search is looking for.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LowTarget {
    /// Reach `point` (its cell, or any cell within `radius` with a direct
    /// line to it).  With `portal` set, only that portal node matches.
    Reach { point: Point, radius: f32, portal: Option<PortalId> },
    /// Get at least `range` tiles from `from`.
    Flee { from: Point, range: f32 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LowStatus {
    Idle,
    Running,
    Found,
    Exhausted,
}

#[derive(Copy, Clone, Default)]
struct LowNode {
    g:      u32,
    h:      u32,
    parent: Option<NodeRef>,
    closed: bool,
}

pub struct LowSearch {
    slots:    StampedSlots<LowNode>,
    open:     BinaryHeap<Reverse<(u32, u32, NodeRef)>>,
    scratch:  Vec<(NodeRef, u32)>,
    width:    i32,
    cells:    usize,
    portals:  usize,
    window:   Bounds,
    target:   LowTarget,
    found:    Option<NodeRef>,
    /// Cell with the lowest estimate seen so far, as `(h, g, node)`.
    best:     Option<(u32, u32, NodeRef)>,
    expanded: u32,
    status:   LowStatus,
}

impl Default for LowSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl LowSearch {
    pub fn new() -> Self {
        Self {
            slots:    StampedSlots::new(0),
            open:     BinaryHeap::new(),
            scratch:  Vec::new(),
            width:    0,
            cells:    0,
            portals:  0,
            window:   Bounds::new(Cell::new(0, 0), Cell::new(-1, -1)),
            target:   LowTarget::Reach { point: Point::default(), radius: 0.0, portal: None },
            found:    None,
            best:     None,
            expanded: 0,
            status:   LowStatus::Idle,
        }
    }

    /// Size the slot array for `map`.
    fn bind(&mut self, map: &TerrainMap) {
        self.width = map.grid.width();
        self.cells = map.grid.cell_count();
        self.portals = map.portals.len();
        let len = self.cells + self.portals + map.shortcuts.len();
        if self.slots.len() != len {
            self.slots.resize(len);
        }
    }

    #[inline]
    fn slot(&self, node: NodeRef) -> Option<usize> {
        match node {
            NodeRef::Cell(c) => {
                let i = (c.y * self.width + c.x) as usize;
                (c.x >= 0 && c.x < self.width && c.y >= 0 && i < self.cells).then_some(i)
            }
            NodeRef::Portal(p) => (p.index() < self.portals).then(|| self.cells + p.index()),
            NodeRef::Shortcut(s) => Some(self.cells + self.portals + s.index()),
        }
    }

    /// Begin a search from `start` toward `target`, confined to `window`.
    pub fn start(&mut self, cost: &CostModel<'_>, start: Cell, target: LowTarget, window: Bounds) {
        self.bind(cost.map());
        self.slots.next_version();
        self.open.clear();
        self.window = cost.grid().clamp_bounds(window);
        self.target = target;
        self.found = None;
        self.best = None;
        self.expanded = 0;
        self.status = LowStatus::Running;

        let node = NodeRef::Cell(start);
        let Some(i) = self.slot(node) else {
            self.status = LowStatus::Exhausted;
            return;
        };
        let h = self.heuristic(cost, node);
        self.slots.set(i, LowNode { g: 0, h, parent: None, closed: false });
        self.open.push(Reverse((h, h, node)));
    }

    /// Expand up to `budget` nodes.
    pub fn step(&mut self, cost: &CostModel<'_>, budget: u32) -> LowStatus {
        if self.status != LowStatus::Running {
            return self.status;
        }
        let mut done = 0;
        while done < budget {
            let Some(Reverse((_, _, node))) = self.open.pop() else {
                self.status = LowStatus::Exhausted;
                return self.status;
            };
            let Some(i) = self.slot(node) else { continue };
            let Some(&n) = self.slots.get(i) else {
                warn!(%node, "popped a node with a stale stamp; skipping");
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

            if matches!(node, NodeRef::Cell(_)) && self.best.is_none_or(|(bh, bg, _)| (n.h, n.g) < (bh, bg)) {
                self.best = Some((n.h, n.g, node));
            }
            if self.is_goal(cost, node) {
                self.found = Some(node);
                self.status = LowStatus::Found;
                return self.status;
            }
            self.expand(cost, node, n);
        }
        self.status
    }

    fn expand(&mut self, cost: &CostModel<'_>, node: NodeRef, n: LowNode) {
        let mut next = std::mem::take(&mut self.scratch);
        next.clear();
        self.neighbours(cost, node, n, &mut next);

        for &(to, w) in &next {
            if to == node {
                warn!(%node, "edge re-enters its own node; skipping");
                continue;
            }
            let Some(i) = self.slot(to) else { continue };
            let g = n.g.saturating_add(w);
            if let Some(m) = self.slots.get(i) {
                if m.closed || m.g <= g {
                    continue;
                }
            }
            let h = self.heuristic(cost, to);
            self.slots.set(i, LowNode { g, h, parent: Some(node), closed: false });
            self.open.push(Reverse((g.saturating_add(h), h, to)));
        }
        self.scratch = next;
    }

    fn neighbours(&self, cost: &CostModel<'_>, node: NodeRef, n: LowNode, out: &mut Vec<(NodeRef, u32)>) {
        let map = cost.map();
        match node {
            NodeRef::Cell(c) => {
                for dir in Direction::ALL {
                    let to = c.step(dir);
                    if !self.window.contains(to) {
                        continue;
                    }
                    if let Some(w) = cost.step_cost(c, dir) {
                        out.push((NodeRef::Cell(to), w));
                    }
                }
                if let Some((to, w)) = cost.river_step(c) {
                    if self.window.contains(to) {
                        out.push((NodeRef::Cell(to), w));
                    }
                }
                let previous = self.portal_kind(cost, n.parent);
                for &pid in map.portals.at_cell(c) {
                    let Some(portal) = cost.portal(pid) else { continue };
                    if cost.can_enter(portal, previous) {
                        out.push((NodeRef::Portal(pid), cost.portal_cost(portal)));
                    }
                }
                if cost.shortcuts_allowed() {
                    for &sid in map.shortcuts.at_cell(c) {
                        if let Some(lane) = map.shortcuts.get(sid) {
                            out.push((NodeRef::Shortcut(sid), (lane.cost / 2).max(1)));
                        }
                    }
                }
            }
            NodeRef::Portal(pid) => {
                let Some(portal) = cost.portal(pid) else { return };
                for &cell in &portal.cells {
                    if !self.window.contains(cell) {
                        continue;
                    }
                    if let Some(w) = cost.portal_exit_cost(cell) {
                        out.push((NodeRef::Cell(cell), w));
                    }
                }
                // A link is the portal's own transport, not a fresh entry.
                for link in &portal.links {
                    let Some(to) = cost.portal(link.to) else { continue };
                    if cost.can_enter(to, None) {
                        out.push((NodeRef::Portal(link.to), link.cost.max(1)));
                    }
                }
            }
            NodeRef::Shortcut(sid) => {
                let Some(lane) = map.shortcuts.get(sid) else { return };
                let exit = (lane.cost - lane.cost / 2).max(1);
                for end in [lane.from, lane.to] {
                    if self.window.contains(end) && cost.passable(end) {
                        out.push((NodeRef::Cell(end), exit));
                    }
                }
            }
        }
    }

    /// Kind of `node` if it is a portal.  Called with a cell's parent, so a
    /// mover stepping out of a teleport cannot chain straight into another.
    fn portal_kind(&self, cost: &CostModel<'_>, node: Option<NodeRef>) -> Option<AreaKind> {
        let pid = node?.as_portal()?;
        cost.portal(pid).map(|p| p.kind)
    }

    fn position(cost: &CostModel<'_>, node: NodeRef) -> Point {
        let map = cost.map();
        match node {
            NodeRef::Cell(c) => c.center(),
            NodeRef::Portal(p) => map.portals.get(p).map_or(Point::default(), |p| p.position),
            NodeRef::Shortcut(s) => map
                .shortcuts
                .get(s)
                .map_or(Point::default(), |l| l.from.center().lerp(l.to.center(), 0.5)),
        }
    }

    fn heuristic(&self, cost: &CostModel<'_>, node: NodeRef) -> u32 {
        let p = Self::position(cost, node);
        match self.target {
            LowTarget::Reach { point, .. } => cost.estimate(p, point),
            LowTarget::Flee { from, range } => cost.flee_estimate(p, from, range),
        }
    }

    fn is_goal(&self, cost: &CostModel<'_>, node: NodeRef) -> bool {
        match (self.target, node) {
            (LowTarget::Reach { portal: Some(goal), .. }, _) => node == NodeRef::Portal(goal),
            (LowTarget::Reach { point, radius, .. }, NodeRef::Cell(c)) => {
                c == point.cell()
                    || (radius > 0.0
                        && c.center().distance(point) <= radius
                        && direct_reachable(cost.grid(), c.center(), point, &|x| cost.passable(x)))
            }
            (LowTarget::Flee { from, range }, NodeRef::Cell(c)) => c.center().distance(from) >= range,
            _ => false,
        }
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

    pub fn window(&self) -> Bounds {
        self.window
    }

    pub fn found(&self) -> Option<NodeRef> {
        self.found
    }

    /// Closest cell to the target seen so far, for partial routes.
    pub fn best_effort(&self) -> Option<NodeRef> {
        self.best.map(|(_, _, node)| node)
    }

    /// Accumulated cost to `node` in the current search.
    pub fn cost_of(&self, node: NodeRef) -> Option<u32> {
        self.slot(node).and_then(|i| self.slots.get(i)).map(|n| n.g)
    }

    /// Node chain from the start to `end`, inclusive.
    pub fn chain_to(&self, end: NodeRef) -> Vec<NodeRef> {
        let mut chain = Vec::new();
        let mut cur = Some(end);
        while let Some(node) = cur {
            if chain.len() > self.slots.len() {
                warn!(%end, "parent chain does not terminate; truncating");
                break;
            }
            chain.push(node);
            cur = self.slot(node).and_then(|i| self.slots.get(i)).and_then(|n| n.parent);
        }
        chain.reverse();
        chain
    }
}
