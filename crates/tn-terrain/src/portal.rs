//! Portals (passable areas) and water-lane shortcuts.
//!
//! A portal is a connector that is not a plain grid step: a gate in a wall, a
//! ladder up a cliff, stairs, a teleport pad, a tower entrance.  Each portal
//! is attached to one or more grid cells and may link to other portals.
//!
//! # Area behaviour table
//!
//! Behaviour per [`AreaKind`] lives in one static table instead of being
//! re-derived at every call site:
//!
//! | Kind     | Cost × | Entry rule                          |
//! |----------|--------|-------------------------------------|
//! | Gate     | 1.0    | open, unowned, or same faction      |
//! | Ladder   | 3.0    | mover radius ≤ 0.6                  |
//! | Stairs   | 1.5    | anyone                              |
//! | Teleport | 2.0    | not straight out of another teleport|
//! | Tower    | 2.0    | unowned or same faction only        |

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use tn_core::{Cell, ORTHOGONAL_STEP, Point, PortalId, ShortcutId};

use crate::{TerrainError, TerrainResult};

// ── AreaKind & behaviour table ────────────────────────────────────────────────

/// Closed set of portal kinds.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum AreaKind {
    Gate,
    Ladder,
    Stairs,
    Teleport,
    Tower,
}

/// Who may enter a portal.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum EntryRule {
    Anyone,
    /// Open gates admit everyone; closed ones only the owner's faction.
    OwnerOrOpen,
    /// Only movers no wider than the given radius.
    MaxRadius(f32),
    /// Not enterable directly from a portal of the same kind.
    NoChaining,
    OwnerOnly,
}

/// Behaviour record for one [`AreaKind`].
#[derive(Copy, Clone, Debug)]
pub struct AreaBehavior {
    /// Multiplier on the base orthogonal step cost for passing the portal.
    pub cost_mul: f32,
    pub entry:    EntryRule,
}

static AREA_BEHAVIOR: [AreaBehavior; 5] = [
    AreaBehavior { cost_mul: 1.0, entry: EntryRule::OwnerOrOpen },   // Gate
    AreaBehavior { cost_mul: 3.0, entry: EntryRule::MaxRadius(0.6) }, // Ladder
    AreaBehavior { cost_mul: 1.5, entry: EntryRule::Anyone },        // Stairs
    AreaBehavior { cost_mul: 2.0, entry: EntryRule::NoChaining },    // Teleport
    AreaBehavior { cost_mul: 2.0, entry: EntryRule::OwnerOnly },     // Tower
];

impl AreaKind {
    #[inline]
    pub fn behavior(self) -> &'static AreaBehavior {
        &AREA_BEHAVIOR[self as usize]
    }

    pub fn parse(s: &str) -> Option<AreaKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gate" => Some(AreaKind::Gate),
            "ladder" => Some(AreaKind::Ladder),
            "stairs" => Some(AreaKind::Stairs),
            "teleport" => Some(AreaKind::Teleport),
            "tower" => Some(AreaKind::Tower),
            _ => None,
        }
    }
}

/// The mover-side facts an entry rule looks at.
#[derive(Copy, Clone, Debug)]
pub struct Entrant {
    pub faction:  u32,
    pub radius:   f32,
    /// Kind of the portal the mover is stepping out of, if any.
    pub previous: Option<AreaKind>,
}

// ── Portal ────────────────────────────────────────────────────────────────────

/// Directed link from one portal to another.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PortalLink {
    pub to:   PortalId,
    pub cost: u32,
}

#[derive(Clone, Debug)]
pub struct Portal {
    pub id:       PortalId,
    pub kind:     AreaKind,
    /// Grid cells the portal can be entered from and exited to.
    pub cells:    Vec<Cell>,
    pub links:    Vec<PortalLink>,
    pub owner:    Option<u32>,
    pub open:     bool,
    /// Representative point (mean of attached cells).
    pub position: Point,
}

impl Portal {
    pub fn can_enter(&self, who: &Entrant) -> bool {
        let owned_by_mover = self.owner.is_none_or(|o| o == who.faction);
        match self.kind.behavior().entry {
            EntryRule::Anyone => true,
            EntryRule::OwnerOrOpen => self.open || owned_by_mover,
            EntryRule::MaxRadius(r) => who.radius <= r,
            EntryRule::NoChaining => who.previous != Some(self.kind),
            EntryRule::OwnerOnly => owned_by_mover,
        }
    }

    /// Cost of stepping into the portal from an attached cell.
    #[inline]
    pub fn entry_cost(&self) -> u32 {
        (ORTHOGONAL_STEP as f32 * self.kind.behavior().cost_mul).round() as u32
    }
}

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone)]
struct PortalEntry {
    point: [f32; 2],
    id:    PortalId,
}

impl RTreeObject for PortalEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for PortalEntry {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── PortalGraph ───────────────────────────────────────────────────────────────

/// All portals of a map, indexed by id, attached cell, and position.
#[derive(Clone)]
pub struct PortalGraph {
    portals: Vec<Portal>,
    by_cell: FxHashMap<Cell, Vec<PortalId>>,
    index:   RTree<PortalEntry>,
}

impl PortalGraph {
    pub fn empty() -> Self {
        PortalGraphBuilder::new().build()
    }

    pub fn len(&self) -> usize {
        self.portals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portals.is_empty()
    }

    #[inline]
    pub fn get(&self, id: PortalId) -> Option<&Portal> {
        self.portals.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Portal> {
        self.portals.iter()
    }

    /// Portals attached to `cell`.
    #[inline]
    pub fn at_cell(&self, cell: Cell) -> &[PortalId] {
        self.by_cell.get(&cell).map_or(&[], Vec::as_slice)
    }

    /// Portals whose representative point lies within `radius` of `p`,
    /// nearest first.
    pub fn portals_near(&self, p: Point, radius: f32) -> Vec<PortalId> {
        let mut hits: Vec<(f32, PortalId)> = self
            .index
            .locate_within_distance([p.x, p.y], radius * radius)
            .map(|e| (e.distance_2(&[p.x, p.y]), e.id))
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        hits.into_iter().map(|(_, id)| id).collect()
    }
}

/// Incremental construction of a [`PortalGraph`].
#[derive(Default)]
pub struct PortalGraphBuilder {
    portals: Vec<Portal>,
}

impl PortalGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a portal attached to `cells` and return its id (sequential from 0).
    pub fn add_portal(&mut self, kind: AreaKind, cells: Vec<Cell>, owner: Option<u32>) -> PortalId {
        let id = PortalId(self.portals.len() as u32);
        let n = cells.len().max(1) as f32;
        let (sx, sy) = cells
            .iter()
            .fold((0.0, 0.0), |(sx, sy), c| (sx + c.x as f32, sy + c.y as f32));
        self.portals.push(Portal {
            id,
            kind,
            cells,
            links: Vec::new(),
            owner,
            open: kind != AreaKind::Gate,
            position: Point::new(sx / n, sy / n),
        });
        id
    }

    /// Attach one more cell to an existing portal.
    pub fn attach_cell(&mut self, id: PortalId, cell: Cell) -> TerrainResult<()> {
        let portal = self.portals.get_mut(id.index()).ok_or(TerrainError::PortalNotFound(id))?;
        if !portal.cells.contains(&cell) {
            portal.cells.push(cell);
            let n = portal.cells.len() as f32;
            let (sx, sy) = portal
                .cells
                .iter()
                .fold((0.0, 0.0), |(sx, sy), c| (sx + c.x as f32, sy + c.y as f32));
            portal.position = Point::new(sx / n, sy / n);
        }
        Ok(())
    }

    /// Link two portals in both directions.
    pub fn link(&mut self, a: PortalId, b: PortalId, cost: u32) -> TerrainResult<()> {
        for (from, to) in [(a, b), (b, a)] {
            let portal = self.portals.get_mut(from.index()).ok_or(TerrainError::PortalNotFound(from))?;
            portal.links.push(PortalLink { to, cost });
        }
        Ok(())
    }

    pub fn set_open(&mut self, id: PortalId, open: bool) -> TerrainResult<()> {
        let portal = self.portals.get_mut(id.index()).ok_or(TerrainError::PortalNotFound(id))?;
        portal.open = open;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.portals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portals.is_empty()
    }

    pub fn build(self) -> PortalGraph {
        let mut by_cell: FxHashMap<Cell, Vec<PortalId>> = FxHashMap::default();
        for p in &self.portals {
            for &c in &p.cells {
                by_cell.entry(c).or_default().push(p.id);
            }
        }
        let entries: Vec<PortalEntry> = self
            .portals
            .iter()
            .map(|p| PortalEntry { point: [p.position.x, p.position.y], id: p.id })
            .collect();
        PortalGraph {
            portals: self.portals,
            by_cell,
            index: RTree::bulk_load(entries),
        }
    }
}

// ── Shortcuts ─────────────────────────────────────────────────────────────────

/// Bidirectional water lane between two cells.  Only movers allowed on water
/// may use it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Shortcut {
    pub id:   ShortcutId,
    pub from: Cell,
    pub to:   Cell,
    pub cost: u32,
}

impl Shortcut {
    /// The end opposite `end`, or `None` if `end` is not an endpoint.
    pub fn other_end(&self, end: Cell) -> Option<Cell> {
        if end == self.from {
            Some(self.to)
        } else if end == self.to {
            Some(self.from)
        } else {
            None
        }
    }
}

#[derive(Clone, Default)]
pub struct ShortcutSet {
    lanes:   Vec<Shortcut>,
    by_cell: FxHashMap<Cell, Vec<ShortcutId>>,
}

impl ShortcutSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, from: Cell, to: Cell, cost: u32) -> ShortcutId {
        let id = ShortcutId(self.lanes.len() as u32);
        self.lanes.push(Shortcut { id, from, to, cost });
        self.by_cell.entry(from).or_default().push(id);
        self.by_cell.entry(to).or_default().push(id);
        id
    }

    #[inline]
    pub fn get(&self, id: ShortcutId) -> Option<&Shortcut> {
        self.lanes.get(id.index())
    }

    #[inline]
    pub fn at_cell(&self, cell: Cell) -> &[ShortcutId] {
        self.by_cell.get(&cell).map_or(&[], Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shortcut> {
        self.lanes.iter()
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}
