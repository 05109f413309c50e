//! Reservation spatial hash.
//!
//! The world is divided into square buckets of `cell_size` tiles.  Each claim
//! lives in the bucket containing its point, so a conflict check usually
//! visits only the 3 × 3 buckets around the queried point.  The scanned ring
//! widens while a claim larger than a bucket is held, so wide claims are
//! never missed; they just make lookups slower.
//!
//! # Yield rules
//!
//! When a new claim would overlap an existing one:
//!
//! | Existing claim                       | Outcome            |
//! |--------------------------------------|--------------------|
//! | lower priority, not force-push       | existing yields    |
//! | lower priority, force-push           | conflict           |
//! | equal or higher priority             | conflict           |
//!
//! Ladder occupancy is tracked beside the hash: one mover per ladder portal.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashMap;
use tracing::trace;

use tn_core::{EntityId, Point, PortalId};

/// One mover's claimed point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Claim {
    pub entity:     EntityId,
    pub point:      Point,
    pub priority:   u8,
    /// Radius around `point` the mover occupies.
    pub radius:     f32,
    /// Refuse to yield to higher-priority claimants.
    pub force_push: bool,
}

/// Bucket coordinate.
type Key = (i32, i32);

pub struct ReservationGrid {
    cell_size:  f32,
    /// Largest radius among held claims.
    max_radius: f32,
    buckets:    FxHashMap<Key, Vec<Claim>>,
    by_entity: FxHashMap<EntityId, Claim>,
    ladders:   FxHashMap<PortalId, EntityId>,
}

impl ReservationGrid {
    /// Empty grid with `cell_size`-tile buckets (clamped to at least 1).
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size:  cell_size.max(1.0),
            max_radius: 0.0,
            buckets:    FxHashMap::default(),
            by_entity: FxHashMap::default(),
            ladders:   FxHashMap::default(),
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    fn key(&self, p: Point) -> Key {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }

    // ── Claims ────────────────────────────────────────────────────────────

    /// Record `claim`, replacing any earlier claim by the same entity.
    pub fn reserve(&mut self, claim: Claim) {
        self.remove_claim(claim.entity);
        let key = self.key(claim.point);
        self.buckets.entry(key).or_default().push(claim);
        self.by_entity.insert(claim.entity, claim);
        self.max_radius = self.max_radius.max(claim.radius);
        trace!(entity = %claim.entity, x = claim.point.x, y = claim.point.y, "reserved");
    }

    /// Drop `entity`'s claim and any ladder it occupies.  Returns `true` if
    /// anything was held.
    pub fn release(&mut self, entity: EntityId) -> bool {
        let had_claim = self.remove_claim(entity);
        let before = self.ladders.len();
        self.ladders.retain(|_, occupant| *occupant != entity);
        had_claim || self.ladders.len() != before
    }

    fn remove_claim(&mut self, entity: EntityId) -> bool {
        let Some(old) = self.by_entity.remove(&entity) else { return false };
        let key = self.key(old.point);
        if let Some(bucket) = self.buckets.get_mut(&key) {
            bucket.retain(|c| c.entity != entity);
            if bucket.is_empty() {
                self.buckets.remove(&key);
            }
        }
        if old.radius >= self.max_radius {
            self.max_radius = self.by_entity.values().map(|c| c.radius).fold(0.0, f32::max);
        }
        true
    }

    pub fn claim_of(&self, entity: EntityId) -> Option<&Claim> {
        self.by_entity.get(&entity)
    }

    /// Every claim whose radius could cover `p`: the 3 × 3 buckets around
    /// it, or more while a wide claim is held.
    pub fn claims_near(&self, p: Point) -> Box<dyn Iterator<Item = &Claim> + '_> {
        self.claims_within(p, 0.0)
    }

    /// Claims that could overlap a circle of radius `reach` around `p`.
    fn claims_within(&self, p: Point, reach: f32) -> Box<dyn Iterator<Item = &Claim> + '_> {
        let (kx, ky) = self.key(p);
        let span = ((self.max_radius + reach) / self.cell_size).ceil();
        let ring = if span.is_finite() { span.clamp(1.0, i32::MAX as f32) as i32 } else { i32::MAX };
        let side = 2 * ring as i64 + 1;
        if side.saturating_mul(side) > self.buckets.len() as i64 {
            // Wider than the occupied buckets: filter those instead.
            return Box::new(
                self.buckets
                    .iter()
                    .filter(move |(k, _)| k.0.abs_diff(kx) <= ring as u32 && k.1.abs_diff(ky) <= ring as u32)
                    .flat_map(|(_, bucket)| bucket),
            );
        }
        Box::new(
            (-ring..=ring)
                .flat_map(move |dy| (-ring..=ring).map(move |dx| (kx + dx, ky + dy)))
                .filter_map(|k| self.buckets.get(&k))
                .flatten(),
        )
    }

    /// `true` if `entity` may claim `point` with the given priority and
    /// radius.  The entity's own claim never conflicts.
    pub fn can_reserve(&self, point: Point, entity: EntityId, priority: u8, radius: f32) -> bool {
        self.claims_within(point, radius.max(0.0)).all(|c| {
            if c.entity == entity || c.point.distance(point) >= c.radius + radius {
                return true;
            }
            c.priority < priority && !c.force_push
        })
    }

    /// `true` if no claim covers `point`.
    pub fn can_occupy(&self, point: Point) -> bool {
        self.claims_near(point)
            .all(|c| c.point.distance(point) >= c.radius)
    }

    /// Coarse-search penalty for passing near other movers' claims:
    /// `1 + penalty × n`, where `n` counts claims of other entities within one
    /// bucket width of `center`.
    pub fn reservation_multiplier(&self, center: Point, entity: EntityId, penalty: f32) -> f32 {
        let n = self
            .claims_near(center)
            .filter(|c| c.entity != entity && c.point.distance(center) <= self.cell_size)
            .count();
        1.0 + penalty * n as f32
    }

    // ── Ladder occupancy ──────────────────────────────────────────────────

    /// Mark `portal` as climbed by `entity`.  Fails if another mover is on it.
    pub fn occupy_portal(&mut self, portal: PortalId, entity: EntityId) -> bool {
        match self.ladders.get(&portal) {
            Some(&occupant) if occupant != entity => false,
            _ => {
                self.ladders.insert(portal, entity);
                true
            }
        }
    }

    /// Clear `portal` if `entity` holds it.
    pub fn vacate_portal(&mut self, portal: PortalId, entity: EntityId) -> bool {
        if self.ladders.get(&portal) == Some(&entity) {
            self.ladders.remove(&portal);
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn portal_occupant(&self, portal: PortalId) -> Option<EntityId> {
        self.ladders.get(&portal).copied()
    }
}

// ── Shared handle ─────────────────────────────────────────────────────────────

/// Cloneable handle to a [`ReservationGrid`] shared between the simulation
/// and the search worker.
#[derive(Clone)]
pub struct SharedReservations(Arc<RwLock<ReservationGrid>>);

impl SharedReservations {
    pub fn new(grid: ReservationGrid) -> Self {
        Self(Arc::new(RwLock::new(grid)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ReservationGrid> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ReservationGrid> {
        self.0.write()
    }

    pub fn reserve(&self, claim: Claim) {
        self.write().reserve(claim);
    }

    pub fn release(&self, entity: EntityId) -> bool {
        self.write().release(entity)
    }

    pub fn can_occupy(&self, point: Point) -> bool {
        self.read().can_occupy(point)
    }
}
