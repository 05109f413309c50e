//! Per-request search inputs.

use tn_core::{Cell, EntityId, PathSettings, Point, PortalId};
use tn_reserve::ReservationGrid;
use tn_terrain::TerrainMap;

/// Flee mode: get at least `range` tiles away from `from`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Flee {
    pub from:  Point,
    pub range: f32,
}

/// What the mover is and what the caller will accept.
#[derive(Copy, Clone, Debug)]
pub struct PathConstraints {
    /// Mover radius, used for clearance traces and ladder entry.
    pub radius:         f32,
    pub flee:           Option<Flee>,
    pub allow_water:    bool,
    /// Weight coarse edges by the external threat field.
    pub avoid_threat:   bool,
    /// Skip the coarse search and run one fine search.
    pub low_level_only: bool,
    /// Return the best-effort partial route instead of failing.
    pub accept_partial: bool,
    pub priority:       u8,
    pub force_push:     bool,
    pub faction:        u32,
    pub entity:         EntityId,
    /// Ladder the mover is currently on, if any.
    pub climbing:       Option<PortalId>,
}

impl Default for PathConstraints {
    fn default() -> Self {
        Self {
            radius:         0.5,
            flee:           None,
            allow_water:    false,
            avoid_threat:   false,
            low_level_only: false,
            accept_partial: false,
            priority:       0,
            force_push:     false,
            faction:        0,
            entity:         EntityId::INVALID,
            climbing:       None,
        }
    }
}

/// Danger estimate per coarse block, supplied by AI code outside the engine.
///
/// Samples are expected in `0.0..=1.0`; the coarse search multiplies edge
/// weights by `1 + ai_threat_avoidance_mod × sample`.
pub trait ThreatField: Send + Sync {
    fn sample(&self, block: Cell) -> f32;
}

/// Threat field that reports no danger anywhere.
pub struct NoThreat;

impl ThreatField for NoThreat {
    fn sample(&self, _block: Cell) -> f32 {
        0.0
    }
}

/// Everything a search step reads, borrowed for the duration of one tick.
#[derive(Copy, Clone)]
pub struct SearchContext<'a> {
    pub map:          &'a TerrainMap,
    pub settings:     &'a PathSettings,
    pub constraints:  &'a PathConstraints,
    pub reservations: &'a ReservationGrid,
    pub threat:       &'a dyn ThreatField,
}
