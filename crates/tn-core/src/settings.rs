//! Search configuration.
//!
//! `PathSettings` is normally loaded from a TOML file shipped with the game
//! data.  Every field has a default so a file only needs to list what it
//! overrides:
//!
//! ```toml
//! max_slope       = 3
//! road_stickiness = 0.3
//! multithreaded   = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Named numeric/boolean options consumed by the search and the scheduler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    // ── Fine edge-cost modifiers ──────────────────────────────────────────
    /// Largest height difference a single step may climb.  Steeper steps are
    /// impassable.
    pub max_slope: u16,

    /// Penalty factor for partial slopes: a step climbing `d` costs
    /// `× (1 + slope_avoidance · d / max_slope)`.
    pub slope_avoidance: f32,

    /// Extra cost fraction for entering a river cell.
    pub river_avoidance: f32,

    /// Discount fraction for road-to-road steps, in `[0, 1)`.
    pub road_stickiness: f32,

    /// Multiplier for stepping from land into water, or between water cells
    /// of different regions.
    pub enter_water_weight_mod: f32,

    /// Multiplier for a ladder another mover is already on.
    pub ladder_occupied_mod: f32,

    /// Multiplier for the ladder the mover itself is climbing.
    pub ladder_self_mod: f32,

    /// Cost fraction of following a river's flow offset relative to an
    /// orthogonal step.
    pub river_flow_factor: f32,

    /// Multiplier on the octile heuristic.  `1.0` keeps A* near-optimal.
    pub heuristic_weight: f32,

    // ── Reservations ──────────────────────────────────────────────────────
    /// Edge length (tiles) of one reservation-grid cell.  Lookups stay
    /// cheapest while it is at least twice the largest mover radius.
    pub reserve_grid_size: f32,

    /// Coarse edge multiplier added per foreign claim near a coarse cell.
    pub reservation_penalty: f32,

    /// Half-width (cells) of the unreserved-point wavefront window.
    pub resolver_window: i32,

    // ── High-level search ─────────────────────────────────────────────────
    /// Strength of the AI threat field on coarse edges.
    pub ai_threat_avoidance_mod: f32,

    /// Coarse cells solved per low-level segment (1–2).
    pub steps_ahead: usize,

    /// Relative cost divergence above which the look-ahead shrinks to 1.
    pub lookahead_divergence: f32,

    /// Weight-patch flood window as a multiple of the coarse block size.
    pub patch_tile_multiplier: i32,

    // ── Scheduling ────────────────────────────────────────────────────────
    /// Run searches on a dedicated worker thread.  `false` runs them inside
    /// `Pathfinder::poll`.
    pub multithreaded: bool,

    /// Node-expansion cap for one whole request.
    pub max_steps: u32,

    /// Node expansions performed per scheduler tick.
    pub steps_per_tick: u32,

    // ── Path post-processing ──────────────────────────────────────────────
    /// Smoothing passes applied after optimization.
    pub smooth_passes: u32,

    /// Blur iterations applied to clearance offsets.
    pub clearance_blur_passes: u32,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            max_slope:               4,
            slope_avoidance:         1.0,
            river_avoidance:         2.0,
            road_stickiness:         0.3,
            enter_water_weight_mod:  3.0,
            ladder_occupied_mod:     4.0,
            ladder_self_mod:         0.5,
            river_flow_factor:       0.5,
            heuristic_weight:        1.0,
            reserve_grid_size:       4.0,
            reservation_penalty:     0.25,
            resolver_window:         8,
            ai_threat_avoidance_mod: 1.0,
            steps_ahead:             2,
            lookahead_divergence:    0.1,
            patch_tile_multiplier:   2,
            multithreaded:           true,
            max_steps:               200_000,
            steps_per_tick:          1_000,
            smooth_passes:           1,
            clearance_blur_passes:   3,
        }
    }
}

impl PathSettings {
    /// Parse settings from a TOML document and validate them.
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let settings: PathSettings =
            toml::from_str(text).map_err(|e| CoreError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Like [`from_toml_str`](Self::from_toml_str) but reads `path` first.
    pub fn from_toml_file(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject values the search cannot work with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_slope == 0 {
            return Err(CoreError::Config("max_slope must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&self.road_stickiness) {
            return Err(CoreError::Config(format!(
                "road_stickiness {} outside [0, 1)",
                self.road_stickiness
            )));
        }
        if self.reserve_grid_size <= 0.0 {
            return Err(CoreError::Config("reserve_grid_size must be positive".into()));
        }
        if !(1..=2).contains(&self.steps_ahead) {
            return Err(CoreError::Config(format!(
                "steps_ahead {} outside 1..=2",
                self.steps_ahead
            )));
        }
        if self.steps_per_tick == 0 || self.max_steps == 0 {
            return Err(CoreError::Config("step budgets must be non-zero".into()));
        }
        if self.heuristic_weight < 0.0 || self.enter_water_weight_mod <= 0.0 {
            return Err(CoreError::Config("weights must be positive".into()));
        }
        if self.resolver_window < 1 || self.patch_tile_multiplier < 1 {
            return Err(CoreError::Config("search windows must be at least 1".into()));
        }
        Ok(())
    }
}
