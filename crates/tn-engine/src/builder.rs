//! Fluent builder for constructing a [`Pathfinder`].

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::warn;

use tn_core::PathSettings;
use tn_reserve::{ReservationGrid, SharedReservations};
use tn_search::{NoThreat, ThreatField};
use tn_terrain::{HighGridParams, TerrainMap};

use crate::observer::{NoopObserver, SchedulerObserver};
use crate::scheduler::Env;
use crate::{EngineError, EngineResult, Pathfinder};

/// Fluent builder for [`Pathfinder`].
///
/// # Optional inputs (have defaults)
///
/// | Method          | Default                   |
/// |-----------------|---------------------------|
/// | `.settings(s)`  | `PathSettings::default()` |
/// | `.threat(t)`    | `NoThreat`                |
/// | `.observer(o)`  | `NoopObserver`            |
///
/// # Example
///
/// ```rust,ignore
/// let map = TerrainMap::from_grid(grid, high_grid_params(&settings))?;
/// let mut finder = PathfinderBuilder::new(map).settings(settings).build()?;
/// finder.submit(PathRequest::new(src, dst), |outcome| println!("{}", outcome.length()));
/// finder.poll();
/// ```
pub struct PathfinderBuilder {
    map:      TerrainMap,
    settings: PathSettings,
    threat:   Arc<dyn ThreatField>,
    observer: Box<dyn SchedulerObserver>,
}

impl PathfinderBuilder {
    pub fn new(map: TerrainMap) -> Self {
        Self {
            map,
            settings: PathSettings::default(),
            threat:   Arc::new(NoThreat),
            observer: Box::new(NoopObserver),
        }
    }

    pub fn settings(mut self, settings: PathSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Threat field sampled by requests that opt into threat avoidance.
    pub fn threat(mut self, threat: impl ThreatField + 'static) -> Self {
        self.threat = Arc::new(threat);
        self
    }

    /// Observer driven from the scheduler's thread.
    pub fn observer(mut self, observer: impl SchedulerObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Validate inputs and start the pathfinder.  In multithreaded mode this
    /// spawns the worker thread.
    pub fn build(self) -> EngineResult<Pathfinder> {
        self.settings.validate()?;
        if self.map.grid.cell_count() == 0 {
            return Err(EngineError::Config("terrain map has no cells".into()));
        }
        if self.map.params().max_slope != self.settings.max_slope {
            warn!(
                map = self.map.params().max_slope,
                settings = self.settings.max_slope,
                "coarse weights were built with a different max_slope"
            );
        }

        let env = Env {
            reservations: SharedReservations::new(ReservationGrid::new(self.settings.reserve_grid_size)),
            terrain:      Arc::new(ArcSwap::from_pointee(self.map)),
            threat:       self.threat,
            settings:     self.settings,
        };
        Pathfinder::start(env, self.observer)
    }
}

/// Coarse grid parameters consistent with `settings`.
pub fn high_grid_params(settings: &PathSettings) -> HighGridParams {
    HighGridParams { max_slope: settings.max_slope, ..HighGridParams::default() }
}
