//! `tn-engine` — request scheduling and the `Pathfinder` facade for tilenav.
//!
//! # Request lifecycle
//!
//! ```text
//! submit ──▶ RequestQueue ──▶ Scheduler::tick × N ──▶ results channel ──▶ poll ──▶ callback
//!              (urgent first)    (worker thread or poll)
//! ```
//!
//! | Module         | Contents                                                |
//! |----------------|---------------------------------------------------------|
//! | [`request`]    | `PathRequest`, `PathHandle`, `PathOutcome`, `PathFailure` |
//! | `queue`        | FIFO request queue with an urgent lane                  |
//! | [`scheduler`]  | `Scheduler` phase machine, `Phase`                      |
//! | [`pathfinder`] | `Pathfinder` — submit / cancel / poll / reservations    |
//! | [`builder`]    | `PathfinderBuilder`, `high_grid_params`                 |
//! | [`observer`]   | `SchedulerObserver`, `NoopObserver`                     |
//! | [`error`]      | `EngineError`, `EngineResult<T>`                        |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tn_core::{PathSettings, Point};
//! use tn_engine::{PathRequest, PathfinderBuilder, high_grid_params};
//! use tn_terrain::{TerrainGridBuilder, TerrainMap};
//!
//! let settings = PathSettings::from_toml_file(path)?;
//! let map = TerrainMap::from_grid(TerrainGridBuilder::new(64, 64).build(), high_grid_params(&settings))?;
//! let mut finder = PathfinderBuilder::new(map).settings(settings).build()?;
//! finder.submit(PathRequest::new(Point::new(1.0, 1.0), Point::new(60.0, 50.0)), |outcome| {
//!     println!("{} points", outcome.points.len());
//! });
//! finder.poll();
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod pathfinder;
mod queue;
pub mod request;
pub mod scheduler;


pub use builder::{PathfinderBuilder, high_grid_params};
pub use error::{EngineError, EngineResult};
pub use observer::{NoopObserver, SchedulerObserver};
pub use pathfinder::Pathfinder;
pub use request::{PathCallback, PathFailure, PathHandle, PathOutcome, PathRequest, RequestState};
pub use scheduler::{Phase, Scheduler};
