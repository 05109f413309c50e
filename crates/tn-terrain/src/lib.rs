//! `tn-terrain` — the read-only world model the search runs over.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`grid`]    | `TerrainGrid`, `TerrainGridBuilder`, `TerrainFlags`, `Bounds` |
//! | [`portal`]  | `AreaKind` behaviour table, `PortalGraph`, `ShortcutSet`     |
//! | [`high`]    | `HighGrid` (coarse blocks + rib graph), `HighNode`           |
//! | [`flood`]   | Bounded local Dijkstra (`flood`, `FloodField`)               |
//! | [`trace`]   | Straight-line clearance and river-crossing traces            |
//! | [`map`]     | `TerrainMap` — the bundle handed to the search               |
//! | [`loader`]  | CSV loaders for cells, portals, and shortcuts                |
//! | [`error`]   | `TerrainError`, `TerrainResult<T>`                           |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | Precomputes high-grid edge weights with Rayon.            |

pub mod error;
pub mod flood;
pub mod grid;
pub mod high;
pub mod loader;
pub mod map;
pub mod portal;
pub mod trace;

#[cfg(test)]
mod tests;

pub use error::{TerrainError, TerrainResult};
pub use flood::{FloodField, flood};
pub use grid::{Bounds, TerrainFlags, TerrainGrid, TerrainGridBuilder};
pub use high::{HighCell, HighGrid, HighGridParams, HighNode, NO_EDGE, Rib};
pub use loader::{load_grid_csv, load_grid_reader, load_portals_csv, load_portals_reader, load_shortcuts_reader};
pub use map::TerrainMap;
pub use portal::{AreaBehavior, AreaKind, Entrant, EntryRule, Portal, PortalGraph, PortalGraphBuilder, PortalLink, Shortcut, ShortcutSet};
