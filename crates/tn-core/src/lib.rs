//! `tn-core` — foundational types for the `tilenav` pathfinding engine.
//!
//! Every other `tn-*` crate depends on this one.  It has no `tn-*`
//! dependencies and only a handful of external ones (`thiserror`, `serde`,
//! `toml`).
//!
//! # What lives here
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | [`ids`]        | `EntityId`, `PortalId`, `ShortcutId`, `RequestId`, `NodeRef` |
//! | [`geo`]        | `Cell`, `Point`, `Direction`, octile helpers           |
//! | [`settings`]   | `PathSettings` (TOML-loadable search configuration)    |
//! | [`error`]      | `CoreError`, `CoreResult`                              |

pub mod error;
pub mod geo;
pub mod ids;
pub mod settings;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::{Cell, DIAGONAL_STEP, Direction, ORTHOGONAL_STEP, Point};
pub use ids::{EntityId, NodeRef, PortalId, RequestId, ShortcutId};
pub use settings::PathSettings;
