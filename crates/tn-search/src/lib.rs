//! `tn-search` — the two search levels and the cost model they share.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`stamp`]   | `StampedSlots<T>` — version-stamped node storage          |
//! | [`context`] | `SearchContext`, `PathConstraints`, `Flee`, `ThreatField` |
//! | [`cost`]    | `CostModel` — fine edge costs and heuristics              |
//! | [`low`]     | `LowSearch` — incremental fine A*                         |
//! | [`high`]    | `HighSearch` — incremental coarse A* over the rib graph   |
//! | [`patch`]   | `WeightPatch` — temporary coarse edge re-pricing          |
//!
//! Both searches are resumable: `start` once, then `step(budget)` until the
//! status leaves `Running`.  Search state is reused across requests and is
//! owned by exactly one thread.

pub mod context;
pub mod cost;
pub mod high;
pub mod low;
pub mod patch;
pub mod stamp;


pub use context::{Flee, NoThreat, PathConstraints, SearchContext, ThreatField};
pub use cost::CostModel;
pub use high::{HighSearch, Waypoint};
pub use low::{LowSearch, LowStatus, LowTarget};
pub use patch::WeightPatch;
pub use stamp::StampedSlots;
