//! `tn-path` — turns search node chains into the point list a mover follows.
//!
//! # Pipeline
//!
//! ```text
//! segment chains ──assemble──▶ points ──optimize──▶ ──smooth×N──▶ ──clearance──▶ PathPoint list
//! ```
//!
//! | Module        | Contents                                               |
//! |---------------|--------------------------------------------------------|
//! | [`point`]     | `PathPoint`, `path_length`                             |
//! | [`assemble`]  | Chain concatenation and node positions                 |
//! | [`shaper`]    | `Shaper` — optimize, smooth, clearance passes          |
//!
//! Portal and shortcut points are connectors: no pass moves or removes them,
//! nor the cell points immediately before and after them.

pub mod assemble;
pub mod point;
pub mod shaper;

#[cfg(test)]
mod tests;

pub use assemble::{assemble, node_position};
pub use point::{PathPoint, path_length};
pub use shaper::Shaper;
