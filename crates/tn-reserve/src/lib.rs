//! `tn-reserve` — claimed points shared between movers, and the resolver
//! that steers a destination away from them.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                |
//! |--------------|---------------------------------------------------------|
//! | [`grid`]     | `ReservationGrid`, `Claim`, `SharedReservations`        |
//! | [`resolver`] | `resolve_unreserved`, `Claimant`, `Resolved`            |
//!
//! The reservation grid is the one piece of search input that simulation
//! threads mutate while a search runs, so it travels as
//! [`SharedReservations`] (`Arc<parking_lot::RwLock<_>>`).

pub mod grid;
pub mod resolver;


pub use grid::{Claim, ReservationGrid, SharedReservations};
pub use resolver::{Claimant, Resolved, needs_resolution, resolve_unreserved};
