//! Strongly typed identifier wrappers and the search-graph node reference.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  Portal and shortcut ids index
//! directly into the terrain's portal/shortcut vectors via `.index()`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Cell;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// A moving entity known to the reservation grid.
    pub struct EntityId(u32);
}

typed_id! {
    /// Index of a portal (gate, ladder, stairs, teleport, tower) in the
    /// terrain's portal graph.
    pub struct PortalId(u32);
}

typed_id! {
    /// Index of a dynamic cross-region shortcut (water lane).
    pub struct ShortcutId(u32);
}

typed_id! {
    /// Handle number assigned to a submitted path request.
    pub struct RequestId(u64);
}

// ── NodeRef ───────────────────────────────────────────────────────────────────

/// Identity of a node in the fine search graph.
///
/// Plain grid cells, portal nodes and shortcut nodes share one open list, so
/// the search needs a single key type that can name any of them.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum NodeRef {
    Cell(Cell),
    Portal(PortalId),
    Shortcut(ShortcutId),
}

impl NodeRef {
    #[inline]
    pub fn as_cell(self) -> Option<Cell> {
        match self {
            NodeRef::Cell(c) => Some(c),
            _ => None,
        }
    }

    #[inline]
    pub fn as_portal(self) -> Option<PortalId> {
        match self {
            NodeRef::Portal(p) => Some(p),
            _ => None,
        }
    }

    /// `true` for portal and shortcut nodes — the points a path optimizer
    /// must never remove.
    #[inline]
    pub fn is_connector(self) -> bool {
        !matches!(self, NodeRef::Cell(_))
    }
}

impl From<Cell> for NodeRef {
    fn from(c: Cell) -> Self {
        NodeRef::Cell(c)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Cell(c) => write!(f, "{c}"),
            NodeRef::Portal(p) => write!(f, "{p}"),
            NodeRef::Shortcut(s) => write!(f, "{s}"),
        }
    }
}
