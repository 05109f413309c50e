//! The unit of a finished path.

use tn_core::{NodeRef, Point};

/// One point of a finished path and the search node it came from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PathPoint {
    pub pos:  Point,
    pub node: NodeRef,
}

impl PathPoint {
    #[inline]
    pub fn new(pos: Point, node: NodeRef) -> Self {
        Self { pos, node }
    }

    /// `true` for portal and shortcut points.
    #[inline]
    pub fn is_connector(&self) -> bool {
        self.node.is_connector()
    }
}

/// Euclidean length of the polyline through `points`.
pub fn path_length(points: &[PathPoint]) -> f32 {
    points.windows(2).map(|w| w[0].pos.distance(w[1].pos)).sum()
}
