//! Stitch per-segment node chains into one point list.

use tn_core::{NodeRef, Point};
use tn_terrain::TerrainMap;

use crate::point::PathPoint;

/// World position of a search node.  Portals sit at their representative
/// point and shortcuts at the middle of their lane.
pub fn node_position(map: &TerrainMap, node: NodeRef) -> Point {
    match node {
        NodeRef::Cell(c) => c.center(),
        NodeRef::Portal(p) => map.portals.get(p).map_or(Point::default(), |p| p.position),
        NodeRef::Shortcut(s) => map
            .shortcuts
            .get(s)
            .map_or(Point::default(), |l| l.from.center().lerp(l.to.center(), 0.5)),
    }
}

/// Concatenate `chains` in order and drop consecutive duplicate nodes (each
/// segment starts where the previous one ended).
///
/// The first point is moved to `start`, and the last to `end` when `end` lies
/// in the final cell, so the path begins and ends at the caller's exact
/// positions rather than at cell centres.
pub fn assemble(map: &TerrainMap, chains: &[Vec<NodeRef>], start: Point, end: Point) -> Vec<PathPoint> {
    let mut points: Vec<PathPoint> = Vec::with_capacity(chains.iter().map(Vec::len).sum());
    for &node in chains.iter().flatten() {
        if points.last().is_some_and(|p| p.node == node) {
            continue;
        }
        points.push(PathPoint::new(node_position(map, node), node));
    }

    if let Some(first) = points.first_mut() {
        if matches!(first.node, NodeRef::Cell(c) if c == start.cell()) {
            first.pos = start;
        }
    }
    if points.len() > 1 {
        if let Some(last) = points.last_mut() {
            if matches!(last.node, NodeRef::Cell(c) if c == end.cell()) {
                last.pos = end;
            }
        }
    }
    points
}
