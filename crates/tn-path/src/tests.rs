//! Unit tests for tn-path.

#[cfg(test)]
mod helpers {
    use tn_core::{Cell, NodeRef};
    use tn_terrain::{TerrainGrid, TerrainGridBuilder};

    use crate::PathPoint;

    pub fn open(w: i32, h: i32) -> TerrainGrid {
        TerrainGridBuilder::new(w, h).build()
    }

    pub fn cells(cs: &[(i32, i32)]) -> Vec<PathPoint> {
        cs.iter()
            .map(|&(x, y)| {
                let c = Cell::new(x, y);
                PathPoint::new(c.center(), NodeRef::Cell(c))
            })
            .collect()
    }
}

// ── Assembly ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod assemble {
    use tn_core::{Cell, NodeRef, Point};
    use tn_terrain::{AreaKind, HighGridParams, PortalGraphBuilder, ShortcutSet, TerrainMap};

    use crate::{assemble, node_position, path_length};

    use super::helpers::{cells, open};

    #[test]
    fn segments_join_without_duplicates() {
        let map = TerrainMap::from_grid(open(8, 8), HighGridParams::default()).unwrap();
        let a = vec![NodeRef::Cell(Cell::new(0, 0)), NodeRef::Cell(Cell::new(1, 0))];
        let b = vec![NodeRef::Cell(Cell::new(1, 0)), NodeRef::Cell(Cell::new(2, 0))];
        let points = assemble(&map, &[a, b], Point::new(0.2, 0.1), Point::new(2.3, -0.2));
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].pos, Point::new(0.2, 0.1));
        assert_eq!(points[1].pos, Point::new(1.0, 0.0));
        assert_eq!(points[2].pos, Point::new(2.3, -0.2));
    }

    #[test]
    fn end_outside_final_cell_keeps_centre() {
        let map = TerrainMap::from_grid(open(8, 8), HighGridParams::default()).unwrap();
        let chain = vec![NodeRef::Cell(Cell::new(0, 0)), NodeRef::Cell(Cell::new(1, 0))];
        let points = assemble(&map, &[chain], Point::new(0.0, 0.0), Point::new(4.0, 0.0));
        assert_eq!(points[1].pos, Point::new(1.0, 0.0));
    }

    #[test]
    fn connectors_take_their_positions() {
        let mut pb = PortalGraphBuilder::new();
        let ladder = pb.add_portal(AreaKind::Ladder, vec![Cell::new(1, 1), Cell::new(3, 1)], None);
        let mut lanes = ShortcutSet::new();
        let lane = lanes.add(Cell::new(0, 4), Cell::new(4, 4), 20);
        let map = TerrainMap::new(open(8, 8), pb.build(), lanes, HighGridParams::default()).unwrap();

        assert_eq!(node_position(&map, NodeRef::Portal(ladder)), Point::new(2.0, 1.0));
        assert_eq!(node_position(&map, NodeRef::Shortcut(lane)), Point::new(2.0, 4.0));
    }

    #[test]
    fn length_sums_segments() {
        let points = cells(&[(0, 0), (3, 4), (3, 6)]);
        assert!((path_length(&points) - 7.0).abs() < 1e-5);
        assert_eq!(path_length(&points[..1]), 0.0);
    }
}

// ── Optimize ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod optimize {
    use tn_core::{Cell, NodeRef};
    use tn_terrain::trace::line_clear;
    use tn_terrain::{AreaKind, HighGridParams, PortalGraphBuilder, ShortcutSet, TerrainGridBuilder, TerrainMap};

    use crate::{PathPoint, Shaper, assemble};

    use super::helpers::{cells, open};

    #[test]
    fn straight_run_collapses() {
        let grid = open(10, 10);
        let passable = |c: Cell| grid.is_passable(c);
        let shaper = Shaper::new(&grid, &passable, 0.5);
        let diagonal: Vec<(i32, i32)> = (0..10).map(|i| (i, i)).collect();
        let out = shaper.optimize(&cells(&diagonal));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].node, NodeRef::Cell(Cell::new(0, 0)));
        assert_eq!(out[1].node, NodeRef::Cell(Cell::new(9, 9)));
    }

    #[test]
    fn corner_is_kept() {
        let mut b = TerrainGridBuilder::new(10, 10);
        for y in 2..10 {
            for x in 2..10 {
                b.block(Cell::new(x, y));
            }
        }
        let grid = b.build();
        let passable = |c: Cell| grid.is_passable(c);
        let shaper = Shaper::new(&grid, &passable, 0.0);

        let mut route: Vec<(i32, i32)> = (0..10).rev().map(|y| (0, y)).collect();
        route.extend((1..10).map(|x| (x, 0)));
        let input = cells(&route);
        let out = shaper.optimize(&input);

        assert!(out.len() >= 3 && out.len() < input.len());
        assert_eq!(out.first().map(|p| p.node), Some(NodeRef::Cell(Cell::new(0, 9))));
        assert_eq!(out.last().map(|p| p.node), Some(NodeRef::Cell(Cell::new(9, 0))));
        for w in out.windows(2) {
            assert!(line_clear(&grid, w[0].pos, w[1].pos, &passable), "{:?} → {:?}", w[0].pos, w[1].pos);
        }
    }

    #[test]
    fn connectors_and_neighbours_survive() {
        let mut b = TerrainGridBuilder::new(20, 5);
        for y in 0..5 {
            b.block(Cell::new(10, y));
        }
        let mut pb = PortalGraphBuilder::new();
        let a = pb.add_portal(AreaKind::Teleport, vec![Cell::new(2, 2)], None);
        let z = pb.add_portal(AreaKind::Teleport, vec![Cell::new(17, 2)], None);
        pb.link(a, z, 20).unwrap();
        let map = TerrainMap::new(b.build(), pb.build(), ShortcutSet::new(), HighGridParams::default()).unwrap();

        let chain: Vec<NodeRef> = [0, 1, 2]
            .into_iter()
            .map(|x| NodeRef::Cell(Cell::new(x, 2)))
            .chain([NodeRef::Portal(a), NodeRef::Portal(z)])
            .chain([17, 18, 19].into_iter().map(|x| NodeRef::Cell(Cell::new(x, 2))))
            .collect();
        let points = assemble(&map, &[chain], Cell::new(0, 2).center(), Cell::new(19, 2).center());

        let passable = |c: Cell| map.grid.is_passable(c);
        let out = Shaper::new(&map.grid, &passable, 0.5).optimize(&points);
        let nodes: Vec<NodeRef> = out.iter().map(|p: &PathPoint| p.node).collect();
        assert_eq!(
            nodes,
            vec![
                NodeRef::Cell(Cell::new(0, 2)),
                NodeRef::Cell(Cell::new(2, 2)),
                NodeRef::Portal(a),
                NodeRef::Portal(z),
                NodeRef::Cell(Cell::new(17, 2)),
                NodeRef::Cell(Cell::new(19, 2)),
            ]
        );
    }

    #[test]
    fn river_is_not_cut_across() {
        let mut b = TerrainGridBuilder::new(10, 10);
        b.set_river(Cell::new(2, 2), (1, 1));
        let grid = b.build();
        let passable = |c: Cell| grid.is_passable(c);
        let input = cells(&[(0, 0), (1, 1), (2, 2), (3, 3), (4, 4), (4, 5)]);

        let out = Shaper::new(&grid, &passable, 0.0).optimize(&input);
        let nodes: Vec<NodeRef> = out.iter().map(|p| p.node).collect();
        assert_eq!(
            nodes,
            vec![
                NodeRef::Cell(Cell::new(0, 0)),
                NodeRef::Cell(Cell::new(2, 2)),
                NodeRef::Cell(Cell::new(4, 5)),
            ]
        );

        let out = Shaper::new(&grid, &passable, 0.0).avoid_rivers(false).optimize(&input);
        assert_eq!(out.len(), 2);
    }
}

// ── Smooth ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod smooth {
    use tn_core::{Cell, Point};
    use tn_terrain::TerrainGridBuilder;

    use crate::Shaper;

    use super::helpers::{cells, open};

    #[test]
    fn zigzag_is_averaged() {
        let grid = open(5, 5);
        let passable = |c: Cell| grid.is_passable(c);
        let mut points = cells(&[(0, 0), (1, 1), (2, 0)]);
        Shaper::new(&grid, &passable, 0.0).smooth(&mut points);
        assert_eq!(points[1].pos, Point::new(1.0, 0.5));
        assert_eq!(points[0].pos, Point::new(0.0, 0.0));
        assert_eq!(points[2].pos, Point::new(2.0, 0.0));
    }

    #[test]
    fn blocked_average_is_rejected() {
        let mut b = TerrainGridBuilder::new(5, 5);
        b.block(Cell::new(1, 0));
        let grid = b.build();
        let passable = |c: Cell| grid.is_passable(c);
        let mut points = cells(&[(0, 0), (1, 1), (2, 0)]);
        Shaper::new(&grid, &passable, 0.0).smooth(&mut points);
        assert_eq!(points[1].pos, Point::new(1.0, 1.0));
    }
}

// ── Clearance ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod clearance {
    use tn_core::{Cell, Point};
    use tn_terrain::TerrainGridBuilder;

    use crate::{Shaper, path_length};

    use super::helpers::{cells, open};

    #[test]
    fn pushes_away_from_wall() {
        let mut b = TerrainGridBuilder::new(10, 5);
        for x in 0..10 {
            b.block(Cell::new(x, 0));
        }
        let grid = b.build();
        let passable = |c: Cell| grid.is_passable(c);
        let route: Vec<(i32, i32)> = (0..10).map(|x| (x, 1)).collect();
        let mut points = cells(&route);

        Shaper::new(&grid, &passable, 0.8).clearance(&mut points, 3);
        assert!((points[5].pos.y - 1.3).abs() < 1e-4, "y = {}", points[5].pos.y);
        assert_eq!(points[5].pos.x, 5.0);
        assert_eq!(points[0].pos, Point::new(0.0, 1.0));
        assert_eq!(points[9].pos, Point::new(9.0, 1.0));
        // Blur tapers the offset toward the fixed endpoints.
        assert!(points[1].pos.y < points[5].pos.y);
    }

    #[test]
    fn open_ground_is_untouched() {
        let grid = open(20, 20);
        let passable = |c: Cell| grid.is_passable(c);
        let route: Vec<(i32, i32)> = (2..18).map(|x| (x, 10)).collect();
        let mut points = cells(&route);
        let before = points.clone();
        Shaper::new(&grid, &passable, 0.5).clearance(&mut points, 3);
        assert_eq!(points, before);
    }

    #[test]
    fn full_pipeline_on_open_diagonal() {
        let grid = open(10, 10);
        let passable = |c: Cell| grid.is_passable(c);
        let route: Vec<(i32, i32)> = (0..10).map(|i| (i, i)).collect();
        let out = Shaper::new(&grid, &passable, 0.5).shape(&cells(&route), 1, 3);
        assert!(out.len() <= 10);
        assert!((path_length(&out) - 12.728).abs() < 0.01);
    }
}
