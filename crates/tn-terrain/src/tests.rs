//! Unit tests for tn-terrain.

#[cfg(test)]
mod helpers {
    use tn_core::Cell;

    use crate::{Bounds, TerrainGrid, TerrainGridBuilder};

    pub fn open(w: i32, h: i32) -> TerrainGrid {
        TerrainGridBuilder::new(w, h).build()
    }

    /// `w × h` open grid with a full-height wall at column `x`.
    pub fn walled(w: i32, h: i32, x: i32) -> TerrainGrid {
        let mut b = TerrainGridBuilder::new(w, h);
        b.fill(Bounds::new(Cell::new(x, 0), Cell::new(x, h - 1)), |b, c| {
            b.block(c);
        });
        b.build()
    }
}

// ── Grid ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod grid {
    use tn_core::{Cell, Direction};

    use crate::{Bounds, TerrainFlags, TerrainGridBuilder};

    use super::helpers::open;

    #[test]
    fn builder_defaults_are_open() {
        let g = open(4, 3);
        assert_eq!(g.cell_count(), 12);
        assert!(g.is_walkable(Cell::new(3, 2)));
        assert_eq!(g.weight(Cell::new(0, 0)), 1);
        assert_eq!(g.height_at(Cell::new(1, 1)), 0);
    }

    #[test]
    fn out_of_bounds_reads_as_impassable() {
        let g = open(4, 4);
        assert!(!g.is_passable(Cell::new(-1, 0)));
        assert!(!g.is_passable(Cell::new(4, 0)));
        assert_eq!(g.flags(Cell::new(9, 9)), TerrainFlags::empty());
    }

    #[test]
    fn builder_rejects_out_of_bounds_writes() {
        let mut b = TerrainGridBuilder::new(2, 2);
        assert!(b.set_weight(Cell::new(1, 1), 3));
        assert!(!b.set_weight(Cell::new(2, 0), 3));
        assert!(!b.set_road(Cell::new(0, -1)));
    }

    #[test]
    fn water_and_river_setters_set_flags() {
        let mut b = TerrainGridBuilder::new(4, 4);
        b.set_water(Cell::new(1, 1), 7);
        b.set_river(Cell::new(2, 2), (1, 0));
        b.set_river(Cell::new(3, 3), (0, 0));
        let g = b.build();
        assert!(g.is_water(Cell::new(1, 1)));
        assert!(!g.is_walkable(Cell::new(1, 1)));
        assert_eq!(g.water_region(Cell::new(1, 1)), 7);
        assert_eq!(g.river_flow(Cell::new(2, 2)), Some((1, 0)));
        assert!(g.flags(Cell::new(3, 3)).contains(TerrainFlags::RIVER));
        assert_eq!(g.river_flow(Cell::new(3, 3)), None);
    }

    #[test]
    fn flag_list_parsing() {
        assert_eq!(
            TerrainFlags::parse_list("road | town").unwrap(),
            TerrainFlags::ROAD | TerrainFlags::TOWN
        );
        assert_eq!(
            TerrainFlags::parse_list("ocean").unwrap(),
            TerrainFlags::OCEAN | TerrainFlags::WATER
        );
        assert_eq!(TerrainFlags::parse_list("").unwrap(), TerrainFlags::empty());
        assert_eq!(TerrainFlags::parse_list("road|lava").unwrap_err(), "lava");
    }

    #[test]
    fn bounds_geometry() {
        let b = Bounds::spanning(Cell::new(3, 1), Cell::new(1, 4));
        assert_eq!(b.min, Cell::new(1, 1));
        assert_eq!(b.max, Cell::new(3, 4));
        assert_eq!(b.area(), 12);
        assert_eq!(b.local_index(Cell::new(2, 2)), 4);
        assert!(Bounds::around(Cell::new(5, 5), 2).contains(Cell::new(7, 3)));
        assert_eq!(b.union(&Bounds::around(Cell::new(0, 0), 0)).min, Cell::new(0, 0));
    }

    #[test]
    fn base_step_cost_rules() {
        let mut b = TerrainGridBuilder::new(5, 5);
        b.set_weight(Cell::new(2, 0), 3);
        b.set_height(Cell::new(0, 2), 10);
        b.block(Cell::new(4, 3));
        b.block(Cell::new(3, 4));
        let g = b.build();

        assert_eq!(g.base_step_cost(Cell::new(0, 0), Direction::E, 4), Some(5));
        assert_eq!(g.base_step_cost(Cell::new(1, 0), Direction::E, 4), Some(15));
        assert_eq!(g.base_step_cost(Cell::new(0, 0), Direction::SE, 4), Some(7));
        // Too steep.
        assert_eq!(g.base_step_cost(Cell::new(0, 1), Direction::S, 4), None);
        assert_eq!(g.base_step_cost(Cell::new(0, 1), Direction::S, 10), Some(5));
        // Squeezing between two blocked cells.
        assert_eq!(g.base_step_cost(Cell::new(3, 3), Direction::SE, 4), None);
        // Off the grid.
        assert_eq!(g.base_step_cost(Cell::new(0, 0), Direction::N, 4), None);
    }
}

// ── Flood ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod flood {
    use tn_core::Cell;

    use crate::flood;

    use super::helpers::{open, walled};

    #[test]
    fn octile_costs_on_open_grid() {
        let g = open(5, 5);
        let field = flood(Cell::new(0, 0), g.bounds(), u32::MAX, |c, d| g.base_step_cost(c, d, 4));
        assert_eq!(field.cost_to(Cell::new(0, 0)), Some(0));
        assert_eq!(field.cost_to(Cell::new(4, 0)), Some(20));
        assert_eq!(field.cost_to(Cell::new(4, 4)), Some(28));
        assert_eq!(field.cost_to(Cell::new(4, 2)), Some(24));
        assert_eq!(field.cost_to(Cell::new(5, 5)), None);
    }

    #[test]
    fn max_cost_limits_expansion() {
        let g = open(5, 5);
        let field = flood(Cell::new(0, 0), g.bounds(), 10, |c, d| g.base_step_cost(c, d, 4));
        assert_eq!(field.cost_to(Cell::new(2, 0)), Some(10));
        assert_eq!(field.cost_to(Cell::new(4, 0)), None);
    }

    #[test]
    fn wall_separates_regions() {
        let g = walled(6, 4, 3);
        let field = flood(Cell::new(0, 0), g.bounds(), u32::MAX, |c, d| g.base_step_cost(c, d, 4));
        assert!(field.cost_to(Cell::new(2, 3)).is_some());
        assert_eq!(field.cost_to(Cell::new(4, 0)), None);
    }

    #[test]
    fn origin_outside_window_reaches_nothing() {
        let g = open(5, 5);
        let field = flood(Cell::new(9, 9), g.bounds(), u32::MAX, |c, d| g.base_step_cost(c, d, 4));
        assert_eq!(field.cost_to(Cell::new(0, 0)), None);
    }
}

// ── High-level grid ───────────────────────────────────────────────────────────

#[cfg(test)]
mod high {
    use tn_core::{Cell, Direction, PortalId, ShortcutId};

    use crate::{
        AreaKind, HighGrid, HighGridParams, HighNode, NO_EDGE, PortalGraph, PortalGraphBuilder, Rib,
        ShortcutSet, TerrainGridBuilder,
    };

    use super::helpers::{open, walled};

    fn params() -> HighGridParams {
        HighGridParams { block_size: 8, max_slope: 4 }
    }

    #[test]
    fn representatives_sit_near_block_centres() {
        let g = open(16, 16);
        let h = HighGrid::build(&g, &PortalGraph::empty(), &ShortcutSet::new(), params());
        assert_eq!((h.width(), h.height()), (2, 2));
        assert_eq!(h.rep(Cell::new(0, 0)), Some(Cell::new(3, 3)));
        assert_eq!(h.rep(Cell::new(1, 1)), Some(Cell::new(11, 11)));
        assert!(h.is_rep(Cell::new(11, 3)));
        assert!(!h.is_rep(Cell::new(0, 0)));
    }

    #[test]
    fn blocked_centre_moves_representative() {
        let mut b = TerrainGridBuilder::new(8, 8);
        b.block(Cell::new(3, 3));
        let g = b.build();
        let h = HighGrid::build(&g, &PortalGraph::empty(), &ShortcutSet::new(), params());
        // Nearest by step distance with (y, x) tie-break.
        assert_eq!(h.rep(Cell::new(0, 0)), Some(Cell::new(3, 2)));
    }

    #[test]
    fn fully_blocked_block_has_no_representative() {
        let mut b = TerrainGridBuilder::new(16, 8);
        b.fill(crate::Bounds::new(Cell::new(8, 0), Cell::new(15, 7)), |b, c| {
            b.block(c);
        });
        let g = b.build();
        let h = HighGrid::build(&g, &PortalGraph::empty(), &ShortcutSet::new(), params());
        assert_eq!(h.rep(Cell::new(1, 0)), None);
        assert_eq!(h.weight(Cell::new(0, 0), Direction::E), NO_EDGE);
    }

    #[test]
    fn cached_weights_are_fine_costs_between_representatives() {
        let g = open(16, 16);
        let h = HighGrid::build(&g, &PortalGraph::empty(), &ShortcutSet::new(), params());
        assert_eq!(h.weight(Cell::new(0, 0), Direction::E), 40);
        assert_eq!(h.weight(Cell::new(0, 0), Direction::S), 40);
        assert_eq!(h.weight(Cell::new(0, 0), Direction::SE), 56);
        assert_eq!(h.weight(Cell::new(1, 1), Direction::NW), 56);
        // Off the coarse grid.
        assert_eq!(h.weight(Cell::new(0, 0), Direction::W), NO_EDGE);
        assert_eq!(h.weights_snapshot().len(), 4);
    }

    #[test]
    fn wall_removes_lattice_edges() {
        let g = walled(16, 16, 8);
        let h = HighGrid::build(&g, &PortalGraph::empty(), &ShortcutSet::new(), params());
        assert_eq!(h.weight(Cell::new(0, 0), Direction::E), NO_EDGE);
        assert_eq!(h.weight(Cell::new(0, 0), Direction::SE), NO_EDGE);
        assert_eq!(h.weight(Cell::new(0, 0), Direction::S), 40);
    }

    #[test]
    fn portal_ribs_connect_blocks() {
        let g = open(16, 16);
        let mut pb = PortalGraphBuilder::new();
        let stairs = pb.add_portal(AreaKind::Stairs, vec![Cell::new(5, 3)], None);
        let portals = pb.build();
        let h = HighGrid::build(&g, &portals, &ShortcutSet::new(), params());

        // Two steps from the representative plus round(5 × 1.5).
        let rib = Rib { to: HighNode::Portal(stairs), cost: 18 };
        assert!(h.ribs(HighNode::Block(Cell::new(0, 0))).contains(&rib));
        assert_eq!(
            h.ribs(HighNode::Portal(stairs)),
            &[Rib { to: HighNode::Block(Cell::new(0, 0)), cost: 18 }]
        );
        assert!(h.ribs(HighNode::Portal(PortalId(9))).is_empty());
    }

    #[test]
    fn portal_links_become_ribs() {
        let g = open(16, 16);
        let mut pb = PortalGraphBuilder::new();
        let a = pb.add_portal(AreaKind::Teleport, vec![Cell::new(3, 3)], None);
        let b = pb.add_portal(AreaKind::Teleport, vec![Cell::new(11, 11)], None);
        pb.link(a, b, 20).unwrap();
        let portals = pb.build();
        let h = HighGrid::build(&g, &portals, &ShortcutSet::new(), params());
        assert!(h.ribs(HighNode::Portal(a)).contains(&Rib { to: HighNode::Portal(b), cost: 20 }));
        assert!(h.ribs(HighNode::Portal(b)).contains(&Rib { to: HighNode::Portal(a), cost: 20 }));
    }

    #[test]
    fn shortcut_ribs_carry_half_the_lane_cost() {
        let g = open(16, 16);
        let mut lanes = ShortcutSet::new();
        let id = lanes.add(Cell::new(3, 3), Cell::new(11, 11), 60);
        let h = HighGrid::build(&g, &PortalGraph::empty(), &lanes, params());
        let back = h.ribs(HighNode::Shortcut(id));
        assert_eq!(back.len(), 2);
        assert!(back.contains(&Rib { to: HighNode::Block(Cell::new(0, 0)), cost: 30 }));
        assert!(back.contains(&Rib { to: HighNode::Block(Cell::new(1, 1)), cost: 30 }));
        assert!(h.ribs(HighNode::Shortcut(ShortcutId(5))).is_empty());
    }
}

// ── Portals ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod portal {
    use tn_core::{Cell, Point, PortalId};

    use crate::{AreaKind, Entrant, PortalGraphBuilder, ShortcutSet, TerrainError};

    fn entrant(faction: u32, radius: f32) -> Entrant {
        Entrant { faction, radius, previous: None }
    }

    #[test]
    fn behaviour_table() {
        assert_eq!(AreaKind::Ladder.behavior().cost_mul, 3.0);
        assert_eq!(AreaKind::parse(" Stairs "), Some(AreaKind::Stairs));
        assert_eq!(AreaKind::parse("bridge"), None);
    }

    #[test]
    fn gate_entry() {
        let mut b = PortalGraphBuilder::new();
        let gate = b.add_portal(AreaKind::Gate, vec![Cell::new(0, 0)], Some(1));
        let g = b.build();
        let p = g.get(gate).unwrap();
        assert!(!p.open);
        assert!(p.can_enter(&entrant(1, 0.5)));
        assert!(!p.can_enter(&entrant(2, 0.5)));

        let mut b = PortalGraphBuilder::new();
        let gate = b.add_portal(AreaKind::Gate, vec![Cell::new(0, 0)], Some(1));
        b.set_open(gate, true).unwrap();
        assert!(b.build().get(gate).unwrap().can_enter(&entrant(2, 0.5)));
    }

    #[test]
    fn ladder_teleport_tower_entry() {
        let mut b = PortalGraphBuilder::new();
        let ladder = b.add_portal(AreaKind::Ladder, vec![Cell::new(0, 0)], None);
        let tele = b.add_portal(AreaKind::Teleport, vec![Cell::new(1, 0)], None);
        let tower = b.add_portal(AreaKind::Tower, vec![Cell::new(2, 0)], Some(3));
        let g = b.build();

        let ladder = g.get(ladder).unwrap();
        assert!(ladder.can_enter(&entrant(0, 0.5)));
        assert!(!ladder.can_enter(&entrant(0, 0.8)));

        let tele = g.get(tele).unwrap();
        assert!(tele.can_enter(&entrant(0, 0.5)));
        let chained = Entrant { previous: Some(AreaKind::Teleport), ..entrant(0, 0.5) };
        assert!(!tele.can_enter(&chained));

        let tower = g.get(tower).unwrap();
        assert!(tower.can_enter(&entrant(3, 0.5)));
        assert!(!tower.can_enter(&entrant(4, 0.5)));
    }

    #[test]
    fn entry_cost_rounds_multiplier() {
        let mut b = PortalGraphBuilder::new();
        let stairs = b.add_portal(AreaKind::Stairs, vec![Cell::new(0, 0)], None);
        let ladder = b.add_portal(AreaKind::Ladder, vec![Cell::new(1, 0)], None);
        let g = b.build();
        assert_eq!(g.get(stairs).unwrap().entry_cost(), 8);
        assert_eq!(g.get(ladder).unwrap().entry_cost(), 15);
    }

    #[test]
    fn lookup_by_cell_and_position() {
        let mut b = PortalGraphBuilder::new();
        let a = b.add_portal(AreaKind::Stairs, vec![Cell::new(0, 0)], None);
        let far = b.add_portal(AreaKind::Stairs, vec![Cell::new(10, 0)], None);
        let c = b.add_portal(AreaKind::Stairs, vec![Cell::new(3, 4)], None);
        b.attach_cell(far, Cell::new(10, 2)).unwrap();
        let g = b.build();

        assert_eq!(g.at_cell(Cell::new(3, 4)), &[c]);
        assert_eq!(g.at_cell(Cell::new(10, 2)), &[far]);
        assert!(g.at_cell(Cell::new(5, 5)).is_empty());
        assert_eq!(g.get(far).unwrap().position, Point::new(10.0, 1.0));
        assert_eq!(g.portals_near(Point::new(0.0, 0.0), 6.0), vec![a, c]);
    }

    #[test]
    fn builder_rejects_unknown_ids() {
        let mut b = PortalGraphBuilder::new();
        let a = b.add_portal(AreaKind::Gate, vec![Cell::new(0, 0)], None);
        assert!(matches!(b.link(a, PortalId(4), 10), Err(TerrainError::PortalNotFound(_))));
        assert!(matches!(b.set_open(PortalId(2), true), Err(TerrainError::PortalNotFound(_))));
    }

    #[test]
    fn shortcuts_index_both_ends() {
        let mut set = ShortcutSet::new();
        let id = set.add(Cell::new(1, 1), Cell::new(9, 1), 40);
        assert_eq!(set.at_cell(Cell::new(9, 1)), &[id]);
        let lane = set.get(id).unwrap();
        assert_eq!(lane.other_end(Cell::new(1, 1)), Some(Cell::new(9, 1)));
        assert_eq!(lane.other_end(Cell::new(5, 1)), None);
    }
}

// ── Traces ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod trace {
    use tn_core::{Cell, Point};

    use crate::trace::{crosses_river, direct_reachable, free_distance, line_clear, trace_clear};
    use crate::TerrainGridBuilder;

    fn pt(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn line_clear_stops_at_blocked_cell() {
        let mut b = TerrainGridBuilder::new(10, 10);
        b.block(Cell::new(5, 5));
        let g = b.build();
        let pass = |c: Cell| g.is_walkable(c);
        assert!(!line_clear(&g, pt(0.0, 5.0), pt(9.0, 5.0), &pass));
        assert!(line_clear(&g, pt(0.0, 0.0), pt(9.0, 0.0), &pass));
    }

    #[test]
    fn line_clear_rejects_corner_cut() {
        let mut b = TerrainGridBuilder::new(4, 4);
        b.block(Cell::new(1, 0));
        b.block(Cell::new(0, 1));
        let g = b.build();
        assert!(!line_clear(&g, pt(0.0, 0.0), pt(1.0, 1.0), &|c| g.is_walkable(c)));
    }

    #[test]
    fn clearance_radius_widens_the_trace() {
        let mut b = TerrainGridBuilder::new(10, 10);
        b.block(Cell::new(5, 5));
        let g = b.build();
        let pass = |c: Cell| g.is_walkable(c);
        assert!(trace_clear(&g, pt(0.0, 4.0), pt(9.0, 4.0), 0.3, &pass));
        assert!(!trace_clear(&g, pt(0.0, 4.0), pt(9.0, 4.0), 0.6, &pass));
    }

    #[test]
    fn river_crossing_ignores_endpoints() {
        let mut b = TerrainGridBuilder::new(10, 4);
        for y in 0..4 {
            b.set_river(Cell::new(5, y), (0, 1));
        }
        let g = b.build();
        assert!(crosses_river(&g, pt(0.0, 2.0), pt(9.0, 2.0)));
        assert!(!crosses_river(&g, pt(5.0, 2.0), pt(9.0, 2.0)));
        assert!(!crosses_river(&g, pt(0.0, 2.0), pt(4.0, 2.0)));
        assert!(!direct_reachable(&g, pt(0.0, 2.0), pt(9.0, 2.0), &|c| g.is_passable(c)));
        assert!(direct_reachable(&g, pt(0.0, 0.0), pt(4.0, 3.0), &|c| g.is_passable(c)));
    }

    #[test]
    fn free_distance_to_first_obstacle() {
        let mut b = TerrainGridBuilder::new(10, 10);
        b.block(Cell::new(5, 0));
        let g = b.build();
        let pass = |c: Cell| g.is_walkable(c);
        // x = 4.5 rounds into the blocked cell.
        let d = free_distance(pt(0.0, 0.0), pt(1.0, 0.0), 10.0, &pass);
        assert!((d - 4.25).abs() < 1e-4, "got {d}");
        let open = free_distance(pt(0.0, 5.0), pt(1.0, 0.0), 3.0, &pass);
        assert_eq!(open, 3.0);
    }
}

// ── Map ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod map {
    use tn_core::Cell;

    use crate::{
        AreaKind, HighGridParams, PortalGraphBuilder, ShortcutSet, TerrainError, TerrainGridBuilder,
        TerrainMap,
    };

    use super::helpers::open;

    #[test]
    fn builds_high_grid() {
        let map = TerrainMap::from_grid(open(16, 16), HighGridParams::default()).unwrap();
        assert_eq!(map.high.block_count(), 4);
        assert_eq!(map.params().block_size, 8);
    }

    #[test]
    fn rejects_bad_parts() {
        let small = HighGridParams { block_size: 1, max_slope: 4 };
        assert!(matches!(TerrainMap::from_grid(open(4, 4), small), Err(TerrainError::Config(_))));

        let empty = TerrainGridBuilder::new(0, 0).build();
        assert!(matches!(
            TerrainMap::from_grid(empty, HighGridParams::default()),
            Err(TerrainError::Config(_))
        ));

        let mut lanes = ShortcutSet::new();
        lanes.add(Cell::new(0, 0), Cell::new(20, 0), 10);
        let mut pb = PortalGraphBuilder::new();
        pb.add_portal(AreaKind::Stairs, vec![Cell::new(1, 1)], None);
        let err = TerrainMap::new(open(8, 8), pb.build(), lanes, HighGridParams::default());
        assert!(matches!(err, Err(TerrainError::OutOfBounds(c)) if c == Cell::new(20, 0)));

        let mut pb = PortalGraphBuilder::new();
        pb.add_portal(AreaKind::Stairs, Vec::new(), None);
        let err = TerrainMap::new(open(8, 8), pb.build(), ShortcutSet::new(), HighGridParams::default());
        assert!(matches!(err, Err(TerrainError::EmptyPortal(_))));
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::{Cursor, Write};

    use tn_core::{Cell, PortalId};

    use crate::{
        AreaKind, TerrainError, TerrainFlags, load_grid_csv, load_grid_reader, load_portals_reader,
        load_shortcuts_reader,
    };

    const CELLS: &str = "\
x,y,weight,height,flags,water_region,river_dx,river_dy
0,0,1,0,road,,,
4,2,0,0,,,,
5,5,2,3,water,3,,
6,5,2,0,river,,1,0
";

    #[test]
    fn grid_from_reader() {
        let g = load_grid_reader(Cursor::new(CELLS), None).unwrap();
        assert_eq!((g.width(), g.height()), (7, 6));
        assert!(g.flags(Cell::new(0, 0)).contains(TerrainFlags::ROAD));
        assert!(!g.is_passable(Cell::new(4, 2)));
        assert_eq!(g.weight(Cell::new(5, 5)), 2);
        assert_eq!(g.height_at(Cell::new(5, 5)), 3);
        assert_eq!(g.water_region(Cell::new(5, 5)), 3);
        assert_eq!(g.river_flow(Cell::new(6, 5)), Some((1, 0)));
        // Cells absent from the file stay open.
        assert_eq!(g.weight(Cell::new(3, 3)), 1);
    }

    #[test]
    fn empty_columns_take_defaults() {
        let csv = "x,y,weight,height,flags,water_region,river_dx,river_dy\n1,1,,,town,,,\n";
        let g = load_grid_reader(Cursor::new(csv), Some((3, 3))).unwrap();
        assert_eq!(g.weight(Cell::new(1, 1)), 1);
        assert!(g.is_town(Cell::new(1, 1)));
    }

    #[test]
    fn grid_errors() {
        let out = "x,y,weight,height,flags,water_region,river_dx,river_dy\n5,0,1,0,,,,\n";
        assert!(matches!(
            load_grid_reader(Cursor::new(out), Some((2, 2))),
            Err(TerrainError::OutOfBounds(_))
        ));
        let lava = "x,y,weight,height,flags,water_region,river_dx,river_dy\n0,0,1,0,lava,,,\n";
        assert!(matches!(load_grid_reader(Cursor::new(lava), None), Err(TerrainError::Parse(_))));
    }

    #[test]
    fn grid_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CELLS.as_bytes()).unwrap();
        let g = load_grid_csv(file.path(), Some((10, 10))).unwrap();
        assert_eq!(g.width(), 10);
        assert!(!g.is_passable(Cell::new(4, 2)));
    }

    #[test]
    fn portals_from_reader() {
        let csv = "\
portal,kind,x,y,owner,link,link_cost
2,ladder,10,6,,,
0,teleport,1,1,,1,20
1,teleport,30,30,,,
2,ladder,10,4,,,
";
        let g = load_portals_reader(Cursor::new(csv)).unwrap();
        assert_eq!(g.len(), 3);
        let tele = g.get(PortalId(0)).unwrap();
        assert_eq!(tele.kind, AreaKind::Teleport);
        assert_eq!(tele.links[0].to, PortalId(1));
        assert_eq!(tele.links[0].cost, 20);
        assert_eq!(g.get(PortalId(1)).unwrap().links[0].to, PortalId(0));
        assert_eq!(g.get(PortalId(2)).unwrap().cells.len(), 2);
    }

    #[test]
    fn portal_ids_must_be_dense() {
        let csv = "portal,kind,x,y,owner,link,link_cost\n0,gate,1,1,,,\n2,gate,2,2,,,\n";
        assert!(matches!(load_portals_reader(Cursor::new(csv)), Err(TerrainError::Parse(_))));
        let dangling = "portal,kind,x,y,owner,link,link_cost\n0,gate,1,1,,5,\n";
        assert!(matches!(
            load_portals_reader(Cursor::new(dangling)),
            Err(TerrainError::PortalNotFound(_))
        ));
    }

    #[test]
    fn shortcuts_from_reader() {
        let csv = "from_x,from_y,to_x,to_y,cost\n3,3,40,3,60\n";
        let set = load_shortcuts_reader(Cursor::new(csv)).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().to, Cell::new(40, 3));
    }
}
