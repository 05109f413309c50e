//! Generated battlefield: a road, a river, a lake with a ferry lane, a hill,
//! a cliff with a ladder, a fortress wall with a gate, a pair of teleports,
//! and scattered rocks.

use std::io::Cursor;

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use tn_core::Cell;
use tn_terrain::{
    Bounds, HighGridParams, TerrainGridBuilder, TerrainMap, load_portals_reader, load_shortcuts_reader,
};

pub const WIDTH:  i32 = 96;
pub const HEIGHT: i32 = 64;

const ROAD_Y:    i32 = 10;
const RIVER_X:   i32 = 40;
const CLIFF_Y:   i32 = 32;
const WALL_X:    i32 = 80;
const WALL_END:  i32 = 20;
const ROCKS:     usize = 260;
const HILL:      Cell = Cell::new(64, 50);
const HILL_PEAK: i16 = 8;

const PORTALS_CSV: &str = "\
portal,kind,x,y,owner,link,link_cost\n\
0,teleport,4,4,,1,20\n\
1,teleport,90,58,,,\n\
2,ladder,70,31,,,\n\
2,ladder,70,33,,,\n\
3,gate,79,12,,,\n\
3,gate,81,12,,,\n\
";

// Ferry lane across the lake.
const SHORTCUTS_CSV: &str = "\
from_x,from_y,to_x,to_y,cost\n\
9,47,26,47,60\n\
";

/// Cells no rock may land on.
fn keep_clear(c: Cell) -> bool {
    (c.y - ROAD_Y).abs() <= 1
        || (c.x - RIVER_X).abs() <= 1
        || (c.y - CLIFF_Y).abs() <= 1
        || (c.x - WALL_X).abs() <= 1
        || c.chebyshev(Cell::new(4, 4)) <= 1
        || c.chebyshev(Cell::new(90, 58)) <= 1
        || (8..=27).contains(&c.x) && (38..=57).contains(&c.y)
}

pub fn build(seed: u64, params: HighGridParams) -> Result<TerrainMap> {
    let mut b = TerrainGridBuilder::new(WIDTH, HEIGHT);

    for y in 0..HEIGHT {
        b.set_river(Cell::new(RIVER_X, y), (0, 1));
    }
    for x in 0..WIDTH {
        b.set_road(Cell::new(x, ROAD_Y));
    }
    b.fill(Bounds::new(Cell::new(10, 40), Cell::new(25, 55)), |b, c| {
        b.set_water(c, 1);
    });
    b.fill(Bounds::around(HILL, HILL_PEAK as i32), |b, c| {
        let h = HILL_PEAK - c.chebyshev(HILL) as i16;
        b.set_height(c, h.max(0));
    });
    for x in 50..WIDTH {
        b.block(Cell::new(x, CLIFF_Y));
    }
    for y in 0..=WALL_END {
        b.block(Cell::new(WALL_X, y));
    }

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut placed = 0;
    while placed < ROCKS {
        let c = Cell::new(rng.gen_range(0..WIDTH), rng.gen_range(0..HEIGHT));
        if keep_clear(c) {
            continue;
        }
        b.block(c);
        placed += 1;
    }

    let portals = load_portals_reader(Cursor::new(PORTALS_CSV))?;
    let shortcuts = load_shortcuts_reader(Cursor::new(SHORTCUTS_CSV))?;
    Ok(TerrainMap::new(b.build(), portals, shortcuts, params)?)
}
