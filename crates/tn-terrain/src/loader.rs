//! CSV terrain loader.
//!
//! # Cell CSV
//!
//! One row per cell that differs from the default (open, weight 1, height 0).
//! The grid is sized to the largest coordinate seen unless explicit
//! dimensions are given.
//!
//! ```csv
//! x,y,weight,height,flags,water_region,river_dx,river_dy
//! 0,0,1,0,road,,,
//! 4,2,0,0,,,,
//! 5,5,2,0,water,3,,
//! 6,5,2,0,river,,1,0
//! ```
//!
//! `flags` is a `|`-separated list of `water`, `ocean`, `town`, `river`,
//! `road`.  Empty trailing columns take defaults.
//!
//! # Portal CSV
//!
//! One row per attached cell; rows sharing `portal` build one portal.
//! `link` (optional) names another portal id to connect to.
//!
//! ```csv
//! portal,kind,x,y,owner,link,link_cost
//! 0,teleport,1,1,,1,20
//! 1,teleport,30,30,,,
//! 2,ladder,10,4,,,
//! 2,ladder,10,6,,,
//! ```
//!
//! # Shortcut CSV
//!
//! ```csv
//! from_x,from_y,to_x,to_y,cost
//! 3,3,40,3,60
//! ```

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use tn_core::{Cell, PortalId};

use crate::grid::{TerrainFlags, TerrainGrid, TerrainGridBuilder};
use crate::portal::{AreaKind, PortalGraph, PortalGraphBuilder, ShortcutSet};
use crate::TerrainError;

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CellRecord {
    x:            i32,
    y:            i32,
    #[serde(default)]
    weight:       Option<u8>,
    #[serde(default)]
    height:       Option<i16>,
    #[serde(default)]
    flags:        String,
    #[serde(default)]
    water_region: Option<u16>,
    #[serde(default)]
    river_dx:     Option<i8>,
    #[serde(default)]
    river_dy:     Option<i8>,
}

#[derive(Deserialize)]
struct PortalRecord {
    portal:    u32,
    kind:      String,
    x:         i32,
    y:         i32,
    #[serde(default)]
    owner:     Option<u32>,
    #[serde(default)]
    link:      Option<u32>,
    #[serde(default)]
    link_cost: Option<u32>,
}

#[derive(Deserialize)]
struct ShortcutRecord {
    from_x: i32,
    from_y: i32,
    to_x:   i32,
    to_y:   i32,
    cost:   u32,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a terrain grid from a cell CSV file.
///
/// `size` overrides the grid dimensions; otherwise the grid spans
/// `0..=max(x)` × `0..=max(y)`.
pub fn load_grid_csv(path: &Path, size: Option<(i32, i32)>) -> Result<TerrainGrid, TerrainError> {
    let file = std::fs::File::open(path)?;
    load_grid_reader(file, size)
}

/// Like [`load_grid_csv`] but accepts any `Read` source.
pub fn load_grid_reader<R: Read>(reader: R, size: Option<(i32, i32)>) -> Result<TerrainGrid, TerrainError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let rows: Vec<CellRecord> = csv_reader
        .deserialize()
        .collect::<Result<_, _>>()
        .map_err(|e| TerrainError::Parse(e.to_string()))?;

    let (width, height) = match size {
        Some(s) => s,
        None => rows
            .iter()
            .fold((0, 0), |(w, h), r| (w.max(r.x + 1), h.max(r.y + 1))),
    };
    let mut b = TerrainGridBuilder::new(width, height);

    for r in rows {
        let c = Cell::new(r.x, r.y);
        if !b.set_weight(c, r.weight.unwrap_or(1)) {
            return Err(TerrainError::OutOfBounds(c));
        }
        b.set_height(c, r.height.unwrap_or(0));
        let flags = TerrainFlags::parse_list(&r.flags)
            .map_err(|name| TerrainError::Parse(format!("unknown terrain flag {name:?} at {c}")))?;
        b.add_flags(c, flags);
        if let Some(region) = r.water_region {
            b.set_water(c, region);
        }
        if let (Some(dx), Some(dy)) = (r.river_dx, r.river_dy) {
            b.set_river(c, (dx, dy));
        }
    }
    Ok(b.build())
}

/// Load the portal graph from a portal CSV file.
pub fn load_portals_csv(path: &Path) -> Result<PortalGraph, TerrainError> {
    let file = std::fs::File::open(path)?;
    load_portals_reader(file)
}

/// Like [`load_portals_csv`] but accepts any `Read` source.
///
/// Portal ids in the file must be dense from 0; they are reassigned in
/// ascending order and links are resolved after all rows are read.
pub fn load_portals_reader<R: Read>(reader: R) -> Result<PortalGraph, TerrainError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    // Buffer by file id so rows may appear in any order.
    let mut by_portal: BTreeMap<u32, Vec<PortalRecord>> = BTreeMap::new();
    for result in csv_reader.deserialize::<PortalRecord>() {
        let row = result.map_err(|e| TerrainError::Parse(e.to_string()))?;
        by_portal.entry(row.portal).or_default().push(row);
    }

    let mut b = PortalGraphBuilder::new();
    let mut links: Vec<(PortalId, u32, Option<u32>)> = Vec::new();

    for (file_id, rows) in &by_portal {
        if *file_id as usize != b.len() {
            return Err(TerrainError::Parse(format!(
                "portal ids must be dense from 0; found {file_id} after {} portals",
                b.len()
            )));
        }
        let kind = AreaKind::parse(&rows[0].kind)
            .ok_or_else(|| TerrainError::Parse(format!("unknown portal kind {:?}", rows[0].kind)))?;
        let owner = rows.iter().find_map(|r| r.owner);
        let cells = rows.iter().map(|r| Cell::new(r.x, r.y)).collect();
        let id = b.add_portal(kind, cells, owner);
        for r in rows {
            if let Some(to) = r.link {
                links.push((id, to, r.link_cost));
            }
        }
    }

    for (from, to, cost) in links {
        let to = PortalId(to);
        if to.index() >= b.len() {
            return Err(TerrainError::PortalNotFound(to));
        }
        b.link(from, to, cost.unwrap_or(tn_core::ORTHOGONAL_STEP * 4))?;
    }

    Ok(b.build())
}

/// Load water-lane shortcuts from any `Read` source.
pub fn load_shortcuts_reader<R: Read>(reader: R) -> Result<ShortcutSet, TerrainError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut set = ShortcutSet::new();
    for result in csv_reader.deserialize::<ShortcutRecord>() {
        let r = result.map_err(|e| TerrainError::Parse(e.to_string()))?;
        set.add(Cell::new(r.from_x, r.from_y), Cell::new(r.to_x, r.to_y), r.cost);
    }
    Ok(set)
}
