//! `TerrainMap` — everything the search reads about the world, in one
//! immutable bundle.

use tracing::debug;

use tn_core::Cell;

use crate::grid::TerrainGrid;
use crate::high::{HighGrid, HighGridParams};
use crate::portal::{PortalGraph, ShortcutSet};
use crate::{TerrainError, TerrainResult};

/// Fine grid, portal graph, shortcuts, and the precomputed high-level grid.
///
/// Built once per terrain revision and shared read-only (`Arc<TerrainMap>`)
/// by the search worker and the simulation.
pub struct TerrainMap {
    pub grid:      TerrainGrid,
    pub portals:   PortalGraph,
    pub shortcuts: ShortcutSet,
    pub high:      HighGrid,
    params:        HighGridParams,
}

impl TerrainMap {
    /// Validate the parts and precompute the high-level grid.
    ///
    /// # Errors
    ///
    /// - [`TerrainError::Config`] for an empty grid or a block size below 2.
    /// - [`TerrainError::EmptyPortal`] / [`TerrainError::OutOfBounds`] for
    ///   portals or shortcuts that do not sit on the grid.
    pub fn new(
        grid:      TerrainGrid,
        portals:   PortalGraph,
        shortcuts: ShortcutSet,
        params:    HighGridParams,
    ) -> TerrainResult<Self> {
        if grid.cell_count() == 0 {
            return Err(TerrainError::Config("terrain grid is empty".into()));
        }
        if params.block_size < 2 {
            return Err(TerrainError::Config(format!(
                "block size {} is below 2",
                params.block_size
            )));
        }
        for portal in portals.iter() {
            if portal.cells.is_empty() {
                return Err(TerrainError::EmptyPortal(portal.id));
            }
            check_cells(&grid, portal.cells.iter().copied())?;
        }
        check_cells(&grid, shortcuts.iter().flat_map(|s| [s.from, s.to]))?;

        let high = HighGrid::build(&grid, &portals, &shortcuts, params);
        debug!(
            width = grid.width(),
            height = grid.height(),
            blocks = high.block_count(),
            portals = portals.len(),
            shortcuts = shortcuts.len(),
            "terrain map built"
        );
        Ok(Self { grid, portals, shortcuts, high, params })
    }

    /// A map with no portals or shortcuts.
    pub fn from_grid(grid: TerrainGrid, params: HighGridParams) -> TerrainResult<Self> {
        Self::new(grid, PortalGraph::empty(), ShortcutSet::new(), params)
    }

    pub fn params(&self) -> HighGridParams {
        self.params
    }
}

fn check_cells(grid: &TerrainGrid, cells: impl Iterator<Item = Cell>) -> TerrainResult<()> {
    for c in cells {
        if !grid.in_bounds(c) {
            return Err(TerrainError::OutOfBounds(c));
        }
    }
    Ok(())
}
