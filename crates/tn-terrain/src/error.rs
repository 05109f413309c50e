//! Terrain-subsystem error type.

use thiserror::Error;

use tn_core::{Cell, PortalId};

/// Errors produced while building or loading a [`TerrainMap`](crate::TerrainMap).
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("cell {0} lies outside the terrain grid")]
    OutOfBounds(Cell),

    #[error("portal {0} has no attached cells")]
    EmptyPortal(PortalId),

    #[error("portal {0} not found")]
    PortalNotFound(PortalId),

    #[error("invalid terrain parameters: {0}")]
    Config(String),

    #[error("terrain parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TerrainResult<T> = Result<T, TerrainError>;
