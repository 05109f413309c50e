use thiserror::Error;

use tn_core::CoreError;
use tn_terrain::TerrainError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("pathfinder configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Terrain(#[from] TerrainError),

    #[error("failed to spawn the pathfinder worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
