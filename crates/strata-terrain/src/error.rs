//! Errors raised by the world generator.

use strata_config::ConfigError;
use strata_voxel::{ChunkAddress, ChunkSize, RegistryError};

use crate::biome::BiomeTableError;

/// Errors from building a [`TerrainGenerator`](crate::TerrainGenerator) or
/// filling a chunk. Construction errors are configuration defects.
#[derive(Debug, thiserror::Error)]
pub enum WorldGenError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("block registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("biome table error: {0}")]
    BiomeTable(#[from] BiomeTableError),
    /// Chunks are filled exactly once.
    #[error("chunk {0} was already generated")]
    ChunkAlreadyFilled(ChunkAddress),
    #[error("chunk size {actual:?} does not match the world chunk size {expected:?}")]
    ChunkSizeMismatch { expected: ChunkSize, actual: ChunkSize },
}
