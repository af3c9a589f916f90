//! Procedural voxel terrain: seeded noise, biome lookup, blended height maps,
//! cave networks, abandoned mines and the chunk generation pipeline.

mod async_generation;
mod cache;
mod cave;
mod error;
mod generator;
mod heightmap;
mod mine;
mod noise_field;
mod ore;
mod seed;
mod vegetation;

pub mod biome;

pub use async_generation::{AsyncChunkGenerator, GeneratedChunk};
pub use biome::{BiomeDef, BiomeId, BiomeRegistry, BiomeTable, BiomeTableError, default_biome_table};
pub use cache::BoundedCache;
pub use cave::{Cave, CaveNetwork, CavePoint, CaveView};
pub use error::WorldGenError;
pub use generator::{CarveMask, TerrainGenerator};
pub use heightmap::{ColumnSampler, HeightMap, HeightMapCache, MapCell, Neighborhood, RawMap};
pub use mine::{
    BoxFill, BoxOp, Direction, MineIndex, MineLayout, MineNode, MineStructure, NodeKind, node_template,
    template_blocks,
};
pub use noise_field::NoiseField;
pub use ore::{DensityChannel, OreDistribution, OreDistributor, default_ore_distributions};
pub use seed::{RandomSource, SeededRandom, det_pow, det_sqrt, hash_chunk};
pub use vegetation::{
    PlantKind, PlantPlacement, TreeKind, TreePlacement, TreeStyle, VegetationTable, place_vegetation, stamp_tree,
};
