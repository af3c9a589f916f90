//! Voxel storage for generated worlds: block registry, chunk addressing and the chunk container.

pub mod address;
pub mod blocks;
pub mod chunk;
pub mod registry;

pub use address::{ChunkAddress, ColumnAddress};
pub use chunk::{BlockMeta, Chunk, ChunkSize, MetadataError, Strides};
pub use registry::{BlockDef, BlockId, BlockKind, BlockRegistry, DropRule, RegistryError, Transparency};
