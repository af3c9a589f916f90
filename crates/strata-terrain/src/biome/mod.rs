//! Biome system: registry, region table lookup, and the default biome set.
//!
//! Assigns biomes to columns from normalized height, humidity and climate
//! using an ordered partition of the parameter cube.

mod def;
mod defaults;
mod registry;
mod table;

pub use def::BiomeDef;
pub use defaults::default_biome_table;
pub use registry::{BiomeId, BiomeRegistry};
pub use table::{BiomeRegion, BiomeTable, BiomeTableError, Span};
