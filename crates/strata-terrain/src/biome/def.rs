//! Biome definition: describes the properties of a single biome type.

use strata_voxel::BlockId;

use crate::vegetation::VegetationTable;

/// Full descriptor for a biome type.
#[derive(Clone, Debug)]
pub struct BiomeDef {
    /// Upper-case biome name (e.g., "TEMPERATE_RAIN_FOREST").
    pub name: String,
    /// Surface blocks, one of which is picked per column by dirt-variant noise.
    /// Fills the top layers of every column in the biome.
    pub dirt_blocks: Vec<BlockId>,
    /// Block filling the space between the ground and the water line, for
    /// submerged biomes.
    pub surface_block: Option<BlockId>,
    /// Multiplier applied to the raw height noise before quantization.
    pub max_height: f64,
    /// Display color (linear RGB).
    pub color: [f32; 3],
    /// Whether random-walk caves may carve columns of this biome.
    pub caves: bool,
    /// Trees and plants growing in this biome.
    pub vegetation: VegetationTable,
}

impl BiomeDef {
    /// Every block id this biome can place.
    pub fn referenced_blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.dirt_blocks
            .iter()
            .copied()
            .chain(self.surface_block)
            .chain(self.vegetation.referenced_blocks())
    }
}
