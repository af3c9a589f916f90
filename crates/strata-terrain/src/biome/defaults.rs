//! The built-in biome set and its region partition.
//!
//! Height bands split the cube first (ocean, beach, lowland, upland,
//! highland, mountain); inside a band humidity picks the biome. Cold
//! climates override every band above the beach.

use strata_voxel::{BlockId, blocks};

use super::{BiomeDef, BiomeId, BiomeRegion, BiomeRegistry, BiomeTable, BiomeTableError, Span};
use crate::vegetation::{PlantKind, TreeKind, TreeStyle, VegetationTable};

/// Height band boundaries (normalized height).
const OCEAN_TOP: f64 = 0.248;
const BEACH_TOP: f64 = 0.255;
const LOWLAND_TOP: f64 = 0.3;
const UPLAND_TOP: f64 = 0.6;
const HIGHLAND_TOP: f64 = 0.8;
/// Climate below which land is polar.
const POLAR_CLIMATE: f64 = 0.25;

fn tree(style: TreeStyle, trunk: BlockId, leaves: BlockId, percent: f64, height: (i32, i32)) -> TreeKind {
    TreeKind {
        style,
        trunk,
        leaves,
        percent,
        height,
    }
}

fn plant(block: BlockId, percent: f64) -> PlantKind {
    PlantKind { block, percent }
}

fn meadow_plants() -> Vec<PlantKind> {
    vec![plant(blocks::TALL_GRASS, 0.85), plant(blocks::FLOWER, 0.15)]
}

fn broadleaf(tree_frequency: f64, plant_frequency: f64) -> VegetationTable {
    VegetationTable {
        tree_frequency,
        trees: vec![
            tree(TreeStyle::Wood, blocks::OAK_LOG, blocks::OAK_LEAVES, 0.7, (4, 8)),
            tree(TreeStyle::Wood, blocks::BIRCH_LOG, blocks::BIRCH_LEAVES, 0.3, (5, 8)),
        ],
        plant_frequency,
        plants: meadow_plants(),
    }
}

fn conifer(tree_frequency: f64, plant_frequency: f64) -> VegetationTable {
    VegetationTable {
        tree_frequency,
        trees: vec![tree(TreeStyle::Spruce, blocks::SPRUCE_LOG, blocks::SPRUCE_LEAVES, 1.0, (6, 10))],
        plant_frequency,
        plants: vec![plant(blocks::TALL_GRASS, 1.0)],
    }
}

fn desert() -> VegetationTable {
    VegetationTable {
        tree_frequency: 0.004,
        trees: vec![tree(TreeStyle::Cactus, blocks::CACTUS, blocks::CACTUS, 1.0, (2, 4))],
        plant_frequency: 0.006,
        plants: vec![plant(blocks::DEAD_BUSH, 1.0)],
    }
}

#[allow(clippy::too_many_arguments)]
fn biome(
    name: &str,
    dirt_blocks: Vec<BlockId>,
    surface_block: Option<BlockId>,
    max_height: f64,
    color: [f32; 3],
    caves: bool,
    vegetation: VegetationTable,
) -> BiomeDef {
    BiomeDef {
        name: name.to_string(),
        dirt_blocks,
        surface_block,
        max_height,
        color,
        caves,
        vegetation,
    }
}

fn region(height: Span, humidity: Span, climate: Span, biome: BiomeId) -> BiomeRegion {
    BiomeRegion {
        height,
        humidity,
        climate,
        biome,
    }
}

/// Builds the default biome table.
///
/// # Errors
///
/// Only fails if the built-in partition is edited into an invalid state.
pub fn default_biome_table() -> Result<BiomeTable, BiomeTableError> {
    let mut reg = BiomeRegistry::new();
    let grass = vec![blocks::GRASS_BLOCK];
    let forest_floor = vec![blocks::GRASS_BLOCK, blocks::GRASS_BLOCK, blocks::PODZOL];
    let sand = vec![blocks::SAND, blocks::RED_SAND];
    let snow = vec![blocks::SNOW_DIRT];

    let ocean = reg.register(biome(
        "OCEAN",
        vec![blocks::SAND, blocks::DIRT],
        Some(blocks::STILL_WATER),
        64.0,
        [0.02, 0.2, 0.6],
        false,
        VegetationTable::default(),
    ))?;
    let beach = reg.register(biome(
        "BEACH",
        vec![blocks::SAND],
        None,
        1.0,
        [0.9, 0.85, 0.6],
        false,
        VegetationTable::default(),
    ))?;
    let subtropical_desert = reg.register(biome(
        "SUBTROPICAL_DESERT",
        sand.clone(),
        None,
        6.0,
        [0.91, 0.87, 0.6],
        true,
        desert(),
    ))?;
    let grassland = reg.register(biome(
        "GRASSLAND",
        grass.clone(),
        None,
        8.0,
        [0.53, 0.67, 0.33],
        true,
        broadleaf(0.002, 0.5),
    ))?;
    let tropical_seasonal_forest = reg.register(biome(
        "TROPICAL_SEASONAL_FOREST",
        forest_floor.clone(),
        None,
        12.0,
        [0.33, 0.6, 0.27],
        true,
        VegetationTable {
            tree_frequency: 0.02,
            trees: vec![tree(TreeStyle::Acacia, blocks::ACACIA_LOG, blocks::ACACIA_LEAVES, 1.0, (4, 6))],
            plant_frequency: 0.3,
            plants: meadow_plants(),
        },
    ))?;
    let tropical_rain_forest = reg.register(biome(
        "TROPICAL_RAIN_FOREST",
        forest_floor.clone(),
        None,
        16.0,
        [0.2, 0.47, 0.33],
        true,
        broadleaf(0.06, 0.4),
    ))?;
    let temperate_desert = reg.register(biome(
        "TEMPERATE_DESERT",
        sand,
        None,
        6.0,
        [0.89, 0.91, 0.79],
        true,
        desert(),
    ))?;
    let temperate_deciduous_forest = reg.register(biome(
        "TEMPERATE_DECIDUOUS_FOREST",
        forest_floor.clone(),
        None,
        12.0,
        [0.4, 0.58, 0.35],
        true,
        broadleaf(0.03, 0.3),
    ))?;
    let temperate_rain_forest = reg.register(biome(
        "TEMPERATE_RAIN_FOREST",
        forest_floor,
        None,
        16.0,
        [0.27, 0.53, 0.33],
        true,
        broadleaf(0.05, 0.35),
    ))?;
    let shrubland = reg.register(biome(
        "SHRUBLAND",
        grass.clone(),
        None,
        20.0,
        [0.53, 0.6, 0.47],
        true,
        VegetationTable {
            tree_frequency: 0.01,
            trees: vec![tree(TreeStyle::Stump, blocks::OAK_LOG, blocks::OAK_LEAVES, 1.0, (1, 2))],
            plant_frequency: 0.1,
            plants: vec![plant(blocks::TALL_GRASS, 0.7), plant(blocks::DEAD_BUSH, 0.3)],
        },
    ))?;
    let taiga = reg.register(biome(
        "TAIGA",
        grass,
        None,
        28.0,
        [0.6, 0.67, 0.47],
        true,
        conifer(0.03, 0.1),
    ))?;
    let scorched = reg.register(biome(
        "SCORCHED",
        vec![blocks::STONE],
        None,
        35.0,
        [0.33, 0.33, 0.33],
        true,
        VegetationTable::default(),
    ))?;
    let bare = reg.register(biome(
        "BARE",
        vec![blocks::DIRT, blocks::STONE],
        None,
        35.0,
        [0.53, 0.53, 0.53],
        true,
        VegetationTable::default(),
    ))?;
    let tundra = reg.register(biome(
        "TUNDRA",
        snow.clone(),
        None,
        35.0,
        [0.73, 0.73, 0.67],
        true,
        conifer(0.004, 0.05),
    ))?;
    let snow_biome = reg.register(biome(
        "SNOW",
        snow,
        None,
        40.0,
        [1.0, 1.0, 1.0],
        true,
        VegetationTable::default(),
    ))?;

    let all = Span::FULL;
    let land = Span::new(BEACH_TOP, 1.0);
    let lowland = Span::new(BEACH_TOP, LOWLAND_TOP);
    let upland = Span::new(LOWLAND_TOP, UPLAND_TOP);
    let highland = Span::new(UPLAND_TOP, HIGHLAND_TOP);
    let mountain = Span::new(HIGHLAND_TOP, 1.0);
    let polar = Span::new(0.0, POLAR_CLIMATE);

    let regions = vec![
        region(Span::new(0.0, OCEAN_TOP), all, all, ocean),
        region(Span::new(OCEAN_TOP, BEACH_TOP), all, all, beach),
        // Cold climates
        region(land, Span::new(0.0, 0.5), polar, tundra),
        region(land, Span::new(0.5, 1.0), polar, taiga),
        // Lowland
        region(lowland, Span::new(0.0, 0.16), all, subtropical_desert),
        region(lowland, Span::new(0.16, 0.33), all, grassland),
        region(lowland, Span::new(0.33, 0.66), all, tropical_seasonal_forest),
        region(lowland, Span::new(0.66, 1.0), all, tropical_rain_forest),
        // Upland
        region(upland, Span::new(0.0, 0.16), all, temperate_desert),
        region(upland, Span::new(0.16, 0.5), all, grassland),
        region(upland, Span::new(0.5, 0.83), all, temperate_deciduous_forest),
        region(upland, Span::new(0.83, 1.0), all, temperate_rain_forest),
        // Highland
        region(highland, Span::new(0.0, 0.33), all, temperate_desert),
        region(highland, Span::new(0.33, 0.66), all, shrubland),
        region(highland, Span::new(0.66, 1.0), all, taiga),
        // Mountain
        region(mountain, Span::new(0.0, 0.1), all, scorched),
        region(mountain, Span::new(0.1, 0.2), all, bare),
        region(mountain, Span::new(0.2, 0.5), all, tundra),
        region(mountain, Span::new(0.5, 1.0), all, snow_biome),
    ];

    BiomeTable::new(reg, regions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_total() {
        let table = default_biome_table().expect("default biome table must be total");
        assert_eq!(table.registry().len(), 15);
    }

    #[test]
    fn test_default_blocks_are_registered() {
        let table = default_biome_table().unwrap();
        let registry = blocks::standard_registry().unwrap();
        table
            .validate_blocks(&registry)
            .expect("every default biome block is in the standard registry");
    }

    #[test]
    fn test_known_lookups() {
        let table = default_biome_table().unwrap();
        let name = |h, m, c| table.lookup_def(h, m, c).name.as_str();
        assert_eq!(name(0.1, 0.5, 0.5), "OCEAN");
        assert_eq!(name(0.25, 0.5, 0.5), "BEACH");
        assert_eq!(name(0.27, 0.1, 0.9), "SUBTROPICAL_DESERT");
        assert_eq!(name(0.4, 0.6, 0.9), "TEMPERATE_DECIDUOUS_FOREST");
        assert_eq!(name(0.7, 0.9, 0.9), "TAIGA");
        assert_eq!(name(1.0, 1.0, 1.0), "SNOW");
        assert_eq!(name(0.4, 0.2, 0.1), "TUNDRA", "polar climate overrides the band");
    }

    #[test]
    fn test_ocean_carries_water_and_no_caves() {
        let table = default_biome_table().unwrap();
        let ocean = table.lookup_def(0.0, 0.0, 0.0);
        assert_eq!(ocean.surface_block, Some(blocks::STILL_WATER));
        assert!(!ocean.caves);
        assert!(table.lookup_def(0.5, 0.5, 0.5).caves);
    }

    #[test]
    fn test_vegetation_percentages_sum_to_one() {
        let table = default_biome_table().unwrap();
        for (_, def) in table.registry().iter() {
            let veg = &def.vegetation;
            if !veg.trees.is_empty() {
                let sum: f64 = veg.trees.iter().map(|t| t.percent).sum();
                assert!((sum - 1.0).abs() < 1e-9, "{} tree percentages sum to {sum}", def.name);
            }
            if !veg.plants.is_empty() {
                let sum: f64 = veg.plants.iter().map(|p| p.percent).sum();
                assert!((sum - 1.0).abs() < 1e-9, "{} plant percentages sum to {sum}", def.name);
            }
        }
    }
}
