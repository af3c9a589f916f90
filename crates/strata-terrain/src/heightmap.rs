//! Per-column height, biome and vegetation maps.
//!
//! A column map is built in two stages:
//!
//! 1. **Raw**: every cell is sampled from the noise field on its own
//!    ([`ColumnSampler`]).
//! 2. **Blended**: cells near a biome border are averaged over a square
//!    window of raw heights that may reach into the eight neighbouring
//!    columns, then vegetation is placed on the blended heights.
//!
//! Both stages are pure functions of the world seed and the column
//! address, so a blended map is identical whichever chunk asked for it
//! first. [`HeightMapCache`] memoizes both stages.

use std::sync::Arc;

use strata_config::TerrainConfig;
use strata_voxel::{BlockId, ChunkSize, ColumnAddress, blocks};

use crate::biome::{BiomeId, BiomeTable};
use crate::cache::BoundedCache;
use crate::noise_field::{NoiseField, variant_index};
use crate::seed::{SeededRandom, det_pow};
use crate::vegetation::{PlantPlacement, TreePlacement, place_vegetation};

/// Normalizing denominator for biome lookups by height.
const HEIGHT_NORMALIZER: f64 = 255.0;
/// Height scale used for the provisional biome lookup.
const PROVISIONAL_SCALE: f64 = 64.0;

/// Resolved values for one `(x, z)` column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapCell {
    /// Surface height: the first voxel above the ground.
    pub height: i32,
    pub humidity: f64,
    pub climate: f64,
    pub biome: BiomeId,
    /// Dirt variant chosen for this column.
    pub dirt_block: BlockId,
}

/// Samples individual cells from the noise field.
pub struct ColumnSampler {
    noise: Arc<NoiseField>,
    biomes: Arc<BiomeTable>,
    terrain: TerrainConfig,
}

impl ColumnSampler {
    pub fn new(noise: Arc<NoiseField>, biomes: Arc<BiomeTable>, terrain: TerrainConfig) -> Self {
        Self {
            noise,
            biomes,
            terrain,
        }
    }

    /// Computes the unblended cell at world column `(x, z)`.
    ///
    /// The biome is resolved twice: a provisional lookup supplies the
    /// max-height multiplier, and the final lookup uses the scaled height.
    /// Heights are truncated, never rounded.
    pub fn sample(&self, x: i32, z: i32) -> MapCell {
        let (fx, fz) = (x as f64, z as f64);
        let t = &self.terrain;
        let noise_value = self.noise.height(fx, fz);
        let humidity = self.noise.humidity(fx, fz);
        let climate = self.noise.climate(fx, fz);

        let provisional = self.biomes.lookup_def(
            (noise_value * PROVISIONAL_SCALE + t.base_height) / HEIGHT_NORMALIZER,
            humidity,
            climate,
        );
        let value = (noise_value * provisional.max_height + t.base_height)
            .trunc()
            .clamp(t.min_elevation as f64, t.max_elevation as f64);
        let biome = self.biomes.lookup(value / HEIGHT_NORMALIZER, humidity, climate);

        let height = shape_height(value, t);

        let def = self.biomes.def(biome);
        let variant = variant_index(def.dirt_blocks.len(), self.noise.dirt_variant(fx, fz));
        let dirt_block = def.dirt_blocks.get(variant).copied().unwrap_or(blocks::STONE);

        MapCell {
            height,
            humidity,
            climate,
            biome,
            dirt_block,
        }
    }

    /// Samples every cell of a column, `z`-major.
    pub fn sample_column(&self, column: ColumnAddress, size: ChunkSize) -> Vec<MapCell> {
        let (ox, oz) = column.origin(size);
        let mut cells = Vec::with_capacity((size.x * size.z) as usize);
        for z in 0..size.z as i32 {
            for x in 0..size.x as i32 {
                cells.push(self.sample(ox + x, oz + z));
            }
        }
        cells
    }

    pub fn biomes(&self) -> &BiomeTable {
        &self.biomes
    }

    pub fn terrain(&self) -> &TerrainConfig {
        &self.terrain
    }
}

/// Bends a clamped elevation around the water line: basins sink linearly,
/// land rises on a power curve that steepens with altitude.
fn shape_height(mut value: f64, t: &TerrainConfig) -> i32 {
    let water = t.water_line as f64;
    let diff = value - water;
    if diff < 0.0 {
        value -= (water - value) * t.below_water_factor - t.below_water_bias;
    } else {
        value = water + det_pow(diff, 1.0 + diff / t.curve_divisor);
    }
    (value.trunc() as i32).min(t.max_elevation)
}

/// Unblended cells of one column.
pub struct RawMap {
    cells: Vec<MapCell>,
}

impl RawMap {
    pub fn cells(&self) -> &[MapCell] {
        &self.cells
    }
}

/// Blended cells and vegetation of one chunk column.
#[derive(Debug)]
pub struct HeightMap {
    column: ColumnAddress,
    size: ChunkSize,
    cells: Vec<MapCell>,
    trees: Vec<TreePlacement>,
    plants: Vec<PlantPlacement>,
}

impl HeightMap {
    pub fn column(&self) -> ColumnAddress {
        self.column
    }

    pub fn cells(&self) -> &[MapCell] {
        &self.cells
    }

    /// Cell at local `(x, z)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates lie outside the column footprint.
    pub fn cell(&self, x: usize, z: usize) -> &MapCell {
        &self.cells[z * self.size.x as usize + x]
    }

    /// Blended surface height at local `(x, z)`.
    pub fn height(&self, x: usize, z: usize) -> i32 {
        self.cell(x, z).height
    }

    /// Trees rooted in this column, in world coordinates.
    pub fn trees(&self) -> &[TreePlacement] {
        &self.trees
    }

    /// Plants rooted in this column, in world coordinates.
    pub fn plants(&self) -> &[PlantPlacement] {
        &self.plants
    }
}

/// 3x3 raw maps around a column, indexed by world column.
struct RawNeighborhood {
    origin: (i32, i32),
    size: ChunkSize,
    maps: Vec<Arc<RawMap>>,
}

impl RawNeighborhood {
    fn cell(&self, wx: i32, wz: i32) -> &MapCell {
        let (sx, sz) = (self.size.x as i32, self.size.z as i32);
        let (rx, rz) = (wx - self.origin.0 + sx, wz - self.origin.1 + sz);
        let (cx, cz) = (rx.div_euclid(sx), rz.div_euclid(sz));
        let (lx, lz) = (rx.rem_euclid(sx), rz.rem_euclid(sz));
        &self.maps[(cz * 3 + cx) as usize].cells[(lz * sx + lx) as usize]
    }
}

/// Blends biome borders of the center column of `raw`.
fn blend(raw: &RawNeighborhood, radius: i32) -> Vec<MapCell> {
    let (sx, sz) = (raw.size.x as i32, raw.size.z as i32);
    let (ox, oz) = raw.origin;
    let mut cells = Vec::with_capacity((sx * sz) as usize);

    for z in 0..sz {
        for x in 0..sx {
            let (wx, wz) = (ox + x, oz + z);
            let mut cell = *raw.cell(wx, wz);

            let mut border = false;
            let mut sum = 0i64;
            let mut count = 0i64;
            for dz in -radius..=radius {
                for dx in -radius..=radius {
                    let other = raw.cell(wx + dx, wz + dz);
                    border |= other.biome != cell.biome;
                    sum += other.height as i64;
                    count += 1;
                }
            }
            if border {
                cell.height = (sum as f64 / count as f64).trunc() as i32;
            }
            cells.push(cell);
        }
    }
    cells
}

/// The 3x3 blended maps around a chunk column.
pub struct Neighborhood {
    center: ColumnAddress,
    size: ChunkSize,
    maps: Vec<Arc<HeightMap>>,
}

impl Neighborhood {
    /// Map at column offset `(dx, dz)`, each in `-1..=1`.
    pub fn map(&self, dx: i32, dz: i32) -> &HeightMap {
        &self.maps[((dz + 1) * 3 + dx + 1) as usize]
    }

    pub fn center(&self) -> &HeightMap {
        self.map(0, 0)
    }

    /// Cell at world `(x, z)`, or `None` outside the nine columns.
    pub fn cell_at(&self, x: i32, z: i32) -> Option<&MapCell> {
        let column = ColumnAddress::containing(x, z, self.size);
        let (dx, dz) = (column.x - self.center.x, column.z - self.center.z);
        if dx.abs() > 1 || dz.abs() > 1 {
            return None;
        }
        let (ox, oz) = column.origin(self.size);
        Some(self.map(dx, dz).cell((x - ox) as usize, (z - oz) as usize))
    }

    /// Trees rooted anywhere in the nine columns.
    pub fn trees(&self) -> impl Iterator<Item = &TreePlacement> {
        self.maps.iter().flat_map(|m| m.trees.iter())
    }

    pub fn maps(&self) -> &[Arc<HeightMap>] {
        &self.maps
    }
}

/// Memoizes raw and blended column maps.
pub struct HeightMapCache {
    seed: String,
    size: ChunkSize,
    sampler: ColumnSampler,
    raw: BoundedCache<ColumnAddress, RawMap>,
    blended: BoundedCache<ColumnAddress, HeightMap>,
}

impl HeightMapCache {
    pub fn new(seed: &str, size: ChunkSize, sampler: ColumnSampler, capacity: usize) -> Self {
        Self {
            seed: seed.to_string(),
            size,
            sampler,
            raw: BoundedCache::new("raw_height_map", capacity),
            blended: BoundedCache::new("height_map", capacity),
        }
    }

    /// Unblended map of a column.
    pub fn raw(&self, column: ColumnAddress) -> Arc<RawMap> {
        self.raw.get_or_insert_with(column, || RawMap {
            cells: self.sampler.sample_column(column, self.size),
        })
    }

    /// Blended map of a column with its vegetation.
    pub fn get(&self, column: ColumnAddress) -> Arc<HeightMap> {
        self.blended.get_or_insert_with(column, || self.build(column))
    }

    fn build(&self, column: ColumnAddress) -> HeightMap {
        let mut maps = Vec::with_capacity(9);
        for dz in -1..=1 {
            for dx in -1..=1 {
                maps.push(self.raw(column.offset(dx, dz)));
            }
        }
        let raw = RawNeighborhood {
            origin: column.origin(self.size),
            size: self.size,
            maps,
        };
        let terrain = self.sampler.terrain();
        let cells = blend(&raw, terrain.smooth_radius as i32);

        let mut rnd = SeededRandom::new(&self.seed, format!("veg{column}"));
        let (trees, plants) = place_vegetation(
            &cells,
            self.size.x as usize,
            raw.origin,
            self.sampler.biomes(),
            terrain.water_line,
            &mut rnd,
        );

        HeightMap {
            column,
            size: self.size,
            cells,
            trees,
            plants,
        }
    }

    /// Blended maps of a column and its eight neighbours.
    pub fn neighborhood(&self, center: ColumnAddress) -> Neighborhood {
        let mut maps = Vec::with_capacity(9);
        for dz in -1..=1 {
            for dx in -1..=1 {
                maps.push(self.get(center.offset(dx, dz)));
            }
        }
        Neighborhood {
            center,
            size: self.size,
            maps,
        }
    }

    pub fn sampler(&self) -> &ColumnSampler {
        &self.sampler
    }

    /// Number of cached blended maps.
    pub fn len(&self) -> usize {
        self.blended.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blended.is_empty()
    }

    /// Drops every cached map.
    pub fn clear(&self) {
        self.raw.clear();
        self.blended.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::default_biome_table;

    const SIZE: ChunkSize = ChunkSize::new(16, 40, 16);

    fn cache(seed: &str, capacity: usize) -> HeightMapCache {
        let sampler = ColumnSampler::new(
            Arc::new(NoiseField::new(seed)),
            Arc::new(default_biome_table().unwrap()),
            TerrainConfig::default(),
        );
        HeightMapCache::new(seed, SIZE, sampler, capacity)
    }

    #[test]
    fn test_heights_within_bounds() {
        let cache = cache("test", 64);
        let terrain = TerrainConfig::default();
        let map = cache.get(ColumnAddress::new(0, 0));
        assert_eq!(map.cells().len(), 256);
        for cell in map.cells() {
            assert!(cell.height <= terrain.max_elevation, "height {} above max", cell.height);
            assert!(cell.height > -terrain.water_line, "height {} below the deepest basin", cell.height);
        }
    }

    #[test]
    fn test_shape_height_fixed_points() {
        let t = TerrainConfig::default();
        // Basins: v - ((63 - v) * 0.65 - 1.5), truncated toward zero.
        assert_eq!(shape_height(4.0, &t), -32);
        assert_eq!(shape_height(10.0, &t), -22);
        assert_eq!(shape_height(40.0, &t), 26);
        assert_eq!(shape_height(62.0, &t), 62);
        // Land: 63 + d^(1 + d / 64).
        assert_eq!(shape_height(63.0, &t), 63);
        assert_eq!(shape_height(67.0, &t), 67);
        assert_eq!(shape_height(71.0, &t), 73);
        assert_eq!(shape_height(95.0, &t), 244);
        assert_eq!(shape_height(96.0, &t), 255, "clamped to the maximum elevation");
        assert_eq!(shape_height(255.0, &t), 255);
    }

    #[test]
    fn test_sample_follows_height_formula() {
        let noise = NoiseField::new("test");
        let biomes = default_biome_table().unwrap();
        let sampler = ColumnSampler::new(
            Arc::new(NoiseField::new("test")),
            Arc::new(default_biome_table().unwrap()),
            TerrainConfig::default(),
        );
        let mut basins = 0;
        for i in 0..1600 {
            let (x, z) = ((i % 40) * 97 - 2000, (i / 40) * 89 - 2000);
            let (fx, fz) = (x as f64, z as f64);
            let v = noise.height(fx, fz);
            let (hum, cli) = (noise.humidity(fx, fz), noise.climate(fx, fz));
            let provisional = biomes.lookup_def((v * 64.0 + 68.0) / 255.0, hum, cli);
            let elevation = (v * provisional.max_height + 68.0).trunc().clamp(4.0, 255.0);
            let expected = if elevation < 63.0 {
                elevation - ((63.0 - elevation) * 0.65 - 1.5)
            } else {
                63.0 + det_pow(elevation - 63.0, 1.0 + (elevation - 63.0) / 64.0)
            };
            let expected = (expected.trunc() as i32).min(255);

            let cell = sampler.sample(x, z);
            assert_eq!(cell.height, expected, "height at ({x}, {z})");
            assert_eq!(cell.biome, biomes.lookup(elevation / 255.0, hum, cli), "biome at ({x}, {z})");
            if cell.height < 63 {
                basins += 1;
            }
        }
        assert!(basins > 0, "the sample should include columns below the water line");
    }

    #[test]
    fn test_sample_is_pure() {
        let a = cache("test", 64);
        let b = cache("test", 64);
        for i in -20..20 {
            assert_eq!(a.sampler().sample(i * 7, i * -3), b.sampler().sample(i * 7, i * -3));
        }
    }

    #[test]
    fn test_blended_map_independent_of_access_order() {
        let first = cache("order", 64);
        first.get(ColumnAddress::new(1, 0));
        first.get(ColumnAddress::new(-1, 2));
        let warm = first.get(ColumnAddress::new(0, 1));

        let second = cache("order", 64);
        let cold = second.get(ColumnAddress::new(0, 1));
        assert_eq!(warm.cells(), cold.cells());
        assert_eq!(warm.trees(), cold.trees());
        assert_eq!(warm.plants(), cold.plants());
    }

    #[test]
    fn test_blending_only_touches_biome_borders() {
        let cache = cache("border", 64);
        let column = ColumnAddress::new(3, -2);
        let raw = cache.raw(column);
        let blended = cache.get(column);
        for (r, b) in raw.cells().iter().zip(blended.cells()) {
            assert_eq!(r.biome, b.biome, "blending never changes the biome");
            assert_eq!(r.dirt_block, b.dirt_block);
        }
    }

    #[test]
    fn test_neighborhood_cell_lookup() {
        let cache = cache("test", 64);
        let hood = cache.neighborhood(ColumnAddress::new(0, 0));
        let west = cache.get(ColumnAddress::new(-1, 0));
        assert_eq!(hood.cell_at(-1, 5), Some(west.cell(15, 5)));
        assert_eq!(hood.cell_at(3, 4), Some(hood.center().cell(3, 4)));
        assert!(hood.cell_at(40, 0).is_none(), "outside the 3x3 is no data");
    }

    #[test]
    fn test_vegetation_rooted_on_surface() {
        let cache = cache("veg", 64);
        for cx in 0..4 {
            let map = cache.get(ColumnAddress::new(cx, 0));
            let (ox, oz) = map.column().origin(SIZE);
            for tree in map.trees() {
                let cell = map.cell((tree.pos.x - ox) as usize, (tree.pos.z - oz) as usize);
                assert_eq!(tree.pos.y, cell.height);
                assert!(tree.pos.y > TerrainConfig::default().water_line);
            }
        }
    }

    #[test]
    fn test_capacity_bounds_cache() {
        let cache = cache("evict", 4);
        for x in 0..10 {
            cache.get(ColumnAddress::new(x, 0));
        }
        assert!(cache.len() <= 5, "cache holds {} maps over capacity 4", cache.len());
    }
}
