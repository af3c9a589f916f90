//! Chunk generation pipeline.
//!
//! [`TerrainGenerator`] owns the per-world state (noise, tables and the
//! height map, cave and mine caches) and fills one chunk at a time:
//!
//! 1. resolve the 3x3 blended height maps around the chunk column;
//! 2. collect the caves reaching the chunk and build its carve mask, which
//!    leaves voxels near tree roots and in cave-free biomes intact;
//! 3. fill bedrock, stone, ore bands, biome dirt layers and standing water;
//! 4. place plants and stamp trees from all nine columns;
//! 5. overlay mine nodes, which overwrite anything beneath them.
//!
//! Every step reads only per-world immutable state or caches whose values
//! are pure functions of `(seed, address)`, so chunks can be generated in
//! any order on any thread.

use std::sync::Arc;
use std::time::Instant;

use glam::{DVec3, IVec3};
use strata_config::Config;
use strata_voxel::{BlockId, BlockRegistry, Chunk, ChunkAddress, ChunkSize, Strides, blocks};
use tracing::{debug, info};

use crate::biome::{BiomeTable, default_biome_table};
use crate::cave::{CaveNetwork, CaveView};
use crate::error::WorldGenError;
use crate::heightmap::{ColumnSampler, HeightMapCache, Neighborhood};
use crate::mine::MineIndex;
use crate::noise_field::NoiseField;
use crate::ore::{OreDistribution, OreDistributor, default_ore_distributions};
use crate::seed::{RandomSource, SeededRandom};
use crate::vegetation::stamp_tree;

/// Voxels of one chunk that caves turn into air.
pub struct CarveMask {
    origin: IVec3,
    size: ChunkSize,
    strides: Strides,
    carved: Vec<bool>,
}

impl CarveMask {
    fn new(origin: IVec3, size: ChunkSize) -> Self {
        Self {
            origin,
            size,
            strides: Strides::for_size(size),
            carved: vec![false; size.volume()],
        }
    }

    fn index(&self, world: IVec3) -> Option<usize> {
        let local = world - self.origin;
        let inside = local.cmpge(IVec3::ZERO).all() && local.cmplt(self.size.as_ivec3()).all();
        inside.then(|| self.strides.index(local.x as usize, local.y as usize, local.z as usize))
    }

    /// Whether a cave carves the voxel. Positions outside the chunk are
    /// never carved.
    pub fn is_carved(&self, world: IVec3) -> bool {
        self.index(world).is_some_and(|i| self.carved[i])
    }

    /// Number of carved voxels.
    pub fn count(&self) -> usize {
        self.carved.iter().filter(|c| **c).count()
    }
}

/// Per-world chunk generator.
pub struct TerrainGenerator {
    config: Config,
    size: ChunkSize,
    registry: Arc<BlockRegistry>,
    biomes: Arc<BiomeTable>,
    noise: Arc<NoiseField>,
    heights: HeightMapCache,
    caves: CaveNetwork,
    mines: MineIndex,
    ores: OreDistributor,
}

impl TerrainGenerator {
    /// Builds a generator with the standard block set, the default biome
    /// table and the default ore bands.
    ///
    /// # Errors
    ///
    /// Any [`WorldGenError`] construction variant; all of them are
    /// configuration defects.
    pub fn new(config: &Config) -> Result<Self, WorldGenError> {
        Self::with_tables(
            config,
            blocks::standard_registry()?,
            default_biome_table()?,
            default_ore_distributions(),
        )
    }

    /// Builds a generator from explicit tables, validating every block id
    /// they reference against `registry`.
    pub fn with_tables(
        config: &Config,
        registry: BlockRegistry,
        biomes: BiomeTable,
        ores: Vec<OreDistribution>,
    ) -> Result<Self, WorldGenError> {
        config.validate()?;
        biomes.validate_blocks(&registry)?;

        let seed = config.world.seed.as_str();
        let (x, y, z) = config.world.chunk_size;
        let size = ChunkSize::new(x, y, z);
        let noise = Arc::new(NoiseField::new(seed));
        let biomes = Arc::new(biomes);

        let ores = OreDistributor::new(Arc::clone(&noise), ores);
        registry.validate_ids(ores.referenced_blocks())?;

        let mines = MineIndex::new(seed, size, config.mines.clone(), config.cache.mine_capacity);
        if config.mines.enabled {
            registry.validate_ids(mines.referenced_blocks())?;
        }

        let sampler = ColumnSampler::new(Arc::clone(&noise), Arc::clone(&biomes), config.terrain.clone());
        let heights = HeightMapCache::new(seed, size, sampler, config.cache.height_map_capacity);
        let caves = CaveNetwork::new(seed, size, config.caves.clone(), config.cache.cave_capacity);

        info!(
            seed,
            chunk_size = ?(x, y, z),
            biomes = biomes.registry().len(),
            blocks = registry.len(),
            "Terrain generator ready"
        );

        Ok(Self {
            config: config.clone(),
            size,
            registry: Arc::new(registry),
            biomes,
            noise,
            heights,
            caves,
            mines,
            ores,
        })
    }

    /// Generates the chunk at `address`.
    pub fn generate(&self, address: ChunkAddress) -> Chunk {
        let mut chunk = Chunk::new(address, self.size);
        self.populate(&mut chunk);
        chunk
    }

    /// Fills an empty chunk created elsewhere.
    ///
    /// # Errors
    ///
    /// [`WorldGenError::ChunkAlreadyFilled`] if the chunk was generated
    /// before, [`WorldGenError::ChunkSizeMismatch`] if its dimensions differ
    /// from the world's.
    pub fn fill(&self, chunk: &mut Chunk) -> Result<(), WorldGenError> {
        if chunk.is_generated() {
            return Err(WorldGenError::ChunkAlreadyFilled(chunk.address()));
        }
        if chunk.size() != self.size {
            return Err(WorldGenError::ChunkSizeMismatch {
                expected: self.size,
                actual: chunk.size(),
            });
        }
        self.populate(chunk);
        Ok(())
    }

    fn populate(&self, chunk: &mut Chunk) {
        let start = Instant::now();
        let address = chunk.address();

        let hood = self.heights.neighborhood(address.column());
        let views = self.caves.neighbors(address, self.config.caves.neighbor_radius);
        let mask = self.carve_mask(address, &hood, &views);

        self.fill_terrain(chunk, &hood, &mask);
        self.place_vegetation(chunk, &hood);
        if self.config.mines.enabled {
            self.mines.for_column(address.column()).fill(chunk);
        }
        chunk.mark_generated();

        debug!(
            %address,
            caves = views.len(),
            carved = mask.count(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Chunk generated"
        );
    }

    /// Computes which voxels of the chunk at `address` the given caves
    /// carve.
    ///
    /// A voxel is carved when it lies strictly inside some cave point,
    /// above bedrock, in a biome that allows caves, farther than the
    /// protection radius from every tree root of the neighbourhood, and
    /// not the ground directly under a plant.
    pub fn carve_mask(&self, address: ChunkAddress, hood: &Neighborhood, views: &[CaveView]) -> CarveMask {
        let origin = address.origin(self.size);
        let extent = self.size.as_ivec3() - IVec3::ONE;
        let mut mask = CarveMask::new(origin, self.size);
        let radius = self.config.caves.protection_radius;

        let lo = origin.as_dvec3();
        let hi = (origin + extent).as_dvec3();
        let roots: Vec<DVec3> = hood
            .trees()
            .map(|t| t.pos.as_dvec3())
            .filter(|r| r.clamp(lo, hi).distance(*r) < radius)
            .collect();
        let supports: Vec<IVec3> = hood
            .maps()
            .iter()
            .flat_map(|m| m.plants())
            .map(|p| p.pos - IVec3::Y)
            .filter(|s| mask.index(*s).is_some())
            .collect();

        for view in views {
            for point in view.points() {
                let (min, max) = point.voxel_bounds();
                let (min, max) = (min.max(origin), max.min(origin + extent));
                for y in min.y..=max.y {
                    for z in min.z..=max.z {
                        for x in min.x..=max.x {
                            let voxel = IVec3::new(x, y, z);
                            let Some(index) = mask.index(voxel) else {
                                continue;
                            };
                            if mask.carved[index] || !point.carves(voxel) {
                                continue;
                            }
                            if !supports.contains(&voxel) && self.cave_allowed(voxel, hood, &roots, radius) {
                                mask.carved[index] = true;
                            }
                        }
                    }
                }
            }
        }
        mask
    }

    fn cave_allowed(&self, voxel: IVec3, hood: &Neighborhood, roots: &[DVec3], radius: f64) -> bool {
        if voxel.y <= 0 {
            return false;
        }
        let Some(cell) = hood.cell_at(voxel.x, voxel.z) else {
            return false;
        };
        if !self.biomes.def(cell.biome).caves {
            return false;
        }
        let p = voxel.as_dvec3();
        roots.iter().all(|r| r.distance(p) >= radius)
    }

    fn fill_terrain(&self, chunk: &mut Chunk, hood: &Neighborhood, mask: &CarveMask) {
        let t = &self.config.terrain;
        let origin = chunk.coord();
        let center = hood.center();
        // Keyed by column so vertically stacked chunks agree.
        let mut bare_rnd = SeededRandom::new(&self.config.world.seed, format!("bare{}", center.column()));

        for lz in 0..self.size.z as usize {
            for lx in 0..self.size.x as usize {
                let cell = center.cell(lx, lz);
                let biome = self.biomes.def(cell.biome);
                let bare = bare_rnd.next_double() < t.bare_stone_chance;
                let (wx, wz) = (origin.x + lx as i32, origin.z + lz as i32);

                for ly in 0..self.size.y as usize {
                    let wy = origin.y + ly as i32;
                    let voxel = IVec3::new(wx, wy, wz);
                    let block = if wy < 0 {
                        continue;
                    } else if wy == 0 {
                        blocks::BEDROCK
                    } else if wy < cell.height {
                        if mask.is_carved(voxel) {
                            continue;
                        } else if !bare && wy >= cell.height - t.surface_depth {
                            cell.dirt_block
                        } else {
                            self.ores.sample_ore(voxel, cell.height).unwrap_or(blocks::STONE)
                        }
                    } else if let Some(surface) = biome.surface_block
                        && wy <= t.water_line
                    {
                        surface
                    } else {
                        continue;
                    };
                    chunk.set(lx, ly, lz, block);
                }
            }
        }
    }

    fn place_vegetation(&self, chunk: &mut Chunk, hood: &Neighborhood) {
        for plant in hood.center().plants() {
            if chunk.get_world(plant.pos) != Some(BlockId::AIR) {
                continue;
            }
            // Plant supports are never carved, so ground in the chunk below is solid.
            let grounded = chunk
                .get_world(plant.pos - IVec3::Y)
                .is_none_or(|below| self.registry.is_surface_eligible(below));
            if grounded {
                chunk.set_world(plant.pos, plant.block);
            }
        }
        for tree in hood.trees() {
            stamp_tree(chunk, &self.registry, tree);
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn seed(&self) -> &str {
        &self.config.world.seed
    }

    pub fn chunk_size(&self) -> ChunkSize {
        self.size
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn biomes(&self) -> &BiomeTable {
        &self.biomes
    }

    pub fn noise(&self) -> &NoiseField {
        &self.noise
    }

    pub fn heights(&self) -> &HeightMapCache {
        &self.heights
    }

    pub fn caves(&self) -> &CaveNetwork {
        &self.caves
    }

    pub fn mines(&self) -> &MineIndex {
        &self.mines
    }

    pub fn ores(&self) -> &OreDistributor {
        &self.ores
    }
}

#[cfg(test)]
mod tests {
    use strata_voxel::ColumnAddress;

    use super::*;

    fn config(seed: &str) -> Config {
        let mut config = Config::default();
        config.world.seed = seed.to_string();
        config
    }

    #[test]
    fn test_fill_rejects_generated_chunk() {
        let generator = TerrainGenerator::new(&config("test")).unwrap();
        let mut chunk = generator.generate(ChunkAddress::new(0, 1, 0));
        assert!(chunk.is_generated());
        assert!(matches!(
            generator.fill(&mut chunk),
            Err(WorldGenError::ChunkAlreadyFilled(_))
        ));
    }

    #[test]
    fn test_fill_rejects_wrong_size() {
        let generator = TerrainGenerator::new(&config("test")).unwrap();
        let mut chunk = Chunk::new(ChunkAddress::default(), ChunkSize::new(8, 8, 8));
        assert!(matches!(
            generator.fill(&mut chunk),
            Err(WorldGenError::ChunkSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_fill_matches_generate() {
        let generator = TerrainGenerator::new(&config("test")).unwrap();
        let address = ChunkAddress::new(2, 1, -1);
        let mut chunk = Chunk::new(address, generator.chunk_size());
        generator.fill(&mut chunk).unwrap();
        assert_eq!(chunk.blocks(), generator.generate(address).blocks());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut bad = config("test");
        bad.terrain.min_elevation = 300;
        assert!(matches!(TerrainGenerator::new(&bad), Err(WorldGenError::Config(_))));
    }

    #[test]
    fn test_bedrock_floor() {
        let mut config = config("bedrock");
        config.mines.enabled = false;
        let generator = TerrainGenerator::new(&config).unwrap();
        let chunk = generator.generate(ChunkAddress::new(3, 0, 3));
        for z in 0..16 {
            for x in 0..16 {
                assert_eq!(chunk.get(x, 0, z), blocks::BEDROCK, "column ({x}, {z}) has no bedrock");
            }
        }
    }

    #[test]
    fn test_ocean_columns_hold_water() {
        let generator = TerrainGenerator::new(&config("test")).unwrap();
        let water_line = generator.config().terrain.water_line;
        let ocean = generator.biomes().registry().lookup_by_name("OCEAN").unwrap();
        let size = generator.chunk_size();
        // Scan a strip of columns for ocean cells and check the water body.
        for cx in -6..6 {
            let column = ColumnAddress::new(cx, 0);
            let map = generator.heights().get(column);
            let layer = water_line.div_euclid(size.y as i32);
            let chunk = generator.generate(column.chunk(layer));
            let ly = (water_line - chunk.coord().y) as usize;
            for z in 0..size.z as usize {
                for x in 0..size.x as usize {
                    let cell = map.cell(x, z);
                    if cell.biome == ocean && cell.height <= water_line {
                        assert_eq!(chunk.get(x, ly, z), blocks::STILL_WATER, "ocean surface missing in {column}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_below_zero_is_air() {
        let generator = TerrainGenerator::new(&config("test")).unwrap();
        let chunk = generator.generate(ChunkAddress::new(0, -1, 0));
        assert!(chunk.blocks().iter().all(|b| b.is_air()));
    }
}
