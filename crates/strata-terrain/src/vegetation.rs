//! Trees and plants: per-biome catalogues, placement and shape stamping.
//!
//! Placements are derived once per height map from the map's own random
//! stream and its blended heights. Stamping writes a placement into whichever
//! chunk is being generated, clipped to that chunk, so a canopy that crosses
//! a column boundary is painted consistently from both sides.

use glam::IVec3;
use strata_voxel::{BlockId, BlockRegistry, Chunk};

use crate::biome::BiomeTable;
use crate::heightmap::MapCell;
use crate::seed::RandomSource;

/// Canopy shape of a tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TreeStyle {
    /// A single leaves block on top of the trunk.
    Stump,
    /// Layered square rings with thinned corners.
    Wood,
    /// Two wide diamond-shaped layers.
    Acacia,
    /// Tapering conic rings.
    Spruce,
    /// Trunk only.
    Cactus,
}

/// One tree species a biome can grow.
#[derive(Clone, Debug)]
pub struct TreeKind {
    pub style: TreeStyle,
    pub trunk: BlockId,
    pub leaves: BlockId,
    /// Share of tree placements in the biome, in `[0, 1]`.
    pub percent: f64,
    /// Inclusive trunk height range.
    pub height: (i32, i32),
}

/// One plant a biome can grow.
#[derive(Clone, Debug)]
pub struct PlantKind {
    pub block: BlockId,
    /// Share of plant placements in the biome, in `[0, 1]`.
    pub percent: f64,
}

/// Vegetation catalogue of a biome.
#[derive(Clone, Debug, Default)]
pub struct VegetationTable {
    /// Per-column chance of a tree.
    pub tree_frequency: f64,
    pub trees: Vec<TreeKind>,
    /// Per-column chance of a plant (checked after trees).
    pub plant_frequency: f64,
    pub plants: Vec<PlantKind>,
}

impl VegetationTable {
    /// Every block id this table can place.
    pub fn referenced_blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.trees
            .iter()
            .flat_map(|t| [t.trunk, t.leaves])
            .chain(self.plants.iter().map(|p| p.block))
    }
}

/// A tree rooted at `pos`, the first trunk voxel.
#[derive(Clone, Debug, PartialEq)]
pub struct TreePlacement {
    pub pos: IVec3,
    pub style: TreeStyle,
    pub trunk: BlockId,
    pub leaves: BlockId,
    pub height: i32,
}

/// A single plant block at `pos`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlantPlacement {
    pub pos: IVec3,
    pub block: BlockId,
}

/// Picks an entry by cumulative percentage.
fn pick<T>(items: &[T], percent: impl Fn(&T) -> f64, sample: f64) -> Option<&T> {
    let mut acc = 0.0;
    for item in items {
        acc += percent(item);
        if sample < acc {
            return Some(item);
        }
    }
    None
}

/// Places vegetation for one column map.
///
/// Draw order: one sample per cell in `z`-then-`x` order, followed by the
/// species and height samples of whatever was placed there. Cells at or
/// below the water line grow nothing.
pub fn place_vegetation(
    cells: &[MapCell],
    size_x: usize,
    origin: (i32, i32),
    biomes: &BiomeTable,
    water_line: i32,
    rnd: &mut impl RandomSource,
) -> (Vec<TreePlacement>, Vec<PlantPlacement>) {
    let mut trees = Vec::new();
    let mut plants = Vec::new();

    for (index, cell) in cells.iter().enumerate() {
        let r = rnd.next_double();
        if cell.height <= water_line {
            continue;
        }
        let table = &biomes.def(cell.biome).vegetation;
        let pos = IVec3::new(
            origin.0 + (index % size_x) as i32,
            cell.height,
            origin.1 + (index / size_x) as i32,
        );

        if r < table.tree_frequency {
            let species = rnd.next_double();
            if let Some(kind) = pick(&table.trees, |t| t.percent, species) {
                let span = (kind.height.1 - kind.height.0 + 1).max(1);
                let height = kind.height.0 + (rnd.next_double() * span as f64) as i32;
                trees.push(TreePlacement {
                    pos,
                    style: kind.style,
                    trunk: kind.trunk,
                    leaves: kind.leaves,
                    height,
                });
            }
        } else if r < table.tree_frequency + table.plant_frequency {
            let species = rnd.next_double();
            if let Some(kind) = pick(&table.plants, |p| p.percent, species) {
                plants.push(PlantPlacement {
                    pos,
                    block: kind.block,
                });
            }
        }
    }

    (trees, plants)
}

// ---------------------------------------------------------------------------
// Stamping
// ---------------------------------------------------------------------------

/// Canopies only grow into air.
fn leaf(chunk: &mut Chunk, pos: IVec3, leaves: BlockId) {
    if chunk.get_world(pos) == Some(BlockId::AIR) {
        chunk.set_world(pos, leaves);
    }
}

/// Writes the part of `tree` that falls inside `chunk`.
///
/// The trunk replaces only replaceable blocks (air, leaves, plants); leaves
/// only fill air, so neither overwrites terrain or another tree's trunk.
pub fn stamp_tree(chunk: &mut Chunk, registry: &BlockRegistry, tree: &TreePlacement) {
    let root = tree.pos;
    for dy in 0..tree.height {
        let p = root + IVec3::new(0, dy, 0);
        if let Some(current) = chunk.get_world(p)
            && registry.is_replaceable(current)
        {
            chunk.set_world(p, tree.trunk);
        }
    }

    let top = root.y + tree.height;
    match tree.style {
        TreeStyle::Cactus => {}
        TreeStyle::Stump => leaf(chunk, IVec3::new(root.x, top, root.z), tree.leaves),
        TreeStyle::Wood => {
            let mut py = top;
            for rad in [1i32, 1, 2, 2] {
                for i in -rad..=rad {
                    for j in -rad..=rad {
                        let corner = i.abs() == rad && j.abs() == rad;
                        // World coordinates keep the thinning identical across chunks.
                        let thinned = py == top || (i + root.x + j + root.z + py).rem_euclid(3) > 0;
                        if corner && thinned {
                            continue;
                        }
                        leaf(chunk, IVec3::new(root.x + i, py, root.z + j), tree.leaves);
                    }
                }
                py -= 1;
            }
        }
        TreeStyle::Acacia => {
            let mut py = top;
            for rad in [2i32, 3] {
                for i in -rad..=rad {
                    for j in -rad..=rad {
                        if i.abs() + j.abs() <= rad {
                            leaf(chunk, IVec3::new(root.x + i, py, root.z + j), tree.leaves);
                        }
                    }
                }
                py -= 1;
            }
        }
        TreeStyle::Spruce => {
            leaf(chunk, IVec3::new(root.x, top, root.z), tree.leaves);
            let mut r = 1.0_f64;
            for (step, py) in (root.y + 1..top).rev().enumerate() {
                let rad = if step % 2 == 0 {
                    (r.round() as i32).min(3)
                } else {
                    1
                };
                for i in -rad..=rad {
                    for j in -rad..=rad {
                        leaf(chunk, IVec3::new(root.x + i, py, root.z + j), tree.leaves);
                    }
                }
                r += 0.9;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_voxel::{ChunkAddress, ChunkSize, blocks};

    fn tree(style: TreeStyle, height: i32) -> TreePlacement {
        TreePlacement {
            pos: IVec3::new(8, 10, 8),
            style,
            trunk: blocks::OAK_LOG,
            leaves: blocks::OAK_LEAVES,
            height,
        }
    }

    fn empty_chunk() -> Chunk {
        Chunk::new(ChunkAddress::default(), ChunkSize::new(16, 40, 16))
    }

    fn count(chunk: &Chunk, block: BlockId) -> usize {
        chunk.blocks().iter().filter(|b| **b == block).count()
    }

    #[test]
    fn test_pick_by_cumulative_percent() {
        let items = [0.25, 0.5, 0.25];
        assert_eq!(pick(&items, |p| *p, 0.1), Some(&0.25));
        assert_eq!(pick(&items, |p| *p, 0.6), Some(&0.5));
        assert_eq!(pick(&items, |p| *p, 0.99), Some(&0.25));
        assert_eq!(pick(&[0.5], |p| *p, 0.7), None);
    }

    #[test]
    fn test_cactus_is_trunk_only() {
        let registry = blocks::standard_registry().unwrap();
        let mut chunk = empty_chunk();
        stamp_tree(&mut chunk, &registry, &tree(TreeStyle::Cactus, 3));
        assert_eq!(count(&chunk, blocks::OAK_LOG), 3);
        assert_eq!(count(&chunk, blocks::OAK_LEAVES), 0);
    }

    #[test]
    fn test_stump_has_single_cap() {
        let registry = blocks::standard_registry().unwrap();
        let mut chunk = empty_chunk();
        stamp_tree(&mut chunk, &registry, &tree(TreeStyle::Stump, 2));
        assert_eq!(count(&chunk, blocks::OAK_LEAVES), 1);
        assert_eq!(chunk.get(8, 12, 8), blocks::OAK_LEAVES);
    }

    #[test]
    fn test_wood_canopy_surrounds_trunk() {
        let registry = blocks::standard_registry().unwrap();
        let mut chunk = empty_chunk();
        stamp_tree(&mut chunk, &registry, &tree(TreeStyle::Wood, 5));
        assert_eq!(chunk.get(8, 14, 8), blocks::OAK_LOG, "trunk survives the canopy");
        assert_eq!(chunk.get(8, 15, 8), blocks::OAK_LEAVES, "top layer caps the trunk");
        assert_eq!(chunk.get(9, 15, 9), BlockId::AIR, "top layer corners are skipped");
        assert_eq!(chunk.get(10, 13, 8), blocks::OAK_LEAVES, "lower layers are wider");
    }

    #[test]
    fn test_acacia_uses_diamond_rings() {
        let registry = blocks::standard_registry().unwrap();
        let mut chunk = empty_chunk();
        stamp_tree(&mut chunk, &registry, &tree(TreeStyle::Acacia, 4));
        assert_eq!(chunk.get(10, 14, 8), blocks::OAK_LEAVES);
        assert_eq!(chunk.get(10, 14, 10), BlockId::AIR, "outside the diamond");
        assert_eq!(chunk.get(11, 13, 8), blocks::OAK_LEAVES);
    }

    #[test]
    fn test_spruce_tapers_upwards() {
        let registry = blocks::standard_registry().unwrap();
        let mut chunk = empty_chunk();
        stamp_tree(&mut chunk, &registry, &tree(TreeStyle::Spruce, 7));
        assert_eq!(chunk.get(8, 17, 8), blocks::OAK_LEAVES, "single top leaf");
        assert_eq!(chunk.get(9, 17, 8), BlockId::AIR);
        assert_eq!(chunk.get(9, 16, 9), blocks::OAK_LEAVES, "first ring has radius 1");
        assert_eq!(chunk.get(11, 12, 8), blocks::OAK_LEAVES, "lower rings reach radius 3");
    }

    #[test]
    fn test_canopy_never_overwrites_terrain() {
        let registry = blocks::standard_registry().unwrap();
        let mut chunk = empty_chunk();
        chunk.set(9, 15, 8, blocks::STONE);
        stamp_tree(&mut chunk, &registry, &tree(TreeStyle::Wood, 5));
        assert_eq!(chunk.get(9, 15, 8), blocks::STONE);
    }

    #[test]
    fn test_trunk_replaces_only_replaceable_blocks() {
        let registry = blocks::standard_registry().unwrap();
        let mut chunk = empty_chunk();
        chunk.set(8, 11, 8, blocks::BIRCH_LEAVES);
        chunk.set(8, 12, 8, blocks::STONE);
        stamp_tree(&mut chunk, &registry, &tree(TreeStyle::Cactus, 3));
        assert_eq!(chunk.get(8, 11, 8), blocks::OAK_LOG);
        assert_eq!(chunk.get(8, 12, 8), blocks::STONE);
    }

    #[test]
    fn test_stamp_clips_to_chunk() {
        let registry = blocks::standard_registry().unwrap();
        let mut chunk = Chunk::new(ChunkAddress::new(1, 0, 0), ChunkSize::new(16, 40, 16));
        let mut edge = tree(TreeStyle::Wood, 5);
        edge.pos = IVec3::new(15, 10, 8);
        stamp_tree(&mut chunk, &registry, &edge);
        assert_eq!(count(&chunk, blocks::OAK_LOG), 0, "trunk lies in the western neighbor");
        assert!(count(&chunk, blocks::OAK_LEAVES) > 0, "canopy spills across the boundary");
        assert_eq!(chunk.get(0, 13, 8), blocks::OAK_LEAVES);
    }
}
