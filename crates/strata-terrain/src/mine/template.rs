//! Declarative box templates for mine nodes.
//!
//! Templates are written for a node facing south in node-local coordinates
//! `x, z` in `[0, footprint)` and `y` up from the node floor. Applying a
//! template rotates every cell by the node's direction and clips it to the
//! footprint and the chunk.

use glam::IVec3;
use serde_json::json;
use strata_voxel::{BlockId, BlockMeta, Chunk, blocks};
use tracing::warn;

use super::{Direction, MineNode, NodeKind};
use crate::seed::{RandomSource, SeededRandom};

/// Lanterns and chests hang from / face the ceiling.
const ROTATION_UP: IVec3 = IVec3::new(0, -1, 0);
/// Far wall of the side room.
const ROOM_LENGTH: i32 = 9;

/// How a box writes each of its cells.
///
/// The ceiling variants read the block above from the chunk being filled.
/// A ceiling that lies in another chunk counts as absent, so a node whose
/// top crosses a chunk layer gets no ceiling decorations along that layer.
/// The outcome depends on the chunk height as well as the world position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoxFill {
    /// Unconditional write.
    Set(BlockId),
    /// Write only into air (bridges over carved gaps).
    IfAir(BlockId),
    /// Write into air that has a non-air block directly above.
    AirUnderCeiling(BlockId),
    /// Write only over non-air blocks.
    IfSolid(BlockId),
    /// Write anywhere with a non-air block directly above.
    UnderCeiling(BlockId),
}

impl BoxFill {
    pub fn block(self) -> BlockId {
        match self {
            Self::Set(b) | Self::IfAir(b) | Self::AirUnderCeiling(b) | Self::IfSolid(b) | Self::UnderCeiling(b) => b,
        }
    }
}

/// An axis-aligned region of a template, bounds inclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxOp {
    pub min: IVec3,
    pub max: IVec3,
    pub fill: BoxFill,
    /// Per-cell placement probability; 1.0 places without drawing.
    pub chance: f64,
    pub meta: Option<BlockMeta>,
}

impl BoxOp {
    fn new(min: (i32, i32, i32), max: (i32, i32, i32), fill: BoxFill) -> Self {
        Self {
            min: IVec3::new(min.0, min.1, min.2),
            max: IVec3::new(max.0, max.1, max.2),
            fill,
            chance: 1.0,
            meta: None,
        }
    }

    fn cell(at: (i32, i32, i32), fill: BoxFill) -> Self {
        Self::new(at, at, fill)
    }

    fn chance(mut self, chance: f64) -> Self {
        self.chance = chance;
        self
    }

    fn meta(mut self, meta: BlockMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

fn lantern() -> BlockMeta {
    BlockMeta::rotated(ROTATION_UP)
}

/// Maps a south-facing local cell into the footprint of a node facing `dir`.
pub fn rotate_local(p: IVec3, dir: Direction, footprint: i32) -> IVec3 {
    let e = footprint - 1;
    match dir {
        Direction::South => p,
        Direction::North => IVec3::new(e - p.x, p.y, e - p.z),
        Direction::East => IVec3::new(p.z, p.y, e - p.x),
        Direction::West => IVec3::new(e - p.z, p.y, p.x),
    }
}

/// Builds the box list of a node kind.
///
/// Junctions and corridors draw their support interval from `rnd` first;
/// everything else in the stream belongs to per-cell chances.
pub fn node_template(kind: NodeKind, footprint: i32, rnd: &mut impl RandomSource) -> Vec<BoxOp> {
    match kind {
        NodeKind::Enter => enter(footprint),
        NodeKind::Cross => cross(footprint, support_interval(rnd)),
        NodeKind::Hal => hal(footprint, support_interval(rnd)),
        NodeKind::Room => room(footprint),
    }
}

fn support_interval(rnd: &mut impl RandomSource) -> i32 {
    rnd.next_double().round() as i32 + 4
}

fn enter(s: i32) -> Vec<BoxOp> {
    let e = s - 1;
    let half = s / 2;
    let mut ops = vec![
        BoxOp::new((0, 1, half), (e, 3, e), BoxFill::Set(BlockId::AIR)),
        BoxOp::new((0, 0, 0), (e, 0, e), BoxFill::Set(blocks::OAK_PLATE)),
    ];
    for (x, z) in [(e, e), (0, e), (0, half), (e, half)] {
        ops.push(BoxOp::cell((x, 3, z), BoxFill::UnderCeiling(blocks::LANTERN)).meta(lantern()));
    }
    ops
}

fn cross(s: i32, interval: i32) -> Vec<BoxOp> {
    let e = s - 1;
    let (near, far) = (e - 3, e - 1);
    let air = BoxFill::Set(BlockId::AIR);
    let mut ops = vec![
        BoxOp::new((0, 1, 0), (4, 4, e), air).chance(0.05),
        BoxOp::new((0, 1, 1), (1, 3, 3), air),
        BoxOp::new((1, 1, 0), (3, 3, e), air),
        BoxOp::new((1, 1, near), (e, 3, far), air),
        // Floors bridge over whatever is carved below.
        BoxOp::new((1, 0, 0), (3, 0, e), BoxFill::IfAir(blocks::OAK_PLATE)),
        BoxOp::new((1, 0, near), (e, 0, far), BoxFill::IfAir(blocks::OAK_PLATE)),
        BoxOp::new((0, 0, 1), (1, 0, 3), BoxFill::IfAir(blocks::OAK_PLATE)),
    ];

    let fence = BoxFill::Set(blocks::OAK_FENCE);
    let slab = BoxFill::Set(blocks::OAK_SLAB);
    let web = BoxFill::AirUnderCeiling(blocks::COBWEB);
    let light = BoxFill::AirUnderCeiling(blocks::LANTERN);
    for n in (0..s).step_by(interval as usize) {
        // Supports along both corridors.
        ops.push(BoxOp::new((1, 1, n), (1, 2, n), fence));
        ops.push(BoxOp::new((3, 1, n), (3, 2, n), fence));
        ops.push(BoxOp::new((1, 3, n), (3, 3, n), slab));
        ops.push(BoxOp::new((n, 1, far), (n, 2, far), fence));
        ops.push(BoxOp::new((n, 1, near), (n, 2, near), fence));
        ops.push(BoxOp::new((n, 3, near), (n, 3, far), slab));

        ops.push(BoxOp::new((1, 3, n - 3), (1, 3, n + 3), web).chance(0.05));
        ops.push(BoxOp::new((3, 3, n - 3), (3, 3, n + 3), web).chance(0.05));
        ops.push(BoxOp::new((n - 3, 3, far), (n + 3, 3, far), web).chance(0.05));
        ops.push(BoxOp::new((n - 3, 3, near), (n + 3, 3, near), web).chance(0.05));

        ops.push(BoxOp::new((1, 3, n - 3), (1, 3, n + 3), light).chance(0.2).meta(lantern()));
        ops.push(BoxOp::new((3, 3, n - 3), (3, 3, n + 3), web).chance(0.1));
        ops.push(BoxOp::new((n - 3, 3, far), (n + 3, 3, far), light).chance(0.1).meta(lantern()));
        ops.push(BoxOp::new((n - 3, 3, near), (n + 3, 3, near), light).chance(0.2).meta(lantern()));
    }
    ops
}

fn hal(s: i32, interval: i32) -> Vec<BoxOp> {
    let e = s - 1;
    let air = BoxFill::Set(BlockId::AIR);
    let mut ops = vec![
        BoxOp::new((0, 1, 0), (4, 4, e), air).chance(0.05),
        BoxOp::new((1, 1, 0), (3, 3, e), air),
        BoxOp::new((1, 0, 0), (3, 0, e), BoxFill::IfAir(blocks::OAK_PLANK)),
    ];

    let fence = BoxFill::Set(blocks::OAK_FENCE);
    let web = BoxFill::AirUnderCeiling(blocks::COBWEB);
    let mushroom = BoxFill::AirUnderCeiling(blocks::BROWN_MUSHROOM);
    let light = BoxFill::AirUnderCeiling(blocks::LANTERN);
    for n in (0..=e).step_by(interval as usize) {
        ops.push(BoxOp::new((1, 1, n), (1, 2, n), fence));
        ops.push(BoxOp::new((3, 1, n), (3, 2, n), fence));
        ops.push(BoxOp::new((1, 3, n), (3, 3, n), BoxFill::Set(blocks::OAK_SLAB)));
        ops.push(BoxOp::new((1, 3, n), (3, 3, n), BoxFill::IfSolid(blocks::OAK_SLAB)).chance(0.25));

        // Debris fallen from the walls.
        ops.push(BoxOp::new((1, 3, n - 1), (1, 3, n + 1), BoxFill::AirUnderCeiling(blocks::COBBLESTONE)).chance(0.25));
        ops.push(BoxOp::new((3, 3, n - 1), (3, 3, n + 1), BoxFill::AirUnderCeiling(blocks::DIRT)).chance(0.25));

        ops.push(BoxOp::new((1, 3, n - 3), (1, 3, n + 3), web).chance(0.05));
        ops.push(BoxOp::new((3, 3, n - 3), (3, 3, n + 3), web).chance(0.05));

        ops.push(BoxOp::new((1, 1, n - 3), (1, 1, n + 3), mushroom).chance(0.01));
        ops.push(BoxOp::new((3, 1, n - 3), (3, 1, n + 3), mushroom).chance(0.01));

        ops.push(BoxOp::new((3, 3, n - 3), (3, 3, n + 3), light).chance(0.1).meta(lantern()));
        ops.push(BoxOp::new((1, 3, n - 3), (1, 3, n + 3), light).chance(0.1).meta(lantern()));
    }
    ops
}

fn room(s: i32) -> Vec<BoxOp> {
    let far = ROOM_LENGTH.min(s - 1);
    let brick = BoxFill::Set(blocks::BRICK);
    let chest = BlockMeta {
        rotation: Some(ROTATION_UP),
        entity_id: None,
        extra_data: Some(json!({ "can_destroy": true, "slots": {} })),
    };
    vec![
        BoxOp::new((0, 0, 0), (far, 1, 4), brick),
        BoxOp::new((0, 2, 0), (far, 3, 4), brick),
        BoxOp::new((1, 1, 1), (far - 1, 3, 4), BoxFill::Set(BlockId::AIR)),
        BoxOp::cell((far - 1, 3, 4), BoxFill::Set(blocks::LANTERN)).meta(lantern()),
        BoxOp::cell((1, 1, 1), BoxFill::Set(blocks::CHEST)).meta(chest),
    ]
}

/// Every block any template can place, sorted and deduplicated.
pub fn template_blocks(footprint: i32) -> Vec<BlockId> {
    let mut rnd = SeededRandom::from_seed_str("templates");
    let mut ids: Vec<BlockId> = [NodeKind::Enter, NodeKind::Cross, NodeKind::Hal, NodeKind::Room]
        .into_iter()
        .flat_map(|kind| node_template(kind, footprint, &mut rnd))
        .map(|op| op.fill.block())
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Writes one box into `chunk`.
///
/// A chance below one is drawn for every cell of the box, whether or not
/// the cell lands in this chunk, so every chunk a node spans sees the same
/// sequence.
fn apply_box(
    chunk: &mut Chunk,
    op: &BoxOp,
    dir: Direction,
    origin: IVec3,
    footprint: i32,
    rnd: &mut impl RandomSource,
) {
    for x in op.min.x..=op.max.x {
        for y in op.min.y..=op.max.y {
            for z in op.min.z..=op.max.z {
                if op.chance < 1.0 && rnd.next_double() >= op.chance {
                    continue;
                }
                let local = rotate_local(IVec3::new(x, y, z), dir, footprint);
                if local.x < 0 || local.x >= footprint || local.z < 0 || local.z >= footprint {
                    continue;
                }
                let world = origin + local;
                let Some(current) = chunk.get_world(world) else {
                    continue;
                };
                // Blocks above the chunk are never ceilings.
                let ceiling = chunk
                    .get_world(world + IVec3::Y)
                    .is_some_and(|b| !b.is_air());

                let place = match op.fill {
                    BoxFill::Set(_) => true,
                    BoxFill::IfAir(_) => current.is_air(),
                    BoxFill::AirUnderCeiling(_) => current.is_air() && ceiling,
                    BoxFill::IfSolid(_) => !current.is_air(),
                    BoxFill::UnderCeiling(_) => ceiling,
                };
                if !place {
                    continue;
                }

                chunk.set_world(world, op.fill.block());
                if let Some(meta) = &op.meta
                    && let Some((lx, ly, lz)) = chunk.to_local(world)
                    && let Err(err) = chunk.set_meta(lx, ly, lz, meta.clone())
                {
                    warn!(%world, %err, "Dropped mine block metadata");
                }
            }
        }
    }
}

/// Expands `node` into `chunk`. `origin` is the world corner of the node.
pub(super) fn apply_node(chunk: &mut Chunk, node: &MineNode, origin: IVec3, footprint: i32) {
    let mut rnd = node.random();
    let ops = node_template(node.kind, footprint, &mut rnd);
    for op in &ops {
        apply_box(chunk, op, node.direction, origin, footprint, &mut rnd);
    }
}
