//! The standard block set used by world generation.
//!
//! Ids are fixed so that generated chunks stay comparable across runs.
//! [`standard_registry`] registers every constant below in id order and
//! fails if any of them lands elsewhere.

use crate::registry::{BlockDef, BlockId, BlockKind, BlockRegistry, DropRule, RegistryError, Transparency};

pub const AIR: BlockId = BlockId::AIR;
pub const BEDROCK: BlockId = BlockId(1);
pub const STONE: BlockId = BlockId(2);
pub const GRASS_BLOCK: BlockId = BlockId(3);
pub const DIRT: BlockId = BlockId(4);
pub const PODZOL: BlockId = BlockId(5);
pub const SAND: BlockId = BlockId(6);
pub const RED_SAND: BlockId = BlockId(7);
pub const SNOW_DIRT: BlockId = BlockId(8);
pub const STILL_WATER: BlockId = BlockId(9);
pub const DIAMOND_ORE: BlockId = BlockId(10);
pub const COAL_ORE: BlockId = BlockId(11);
pub const DIORITE: BlockId = BlockId(12);
pub const ANDESITE: BlockId = BlockId(13);
pub const GRANITE: BlockId = BlockId(14);
pub const OAK_LOG: BlockId = BlockId(15);
pub const OAK_LEAVES: BlockId = BlockId(16);
pub const BIRCH_LOG: BlockId = BlockId(17);
pub const BIRCH_LEAVES: BlockId = BlockId(18);
pub const SPRUCE_LOG: BlockId = BlockId(19);
pub const SPRUCE_LEAVES: BlockId = BlockId(20);
pub const ACACIA_LOG: BlockId = BlockId(21);
pub const ACACIA_LEAVES: BlockId = BlockId(22);
pub const CACTUS: BlockId = BlockId(23);
pub const TALL_GRASS: BlockId = BlockId(24);
pub const FLOWER: BlockId = BlockId(25);
pub const DEAD_BUSH: BlockId = BlockId(26);
pub const BROWN_MUSHROOM: BlockId = BlockId(27);
pub const OAK_PLANK: BlockId = BlockId(28);
pub const OAK_PLATE: BlockId = BlockId(29);
pub const OAK_FENCE: BlockId = BlockId(30);
pub const OAK_SLAB: BlockId = BlockId(31);
pub const COBBLESTONE: BlockId = BlockId(32);
pub const COBWEB: BlockId = BlockId(33);
pub const LANTERN: BlockId = BlockId(34);
pub const BRICK: BlockId = BlockId(35);
pub const CHEST: BlockId = BlockId(36);

fn ground(name: &str, surface_eligible: bool) -> BlockDef {
    BlockDef {
        surface_eligible,
        ..BlockDef::terrain(name)
    }
}

fn log(name: &str) -> BlockDef {
    BlockDef::terrain(name).with_kind(BlockKind::Vegetation)
}

fn leaves(name: &str) -> BlockDef {
    BlockDef {
        transparency: Transparency::SemiTransparent,
        kind: BlockKind::Vegetation,
        replaceable: true,
        drop: DropRule::Nothing,
        ..BlockDef::terrain(name)
    }
}

fn plant(name: &str) -> BlockDef {
    BlockDef {
        solid: false,
        transparency: Transparency::FullyTransparent,
        kind: BlockKind::Vegetation,
        replaceable: true,
        ..BlockDef::terrain(name)
    }
}

fn structure(name: &str, solid: bool) -> BlockDef {
    BlockDef {
        solid,
        transparency: if solid {
            Transparency::Opaque
        } else {
            Transparency::SemiTransparent
        },
        kind: BlockKind::Structure,
        ..BlockDef::terrain(name)
    }
}

/// Every standard block in id order.
fn standard_defs() -> Vec<(BlockId, BlockDef)> {
    vec![
        (
            BEDROCK,
            BlockDef {
                drop: DropRule::Nothing,
                max_stack: 0,
                ..BlockDef::terrain("bedrock")
            },
        ),
        (
            STONE,
            BlockDef {
                drop: DropRule::Other(COBBLESTONE),
                ..BlockDef::terrain("stone")
            },
        ),
        (
            GRASS_BLOCK,
            BlockDef {
                drop: DropRule::Other(DIRT),
                ..ground("grass_block", true)
            },
        ),
        (DIRT, ground("dirt", true)),
        (PODZOL, ground("podzol", true)),
        (SAND, ground("sand", true)),
        (RED_SAND, ground("red_sand", true)),
        (SNOW_DIRT, ground("snow_dirt", true)),
        (
            STILL_WATER,
            BlockDef {
                solid: false,
                transparency: Transparency::SemiTransparent,
                kind: BlockKind::Liquid,
                replaceable: false,
                surface_eligible: false,
                drop: DropRule::Nothing,
                max_stack: 0,
                name: "still_water".to_string(),
            },
        ),
        (DIAMOND_ORE, BlockDef::terrain("diamond_ore").with_kind(BlockKind::Ore)),
        (COAL_ORE, BlockDef::terrain("coal_ore").with_kind(BlockKind::Ore)),
        (DIORITE, BlockDef::terrain("diorite")),
        (ANDESITE, BlockDef::terrain("andesite")),
        (GRANITE, BlockDef::terrain("granite")),
        (OAK_LOG, log("oak_log")),
        (OAK_LEAVES, leaves("oak_leaves")),
        (BIRCH_LOG, log("birch_log")),
        (BIRCH_LEAVES, leaves("birch_leaves")),
        (SPRUCE_LOG, log("spruce_log")),
        (SPRUCE_LEAVES, leaves("spruce_leaves")),
        (ACACIA_LOG, log("acacia_log")),
        (ACACIA_LEAVES, leaves("acacia_leaves")),
        (
            CACTUS,
            BlockDef {
                transparency: Transparency::SemiTransparent,
                ..log("cactus")
            },
        ),
        (TALL_GRASS, plant("tall_grass")),
        (FLOWER, plant("flower")),
        (DEAD_BUSH, plant("dead_bush")),
        (BROWN_MUSHROOM, plant("brown_mushroom")),
        (OAK_PLANK, structure("oak_plank", true)),
        (OAK_PLATE, structure("oak_plate", true)),
        (OAK_FENCE, structure("oak_fence", true)),
        (OAK_SLAB, structure("oak_slab", true)),
        (COBBLESTONE, structure("cobblestone", true)),
        (
            COBWEB,
            BlockDef {
                drop: DropRule::Nothing,
                ..structure("cobweb", false)
            },
        ),
        (
            LANTERN,
            BlockDef {
                kind: BlockKind::Light,
                ..structure("lantern", false)
            },
        ),
        (BRICK, structure("brick", true)),
        (
            CHEST,
            BlockDef {
                max_stack: 1,
                ..structure("chest", true)
            },
        ),
    ]
}

/// Builds the registry holding every block constant of this module.
///
/// # Errors
///
/// Returns [`RegistryError::IdMismatch`] if the table and the constants
/// disagree about an id.
pub fn standard_registry() -> Result<BlockRegistry, RegistryError> {
    let mut registry = BlockRegistry::new();
    for (id, def) in standard_defs() {
        registry.register_as(id, def)?;
    }
    Ok(registry)
}
