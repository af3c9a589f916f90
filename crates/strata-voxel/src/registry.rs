//! Block type registry: maps compact [`BlockId`] values to rich [`BlockDef`] metadata.
//!
//! The registry is built once before any world is created and is read-only
//! afterwards. Air is always ID 0 so that zero-initialized chunk memory
//! represents empty space.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Compact identifier stored inside every voxel cell (2 bytes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u16);

impl BlockId {
    /// The empty block.
    pub const AIR: Self = Self(0);

    /// Returns `true` for [`BlockId::AIR`].
    #[inline]
    pub fn is_air(self) -> bool {
        self.0 == 0
    }
}

/// Transparency mode for a block type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transparency {
    /// Fully blocks light and visibility.
    Opaque,
    /// Partially transparent (e.g. water, leaves).
    SemiTransparent,
    /// Completely transparent (e.g. air).
    FullyTransparent,
}

/// Broad category of a block, used by generation rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Air,
    /// Natural ground: stone, dirt, sand and their variants.
    Terrain,
    Ore,
    Liquid,
    /// Trunks, leaves and plants.
    Vegetation,
    /// Man-made blocks placed by structures.
    Structure,
    /// Light sources.
    Light,
}

/// What a block yields when destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropRule {
    /// Drops nothing.
    Nothing,
    /// Drops itself.
    Itself,
    /// Drops a different block (e.g. stone drops cobblestone).
    Other(BlockId),
}

/// Full descriptor for a block type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockDef {
    /// Human-readable name (e.g. "stone", "oak_leaves").
    pub name: String,
    /// Whether entities collide with this block.
    pub solid: bool,
    /// Transparency mode.
    pub transparency: Transparency,
    /// Generation category.
    pub kind: BlockKind,
    /// Whether growing vegetation may replace this block.
    pub replaceable: bool,
    /// Whether plants may be rooted on top of this block.
    pub surface_eligible: bool,
    /// Drop behavior.
    pub drop: DropRule,
    /// Maximum inventory stack size (0 for blocks that cannot be held).
    pub max_stack: u8,
}

impl BlockDef {
    /// Solid opaque ground block that drops itself.
    pub fn terrain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            solid: true,
            transparency: Transparency::Opaque,
            kind: BlockKind::Terrain,
            replaceable: false,
            surface_eligible: false,
            drop: DropRule::Itself,
            max_stack: 64,
        }
    }

    /// Builder-style override of [`BlockDef::kind`].
    pub fn with_kind(mut self, kind: BlockKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Errors that can occur during block type registration and validation.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A type with the same name has already been registered.
    #[error("duplicate block type name: {0}")]
    DuplicateName(String),
    /// All 65 535 user-defined slots have been consumed.
    #[error("block type registry is full (max 65536 types)")]
    RegistryFull,
    /// A well-known block landed on a different id than expected.
    #[error("block `{name}` registered as {actual:?}, expected {expected:?}")]
    IdMismatch {
        name: String,
        expected: BlockId,
        actual: BlockId,
    },
    /// A generation table referenced an id the registry does not know.
    #[error("unknown block id {0:?}")]
    UnknownId(BlockId),
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps [`BlockId`] → [`BlockDef`] with O(1) lookup by index and
/// O(1) reverse lookup by name.
pub struct BlockRegistry {
    /// Dense array where `index == BlockId.0`.
    types: Vec<BlockDef>,
    /// Reverse lookup: name → ID.
    name_to_id: HashMap<String, BlockId>,
}

impl BlockRegistry {
    /// Creates a new registry with Air pre-registered as ID 0.
    pub fn new() -> Self {
        let air = BlockDef {
            name: "air".to_string(),
            solid: false,
            transparency: Transparency::FullyTransparent,
            kind: BlockKind::Air,
            replaceable: true,
            surface_eligible: false,
            drop: DropRule::Nothing,
            max_stack: 0,
        };

        let mut name_to_id = HashMap::new();
        name_to_id.insert("air".to_string(), BlockId::AIR);

        Self {
            types: vec![air],
            name_to_id,
        }
    }

    /// Registers a new block type and returns its assigned ID.
    ///
    /// IDs are assigned sequentially starting from 1 (0 is Air).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if a type with the same name
    /// already exists, or [`RegistryError::RegistryFull`] if all 65 536 slots
    /// are consumed.
    pub fn register(&mut self, def: BlockDef) -> Result<BlockId, RegistryError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        if self.types.len() > u16::MAX as usize {
            return Err(RegistryError::RegistryFull);
        }

        let id = BlockId(self.types.len() as u16);
        self.name_to_id.insert(def.name.clone(), id);
        self.types.push(def);
        Ok(id)
    }

    /// Registers `def` and checks that it received the `expected` id.
    pub fn register_as(&mut self, expected: BlockId, def: BlockDef) -> Result<(), RegistryError> {
        let name = def.name.clone();
        let actual = self.register(def)?;
        if actual != expected {
            return Err(RegistryError::IdMismatch {
                name,
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Returns the definition for a given ID, or `None` if it was never registered.
    pub fn get(&self, id: BlockId) -> Option<&BlockDef> {
        self.types.get(id.0 as usize)
    }

    /// Returns the ID for a named block type, or `None` if not found.
    pub fn lookup_by_name(&self, name: &str) -> Option<BlockId> {
        self.name_to_id.get(name).copied()
    }

    /// Returns `true` if `id` is registered.
    pub fn contains(&self, id: BlockId) -> bool {
        (id.0 as usize) < self.types.len()
    }

    /// Checks every id in `ids` against the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownId`] for the first unregistered id.
    pub fn validate_ids<I>(&self, ids: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = BlockId>,
    {
        for id in ids {
            if !self.contains(id) {
                return Err(RegistryError::UnknownId(id));
            }
        }
        Ok(())
    }

    /// Returns the total number of registered types (including Air).
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if only Air is registered.
    pub fn is_empty(&self) -> bool {
        self.types.len() <= 1
    }

    /// Returns `true` if the block is solid. Unknown ids count as non-solid.
    pub fn is_solid(&self, id: BlockId) -> bool {
        self.get(id).is_some_and(|def| def.solid)
    }

    /// Returns `true` if vegetation may grow into this block.
    pub fn is_replaceable(&self, id: BlockId) -> bool {
        self.get(id).is_some_and(|def| def.replaceable)
    }

    /// Returns `true` if plants may be rooted on this block.
    pub fn is_surface_eligible(&self, id: BlockId) -> bool {
        self.get(id).is_some_and(|def| def.surface_eligible)
    }

    /// Returns the generation category of a block. Unknown ids map to [`BlockKind::Air`].
    pub fn kind(&self, id: BlockId) -> BlockKind {
        self.get(id).map_or(BlockKind::Air, |def| def.kind)
    }

    /// Returns `true` if the given block type is transparent (fully or semi).
    ///
    /// Returns `true` for unknown IDs (treat missing types like air).
    pub fn is_transparent(&self, id: BlockId) -> bool {
        match self.get(id) {
            Some(def) => def.transparency != Transparency::Opaque,
            None => true,
        }
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_air_is_id_zero() {
        let registry = BlockRegistry::new();
        assert_eq!(registry.lookup_by_name("air"), Some(BlockId::AIR));
        assert!(!registry.is_solid(BlockId::AIR));
        assert!(registry.is_transparent(BlockId::AIR));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let mut registry = BlockRegistry::new();
        let stone = registry.register(BlockDef::terrain("stone")).unwrap();
        let dirt = registry.register(BlockDef::terrain("dirt")).unwrap();
        assert_eq!(stone, BlockId(1));
        assert_eq!(dirt, BlockId(2));
        assert_eq!(registry.len(), 3);
        assert!(registry.is_solid(stone));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = BlockRegistry::new();
        registry.register(BlockDef::terrain("stone")).unwrap();
        let err = registry.register(BlockDef::terrain("stone")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(name) if name == "stone"));
    }

    #[test]
    fn test_register_as_detects_mismatch() {
        let mut registry = BlockRegistry::new();
        let err = registry
            .register_as(BlockId(5), BlockDef::terrain("stone"))
            .unwrap_err();
        assert!(
            matches!(err, RegistryError::IdMismatch { actual, .. } if actual == BlockId(1)),
            "stone should land on id 1, got {err}"
        );
    }

    #[test]
    fn test_validate_ids_reports_unknown() {
        let mut registry = BlockRegistry::new();
        let stone = registry.register(BlockDef::terrain("stone")).unwrap();
        assert!(registry.validate_ids([BlockId::AIR, stone]).is_ok());
        let err = registry.validate_ids([stone, BlockId(99)]).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownId(BlockId(99))));
    }

    #[test]
    fn test_unknown_id_is_conservative() {
        let registry = BlockRegistry::new();
        assert!(registry.get(BlockId(1234)).is_none());
        assert!(!registry.is_solid(BlockId(1234)));
        assert!(registry.is_transparent(BlockId(1234)));
        assert_eq!(registry.kind(BlockId(1234)), BlockKind::Air);
    }
}
