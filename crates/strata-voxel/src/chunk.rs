//! Dense chunk container with sparse per-voxel metadata.
//!
//! A [`Chunk`] owns a `(SX, SY, SZ)` grid of [`BlockId`]s addressed through
//! strides `(cx, cy, cz, cw)`: `index = cx*x + cy*y + cz*z + cw`. A minority of
//! voxels additionally carry [`BlockMeta`] (rotation, entity id, extra data),
//! stored in a hash map keyed by linear index. Metadata is only ever attached
//! to non-air voxels and is dropped whenever the voxel is overwritten.
//!
//! Out-of-bounds reads return Air, out-of-bounds writes are ignored with a
//! warning. Callers that routinely touch positions outside the chunk (tree
//! canopies, structure templates) check [`Chunk::contains_world`] first.

use glam::IVec3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::ChunkAddress;
use crate::registry::BlockId;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Voxel dimensions of a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkSize {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl ChunkSize {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Total number of voxels.
    pub fn volume(self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }

    pub fn as_ivec3(self) -> IVec3 {
        IVec3::new(self.x as i32, self.y as i32, self.z as i32)
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self::new(16, 40, 16)
    }
}

/// Linear addressing strides for a chunk grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Strides {
    pub cx: usize,
    pub cy: usize,
    pub cz: usize,
    pub cw: usize,
}

impl Strides {
    /// Y-major layout: one horizontal slice after another.
    pub fn for_size(size: ChunkSize) -> Self {
        Self {
            cx: 1,
            cy: size.x as usize * size.z as usize,
            cz: size.x as usize,
            cw: 0,
        }
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        self.cx * x + self.cy * y + self.cz * z + self.cw
    }
}

/// Out-of-band data attached to a single voxel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockMeta {
    /// Facing of directional blocks (lanterns hang from `(0, -1, 0)`).
    pub rotation: Option<IVec3>,
    /// Identifier of a block entity (chest inventories and the like).
    pub entity_id: Option<String>,
    /// Arbitrary block-specific payload.
    pub extra_data: Option<serde_json::Value>,
}

impl BlockMeta {
    /// Metadata carrying only a rotation.
    pub fn rotated(rotation: IVec3) -> Self {
        Self {
            rotation: Some(rotation),
            ..Default::default()
        }
    }
}

/// Errors raised when attaching metadata.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("cannot attach metadata to air at ({x}, {y}, {z})")]
    AirBlock { x: usize, y: usize, z: usize },
    #[error("metadata position ({x}, {y}, {z}) is outside the chunk")]
    OutOfBounds { x: usize, y: usize, z: usize },
}

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// A chunk's voxel grid plus its placement in the world.
#[derive(Clone, Debug)]
pub struct Chunk {
    address: ChunkAddress,
    size: ChunkSize,
    /// World-space origin of voxel `(0, 0, 0)`.
    coord: IVec3,
    strides: Strides,
    blocks: Vec<BlockId>,
    meta: FxHashMap<usize, BlockMeta>,
    generated: bool,
}

impl Chunk {
    /// Creates an empty (all Air) chunk at `address`.
    pub fn new(address: ChunkAddress, size: ChunkSize) -> Self {
        Self {
            address,
            size,
            coord: address.origin(size),
            strides: Strides::for_size(size),
            blocks: vec![BlockId::AIR; size.volume()],
            meta: FxHashMap::default(),
            generated: false,
        }
    }

    pub fn address(&self) -> ChunkAddress {
        self.address
    }

    pub fn size(&self) -> ChunkSize {
        self.size
    }

    /// World-space origin of the chunk.
    pub fn coord(&self) -> IVec3 {
        self.coord
    }

    pub fn strides(&self) -> Strides {
        self.strides
    }

    /// Returns `true` once the generator has filled this chunk.
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    /// Marks the chunk as filled. Filling happens exactly once.
    pub fn mark_generated(&mut self) {
        self.generated = true;
    }

    /// Checks whether local `(x, y, z)` lies inside the grid.
    #[inline]
    pub fn in_bounds(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.size.x as usize && y < self.size.y as usize && z < self.size.z as usize
    }

    /// Converts a world-space position to local coordinates if it lies inside.
    #[inline]
    pub fn to_local(&self, world: IVec3) -> Option<(usize, usize, usize)> {
        let local = world - self.coord;
        if local.x < 0 || local.y < 0 || local.z < 0 {
            return None;
        }
        let (x, y, z) = (local.x as usize, local.y as usize, local.z as usize);
        self.in_bounds(x, y, z).then_some((x, y, z))
    }

    /// Returns `true` if the world-space position lies inside this chunk.
    #[inline]
    pub fn contains_world(&self, world: IVec3) -> bool {
        self.to_local(world).is_some()
    }

    /// Returns the block at local `(x, y, z)`, or Air when out of bounds.
    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockId {
        if !self.in_bounds(x, y, z) {
            tracing::warn!("Chunk::get out of bounds: ({}, {}, {})", x, y, z);
            return BlockId::AIR;
        }
        self.blocks[self.strides.index(x, y, z)]
    }

    /// Returns the block at a world position, or `None` outside this chunk.
    pub fn get_world(&self, world: IVec3) -> Option<BlockId> {
        self.to_local(world)
            .map(|(x, y, z)| self.blocks[self.strides.index(x, y, z)])
    }

    /// Sets the block at local `(x, y, z)`, discarding any metadata there.
    ///
    /// No-op with a warning log if out of bounds.
    pub fn set(&mut self, x: usize, y: usize, z: usize, block: BlockId) {
        if !self.in_bounds(x, y, z) {
            tracing::warn!("Chunk::set out of bounds: ({}, {}, {})", x, y, z);
            return;
        }
        let index = self.strides.index(x, y, z);
        self.blocks[index] = block;
        self.meta.remove(&index);
    }

    /// Sets the block at a world position. Returns `false` if it lies outside.
    pub fn set_world(&mut self, world: IVec3, block: BlockId) -> bool {
        match self.to_local(world) {
            Some((x, y, z)) => {
                self.set(x, y, z, block);
                true
            }
            None => false,
        }
    }

    /// Attaches metadata to the (non-air) voxel at local `(x, y, z)`.
    ///
    /// # Errors
    ///
    /// [`MetadataError::AirBlock`] if the voxel is air, [`MetadataError::OutOfBounds`]
    /// if the position is outside the grid.
    pub fn set_meta(&mut self, x: usize, y: usize, z: usize, meta: BlockMeta) -> Result<(), MetadataError> {
        if !self.in_bounds(x, y, z) {
            return Err(MetadataError::OutOfBounds { x, y, z });
        }
        let index = self.strides.index(x, y, z);
        if self.blocks[index].is_air() {
            return Err(MetadataError::AirBlock { x, y, z });
        }
        self.meta.insert(index, meta);
        Ok(())
    }

    /// Returns the metadata at local `(x, y, z)`, if any.
    pub fn meta(&self, x: usize, y: usize, z: usize) -> Option<&BlockMeta> {
        if !self.in_bounds(x, y, z) {
            return None;
        }
        self.meta.get(&self.strides.index(x, y, z))
    }

    /// Number of voxels carrying metadata.
    pub fn meta_count(&self) -> usize {
        self.meta.len()
    }

    /// Iterates `(linear index, metadata)` in ascending index order.
    pub fn meta_sorted(&self) -> Vec<(usize, &BlockMeta)> {
        let mut entries: Vec<_> = self.meta.iter().map(|(i, m)| (*i, m)).collect();
        entries.sort_unstable_by_key(|(i, _)| *i);
        entries
    }

    /// Raw voxel storage in stride order.
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Counts voxels per block id, sorted by id.
    pub fn block_histogram(&self) -> Vec<(BlockId, usize)> {
        let mut counts: FxHashMap<BlockId, usize> = FxHashMap::default();
        for block in &self.blocks {
            *counts.entry(*block).or_default() += 1;
        }
        let mut sorted: Vec<_> = counts.into_iter().collect();
        sorted.sort_unstable_by_key(|(id, _)| *id);
        sorted
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: ChunkSize = ChunkSize::new(16, 40, 16);

    #[test]
    fn test_new_chunk_is_air() {
        let chunk = Chunk::new(ChunkAddress::new(1, 0, -1), SIZE);
        assert_eq!(chunk.blocks().len(), 16 * 40 * 16);
        assert!(chunk.blocks().iter().all(|b| b.is_air()));
        assert_eq!(chunk.coord(), IVec3::new(16, 0, -16));
        assert!(!chunk.is_generated());
    }

    #[test]
    fn test_strides_are_y_major() {
        let strides = Strides::for_size(SIZE);
        assert_eq!(strides.index(1, 0, 0), 1);
        assert_eq!(strides.index(0, 0, 1), 16);
        assert_eq!(strides.index(0, 1, 0), 256);
        assert_eq!(strides.index(15, 39, 15), SIZE.volume() - 1);
    }

    #[test]
    fn test_set_get_round_trip() {
        let mut chunk = Chunk::new(ChunkAddress::default(), SIZE);
        chunk.set(3, 20, 7, BlockId(5));
        assert_eq!(chunk.get(3, 20, 7), BlockId(5));
        assert_eq!(chunk.get_world(IVec3::new(3, 20, 7)), Some(BlockId(5)));
    }

    #[test]
    fn test_out_of_bounds_access_is_benign() {
        let mut chunk = Chunk::new(ChunkAddress::default(), SIZE);
        assert_eq!(chunk.get(16, 0, 0), BlockId::AIR);
        chunk.set(0, 40, 0, BlockId(3));
        assert!(chunk.blocks().iter().all(|b| b.is_air()));
        assert!(!chunk.set_world(IVec3::new(-1, 0, 0), BlockId(3)));
        assert_eq!(chunk.get_world(IVec3::new(0, -1, 0)), None);
    }

    #[test]
    fn test_metadata_requires_non_air() {
        let mut chunk = Chunk::new(ChunkAddress::default(), SIZE);
        assert_eq!(
            chunk.set_meta(1, 1, 1, BlockMeta::rotated(IVec3::NEG_Y)),
            Err(MetadataError::AirBlock { x: 1, y: 1, z: 1 })
        );
        chunk.set(1, 1, 1, BlockId(7));
        chunk
            .set_meta(1, 1, 1, BlockMeta::rotated(IVec3::NEG_Y))
            .expect("non-air voxel accepts metadata");
        assert_eq!(chunk.meta(1, 1, 1).and_then(|m| m.rotation), Some(IVec3::NEG_Y));
    }

    #[test]
    fn test_overwrite_clears_metadata() {
        let mut chunk = Chunk::new(ChunkAddress::default(), SIZE);
        chunk.set(2, 2, 2, BlockId(7));
        chunk.set_meta(2, 2, 2, BlockMeta::rotated(IVec3::Y)).unwrap();
        chunk.set(2, 2, 2, BlockId::AIR);
        assert!(chunk.meta(2, 2, 2).is_none());
        assert_eq!(chunk.meta_count(), 0);
    }

    #[test]
    fn test_histogram_counts_every_voxel() {
        let mut chunk = Chunk::new(ChunkAddress::default(), SIZE);
        chunk.set(0, 0, 0, BlockId(1));
        chunk.set(1, 0, 0, BlockId(1));
        let histogram = chunk.block_histogram();
        assert_eq!(histogram, vec![(BlockId::AIR, SIZE.volume() - 2), (BlockId(1), 2)]);
    }
}
