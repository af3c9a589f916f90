//! Chunk and column addressing in chunk-grid units.

use std::fmt;

use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::chunk::ChunkSize;

/// Identifies a chunk's position in the world, in chunk-grid units.
///
/// Immutable and cheap to copy; used as a cache and spatial-index key.
/// The [`Display`](fmt::Display) form `(x,y,z)` is the canonical spatial key
/// mixed into random seeds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkAddress {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkAddress {
    /// Creates a new chunk address.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the address of the chunk offset by `(dx, dy, dz)`.
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The column this chunk belongs to.
    pub fn column(self) -> ColumnAddress {
        ColumnAddress::new(self.x, self.z)
    }

    /// The chunk containing the world-space voxel `pos`.
    pub fn containing(pos: IVec3, size: ChunkSize) -> Self {
        let s = size.as_ivec3();
        let a = pos.div_euclid(s);
        Self::new(a.x, a.y, a.z)
    }

    /// World-space position of this chunk's minimum corner.
    pub fn origin(self, size: ChunkSize) -> IVec3 {
        IVec3::new(self.x, self.y, self.z) * size.as_ivec3()
    }

    pub fn as_ivec3(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }
}

impl fmt::Display for ChunkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}

/// Horizontal footprint of a stack of chunks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnAddress {
    pub x: i32,
    pub z: i32,
}

impl ColumnAddress {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// The chunk of this column at vertical index `y`.
    pub fn chunk(self, y: i32) -> ChunkAddress {
        ChunkAddress::new(self.x, y, self.z)
    }

    /// The column containing world-space `(x, z)`.
    pub fn containing(x: i32, z: i32, size: ChunkSize) -> Self {
        Self::new(x.div_euclid(size.x as i32), z.div_euclid(size.z as i32))
    }

    /// World-space `(x, z)` of the column's minimum corner.
    pub fn origin(self, size: ChunkSize) -> (i32, i32) {
        (self.x * size.x as i32, self.z * size.z as i32)
    }
}

impl fmt::Display for ColumnAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},0,{})", self.x, self.z)
    }
}
