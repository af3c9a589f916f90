//! Random-walk cave skeletons, one per chunk column.
//!
//! A column either has no cave (its Bernoulli trial failed) or a cave made
//! of a head point plus a few groups of points walking away from it. Each
//! point is bucketed into every chunk whose volume lies within its radius,
//! so carving a chunk only has to look at its own bucket in each nearby
//! cave.

use std::sync::Arc;

use glam::{DVec3, IVec3};
use rustc_hash::FxHashMap;
use strata_config::CaveConfig;
use strata_voxel::{ChunkAddress, ChunkSize, ColumnAddress};

use crate::cache::BoundedCache;
use crate::seed::{RandomSource, SeededRandom};

/// Head sampling skips the bottom 5% of the cave band.
const HEAD_BAND_START: f64 = 0.05;
/// ... and spans the next 50%.
const HEAD_BAND_SPAN: f64 = 0.5;
/// Vertical offset of tall-section points, in multiples of the default radius.
const TALL_OFFSET: f64 = 0.9;

/// One sphere of a cave skeleton.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CavePoint {
    pub pos: DVec3,
    pub radius: f64,
}

impl CavePoint {
    /// Whether the voxel at `voxel` is inside this point's sphere.
    #[inline]
    pub fn carves(&self, voxel: IVec3) -> bool {
        self.pos.distance_squared(voxel.as_dvec3()) < self.radius * self.radius
    }

    /// Inclusive voxel bounds of the sphere.
    pub fn voxel_bounds(&self) -> (IVec3, IVec3) {
        let r = DVec3::splat(self.radius);
        ((self.pos - r).floor().as_ivec3(), (self.pos + r).ceil().as_ivec3())
    }
}

/// Cave skeleton of one column.
#[derive(Debug, Default)]
pub struct Cave {
    column: ColumnAddress,
    points: Vec<CavePoint>,
    buckets: FxHashMap<ChunkAddress, Vec<u32>>,
}

impl Cave {
    /// Generates the cave of `column`.
    ///
    /// Draw order: the existence trial, the head index, then per group the
    /// point count, three direction components, and per step the radius
    /// sample followed by the tall-section sample.
    pub fn generate(
        column: ColumnAddress,
        size: ChunkSize,
        config: &CaveConfig,
        rnd: &mut impl RandomSource,
    ) -> Self {
        let mut cave = Self {
            column,
            ..Self::default()
        };
        if rnd.next_double() >= config.chance {
            return cave;
        }

        let (sx, sz) = (size.x as i64, size.z as i64);
        let block_count = (sx * config.max_level as i64 * sz) as f64;
        let index = (block_count * HEAD_BAND_START + rnd.next_double() * block_count * HEAD_BAND_SPAN) as i64;
        let (ox, oz) = column.origin(size);
        let head = DVec3::new(
            (ox as i64 + index % sx) as f64,
            (index / (sx * sz)) as f64,
            (oz as i64 + (index / sx) % sz) as f64,
        );

        let mut radius = config.default_radius;
        cave.push(CavePoint { pos: head, radius }, size);

        let (jx, jy, jz) = config.step_jitter;
        let mut pos = head;
        for _ in 0..config.groups {
            let count = (rnd.next_double() * config.max_group_points as f64) as u32 + 1;
            let direction = DVec3::new(
                (rnd.next_double() * 2.0 - 1.0) * jx,
                (rnd.next_double() * 2.0 - 1.0) * jy,
                (rnd.next_double() * 2.0 - 1.0) * jz,
            );
            for _ in 0..count {
                pos += direction;
                radius = ((radius + rnd.next_double() * config.default_radius + config.min_radius) / 2.0)
                    .trunc()
                    .clamp(config.min_radius, config.max_radius);
                let point = CavePoint {
                    pos: pos.round(),
                    radius,
                };
                cave.push(point, size);

                let tall = rnd.next_double();
                if tall < config.tall_chance {
                    let drop = DVec3::new(0.0, config.default_radius * TALL_OFFSET, 0.0);
                    cave.push(CavePoint { pos: (pos - drop).round(), radius }, size);
                    if tall < config.taller_chance {
                        cave.push(CavePoint { pos: (pos - 2.0 * drop).round(), radius }, size);
                    }
                }
            }
        }
        cave
    }

    /// Builds a cave from explicit points, the first one being the head.
    pub fn from_points(column: ColumnAddress, points: impl IntoIterator<Item = CavePoint>, size: ChunkSize) -> Self {
        let mut cave = Self {
            column,
            ..Self::default()
        };
        for point in points {
            cave.push(point, size);
        }
        cave
    }

    /// Appends a point and files it under every chunk it reaches.
    fn push(&mut self, point: CavePoint, size: ChunkSize) {
        let index = self.points.len() as u32;
        self.points.push(point);

        let (lo, hi) = point.voxel_bounds();
        let min = ChunkAddress::containing(lo, size);
        let max = ChunkAddress::containing(hi, size);
        let extent = size.as_ivec3() - IVec3::ONE;
        for cy in min.y..=max.y {
            for cz in min.z..=max.z {
                for cx in min.x..=max.x {
                    let address = ChunkAddress::new(cx, cy, cz);
                    let origin = address.origin(size);
                    let closest = point
                        .pos
                        .clamp(origin.as_dvec3(), (origin + extent).as_dvec3());
                    if closest.distance_squared(point.pos) < point.radius * point.radius {
                        self.buckets.entry(address).or_default().push(index);
                    }
                }
            }
        }
    }

    pub fn column(&self) -> ColumnAddress {
        self.column
    }

    /// The head point, `None` for a column without a cave.
    pub fn head(&self) -> Option<&CavePoint> {
        self.points.first()
    }

    /// Returns `true` if the trial failed and the column has no cave.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[CavePoint] {
        &self.points
    }

    /// Points bucketed into `address`.
    pub fn bucket(&self, address: ChunkAddress) -> impl Iterator<Item = &CavePoint> {
        self.buckets
            .get(&address)
            .into_iter()
            .flatten()
            .map(|&i| &self.points[i as usize])
    }

    /// Every chunk this cave reaches.
    pub fn bucket_addresses(&self) -> impl Iterator<Item = &ChunkAddress> {
        self.buckets.keys()
    }
}

/// The part of a cave that reaches one chunk.
#[derive(Clone, Debug)]
pub struct CaveView {
    cave: Arc<Cave>,
    address: ChunkAddress,
}

impl CaveView {
    pub fn new(cave: Arc<Cave>, address: ChunkAddress) -> Self {
        Self { cave, address }
    }

    pub fn cave(&self) -> &Cave {
        &self.cave
    }

    pub fn address(&self) -> ChunkAddress {
        self.address
    }

    /// Points of the cave bucketed into the viewed chunk.
    pub fn points(&self) -> impl Iterator<Item = &CavePoint> {
        self.cave.bucket(self.address)
    }
}

/// Lazily generated caves for every column, keyed by column address.
pub struct CaveNetwork {
    seed: String,
    size: ChunkSize,
    config: CaveConfig,
    caves: BoundedCache<ColumnAddress, Cave>,
}

impl CaveNetwork {
    pub fn new(seed: &str, size: ChunkSize, config: CaveConfig, capacity: usize) -> Self {
        Self {
            seed: seed.to_string(),
            size,
            config,
            caves: BoundedCache::new("cave", capacity),
        }
    }

    /// Cave of `column`, generated on first access.
    pub fn get(&self, column: ColumnAddress) -> Arc<Cave> {
        self.caves.get_or_insert_with(column, || {
            let mut rnd = SeededRandom::new(&self.seed, format!("cave{column}"));
            Cave::generate(column, self.size, &self.config, &mut rnd)
        })
    }

    /// Views of every cave headed within `ring` columns of `address` that
    /// reaches into `address`. Columns without caves are skipped.
    pub fn neighbors(&self, address: ChunkAddress, ring: i32) -> Vec<CaveView> {
        let center = address.column();
        let mut views = Vec::new();
        for dz in -ring..=ring {
            for dx in -ring..=ring {
                let cave = self.get(center.offset(dx, dz));
                if cave.head().is_some() && cave.buckets.contains_key(&address) {
                    views.push(CaveView { cave, address });
                }
            }
        }
        views
    }

    pub fn config(&self) -> &CaveConfig {
        &self.config
    }

    /// Number of cached caves.
    pub fn len(&self) -> usize {
        self.caves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caves.is_empty()
    }
}
