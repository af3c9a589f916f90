//! Coherent noise channels sampled by the height map and the voxel fill.
//!
//! Every channel is a pure function of position and the world seed. The
//! octave tables are fixed: changing them changes every world.

use noise::{NoiseFn, Perlin, Simplex};

use crate::seed::derive_seed;

/// `(scale, weight)` pairs summed into the raw height value.
const HEIGHT_OCTAVES: [(f64, f64); 5] = [
    (150.0, 0.4),
    (1650.0, 0.1),
    (650.0, 0.25),
    (20.0, 0.05),
    (350.0, 0.5),
];

/// Fine roughness: `n(x / 25) * (4 / 255) * n(x / 20)`.
const ROUGHNESS_SCALE: f64 = 25.0;
const ROUGHNESS_MOD_SCALE: f64 = 20.0;
const ROUGHNESS_WEIGHT: f64 = 4.0 / 255.0;

const HUMIDITY_SCALE: f64 = 160.0;
const CLIMATE_SCALE: f64 = 640.0;
const DIRT_VARIANT_SCALE: f64 = 5.0;
const ORE_SCALE: f64 = 10.0;
const STONE_VARIANT_SCALE: f64 = 20.0;
const STONE_VARIANT_OFFSET: f64 = 100_000.0;

/// Seeded 2D/3D noise channels.
pub struct NoiseField {
    surface: Perlin,
    volume: Simplex,
}

impl NoiseField {
    /// Create the noise channels for a world seed.
    pub fn new(world_seed: &str) -> Self {
        let base = derive_seed(world_seed);
        Self {
            surface: Perlin::new(base as u32),
            // Decorrelate underground noise from the surface.
            volume: Simplex::new((base >> 32) as u32 ^ 0xCAFE_BABE),
        }
    }

    #[inline]
    fn n2(&self, x: f64, z: f64, scale: f64) -> f64 {
        self.surface.get([x / scale, z / scale])
    }

    /// Raw height value, roughly in `[-1.4, 1.4]`.
    pub fn height(&self, x: f64, z: f64) -> f64 {
        let mut value = 0.0;
        for (scale, weight) in HEIGHT_OCTAVES {
            value += self.n2(x, z, scale) * weight;
        }
        value
            + self.n2(x, z, ROUGHNESS_SCALE)
                * (ROUGHNESS_WEIGHT * self.n2(x, z, ROUGHNESS_MOD_SCALE))
    }

    /// Humidity in `[0, 1]`.
    pub fn humidity(&self, x: f64, z: f64) -> f64 {
        ((self.n2(x, z, HUMIDITY_SCALE) + 0.8) / 2.0).clamp(0.0, 1.0)
    }

    /// Climate ("distance to the equator") factor in `[0, 1]`.
    pub fn climate(&self, x: f64, z: f64) -> f64 {
        (self.n2(x, z, CLIMATE_SCALE) + 0.8).clamp(0.0, 1.0)
    }

    /// High-frequency selector for biome dirt variants, in `[-1, 1]`.
    pub fn dirt_variant(&self, x: f64, z: f64) -> f64 {
        self.n2(x, z, DIRT_VARIANT_SCALE)
    }

    /// Ore density in `[0, 1]`.
    pub fn ore_density(&self, x: f64, y: f64, z: f64) -> f64 {
        self.volume.get([y / ORE_SCALE, x / ORE_SCALE, z / ORE_SCALE]) / 2.0 + 0.5
    }

    /// Stone variant density in `[0, 1]`.
    pub fn stone_variant(&self, x: f64, y: f64, z: f64) -> f64 {
        let o = STONE_VARIANT_OFFSET;
        let s = STONE_VARIANT_SCALE;
        self.volume.get([(x + o) / s, (z + o) / s, (y + o) / s]) / 2.0 + 0.5
    }
}

/// Picks an entry of a variant list from a [`NoiseField::dirt_variant`] sample.
pub fn variant_index(len: usize, sample: f64) -> usize {
    let t = (sample + 0.3).abs().clamp(0.0, 0.999);
    (len as f64 * t) as usize
}
