//! Ore and stone-variant bands for underground voxels.
//!
//! Each band tests one density channel of the [`NoiseField`] against a
//! half-open interval. Bands are checked in order and the first match wins;
//! voxels matching nothing stay plain stone.

use std::sync::Arc;

use glam::IVec3;
use strata_voxel::{BlockId, blocks};

use crate::noise_field::NoiseField;

/// Density channel a band samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DensityChannel {
    /// [`NoiseField::ore_density`].
    Ore,
    /// [`NoiseField::stone_variant`].
    StoneVariant,
}

/// One ore or stone-variant band.
#[derive(Clone, Debug)]
pub struct OreDistribution {
    /// Block placed when the band matches.
    pub block: BlockId,
    /// Human-readable name for logging/debugging.
    pub name: String,
    pub channel: DensityChannel,
    /// Inclusive lower density bound.
    pub min: f64,
    /// Exclusive upper density bound.
    pub max: f64,
    /// Minimum depth below the column surface.
    pub min_depth: i32,
}

/// Picks ore and stone variants for solid underground voxels.
pub struct OreDistributor {
    noise: Arc<NoiseField>,
    ores: Vec<OreDistribution>,
}

impl OreDistributor {
    pub fn new(noise: Arc<NoiseField>, ores: Vec<OreDistribution>) -> Self {
        Self { noise, ores }
    }

    /// Query which block (if any) should replace stone at `voxel`.
    ///
    /// Returns `None` above the surface or when no band matches. Channels
    /// are sampled lazily, at most once each.
    pub fn sample_ore(&self, voxel: IVec3, surface_height: i32) -> Option<BlockId> {
        if voxel.y >= surface_height {
            return None;
        }
        let depth = surface_height - voxel.y;
        let (x, y, z) = (voxel.x as f64, voxel.y as f64, voxel.z as f64);
        let mut ore = None;
        let mut stone = None;

        for band in &self.ores {
            if depth < band.min_depth {
                continue;
            }
            let density = match band.channel {
                DensityChannel::Ore => *ore.get_or_insert_with(|| self.noise.ore_density(x, y, z)),
                DensityChannel::StoneVariant => *stone.get_or_insert_with(|| self.noise.stone_variant(x, y, z)),
            };
            if density >= band.min && density < band.max {
                return Some(band.block);
            }
        }
        None
    }

    /// Every block a band can place.
    pub fn referenced_blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.ores.iter().map(|o| o.block)
    }

    /// Count the number of registered bands.
    pub fn ore_count(&self) -> usize {
        self.ores.len()
    }
}

/// Default bands: rare deep diamonds, a thin coal shell, and decorative
/// stone in the upper stone-variant range.
pub fn default_ore_distributions() -> Vec<OreDistribution> {
    let band = |block, name: &str, channel, min, max, min_depth| OreDistribution {
        block,
        name: name.into(),
        channel,
        min,
        max,
        min_depth,
    };
    vec![
        band(blocks::DIAMOND_ORE, "diamond", DensityChannel::StoneVariant, 0.0, 0.04, 5),
        band(blocks::COAL_ORE, "coal", DensityChannel::Ore, 0.495, 0.51, 0),
        band(blocks::DIORITE, "diorite", DensityChannel::StoneVariant, 0.75, 0.82, 0),
        band(blocks::ANDESITE, "andesite", DensityChannel::StoneVariant, 0.82, 0.89, 0),
        band(blocks::GRANITE, "granite", DensityChannel::StoneVariant, 0.89, f64::MAX, 0),
    ]
}
