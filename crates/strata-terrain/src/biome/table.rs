//! Biome table: maps (height, humidity, climate) triples to biomes.
//!
//! The parameter cube `[0, 1]^3` is partitioned by an ordered list of
//! axis-aligned regions; the first region containing a point wins. Every
//! point of the cube must be covered, which is checked exactly when the
//! table is built.

use strata_voxel::{BlockId, BlockRegistry};

use super::{BiomeDef, BiomeId, BiomeRegistry};

/// Errors raised while building a [`BiomeTable`]. All of them are
/// configuration defects.
#[derive(Debug, thiserror::Error)]
pub enum BiomeTableError {
    /// A biome with this name is already registered.
    #[error("duplicate biome name: {0}")]
    DuplicateName(String),
    /// A region refers to a biome that was never registered.
    #[error("region refers to unknown biome {0:?}")]
    UnknownBiome(BiomeId),
    /// The table has no regions.
    #[error("biome table has no regions")]
    Empty,
    /// Some point of the parameter cube resolves to no biome.
    #[error("no biome covers height={height}, humidity={humidity}, climate={climate}")]
    Gap {
        height: f64,
        humidity: f64,
        climate: f64,
    },
    /// A biome references a block the registry does not know.
    #[error("biome `{biome}` references unknown block {block:?}")]
    UnknownBlock { biome: String, block: BlockId },
}

/// Half-open interval `[min, max)`; a `max` of 1.0 or more also includes 1.0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    pub const FULL: Self = Self { min: 0.0, max: 1.0 };

    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && (v < self.max || (self.max >= 1.0 && v <= self.max))
    }
}

/// A box in (height, humidity, climate) space mapped to a biome.
#[derive(Clone, Debug)]
pub struct BiomeRegion {
    pub height: Span,
    pub humidity: Span,
    pub climate: Span,
    pub biome: BiomeId,
}

impl BiomeRegion {
    #[inline]
    fn contains(&self, height: f64, humidity: f64, climate: f64) -> bool {
        self.height.contains(height) && self.humidity.contains(humidity) && self.climate.contains(climate)
    }
}

/// Read-only biome registry plus the region partition used for lookup.
pub struct BiomeTable {
    registry: BiomeRegistry,
    regions: Vec<BiomeRegion>,
}

impl BiomeTable {
    /// Builds a table and proves that it is total.
    ///
    /// # Errors
    ///
    /// [`BiomeTableError::Empty`] without regions, [`BiomeTableError::Gap`]
    /// for the first uncovered point found.
    pub fn new(registry: BiomeRegistry, regions: Vec<BiomeRegion>) -> Result<Self, BiomeTableError> {
        if regions.is_empty() {
            return Err(BiomeTableError::Empty);
        }
        if let Some(region) = regions.iter().find(|r| !registry.contains(r.biome)) {
            return Err(BiomeTableError::UnknownBiome(region.biome));
        }
        let table = Self { registry, regions };
        table.check_total()?;
        Ok(table)
    }

    /// Coverage by axis-aligned boxes is constant between consecutive region
    /// bounds, so testing every bound and every midpoint between bounds on
    /// each axis is exhaustive.
    fn check_total(&self) -> Result<(), BiomeTableError> {
        let heights = axis_samples(self.regions.iter().map(|r| r.height));
        let humidities = axis_samples(self.regions.iter().map(|r| r.humidity));
        let climates = axis_samples(self.regions.iter().map(|r| r.climate));

        for &height in &heights {
            for &humidity in &humidities {
                for &climate in &climates {
                    if self.find(height, humidity, climate).is_none() {
                        return Err(BiomeTableError::Gap {
                            height,
                            humidity,
                            climate,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Checks every block referenced by any biome against `blocks`.
    pub fn validate_blocks(&self, blocks: &BlockRegistry) -> Result<(), BiomeTableError> {
        for (_, def) in self.registry.iter() {
            for block in def.referenced_blocks() {
                if !blocks.contains(block) {
                    return Err(BiomeTableError::UnknownBlock {
                        biome: def.name.clone(),
                        block,
                    });
                }
            }
        }
        Ok(())
    }

    fn find(&self, height: f64, humidity: f64, climate: f64) -> Option<BiomeId> {
        self.regions
            .iter()
            .find(|r| r.contains(height, humidity, climate))
            .map(|r| r.biome)
    }

    /// Resolves the biome for a point. Inputs are clamped into `[0, 1]`.
    pub fn lookup(&self, height: f64, humidity: f64, climate: f64) -> BiomeId {
        let h = height.clamp(0.0, 1.0);
        let m = humidity.clamp(0.0, 1.0);
        let c = climate.clamp(0.0, 1.0);
        // Totality was proven in `new`, the fallback is unreachable.
        self.find(h, m, c).unwrap_or(self.regions[0].biome)
    }

    /// Like [`lookup`](Self::lookup) but returns the descriptor.
    pub fn lookup_def(&self, height: f64, humidity: f64, climate: f64) -> &BiomeDef {
        self.def(self.lookup(height, humidity, climate))
    }

    /// Returns the descriptor of a biome produced by this table.
    pub fn def(&self, id: BiomeId) -> &BiomeDef {
        self.registry.get(id)
    }

    pub fn registry(&self) -> &BiomeRegistry {
        &self.registry
    }

    pub fn regions(&self) -> &[BiomeRegion] {
        &self.regions
    }
}

/// Axis sample points: 0, 1, every bound inside `[0, 1]`, and midpoints.
fn axis_samples(spans: impl Iterator<Item = Span>) -> Vec<f64> {
    let mut bounds = vec![0.0, 1.0];
    for span in spans {
        for v in [span.min, span.max] {
            if (0.0..=1.0).contains(&v) {
                bounds.push(v);
            }
        }
    }
    bounds.sort_by(f64::total_cmp);
    bounds.dedup();

    let mut samples = bounds.clone();
    for pair in bounds.windows(2) {
        samples.push((pair[0] + pair[1]) / 2.0);
    }
    samples
}
