//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level world generation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Seed and chunk geometry.
    pub world: WorldConfig,
    /// Height map shaping.
    pub terrain: TerrainConfig,
    /// Random-walk caves.
    pub caves: CaveConfig,
    /// Mine districts.
    pub mines: MineConfig,
    /// Cache ceilings.
    pub cache: CacheConfig,
    /// Background worker pool.
    pub workers: WorkerConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// World identity and chunk geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// World seed, immutable for the lifetime of a world.
    pub seed: String,
    /// Chunk dimensions `(x, y, z)` in voxels.
    pub chunk_size: (u32, u32, u32),
}

/// Height map shaping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Absolute height of the sea surface.
    pub water_line: i32,
    /// Lowest surface height before the water-line curve.
    pub min_elevation: i32,
    /// Highest surface height.
    pub max_elevation: i32,
    /// Height that a zero noise sample maps to.
    pub base_height: f64,
    /// Slope of the below-water-line shaping.
    pub below_water_factor: f64,
    /// Constant lift applied below the water line.
    pub below_water_bias: f64,
    /// Divisor in the above-water exponent `1 + diff / divisor`.
    pub curve_divisor: f64,
    /// Radius (in voxels) of the biome-border height smoothing window.
    pub smooth_radius: u32,
    /// Number of biome dirt layers below the surface.
    pub surface_depth: i32,
    /// Per-column chance that bare stone reaches the surface.
    pub bare_stone_chance: f64,
}

/// Random-walk cave settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaveConfig {
    /// Per-column chance that a cave exists.
    pub chance: f64,
    /// Height of the band cave heads are chosen in.
    pub max_level: u32,
    /// Columns searched around a chunk for caves reaching into it.
    pub neighbor_radius: i32,
    /// Distance around a tree root inside which caves do not carve.
    pub protection_radius: f64,
    /// Radius of the head point.
    pub default_radius: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    /// Number of walk groups per cave.
    pub groups: u32,
    /// Maximum points per walk group.
    pub max_group_points: u32,
    /// Per-axis bound of a group's step vector.
    pub step_jitter: (f64, f64, f64),
    /// Chance that a step also adds a point below it.
    pub tall_chance: f64,
    /// Chance that a step adds a second, deeper point.
    pub taller_chance: f64,
}

/// Mine district settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MineConfig {
    pub enabled: bool,
    /// District edge length in chunks.
    pub cluster_chunks: u32,
    /// District height in voxels.
    pub height: u32,
    /// Height of one node layer in voxels.
    pub node_height: u32,
    /// Smallest accepted node count.
    pub min_nodes: usize,
    /// Retry cap for undersized structures.
    pub max_attempts: u32,
    pub chance_cross: f64,
    pub chance_hal: f64,
    pub chance_room: f64,
}

/// Cache ceilings. Exceeding one evicts roughly the oldest third.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub height_map_capacity: usize,
    pub cave_capacity: usize,
    pub mine_capacity: usize,
}

/// Background generation pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkerConfig {
    /// Worker thread count, 0 picks one from the CPU count.
    pub threads: usize,
    /// Maximum queued or running tasks.
    pub max_in_flight: usize,
    /// Capacity of the completed-chunk channel.
    pub result_capacity: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: "test".to_string(),
            chunk_size: (16, 40, 16),
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            water_line: 63,
            min_elevation: 4,
            max_elevation: 255,
            base_height: 68.0,
            below_water_factor: 0.65,
            below_water_bias: 1.5,
            curve_divisor: 64.0,
            smooth_radius: 3,
            surface_depth: 3,
            bare_stone_chance: 0.005,
        }
    }
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            chance: 0.99,
            max_level: 80,
            neighbor_radius: 8,
            protection_radius: 5.0,
            default_radius: 5.0,
            min_radius: 2.0,
            max_radius: 10.0,
            groups: 3,
            max_group_points: 10,
            step_jitter: (4.0, 1.25, 4.0),
            tall_chance: 0.1,
            taller_chance: 0.065,
        }
    }
}

impl Default for MineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cluster_chunks: 8,
            height: 40,
            node_height: 4,
            min_nodes: 9,
            max_attempts: 1000,
            chance_cross: 0.2,
            chance_hal: 0.4,
            chance_room: 0.5,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            height_map_capacity: 20_000,
            cave_capacity: 20_000,
            mine_capacity: 256,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            max_in_flight: 64,
            result_capacity: 128,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Validation ---

fn check_probability(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be within [0, 1], got {value}")))
    }
}

impl Config {
    /// Rejects settings that cannot describe a world.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (sx, sy, sz) = self.world.chunk_size;
        if sx == 0 || sy == 0 || sz == 0 {
            return Err(ConfigError::Invalid(format!(
                "chunk_size must be non-zero, got {:?}",
                self.world.chunk_size
            )));
        }

        let t = &self.terrain;
        if t.min_elevation >= t.max_elevation {
            return Err(ConfigError::Invalid(format!(
                "min_elevation {} must be below max_elevation {}",
                t.min_elevation, t.max_elevation
            )));
        }
        if t.smooth_radius >= sx.min(sz) {
            return Err(ConfigError::Invalid(format!(
                "smooth_radius {} must be smaller than the chunk footprint",
                t.smooth_radius
            )));
        }
        if t.curve_divisor <= 0.0 {
            return Err(ConfigError::Invalid("curve_divisor must be positive".into()));
        }
        check_probability("terrain.bare_stone_chance", t.bare_stone_chance)?;

        let c = &self.caves;
        check_probability("caves.chance", c.chance)?;
        check_probability("caves.tall_chance", c.tall_chance)?;
        check_probability("caves.taller_chance", c.taller_chance)?;
        if !(c.min_radius <= c.default_radius && c.default_radius <= c.max_radius) {
            return Err(ConfigError::Invalid(format!(
                "cave radii must satisfy min <= default <= max, got {} / {} / {}",
                c.min_radius, c.default_radius, c.max_radius
            )));
        }
        if c.max_level == 0 || c.neighbor_radius < 0 {
            return Err(ConfigError::Invalid(
                "caves.max_level must be positive and neighbor_radius non-negative".into(),
            ));
        }

        let m = &self.mines;
        if m.enabled {
            if sx != sz {
                return Err(ConfigError::Invalid(format!(
                    "mines need a square chunk footprint, got {sx}x{sz}"
                )));
            }
            if m.node_height == 0 || m.height % m.node_height != 0 || m.height / m.node_height < 3 {
                return Err(ConfigError::Invalid(format!(
                    "mine height {} must hold at least three layers of {}",
                    m.height, m.node_height
                )));
            }
            if m.cluster_chunks == 0 || m.max_attempts == 0 {
                return Err(ConfigError::Invalid(
                    "mines.cluster_chunks and mines.max_attempts must be positive".into(),
                ));
            }
            check_probability("mines.chance_cross", m.chance_cross)?;
            check_probability("mines.chance_hal", m.chance_hal)?;
            check_probability("mines.chance_room", m.chance_room)?;
        }

        Ok(())
    }
}

// --- Load / Save / Reload ---

/// Platform config directory for strata (`~/.config/strata` on Linux).
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("strata")
}

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(false)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("water_line: 63"));
        assert!(ron_str.contains("seed: \"test\""));
    }

    #[test]
    fn test_terrain_defaults() {
        let t = TerrainConfig::default();
        assert_eq!((t.water_line, t.min_elevation, t.max_elevation), (63, 4, 255));
        assert_eq!(t.base_height, 68.0);
        assert_eq!(t.below_water_factor, 0.65);
        assert_eq!(t.below_water_bias, 1.5);
        assert_eq!(t.curve_divisor, 64.0);
    }

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().expect("defaults must validate");
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(world: (seed: \"abc\"), terrain: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.world.seed, "abc");
        assert_eq!(config.world.chunk_size, (16, 40, 16));
        assert_eq!(config.caves, CaveConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let mut config = Config::default();
        config.world.chunk_size = (16, 0, 16);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_non_square_footprint_rejected_only_with_mines() {
        let mut config = Config::default();
        config.world.chunk_size = (16, 40, 8);
        assert!(config.validate().is_err());
        config.mines.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_probability_rejected() {
        let mut config = Config::default();
        config.mines.chance_hal = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chance_hal"), "unexpected error: {err}");
    }

    #[test]
    fn test_inverted_cave_radii_rejected() {
        let mut config = Config::default();
        config.caves.min_radius = 6.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.world.seed = "saved".to_string();
        config.world.chunk_size = (16, 128, 16);

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.caves.neighbor_radius = 4;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.map(|c| c.caves.neighbor_radius), Some(4));
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
