//! Configuration for strata world generation.
//!
//! Settings persist to disk as RON files, accept CLI overrides via clap and
//! stay forward/backward compatible through `#[serde(default)]`.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CacheConfig, CaveConfig, Config, DebugConfig, MineConfig, TerrainConfig, WorkerConfig,
    WorldConfig, default_config_dir,
};
pub use error::ConfigError;
