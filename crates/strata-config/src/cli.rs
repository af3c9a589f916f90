//! Command-line argument parsing for the generator tools.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Strata world generator command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "strata-gen", about = "Generate and inspect strata worlds")]
pub struct CliArgs {
    /// World seed.
    #[arg(long)]
    pub seed: Option<String>,

    /// Chunk height in voxels.
    #[arg(long)]
    pub chunk_height: Option<u32>,

    /// Radius, in chunks, of the square region to generate.
    #[arg(long, default_value_t = 2)]
    pub radius: i32,

    /// Worker thread count (0 = auto).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref seed) = args.seed {
            self.world.seed = seed.clone();
        }
        if let Some(height) = args.chunk_height {
            self.world.chunk_size.1 = height;
        }
        if let Some(threads) = args.threads {
            self.workers.threads = threads;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs::parse_from(["strata-gen", "--seed", "moon", "--chunk-height", "128"]);
        config.apply_cli_overrides(&args);
        assert_eq!(config.world.seed, "moon");
        assert_eq!(config.world.chunk_size, (16, 128, 16));
        // Non-overridden fields retain defaults
        assert_eq!(config.workers.threads, 0);
        assert_eq!(args.radius, 2);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        let args = CliArgs::parse_from(["strata-gen"]);
        config.apply_cli_overrides(&args);
        assert_eq!(config, original);
    }
}
