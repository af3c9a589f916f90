//! Generates a square region of chunks and reports what ended up in it.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p strata-demo -- --seed moon --radius 4`.

use std::collections::BTreeMap;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use strata_config::{CliArgs, Config, default_config_dir};
use strata_terrain::{AsyncChunkGenerator, GeneratedChunk, TerrainGenerator, hash_chunk};
use strata_voxel::{BlockId, ChunkAddress};
use tracing::{error, info, warn};

/// Vertical chunk layers generated per column.
const LAYERS: i32 = 3;

fn region(radius: i32) -> Vec<ChunkAddress> {
    let mut addresses = Vec::new();
    for y in 0..LAYERS {
        for z in -radius..=radius {
            for x in -radius..=radius {
                addresses.push(ChunkAddress::new(x, y, z));
            }
        }
    }
    // Nearest columns first.
    addresses.sort_by_key(|a| (a.x * a.x + a.z * a.z, a.y));
    addresses
}

fn run(generator: Arc<TerrainGenerator>, config: &Config, radius: i32) -> std::io::Result<Vec<GeneratedChunk>> {
    let pool = AsyncChunkGenerator::from_config(generator, &config.workers)?;
    let mut pending = region(radius).into_iter().peekable();
    let total = pending.len();
    let mut done = Vec::with_capacity(total);

    while done.len() < total {
        while let Some(&address) = pending.peek() {
            if pool.submit(address).is_err() {
                break;
            }
            pending.next();
        }
        let batch = pool.drain_results();
        if batch.is_empty() {
            std::thread::sleep(Duration::from_millis(2));
        }
        done.extend(batch);
    }
    Ok(done)
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    strata_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let generator = match TerrainGenerator::new(&config) {
        Ok(generator) => Arc::new(generator),
        Err(e) => {
            error!("Cannot build the generator: {e}");
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let chunks = match run(Arc::clone(&generator), &config, args.radius.max(0)) {
        Ok(chunks) => chunks,
        Err(e) => {
            error!("Cannot start worker threads: {e}");
            return ExitCode::FAILURE;
        }
    };
    let elapsed = start.elapsed();

    let mut histogram: BTreeMap<BlockId, usize> = BTreeMap::new();
    let mut slowest = 0;
    let mut digest = 0u64;
    for generated in &chunks {
        for (block, count) in generated.chunk.block_histogram() {
            *histogram.entry(block).or_default() += count;
        }
        slowest = slowest.max(generated.generation_time_us);
        digest ^= hash_chunk(&generated.chunk);
    }

    info!(
        seed = generator.seed(),
        chunks = chunks.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        slowest_us = slowest,
        digest = %format!("{digest:016x}"),
        "Region generated"
    );
    for (block, count) in &histogram {
        let name = generator.registry().get(*block).map_or("?", |def| def.name.as_str());
        info!(block = name, count, "Block total");
    }
    if histogram.len() <= 1 {
        warn!("Region contains a single block type");
    }

    ExitCode::SUCCESS
}
