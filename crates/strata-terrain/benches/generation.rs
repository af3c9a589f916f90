use criterion::{Criterion, black_box, criterion_group, criterion_main};
use strata_config::Config;
use strata_terrain::*;
use strata_voxel::{ChunkAddress, ColumnAddress};

fn generator() -> TerrainGenerator {
    TerrainGenerator::new(&Config::default()).unwrap()
}

fn bench_noise_height(c: &mut Criterion) {
    let noise = NoiseField::new("bench");
    c.bench_function("noise_height", |bencher| {
        let mut x = 0.0;
        bencher.iter(|| {
            x += 1.0;
            black_box(noise.height(black_box(x), 17.0))
        })
    });
}

fn bench_seeded_random(c: &mut Criterion) {
    c.bench_function("seeded_random_new_and_draw", |bencher| {
        let mut i = 0;
        bencher.iter(|| {
            i += 1;
            let mut rnd = SeededRandom::new("bench", black_box(i));
            black_box(rnd.next_double())
        })
    });
}

fn bench_height_map_cold(c: &mut Criterion) {
    let generator = generator();
    c.bench_function("height_map_cold", |bencher| {
        let mut x = 0;
        bencher.iter(|| {
            x += 3;
            black_box(generator.heights().get(ColumnAddress::new(x, 0)))
        })
    });
}

fn bench_cave_generation(c: &mut Criterion) {
    let generator = generator();
    c.bench_function("cave_cold", |bencher| {
        let mut x = 0;
        bencher.iter(|| {
            x += 1;
            black_box(generator.caves().get(ColumnAddress::new(x, 0)))
        })
    });
}

fn bench_chunk_warm(c: &mut Criterion) {
    let generator = generator();
    let address = ChunkAddress::new(0, 1, 0);
    generator.generate(address);
    c.bench_function("chunk_generate_warm", |bencher| {
        bencher.iter(|| black_box(generator.generate(black_box(address))))
    });
}

fn bench_chunk_cold(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_generate_cold");
    group.sample_size(10);
    group.bench_function("fresh_generator", |bencher| {
        bencher.iter(|| black_box(generator().generate(ChunkAddress::new(0, 1, 0))))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_noise_height,
    bench_seeded_random,
    bench_height_map_cold,
    bench_cave_generation,
    bench_chunk_warm,
    bench_chunk_cold,
);
criterion_main!(benches);
