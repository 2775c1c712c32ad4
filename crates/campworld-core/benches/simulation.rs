use campworld_core::prelude::*;
use campworld_logic::progress::ProjectProgress;
use campworld_logic::settlement::generate_camp_layout;
use campworld_logic::terrain::{Terrain, TerrainSource};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

fn bench_terrain(c: &mut Criterion) {
    let terrain = Terrain::default();
    c.bench_function("terrain_height_grid_64", |b| {
        b.iter(|| {
            let mut sum = 0.0f32;
            for i in 0..64 {
                for j in 0..64 {
                    let x = -100.0 + i as f32 * 3.125;
                    let z = -100.0 + j as f32 * 3.125;
                    sum += terrain.height(black_box(x), black_box(z));
                }
            }
            sum
        })
    });
}

fn bench_layout(c: &mut Criterion) {
    c.bench_function("camp_layout_full", |b| {
        let mut id = 0u32;
        b.iter(|| {
            id = id.wrapping_add(1);
            generate_camp_layout(black_box(id), 25)
        })
    });
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_update");
    group.sample_size(30);
    group.bench_function("ticks_60", |b| {
        b.iter_batched(
            || {
                let mut sim = WorldSimulation::new(WorldConfig::default()).unwrap();
                sim.sync_settlement(&ProjectProgress::new(1, -40.0, 35.0, 15));
                sim
            },
            |mut sim| {
                for _ in 0..60 {
                    sim.update(1.0 / 60.0);
                }
                sim.drain_events();
                sim
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_terrain, bench_layout, bench_update);
criterion_main!(benches);
