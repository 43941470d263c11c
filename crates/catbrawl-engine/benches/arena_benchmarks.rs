//! Frame-loop benchmarks.
//!
//! Measures one arena frame with a crowd of idle-walking viewers, the same
//! crowd in the middle of a zombie invasion, and state hashing.
//!
//! Run with: `cargo bench --bench arena_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use catbrawl_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// An arena with `viewers` idle-walking viewers.
fn crowd(viewers: usize) -> Arena {
    let config = ArenaConfig {
        seed: 42,
        ..Default::default()
    };
    let mut arena = Arena::new(config, Services::silent()).unwrap();
    for i in 0..viewers {
        let id = arena.spawn_viewer(&format!("viewer_{i}")).unwrap();
        arena.brain_mut(id).unwrap().queue_mut().run_idle_walking();
    }
    arena
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_idle_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("idle_frame");
    for viewers in [10, 100, 500] {
        let mut arena = crowd(viewers);
        arena.run_ticks(60);
        group.bench_with_input(BenchmarkId::from_parameter(viewers), &viewers, |b, _| {
            b.iter(|| {
                arena.tick();
                black_box(arena.tick_count());
            });
        });
    }
    group.finish();
}

fn bench_invasion_frame(c: &mut Criterion) {
    c.bench_function("invasion_frame_100_viewers", |b| {
        b.iter_batched(
            || {
                let mut arena = crowd(100);
                arena.start_zombie_event().unwrap();
                // Past the prediction window: zombies are on stage.
                let window = arena.config().zombie.prediction_secs;
                let frames = (window / arena.fixed_dt()).ceil() as u64 + 1;
                arena.run_ticks(frames);
                arena
            },
            |mut arena| {
                for _ in 0..10 {
                    arena.tick();
                }
                black_box(arena.world().len());
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

fn bench_state_hash(c: &mut Criterion) {
    let mut arena = crowd(100);
    arena.run_ticks(60);
    c.bench_function("state_hash_100_viewers", |b| {
        b.iter(|| black_box(arena.state_hash()));
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_idle_frame, bench_invasion_frame, bench_state_hash);
criterion_main!(benches);
