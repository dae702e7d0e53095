//! # Refresh and Processing Benchmarks
//!
//! Run with: `cargo bench --package tessera_ecs`

// Benchmarks don't need docs and may have intentionally unused code
#![allow(missing_docs)]
#![allow(dead_code)]

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_ecs::{AspectBuilder, GameTime, System, SystemContext, SystemOptions, World};

#[derive(Default)]
struct Position([f32; 3]);

#[derive(Default)]
struct Velocity([f32; 3]);

#[derive(Default)]
struct Frozen;

struct Movement;

impl System for Movement {
    fn aspect(&self) -> AspectBuilder {
        AspectBuilder::new().all::<(Position, Velocity)>().none::<(Frozen,)>()
    }

    fn process(&mut self, ctx: &mut SystemContext<'_>) {
        let dt = ctx.time.elapsed_secs();
        for &entity in ctx.active {
            let Some(velocity) = ctx.entities.get::<Velocity>(entity).map(|v| v.0) else {
                continue;
            };
            if let Some(position) = ctx.entities.get_mut::<Position>(entity) {
                for axis in 0..3 {
                    position.0[axis] += velocity[axis] * dt;
                }
            }
        }
    }
}

fn populated_world(count: usize) -> World {
    let mut world = World::new();
    world
        .add_system(Movement, SystemOptions::update())
        .unwrap_or_else(|err| panic!("{err}"));
    for i in 0..count {
        let entity = world.create_entity();
        world.entities_mut().insert(entity, Position::default());
        world.entities_mut().insert(entity, Velocity([1.0, 0.0, 0.5]));
        if i % 10 == 0 {
            world.entities_mut().attach::<Frozen>(entity);
        }
    }
    world.flush();
    world
}

/// Benchmark: freeze and thaw a tenth of the world, paying for the refresh.
fn bench_refresh_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("refresh_churn");

    for count in [1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut world = populated_world(count);
            let targets: Vec<_> = world.entities().entities().step_by(10).collect();
            b.iter(|| {
                for &entity in &targets {
                    world.entities_mut().detach::<Frozen>(entity);
                }
                black_box(world.flush());
                for &entity in &targets {
                    world.entities_mut().attach::<Frozen>(entity);
                }
                black_box(world.flush());
            });
        });
    }

    group.finish();
}

/// Benchmark: steady-state update with nothing to refresh.
fn bench_update(c: &mut Criterion) {
    let mut world = populated_world(10_000);
    let time = GameTime::from_elapsed(Duration::from_millis(16));

    c.bench_function("update_movement_10k", |b| {
        b.iter(|| world.update(black_box(time)));
    });
}

/// Benchmark: create and destroy entities through the deferred path.
fn bench_create_destroy(c: &mut Criterion) {
    let mut world = populated_world(0);

    c.bench_function("create_destroy_1k", |b| {
        b.iter(|| {
            for _ in 0..1_000 {
                let entity = world.create_entity();
                world.entities_mut().insert(entity, Position::default());
                world.entities_mut().mark_for_removal(entity);
            }
            black_box(world.flush());
        });
    });
}

criterion_group!(benches, bench_refresh_churn, bench_update, bench_create_destroy);
criterion_main!(benches);
