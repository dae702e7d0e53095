//! # Pool and Bit Vector Benchmarks
//!
//! Run with: `cargo bench --package tessera_core`

// Benchmarks don't need docs and may have intentionally unused code
#![allow(missing_docs)]
#![allow(dead_code)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_core::{BitVector, ObjectPool, Poolable, ResizePolicy};

#[derive(Default)]
struct Particle {
    position: [f32; 3],
    life: f32,
}

impl Poolable for Particle {
    fn on_return(&mut self) {
        self.life = 0.0;
    }
}

/// Benchmark: acquire/release churn on a warm pool.
fn bench_pool_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_churn");

    for count in [1_000usize, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut pool = ObjectPool::new(count, ResizePolicy::ReturnNull, Particle::default);
            let mut handles = Vec::with_capacity(count);
            b.iter(|| {
                for _ in 0..count {
                    if let Some(handle) = pool.acquire() {
                        if let Some(particle) = pool.get_mut(handle) {
                            particle.position[0] += 1.0;
                            particle.life = 1.0;
                        }
                        handles.push(handle);
                    }
                }
                for handle in handles.drain(..) {
                    black_box(pool.release(handle));
                }
            });
        });
    }

    group.finish();
}

/// Benchmark: aspect-style mask checks over wide masks.
fn bench_bit_vector_contains_all(c: &mut Criterion) {
    let required = BitVector::from_bits([3, 17, 64, 130]);
    let masks: Vec<BitVector> = (0..10_000)
        .map(|i| BitVector::from_bits([i % 200, 3, 17, 64, (i * 7) % 200]))
        .collect();

    c.bench_function("bit_vector_contains_all_10k", |b| {
        b.iter(|| masks.iter().filter(|mask| mask.contains_all(&required)).count());
    });
}

criterion_group!(benches, bench_pool_churn, bench_bit_vector_contains_all);
criterion_main!(benches);
