//! Criterion benchmarks for the arbitrary-dimension QuickHull engine.
//! Focus sizes: n in {10, 50, 200} points, dimensions in {2, 3, 4}.
//! Results: by default under target/criterion; to store under data/bench, run:
//!   CARGO_TARGET_DIR=data/bench cargo bench -p sfc

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use nalgebra::DMatrix;
use rand::{rngs::StdRng, Rng, SeedableRng};
use sfc::config::HullCfg;
use sfc::geo::quickhull;

fn random_points(dim: usize, n: usize, seed: u64) -> DMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    DMatrix::from_fn(dim, n, |_, _| rng.gen_range(-1.0..1.0))
}

fn bench_quickhull(c: &mut Criterion) {
    let mut group = c.benchmark_group("quickhull");
    for &dim in &[2usize, 3, 4] {
        for &n in &[10usize, 50, 200] {
            group.bench_with_input(BenchmarkId::new(format!("d{dim}"), n), &n, |b, &n| {
                b.iter_batched(
                    || random_points(dim, n, 7),
                    |points| {
                        let _ = quickhull(&points, HullCfg::default());
                    },
                    BatchSize::SmallInput,
                )
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_quickhull);
criterion_main!(benches);
