//! Parallel sweep benchmarks.
//!
//! Measures how long a sweep of independent protocol instances takes on the
//! rayon pool, including graph generation and per-instance preparation.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
#![expect(
    clippy::shadow_reuse,
    reason = "Criterion bench_with_input closures rebind parameter names"
)]
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use ciphermst_benches::{
    error::BenchSetupError,
    fixtures::{bench_model, fitted_config},
    params::SweepBenchParams,
};
use ciphermst_core::{EncodingStrategy, SimulatedOracle, Sweep};

/// Seed used for all graph generation in this benchmark.
const SEED: u64 = 7;

/// Sweeps to benchmark, each a list of instance sizes.
const PLANS: &[&[usize]] = &[&[8; 4], &[4, 8, 12, 16], &[16; 8]];

fn sweep_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("parallel_sweep");
    group.sample_size(10);

    for plan in PLANS {
        let largest = plan.iter().copied().max().unwrap_or_default();
        let model = bench_model(largest);
        let config = fitted_config(EncodingStrategy::AdjacencyMatrix, largest, model.edge_count())?;
        let sweep = Sweep::new(plan, SEED).with_model(model);
        let bench_params = SweepBenchParams {
            node_counts: plan.to_vec(),
        };

        group.bench_with_input(
            BenchmarkId::from_parameter(&bench_params),
            &(&sweep, &config),
            |b, &(sweep, config)| {
                b.iter(|| {
                    let _records = sweep.run(config, |_| SimulatedOracle::exact());
                });
            },
        );
    }
    group.finish();
    Ok(())
}

fn parallel_sweep(c: &mut Criterion) {
    if let Err(err) = sweep_impl(c) {
        panic!("parallel_sweep benchmark setup failed: {err}");
    }
}

criterion_group!(benches, parallel_sweep);
criterion_main!(benches);
