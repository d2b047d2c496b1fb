use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use murmur_infra::{HostComputeBackend, HostKernelTable};
use murmur_sdk::prelude::*;
use std::hint::black_box;

fn bench_ticks(c: &mut Criterion) {
    let mut group = c.benchmark_group("Host tick");

    for swarm_size in [10usize, 100, 500] {
        let config = SimulationConfig {
            swarm_size,
            predator_count: 1,
            seed: Some(7),
            backend: BackendKind::Host,
            ..SimulationConfig::default()
        };
        let backend =
            HostComputeBackend::new(HostKernelTable::flocking(config.flocking, config.field));
        let Ok(mut engine) = SimulationEngine::new(config, &backend) else {
            continue;
        };

        group.bench_with_input(
            BenchmarkId::from_parameter(swarm_size),
            &swarm_size,
            |b, _| {
                b.iter(|| {
                    // Failed ticks are part of what is measured.
                    let _ = black_box(engine.tick());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_ticks);
criterion_main!(benches);
