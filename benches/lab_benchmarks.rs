// benches/lab_benchmarks.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kuramoto_lab_sim::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn benchmark_lab_operations(c: &mut Criterion) {
    let graph = build_graph(&Topology::FullyConnected, 64, 0.2, OffsetMode::Chiral, 0);
    let params = CouplingParams::default();

    c.bench_function("derivative_baseline_n64", |b| {
        let mut rng = StdRng::seed_from_u64(0);
        let theta: Vec<f64> = (0..64).map(|i| i as f64 * 0.1).collect();
        let omega = vec![0.0; 64];
        let memory = vec![0.0; 64];
        b.iter(|| {
            PhysicsModel::Baseline.derivative(
                black_box(&theta),
                &omega,
                &memory,
                &graph,
                &params,
                &mut rng,
            )
        });
    });

    c.bench_function("rk4_step_n64", |b| {
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = OscillatorState::new((0..64).map(|i| i as f64 * 0.1).collect(), vec![0.1; 64]);
        b.iter(|| {
            advance(
                IntegratorScheme::Rk4,
                PhysicsModel::Baseline,
                &mut state,
                &graph,
                &params,
                black_box(0.05),
                &mut rng,
            )
        });
    });

    c.bench_function("order_parameter_n1024", |b| {
        let theta: Vec<f64> = (0..1024).map(|i| (i as f64 * 0.37).sin() * 3.0).collect();
        b.iter(|| order_parameter(black_box(&theta)));
    });

    c.bench_function("run_simulation_ring_n32_t10", |b| {
        let config = SimulationConfig {
            n_oscillators: 32,
            t_end: 10.0,
            ..Default::default()
        };
        b.iter(|| run_simulation(black_box(&config)));
    });

    c.bench_function("artifact_bundle_200_rows", |b| {
        let config = SimulationConfig {
            n_oscillators: 16,
            dt: 0.1,
            t_end: 20.0,
            ..Default::default()
        };
        let result = run_simulation(&config).unwrap();
        b.iter(|| build_artifact_bundle(black_box(&result)));
    });
}

criterion_group!(benches, benchmark_lab_operations);
criterion_main!(benches);
