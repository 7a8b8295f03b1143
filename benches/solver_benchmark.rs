//! Solver benchmarks
//!
//! Benchmarks single steps and whole trajectories for monolithic and
//! composite blocks.

use blocksim::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Diagonal exponential decay: dx_i/dt = -k*x_i
fn decay(n: usize, k: f64) -> Ode<impl FnMut(f64, &[f64], &[f64], &mut [f64])> {
    Ode::new(n, move |_t, x, _u, dx| {
        for (d, &v) in dx.iter_mut().zip(x) {
            *d = -k * v;
        }
    })
}

/// Benchmark RK4 and Euler steps with different state vector sizes
fn bench_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("Step");

    for size in [1, 5, 10, 20, 50, 100].iter() {
        let mut block = decay(*size, 0.5);
        let state = vec![1.0; *size];
        let mut output = vec![0.0; *size];
        let mut scratch = Rk4Scratch::new(*size).unwrap();

        group.bench_with_input(BenchmarkId::new("rk4", size), size, |b, _| {
            b.iter(|| {
                rk4_step(
                    &mut block,
                    0.0,
                    black_box(0.001),
                    &state,
                    StageInputs::constant(&[]),
                    &mut output,
                    &mut scratch,
                );
                black_box(scratch.next()[0]);
            });
        });

        let mut next = vec![0.0; *size];
        let mut d_state = vec![0.0; *size];
        group.bench_with_input(BenchmarkId::new("euler", size), size, |b, _| {
            b.iter(|| {
                euler_step(&mut block, 0.0, black_box(0.001), &state, &[], &mut output, &mut d_state, &mut next);
                black_box(next[0]);
            });
        });
    }

    group.finish();
}

/// Benchmark the RK4 driver for a fixed problem over many steps
fn bench_rk4_trajectory(c: &mut Criterion) {
    let n = 10;
    let dt = 0.001;
    let time = time_vector(1001, dt, 0.0);
    let initial = vec![1.0; n];
    let mut outputs = vec![0.0; time.len() * n];
    let mut block = decay(n, 0.5);

    c.bench_function("RK4 1000 steps (n=10)", |b| {
        b.iter(|| {
            simulate_rk4(&mut block, black_box(dt), &time, &initial, &[], &[], &mut outputs).unwrap();
            black_box(outputs[outputs.len() - 1]);
        });
    });
}

/// Benchmark a chain of coupled masses built as a composite system
fn bench_composite_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("Composite chain");
    let dt = 0.001;
    let time = time_vector(1001, dt, 0.0);

    for n in [2usize, 10, 20].iter() {
        let n = *n;
        let mut system = SystemBuilder::new()
            .children((0..n).map(|_| {
                Box::new(Ode::with_inputs(2, 1, |_t, x, u, dx| {
                    dx[0] = x[1];
                    dx[1] = u[0] - 0.05 * x[1];
                })) as Box<dyn Block>
            }))
            .routing(move |_t, signals, _u| {
                for i in 0..n {
                    let x = signals.state(i)[0];
                    let left = if i > 0 { signals.state(i - 1)[0] } else { 0.0 };
                    let right = if i + 1 < n { signals.state(i + 1)[0] } else { 0.0 };
                    signals.input_mut(i)[0] = -(x - left) - (x - right);
                }
            })
            .output(1, |_t, signals, y| y[0] = signals.state(0)[0])
            .build()
            .unwrap();

        let mut initial = vec![0.0; 2 * n];
        initial[0] = 1.0;
        let mut outputs = vec![0.0; time.len()];

        group.bench_with_input(BenchmarkId::new("masses", n), &n, |b, _| {
            b.iter(|| {
                simulate_rk4(&mut system, black_box(dt), &time, &initial, &[], &[], &mut outputs).unwrap();
                black_box(outputs[outputs.len() - 1]);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_steps, bench_rk4_trajectory, bench_composite_chain);
criterion_main!(benches);
