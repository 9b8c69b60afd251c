//! Throughput benchmarks for the f64 drivers against standard-library
//! scalar loops, across sizes that land in different cache levels.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lanemath::{vdcdf, vddot, vdexp, vdsin};

/// 8 KiB (L1), 512 KiB (L2) and 8 MiB (L3 / memory) working sets.
const VECTOR_SIZES: &[usize] = &[1_024, 65_536, 1_048_576];

fn generate(n: usize, lo: f64, hi: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    (0..n).map(|_| rng.random_range(lo..=hi)).collect()
}

fn bench_exp(c: &mut Criterion) {
    let mut group = c.benchmark_group("exp_f64");

    for &size in VECTOR_SIZES {
        let input = generate(size, -50.0, 50.0);
        let mut out = vec![0.0f64; size];
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("scalar", size), &input, |b, input| {
            b.iter(|| {
                for (o, &x) in out.iter_mut().zip(input.iter()) {
                    *o = x.exp();
                }
                black_box(&out);
            })
        });

        group.bench_with_input(BenchmarkId::new("vdexp", size), &input, |b, input| {
            b.iter(|| {
                vdexp(black_box(input), &mut out).unwrap();
                black_box(&out);
            })
        });
    }

    group.finish();
}

fn bench_sin(c: &mut Criterion) {
    let mut group = c.benchmark_group("sin_f64");

    for &size in VECTOR_SIZES {
        let input = generate(size, -100.0, 100.0);
        let mut out = vec![0.0f64; size];
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("scalar", size), &input, |b, input| {
            b.iter(|| {
                for (o, &x) in out.iter_mut().zip(input.iter()) {
                    *o = x.sin();
                }
                black_box(&out);
            })
        });

        group.bench_with_input(BenchmarkId::new("vdsin", size), &input, |b, input| {
            b.iter(|| {
                vdsin(black_box(input), &mut out).unwrap();
                black_box(&out);
            })
        });
    }

    group.finish();
}

fn bench_cdf(c: &mut Criterion) {
    let mut group = c.benchmark_group("cdf_f64");

    for &size in VECTOR_SIZES {
        let input = generate(size, -6.0, 6.0);
        let mut out = vec![0.0f64; size];
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("vdcdf", size), &input, |b, input| {
            b.iter(|| {
                vdcdf(0.0, 1.0, black_box(input), &mut out).unwrap();
                black_box(&out);
            })
        });
    }

    group.finish();
}

fn bench_dot(c: &mut Criterion) {
    let mut group = c.benchmark_group("dot_f64");

    for &size in VECTOR_SIZES {
        let x = generate(size, -1.0, 1.0);
        let y = generate(size, -1.0, 1.0);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("vddot", size), &size, |b, _| {
            b.iter(|| black_box(vddot(black_box(&x), black_box(&y)).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_exp, bench_sin, bench_cdf, bench_dot);
criterion_main!(benches);
