//! Benchmarks for strip nesting.
//!
//! Measures NFP construction, a single packing pass and a short GA run
//! at a few part counts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strip_nesting_d2::{compute_nfp, Config, NfpCache, Packer, Part, StripNester};

fn l_shape() -> Vec<(f64, f64)> {
    vec![
        (0.0, 0.0),
        (60.0, 0.0),
        (60.0, 20.0),
        (20.0, 20.0),
        (20.0, 50.0),
        (0.0, 50.0),
    ]
}

fn parts(n: usize, angles: &[f64]) -> Vec<Part> {
    (0..n)
        .map(|i| {
            if i % 3 == 0 {
                Part::from_outline(i, &l_shape(), angles, 2.0).unwrap()
            } else {
                let w = 20.0 + (i as f64 * 3.0) % 30.0;
                let h = 15.0 + (i as f64 * 7.0) % 25.0;
                Part::rectangle(i, w, h, angles, 2.0).unwrap()
            }
        })
        .collect()
}

fn bench_compute_nfp(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_nfp");
    let square = vec![(0.0, 0.0), (30.0, 0.0), (30.0, 30.0), (0.0, 30.0)];

    group.bench_function("rect_rect", |b| {
        b.iter(|| compute_nfp(black_box(&square), black_box(&square), 5.0, 1000))
    });
    group.bench_function("l_rect", |b| {
        b.iter(|| compute_nfp(black_box(&l_shape()), black_box(&square), 5.0, 1000))
    });
    group.bench_function("l_l", |b| {
        b.iter(|| compute_nfp(black_box(&l_shape()), black_box(&l_shape()), 5.0, 1000))
    });
    group.finish();
}

fn bench_packing_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("packing_pass");
    group.sample_size(10);

    for &n in &[10, 25, 50] {
        let config = Config::new().with_bin_width(300.0).with_spacing(3.0);
        let parts = parts(n, &config.allowed_angles);

        group.bench_with_input(BenchmarkId::new("warm_cache", n), &parts, |b, parts| {
            let cache = NfpCache::new();
            b.iter(|| {
                let layout = Packer::pack(&config, &cache, parts.iter().map(|p| (p, 0.0)));
                black_box(layout)
            })
        });
    }
    group.finish();
}

fn bench_ga_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("ga_run");
    group.sample_size(10);

    for &n in &[8, 16] {
        let config = Config::new()
            .with_bin_width(200.0)
            .with_spacing(3.0)
            .with_population_size(12)
            .with_generations(5)
            .with_seed(1);
        let parts = parts(n, &config.allowed_angles);

        group.bench_with_input(BenchmarkId::new("parts", n), &parts, |b, parts| {
            b.iter(|| {
                let nester = StripNester::new(parts.clone(), config.clone()).unwrap();
                black_box(nester.run())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compute_nfp, bench_packing_pass, bench_ga_run);
criterion_main!(benches);
