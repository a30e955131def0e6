#![allow(clippy::expect_used, clippy::unwrap_used, missing_docs)]
//! Benchmark for breakpoint classification.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use thematic_viz::prelude::*;

fn skewed_values(size: usize) -> Vec<FeatureValue> {
    // Long-tailed distribution with some repeats, similar to flow counts
    (0..size)
        .map(|i| {
            let x = i as f64 / size as f64;
            FeatureValue::new(i as u64, (x * 6.0).exp() + (i % 13) as f64)
        })
        .collect()
}

fn classify_benchmark(c: &mut Criterion) {
    let key = StyleKey::parse("polygon-continuous").unwrap();

    for method in [
        ClassificationMethod::Quantile,
        ClassificationMethod::EqualInterval,
        ClassificationMethod::Logarithmic,
        ClassificationMethod::KMeans,
    ] {
        let mut group = c.benchmark_group(format!("classify/{method}"));

        for size in [100, 1_000, 10_000, 100_000] {
            let values = skewed_values(size);

            group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
                b.iter(|| classify(black_box(&values), key, method, None));
            });
        }

        group.finish();
    }
}

fn pipeline_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("style");
    let styler = ThematicStyler::default();

    for id in ["polygon-continuous", "line-diverging", "circle-continuous"] {
        let key = StyleKey::parse(id).unwrap();
        let values = skewed_values(10_000);

        let request = StyleRequest::new(&values, "page", "metric");
        group.bench_with_input(BenchmarkId::from_parameter(id), &key, |b, key| {
            b.iter(|| styler.style(*key, black_box(&request)));
        });
    }

    group.finish();
}

criterion_group!(benches, classify_benchmark, pipeline_benchmark);
criterion_main!(benches);
