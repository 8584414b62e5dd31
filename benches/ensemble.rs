//! Benchmarks for the cross-validated ensemble and the weight search.

use alloy_ensemble::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn alloys(n: usize) -> (Matrix<f32>, Vector<f32>) {
    let mut data = Vec::with_capacity(n * 3);
    let mut target = Vec::with_capacity(n);
    for i in 0..n {
        let ni = 45.0 + (i % 9) as f32;
        let ti = 49.0 - (i % 6) as f32;
        data.extend_from_slice(&[ni, ti, 100.0 - ni - ti]);
        target.push(18.0 * (ni - 45.0) - 6.0 * (49.0 - ti) + (i % 4) as f32);
    }
    (
        Matrix::from_vec(n, 3, data).unwrap(),
        Vector::from_vec(target),
    )
}

fn evaluator(n: usize) -> CrossValidatedEnsemble {
    let (x, y) = alloys(n);
    let split = train_test_split(&x, &y, 0.2, Some(42)).unwrap();
    CrossValidatedEnsemble::from_split(split)
        .unwrap()
        .with_models(BaseModelConfig::default().with_n_estimators(30, 10))
}

fn bench_fold_predictions(c: &mut Criterion) {
    let mut group = c.benchmark_group("fold_predictions");
    group.sample_size(10);

    for size in [50, 100, 200].iter() {
        let cv = evaluator(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| cv.fold_predictions().unwrap());
        });
    }

    group.finish();
}

fn bench_blend(c: &mut Criterion) {
    let mut group = c.benchmark_group("blend");

    for size in [50, 200].iter() {
        let folds = evaluator(*size).fold_predictions().unwrap();
        let weights = EnsembleWeights::uniform();
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| folds.blend(black_box(&weights)).unwrap());
        });
    }

    group.finish();
}

fn bench_bayesian_minimize(c: &mut Criterion) {
    let space = (0..5).fold(SearchSpace::new(), |s, i| s.add_real(format!("w{i}"), 0.0, 1.0));
    let optimizer = BayesianOptimizer::new()
        .with_n_calls(20)
        .with_n_initial_points(5)
        .with_n_candidates(1_000);

    c.bench_function("bayesian_minimize_20_calls", |b| {
        b.iter(|| {
            optimizer
                .minimize(&space, |x| Ok(x.iter().map(|v| (v - 0.3).powi(2)).sum()))
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_fold_predictions, bench_blend, bench_bayesian_minimize);
criterion_main!(benches);
