//! End-to-end tests of the experiment pipeline on a small CSV.

use alloy_ensemble::config::{ExperimentConfig, OptimizerConfig};
use alloy_ensemble::ensemble::{BaseModel, BaseModelConfig, EnsembleWeights};
use alloy_ensemble::experiment::{Experiment, IMPORTANCE_FILE, OPTIMIZATION_FILE, PERFORMANCE_FILE};
use alloy_ensemble::report::PerformanceTable;
use std::path::Path;

/// Writes 50 Ni-Ti-Hf-Zr alloys with an id column and a trailing target.
fn write_alloys(dir: &Path) -> std::path::PathBuf {
    write_n_alloys(dir, 50)
}

fn write_n_alloys(dir: &Path, n_rows: usize) -> std::path::PathBuf {
    let mut text = String::from("id,Ni,Ti,Hf,Zr,Am\n");
    for i in 0..n_rows {
        let ni = 44 + i % 9;
        let ti = 49 - i % 6;
        let hf = i % 4;
        let zr = 100 - ni - ti - hf;
        let am = 18 * (ni - 44) - 6 * (49 - ti) + 5 * hf + (i * 5) % 4;
        text.push_str(&format!("{i},{ni},{ti},{hf},{zr},{am}\n"));
    }
    let path = dir.join("alloys.csv");
    std::fs::write(&path, text).expect("write dataset");
    path
}

fn config(data: &Path, out: &Path) -> ExperimentConfig {
    ExperimentConfig::default()
        .with_data_path(data)
        .with_output_dir(out)
        .with_feature_columns(1..5)
        .with_target_column(5)
        .with_sweep_elements(["Hf", "Zr"])
        .with_models(BaseModelConfig::default().with_n_estimators(12, 8))
        .with_optimizer(OptimizerConfig {
            n_calls: 10,
            n_initial_points: 5,
            n_candidates: 300,
            ..OptimizerConfig::default()
        })
}

#[test]
fn test_weight_search_is_deterministic() {
    let dir = tempfile::tempdir().expect("temp dir");
    let data = write_alloys(dir.path());
    let experiment = Experiment::load(config(&data, dir.path())).expect("load");

    let first = experiment.optimize_weights().expect("first search");
    let second = experiment.optimize_weights().expect("second search");
    assert_eq!(first.weights, second.weights);
    assert_eq!(first.result.func_vals, second.result.func_vals);

    let reloaded = Experiment::load(config(&data, dir.path())).expect("reload");
    let third = reloaded.optimize_weights().expect("third search");
    assert_eq!(first.weights, third.weights);
}

#[test]
fn test_default_budget_search_is_reproducible() {
    let dir = tempfile::tempdir().expect("temp dir");
    let data = write_n_alloys(dir.path(), 60);
    let config = ExperimentConfig::default()
        .with_data_path(&data)
        .with_output_dir(dir.path())
        .with_feature_columns(1..5)
        .with_target_column(5)
        .with_models(BaseModelConfig::default().with_n_estimators(6, 4));
    assert_eq!(config.optimizer, OptimizerConfig::default());
    assert_eq!((config.seed, config.n_splits), (42, 5));

    let first = Experiment::load(config.clone()).expect("load").optimize_weights().expect("first");
    let second = Experiment::load(config).expect("reload").optimize_weights().expect("second");
    assert_eq!(first.result.func_vals.len(), 50);
    assert_eq!(first.result.x_iters.len(), 50);
    assert_eq!(first.weights, second.weights);
    assert_eq!(first.result.x_iters, second.result.x_iters);
    assert_eq!(first.result.func_vals, second.result.func_vals);
    assert!(first.result.func_vals.iter().all(|v| v.is_finite()));
}

#[test]
fn test_best_weights_beat_every_initial_point() {
    let dir = tempfile::tempdir().expect("temp dir");
    let data = write_alloys(dir.path());
    let experiment = Experiment::load(config(&data, dir.path())).expect("load");

    let search = experiment.optimize_weights().expect("search");
    let best = search.result.fun;
    assert!(search.result.func_vals.iter().all(|&v| best <= v));

    let sum: f64 = search.weights.as_array().iter().sum();
    assert!((sum - 1.0).abs() < 1e-9);
    assert!(search.weights.as_array().iter().all(|&w| (0.0..=1.0).contains(&w)));
}

#[test]
fn test_run_writes_all_outputs() {
    let dir = tempfile::tempdir().expect("temp dir");
    let data = write_alloys(dir.path());
    let out = dir.path().join("out");
    let outputs = Experiment::load(config(&data, &out))
        .expect("load")
        .run()
        .expect("run");

    assert!(outputs.search.is_some());
    assert_eq!(outputs.importances.len(), 4);
    assert_eq!(outputs.files.len(), 5);
    for name in [
        OPTIMIZATION_FILE,
        PERFORMANCE_FILE,
        IMPORTANCE_FILE,
        "Ni_Ti_Hf_combinations.csv",
        "Ni_Ti_Zr_combinations.csv",
    ] {
        assert!(out.join(name).is_file(), "{name} not written");
    }

    let table = PerformanceTable::read_csv(std::fs::File::open(out.join(PERFORMANCE_FILE)).expect("open table"))
        .expect("read table");
    assert_eq!(table.n_rows(), 100);
    let decision = table.column("Decision Line X").expect("decision line column");
    assert!(decision.windows(2).all(|w| w[0] <= w[1]));

    let sweep = std::fs::read_to_string(out.join("Ni_Ti_Zr_combinations.csv")).expect("sweep");
    assert_eq!(sweep.lines().count(), 4852);
}

#[test]
fn test_fixed_weights_skip_search() {
    let dir = tempfile::tempdir().expect("temp dir");
    let data = write_alloys(dir.path());
    let weights = EnsembleWeights::from_pairs([(BaseModel::Svr, 0.3), (BaseModel::ExtraTrees, 0.7)])
        .expect("valid weights");
    let outputs = Experiment::load(config(&data, dir.path()).with_weights(weights))
        .expect("load")
        .run()
        .expect("run");

    assert!(outputs.search.is_none());
    assert_eq!(outputs.weights, weights);
    assert!(!dir.path().join(OPTIMIZATION_FILE).exists());
    assert!(outputs.summary.train_rmse.is_finite());
    assert!(outputs.summary.test_rmse.is_finite());
}

#[test]
fn test_single_model_evaluation_matches_evaluator() {
    let dir = tempfile::tempdir().expect("temp dir");
    let data = write_alloys(dir.path());
    let experiment = Experiment::load(config(&data, dir.path())).expect("load");

    let report = experiment
        .evaluate(&EnsembleWeights::one_hot(BaseModel::Knn))
        .expect("evaluate");
    let direct = experiment
        .evaluator()
        .single_model_rmse(BaseModel::Knn)
        .expect("single model");
    assert!((report.evaluation.validation_rmse - direct).abs() < 1e-9);
}

#[test]
fn test_missing_target_column_fails() {
    let dir = tempfile::tempdir().expect("temp dir");
    let data = write_alloys(dir.path());
    let bad = config(&data, dir.path()).with_target_column(9);
    assert!(Experiment::load(bad).is_err());
}
