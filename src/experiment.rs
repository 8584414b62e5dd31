//! End-to-end experiment: load, split, search the blending weights, report.
//!
//! The base models are fitted once per fold; every weight vector proposed
//! by the optimiser is scored by re-blending those cached predictions.
//!
//! # Example
//!
//! ```no_run
//! use alloy_ensemble::config::ExperimentConfig;
//! use alloy_ensemble::experiment::Experiment;
//!
//! # fn main() -> alloy_ensemble::Result<()> {
//! let config = ExperimentConfig::default().with_data_path("HTSMA_DATA.csv");
//! let outputs = Experiment::load(config)?.run()?;
//! println!("{}", outputs.weights);
//! println!("{}", outputs.summary);
//! # Ok(())
//! # }
//! ```

use crate::automl::{OptimizationResult, SearchSpace};
use crate::config::ExperimentConfig;
use crate::data::Dataset;
use crate::ensemble::{
    BaseModel, CrossValidatedEnsemble, EnsembleEvaluation, EnsembleWeights, FeatureImportance,
    FittedEnsemble,
};
use crate::error::Result;
use crate::model_selection::{train_test_split, KFold};
use crate::report::{
    save_importances, CompositionSweep, PerformanceSummary, PerformanceTable, UncertaintyBands,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Performance table file name.
pub const PERFORMANCE_FILE: &str = "Am_performance.csv";
/// Feature importance file name.
pub const IMPORTANCE_FILE: &str = "ensemble_feature_importances.csv";
/// Weight search result file name.
pub const OPTIMIZATION_FILE: &str = "optimization.json";

/// One `[0, 1]` dimension per base model, named after its weight.
#[must_use]
pub fn weight_search_space() -> SearchSpace {
    BaseModel::ALL
        .iter()
        .fold(SearchSpace::new(), |space, model| space.add_real(model.weight_param(), 0.0, 1.0))
}

/// Outcome of the weight search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightSearch {
    /// Raw optimiser trace
    pub result: OptimizationResult,
    /// Normalised best weights
    pub weights: EnsembleWeights,
}

impl WeightSearch {
    /// Writes [`OPTIMIZATION_FILE`] into `dir`.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Serialization` errors.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(OPTIMIZATION_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}

/// Cross-validated predictions of one weight vector with their report.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub evaluation: EnsembleEvaluation,
    pub summary: PerformanceSummary,
    pub bands: UncertaintyBands,
    pub table: PerformanceTable,
}

impl EvaluationReport {
    /// Writes [`PERFORMANCE_FILE`] into `dir`.
    ///
    /// # Errors
    ///
    /// Returns `Csv` or `Io` errors.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(PERFORMANCE_FILE);
        self.table.to_csv_file(&path)?;
        Ok(path)
    }
}

/// Everything [`Experiment::run`] produced.
#[derive(Debug, Clone)]
pub struct ExperimentOutputs {
    /// `None` when fixed weights were configured
    pub search: Option<WeightSearch>,
    pub weights: EnsembleWeights,
    pub summary: PerformanceSummary,
    pub importances: Vec<FeatureImportance>,
    /// Every file written, in write order
    pub files: Vec<PathBuf>,
}

/// A dataset split according to an [`ExperimentConfig`].
#[derive(Debug, Clone)]
pub struct Experiment {
    config: ExperimentConfig,
    feature_names: Vec<String>,
    evaluator: CrossValidatedEnsemble,
}

impl Experiment {
    /// Splits `dataset` into train and test and sets up the folds.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid configuration or a dataset too small
    /// for the split.
    pub fn new(config: ExperimentConfig, dataset: &Dataset) -> Result<Self> {
        config.validate()?;
        let split = train_test_split(dataset.x(), dataset.y(), config.test_size, Some(config.seed))?;
        info!(
            train = split.x_train.n_rows(),
            test = split.x_test.n_rows(),
            features = dataset.n_features(),
            "train/test split"
        );
        let evaluator = CrossValidatedEnsemble::from_split(split)?
            .with_kfold(KFold::new(config.n_splits).with_random_state(config.seed))
            .with_models(config.models.clone());
        Ok(Self {
            feature_names: dataset.feature_names().to_vec(),
            config,
            evaluator,
        })
    }

    /// Loads [`ExperimentConfig::data_path`] and calls [`Self::new`].
    ///
    /// # Errors
    ///
    /// Returns CSV errors and everything [`Self::new`] returns.
    pub fn load(config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        let dataset = Dataset::from_csv(&config.data_path, config.feature_range(), config.target_column)?;
        Self::new(config, &dataset)
    }

    #[must_use]
    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn evaluator(&self) -> &CrossValidatedEnsemble {
        &self.evaluator
    }

    /// Minimises the out-of-fold RMSE over the blending weights.
    ///
    /// # Errors
    ///
    /// Propagates base model errors and rejects a degenerate candidate.
    pub fn optimize_weights(&self) -> Result<WeightSearch> {
        let start = Instant::now();
        let folds = self.evaluator.fold_predictions()?;
        info!(elapsed_ms = start.elapsed().as_millis() as u64, "fold predictions cached");

        let optimizer = self.config.optimizer.build(self.config.seed);
        let result = optimizer.minimize(&weight_search_space(), |raw| {
            let weights = EnsembleWeights::from_raw(raw)?;
            Ok(folds.blend(&weights)?.validation_rmse)
        })?;
        let weights = EnsembleWeights::from_raw(&result.x)?;
        info!(
            rmse = result.fun,
            %weights,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "weight search finished"
        );
        Ok(WeightSearch { result, weights })
    }

    /// Cross-validated evaluation of `weights` with the performance report.
    ///
    /// Only models with non-zero weight are fitted.
    ///
    /// # Errors
    ///
    /// Propagates base model errors.
    pub fn evaluate(&self, weights: &EnsembleWeights) -> Result<EvaluationReport> {
        let active: Vec<BaseModel> = weights.active_models().collect();
        let evaluation = self.evaluator.fold_predictions_for(&active)?.blend(weights)?;
        let (y_train, y_test) = (self.evaluator.y_train(), self.evaluator.y_test());

        let summary = PerformanceSummary::from_evaluation(&evaluation, y_train, y_test)?;
        let bands = UncertaintyBands::new(&summary, y_train, y_test)?;
        let table = PerformanceTable::new(
            &evaluation.oof_predictions,
            y_train,
            &evaluation.test_predictions,
            y_test,
            &bands,
        );
        info!(
            train_rmse = summary.train_rmse,
            train_r2 = summary.train_r2,
            test_rmse = summary.test_rmse,
            test_r2 = summary.test_r2,
            "ensemble evaluated"
        );
        Ok(EvaluationReport {
            evaluation,
            summary,
            bands,
            table,
        })
    }

    /// Fits the members of `weights` on the full training set.
    ///
    /// # Errors
    ///
    /// Propagates base model errors.
    pub fn fit_ensemble(&self, weights: EnsembleWeights) -> Result<FittedEnsemble> {
        FittedEnsemble::fit(
            self.evaluator.models(),
            weights,
            self.evaluator.x_train(),
            self.evaluator.y_train(),
        )
    }

    /// Predicts every configured composition sweep.
    ///
    /// # Errors
    ///
    /// Returns an error if a sweep element is not a feature.
    pub fn sweeps(&self, ensemble: &FittedEnsemble) -> Result<Vec<CompositionSweep>> {
        self.config
            .sweep_elements
            .iter()
            .map(|element| CompositionSweep::predict(ensemble, &self.feature_names, element))
            .collect()
    }

    /// Weight search (unless weights are configured), evaluation, feature
    /// importance and sweeps, writing every output into the output
    /// directory.
    ///
    /// # Errors
    ///
    /// Propagates the first failing stage.
    pub fn run(&self) -> Result<ExperimentOutputs> {
        let dir = self.config.output_dir.as_path();
        std::fs::create_dir_all(dir)?;
        let mut files = Vec::new();

        let (search, weights) = match self.config.weights {
            Some(weights) => {
                info!(%weights, "using configured weights");
                (None, weights)
            }
            None => {
                let search = self.optimize_weights()?;
                files.push(search.save(dir)?);
                let weights = search.weights;
                (Some(search), weights)
            }
        };

        let report = self.evaluate(&weights)?;
        files.push(report.save(dir)?);

        let ensemble = self.fit_ensemble(weights)?;
        let importances = ensemble.feature_importances(&self.feature_names)?;
        let importance_path = dir.join(IMPORTANCE_FILE);
        save_importances(&importances, &importance_path)?;
        files.push(importance_path);

        for sweep in self.sweeps(&ensemble)? {
            files.push(sweep.save(dir)?);
        }
        info!(files = files.len(), dir = %dir.display(), "experiment finished");

        Ok(ExperimentOutputs {
            search,
            weights,
            summary: report.summary,
            importances,
            files,
        })
    }
}
