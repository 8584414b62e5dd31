//! Experiment configuration.
//!
//! Every field has a default reproducing the reference experiment, so a
//! JSON file only needs the values that differ.
//!
//! # Example
//!
//! ```
//! use alloy_ensemble::config::ExperimentConfig;
//!
//! let config: ExperimentConfig =
//!     serde_json::from_str(r#"{ "seed": 7, "optimizer": { "n_calls": 20 } }"#).expect("valid JSON");
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.optimizer.n_calls, 20);
//! assert_eq!(config.optimizer.n_initial_points, 10);
//! assert_eq!(config.n_splits, 5);
//! ```

use crate::automl::{Acquisition, BayesianOptimizer};
use crate::ensemble::{BaseModelConfig, EnsembleWeights};
use crate::error::{EnsembleError, Result};
use crate::report::DEFAULT_SWEEP_ELEMENTS;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Budget and acquisition of the weight search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub n_calls: usize,
    pub n_initial_points: usize,
    pub n_candidates: usize,
    pub acquisition: Acquisition,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            n_calls: 50,
            n_initial_points: 10,
            n_candidates: 10_000,
            acquisition: Acquisition::default(),
        }
    }
}

impl OptimizerConfig {
    /// Optimiser with this budget, seeded with `seed`.
    #[must_use]
    pub fn build(&self, seed: u64) -> BayesianOptimizer {
        BayesianOptimizer::new()
            .with_n_calls(self.n_calls)
            .with_n_initial_points(self.n_initial_points)
            .with_n_candidates(self.n_candidates)
            .with_acquisition(self.acquisition)
            .with_seed(Some(seed))
    }
}

/// Everything one experiment run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Input CSV
    pub data_path: PathBuf,
    /// Feature column range `[start, end)`
    pub feature_columns: (usize, usize),
    /// Target column index
    pub target_column: usize,
    /// Fraction of rows held out for testing
    pub test_size: f32,
    /// Seed for the split, the folds and the optimiser
    pub seed: u64,
    /// Number of cross-validation folds
    pub n_splits: usize,
    pub optimizer: OptimizerConfig,
    pub models: BaseModelConfig,
    /// Fixed blending weights for runs that skip the search
    pub weights: Option<EnsembleWeights>,
    /// Third elements of the composition sweeps
    pub sweep_elements: Vec<String>,
    /// Directory receiving every output file
    pub output_dir: PathBuf,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("HTSMA_DATA.csv"),
            feature_columns: (1, 7),
            target_column: 18,
            test_size: 0.2,
            seed: 42,
            n_splits: 5,
            optimizer: OptimizerConfig::default(),
            models: BaseModelConfig::default(),
            weights: None,
            sweep_elements: DEFAULT_SWEEP_ELEMENTS.iter().map(|s| (*s).to_string()).collect(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl ExperimentConfig {
    #[must_use]
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    #[must_use]
    pub fn with_feature_columns(mut self, columns: Range<usize>) -> Self {
        self.feature_columns = (columns.start, columns.end);
        self
    }

    #[must_use]
    pub fn with_target_column(mut self, column: usize) -> Self {
        self.target_column = column;
        self
    }

    #[must_use]
    pub fn with_test_size(mut self, test_size: f32) -> Self {
        self.test_size = test_size;
        self
    }

    /// Seed shared by the split, the folds, the optimiser and the forests.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.models = self.models.with_seed(seed);
        self
    }

    #[must_use]
    pub fn with_n_splits(mut self, n_splits: usize) -> Self {
        self.n_splits = n_splits;
        self
    }

    #[must_use]
    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    #[must_use]
    pub fn with_models(mut self, models: BaseModelConfig) -> Self {
        self.models = models;
        self
    }

    #[must_use]
    pub fn with_weights(mut self, weights: EnsembleWeights) -> Self {
        self.weights = Some(weights);
        self
    }

    #[must_use]
    pub fn with_sweep_elements<I, S>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sweep_elements = elements.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Feature columns as a range.
    #[must_use]
    pub fn feature_range(&self) -> Range<usize> {
        self.feature_columns.0..self.feature_columns.1
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(EnsembleError::invalid_hyperparameter(
                "test_size",
                self.test_size,
                "between 0 and 1 (exclusive)",
            ));
        }
        if self.n_splits < 2 {
            return Err(EnsembleError::invalid_hyperparameter("n_splits", self.n_splits, ">= 2"));
        }
        if self.optimizer.n_calls == 0 {
            return Err(EnsembleError::invalid_hyperparameter(
                "optimizer.n_calls",
                self.optimizer.n_calls,
                ">= 1",
            ));
        }
        if self.optimizer.n_initial_points == 0 {
            return Err(EnsembleError::invalid_hyperparameter(
                "optimizer.n_initial_points",
                self.optimizer.n_initial_points,
                ">= 1",
            ));
        }
        if self.optimizer.n_candidates == 0 {
            return Err(EnsembleError::invalid_hyperparameter(
                "optimizer.n_candidates",
                self.optimizer.n_candidates,
                ">= 1",
            ));
        }
        let (start, end) = self.feature_columns;
        if start >= end {
            return Err(EnsembleError::invalid_hyperparameter(
                "feature_columns",
                format!("{start}..{end}"),
                "start < end",
            ));
        }
        if (start..end).contains(&self.target_column) {
            return Err(EnsembleError::invalid_hyperparameter(
                "target_column",
                self.target_column,
                "outside the feature columns",
            ));
        }
        Ok(())
    }

    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `Serialization` if it is
    /// not a valid configuration.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Writes the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Serialization` errors.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::BaseModel;

    #[test]
    fn test_defaults_reproduce_reference_run() {
        let config = ExperimentConfig::default();
        assert_eq!(config.feature_range(), 1..7);
        assert_eq!(config.target_column, 18);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.seed, 42);
        assert_eq!(config.n_splits, 5);
        assert_eq!(config.optimizer.n_calls, 50);
        assert_eq!(config.optimizer.n_candidates, 10_000);
        assert_eq!(config.sweep_elements, ["Zr", "Hf", "Pd", "Pt"]);
        assert!(config.weights.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = ExperimentConfig::default()
            .with_feature_columns(0..3)
            .with_target_column(3)
            .with_seed(7)
            .with_sweep_elements(["Zr"])
            .with_weights(EnsembleWeights::one_hot(BaseModel::Svr));
        assert_eq!(config.feature_columns, (0, 3));
        assert_eq!(config.seed, 7);
        assert_eq!(config.models.random_forest.random_state, Some(7));
        assert_eq!(config.sweep_elements, ["Zr"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = ExperimentConfig::default();
        assert!(base.clone().with_test_size(0.0).validate().is_err());
        assert!(base.clone().with_test_size(1.0).validate().is_err());
        assert!(base.clone().with_n_splits(1).validate().is_err());
        assert!(base.clone().with_feature_columns(4..4).validate().is_err());
        assert!(base.clone().with_target_column(3).validate().is_err());
        let no_calls = OptimizerConfig {
            n_calls: 0,
            ..OptimizerConfig::default()
        };
        assert!(base.with_optimizer(no_calls).validate().is_err());
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("experiment.json");
        let config = ExperimentConfig::default()
            .with_seed(11)
            .with_output_dir("out")
            .with_weights(EnsembleWeights::uniform());
        config.to_json_file(&path).expect("write");
        let back = ExperimentConfig::from_json_file(&path).expect("read");
        assert_eq!(back.seed, 11);
        assert_eq!(back.output_dir, PathBuf::from("out"));
        assert_eq!(back.models.random_forest, config.models.random_forest);
        assert!(back.weights.is_some());
    }

    #[test]
    fn test_optimizer_config_builds_seeded_optimizer() {
        let opt = OptimizerConfig::default().build(3);
        assert_eq!(opt.n_calls(), 50);
        assert_eq!(opt.n_initial_points(), 10);
    }

    #[test]
    fn test_invalid_json() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").expect("write");
        assert!(matches!(
            ExperimentConfig::from_json_file(&path),
            Err(EnsembleError::Serialization(_))
        ));
    }
}
