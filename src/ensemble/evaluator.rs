//! K-fold cross-validated evaluation of a weighted ensemble.

use super::{BaseModel, BaseModelConfig, EnsembleWeights};
use crate::error::{EnsembleError, Result};
use crate::metrics::rmse;
use crate::model_selection::{KFold, TrainTestSplit};
use crate::primitives::{Matrix, Vector};
use crate::traits::Regressor;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::debug;

/// Predictions of one fitted base model within one fold.
#[derive(Debug, Clone)]
pub struct ModelPredictions {
    /// On the fold's validation rows, in `validation_indices` order
    pub validation: Vector<f32>,
    /// On the full test set
    pub test: Vector<f32>,
}

/// Everything one fold contributes to the blend.
#[derive(Debug, Clone)]
pub struct FoldResult {
    /// Training-set positions of the validation rows
    pub validation_indices: Vec<usize>,
    /// Per-model predictions
    pub predictions: BTreeMap<BaseModel, ModelPredictions>,
}

/// Outcome of evaluating one weight vector.
#[derive(Debug, Clone)]
pub struct EnsembleEvaluation {
    /// One blended prediction per training row, in training-set order
    pub oof_predictions: Vector<f32>,
    /// Blended test predictions averaged over folds
    pub test_predictions: Vector<f32>,
    /// RMSE of `oof_predictions` against the training targets
    pub validation_rmse: f64,
}

/// Base-model predictions of every fold, independent of the weights.
///
/// Blending is linear, so the same `FoldPredictions` can be blended with
/// any number of weight vectors.
#[derive(Debug, Clone)]
pub struct FoldPredictions {
    folds: Vec<FoldResult>,
    y_train: Vector<f32>,
    n_test: usize,
}

impl FoldPredictions {
    /// Per-fold results in fold order.
    #[must_use]
    pub fn folds(&self) -> &[FoldResult] {
        &self.folds
    }

    /// Blends the stored predictions with `weights`.
    ///
    /// # Errors
    ///
    /// Returns an error if a model with non-zero weight was not fitted.
    pub fn blend(&self, weights: &EnsembleWeights) -> Result<EnsembleEvaluation> {
        let n_train = self.y_train.len();
        let mut oof = vec![0.0_f64; n_train];
        let mut covered = vec![false; n_train];
        let mut test_sum = vec![0.0_f64; self.n_test];

        for fold in &self.folds {
            let mut fold_test = vec![0.0_f64; self.n_test];
            for model in weights.active_models() {
                let w = weights.weight(model);
                let preds = fold.predictions.get(&model).ok_or_else(|| {
                    EnsembleError::Other(format!("no fold predictions for {model}"))
                })?;
                for (&row, &p) in fold.validation_indices.iter().zip(preds.validation.iter()) {
                    oof[row] += w * f64::from(p);
                }
                for (t, &p) in fold_test.iter_mut().zip(preds.test.iter()) {
                    *t += w * f64::from(p);
                }
            }
            for &row in &fold.validation_indices {
                covered[row] = true;
            }
            for (s, t) in test_sum.iter_mut().zip(fold_test) {
                *s += t;
            }
        }

        if let Some(row) = covered.iter().position(|c| !c) {
            return Err(EnsembleError::Other(format!(
                "training row {row} is not in any validation fold"
            )));
        }

        let n_folds = self.folds.len() as f64;
        let oof_predictions: Vector<f32> = oof.into_iter().map(|v| v as f32).collect();
        let test_predictions: Vector<f32> =
            test_sum.into_iter().map(|s| (s / n_folds) as f32).collect();
        let validation_rmse = f64::from(rmse(&oof_predictions, &self.y_train));

        Ok(EnsembleEvaluation {
            oof_predictions,
            test_predictions,
            validation_rmse,
        })
    }
}

/// Cross-validated evaluator of weighted ensembles.
///
/// # Examples
///
/// ```no_run
/// use alloy_ensemble::ensemble::{CrossValidatedEnsemble, EnsembleWeights};
/// use alloy_ensemble::model_selection::train_test_split;
/// use alloy_ensemble::primitives::{Matrix, Vector};
///
/// # fn main() -> alloy_ensemble::Result<()> {
/// let x = Matrix::from_vec(50, 2, (0..100).map(|i| i as f32).collect())?;
/// let y: Vector<f32> = (0..50).map(|i| i as f32).collect();
///
/// let evaluator = CrossValidatedEnsemble::from_split(train_test_split(&x, &y, 0.2, Some(42))?)?;
/// let eval = evaluator.evaluate(&EnsembleWeights::uniform())?;
/// println!("OOF RMSE {:.2}", eval.validation_rmse);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CrossValidatedEnsemble {
    x_train: Matrix<f32>,
    y_train: Vector<f32>,
    x_test: Matrix<f32>,
    y_test: Vector<f32>,
    kfold: KFold,
    models: BaseModelConfig,
}

impl CrossValidatedEnsemble {
    /// Creates an evaluator with 5 seeded folds and default models.
    ///
    /// # Errors
    ///
    /// Returns an error if sample or feature counts disagree.
    pub fn new(
        x_train: Matrix<f32>,
        y_train: Vector<f32>,
        x_test: Matrix<f32>,
        y_test: Vector<f32>,
    ) -> Result<Self> {
        if x_train.n_rows() != y_train.len() {
            return Err(EnsembleError::dimension_mismatch(
                "training samples",
                x_train.n_rows(),
                y_train.len(),
            ));
        }
        if x_test.n_rows() != y_test.len() {
            return Err(EnsembleError::dimension_mismatch(
                "test samples",
                x_test.n_rows(),
                y_test.len(),
            ));
        }
        if x_train.n_cols() != x_test.n_cols() {
            return Err(EnsembleError::dimension_mismatch(
                "features",
                x_train.n_cols(),
                x_test.n_cols(),
            ));
        }

        Ok(Self {
            x_train,
            y_train,
            x_test,
            y_test,
            kfold: KFold::new(5).with_random_state(42),
            models: BaseModelConfig::default(),
        })
    }

    /// Creates an evaluator from a train/test split.
    ///
    /// # Errors
    ///
    /// As [`Self::new`].
    pub fn from_split(split: TrainTestSplit) -> Result<Self> {
        Self::new(split.x_train, split.y_train, split.x_test, split.y_test)
    }

    /// Replaces the fold generator.
    #[must_use]
    pub fn with_kfold(mut self, kfold: KFold) -> Self {
        self.kfold = kfold;
        self
    }

    /// Replaces the base model configuration.
    #[must_use]
    pub fn with_models(mut self, models: BaseModelConfig) -> Self {
        self.models = models;
        self
    }

    #[must_use]
    pub fn x_train(&self) -> &Matrix<f32> {
        &self.x_train
    }

    #[must_use]
    pub fn y_train(&self) -> &Vector<f32> {
        &self.y_train
    }

    #[must_use]
    pub fn x_test(&self) -> &Matrix<f32> {
        &self.x_test
    }

    #[must_use]
    pub fn y_test(&self) -> &Vector<f32> {
        &self.y_test
    }

    #[must_use]
    pub fn models(&self) -> &BaseModelConfig {
        &self.models
    }

    /// Fits all five models in every fold.
    ///
    /// # Errors
    ///
    /// Propagates fold generation and model fit/predict errors.
    pub fn fold_predictions(&self) -> Result<FoldPredictions> {
        self.fold_predictions_for(&BaseModel::ALL)
    }

    /// Fits only `models` in every fold.
    ///
    /// # Errors
    ///
    /// Propagates fold generation and model fit/predict errors.
    pub fn fold_predictions_for(&self, models: &[BaseModel]) -> Result<FoldPredictions> {
        let splits = self.kfold.split(self.x_train.n_rows())?;
        let mut folds = Vec::with_capacity(splits.len());

        for (fold_idx, (train_idx, valid_idx)) in splits.into_iter().enumerate() {
            let x_fit = self.x_train.select_rows(&train_idx);
            let y_fit = self.y_train.select(&train_idx);
            let x_valid = self.x_train.select_rows(&valid_idx);

            let mut predictions = BTreeMap::new();
            for &model in models {
                let start = Instant::now();
                let mut regressor = self.models.build(model);
                regressor.fit(&x_fit, &y_fit)?;
                let validation = regressor.predict(&x_valid)?;
                let test = regressor.predict(&self.x_test)?;
                debug!(
                    fold = fold_idx,
                    model = %model,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "fitted base model"
                );
                predictions.insert(model, ModelPredictions { validation, test });
            }

            folds.push(FoldResult {
                validation_indices: valid_idx,
                predictions,
            });
        }

        Ok(FoldPredictions {
            folds,
            y_train: self.y_train.clone(),
            n_test: self.x_test.n_rows(),
        })
    }

    /// Refits every model in every fold and blends with `weights`.
    ///
    /// # Errors
    ///
    /// Propagates model errors.
    pub fn evaluate(&self, weights: &EnsembleWeights) -> Result<EnsembleEvaluation> {
        self.fold_predictions()?.blend(weights)
    }

    /// Cross-validated RMSE of one base model on its own.
    ///
    /// # Errors
    ///
    /// Propagates model errors.
    pub fn single_model_rmse(&self, model: BaseModel) -> Result<f64> {
        Ok(self
            .fold_predictions_for(&[model])?
            .blend(&EnsembleWeights::one_hot(model))?
            .validation_rmse)
    }
}
