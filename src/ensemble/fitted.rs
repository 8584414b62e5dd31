//! Ensemble fitted on the full training set, and its feature importances.

use super::{BaseModel, BaseModelConfig, EnsembleWeights, ScaledRegressor};
use crate::error::{EnsembleError, Result};
use crate::primitives::{Matrix, Vector};
use crate::traits::Regressor;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Every model with non-zero weight, fitted once on all training rows.
#[derive(Debug)]
pub struct FittedEnsemble {
    weights: EnsembleWeights,
    members: Vec<ScaledRegressor>,
    n_features: usize,
}

impl FittedEnsemble {
    /// Fits the active members of `weights` on `(x, y)`.
    ///
    /// # Errors
    ///
    /// Propagates model fit errors.
    pub fn fit(
        config: &BaseModelConfig,
        weights: EnsembleWeights,
        x: &Matrix<f32>,
        y: &Vector<f32>,
    ) -> Result<Self> {
        let mut members = Vec::new();
        for model in weights.active_models() {
            let mut regressor = config.build(model);
            regressor.fit(x, y)?;
            debug!(model = %model, weight = weights.weight(model), "fitted ensemble member");
            members.push(regressor);
        }

        Ok(Self {
            weights,
            members,
            n_features: x.n_cols(),
        })
    }

    /// Blending weights.
    #[must_use]
    pub fn weights(&self) -> &EnsembleWeights {
        &self.weights
    }

    /// Models that were fitted.
    pub fn members(&self) -> impl Iterator<Item = BaseModel> + '_ {
        self.members.iter().map(ScaledRegressor::kind)
    }

    /// `Σ w_m · model_m(x)`.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` has the wrong number of features.
    pub fn predict(&self, x: &Matrix<f32>) -> Result<Vector<f32>> {
        if x.n_cols() != self.n_features {
            return Err(EnsembleError::dimension_mismatch(
                "features",
                self.n_features,
                x.n_cols(),
            ));
        }

        let mut blended = vec![0.0_f64; x.n_rows()];
        for member in &self.members {
            let w = self.weights.weight(member.kind());
            let predictions = member.predict(x)?;
            for (b, &p) in blended.iter_mut().zip(predictions.iter()) {
                *b += w * f64::from(p);
            }
        }
        Ok(blended.into_iter().map(|v| v as f32).collect())
    }

    /// Weight-combined importances of the members that expose them.
    ///
    /// Each contributing model adds `weight × importances`; the sum is
    /// divided by the total weight of all models. Sorted by descending
    /// importance.
    ///
    /// # Errors
    ///
    /// Returns an error if `feature_names` does not match the feature count.
    pub fn feature_importances(&self, feature_names: &[String]) -> Result<Vec<FeatureImportance>> {
        if feature_names.len() != self.n_features {
            return Err(EnsembleError::dimension_mismatch(
                "feature names",
                self.n_features,
                feature_names.len(),
            ));
        }

        let mut combined = vec![0.0_f64; self.n_features];
        for member in &self.members {
            let Some(importances) = member.feature_importances() else {
                continue;
            };
            let w = self.weights.weight(member.kind());
            for (c, imp) in combined.iter_mut().zip(importances) {
                *c += w * f64::from(imp);
            }
        }

        let total_weight: f64 = self.weights.as_array().iter().sum();
        let mut ranking: Vec<FeatureImportance> = feature_names
            .iter()
            .zip(combined)
            .map(|(name, value)| FeatureImportance {
                feature: name.clone(),
                importance: value / total_weight,
            })
            .collect();

        // Stable sort keeps column order among ties
        ranking.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(Ordering::Equal)
        });
        Ok(ranking)
    }
}

/// Importance of one feature in the weighted ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Fits the ensemble on `(x, y)` and ranks features by weighted importance.
///
/// # Errors
///
/// Propagates fit errors and feature-name mismatches.
pub fn ensemble_feature_importances(
    config: &BaseModelConfig,
    weights: EnsembleWeights,
    x: &Matrix<f32>,
    y: &Vector<f32>,
    feature_names: &[String],
) -> Result<Vec<FeatureImportance>> {
    FittedEnsemble::fit(config, weights, x, y)?.feature_importances(feature_names)
}
