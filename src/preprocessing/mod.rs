//! Preprocessing transformers for feature standardization.
//!
//! Every base model of the ensemble sees standardized features; the scaler
//! is fitted on the training fold only and reused for validation and test
//! rows, so no statistics leak across the split boundary.
//!
//! # Example
//!
//! ```
//! use alloy_ensemble::prelude::*;
//! use alloy_ensemble::preprocessing::StandardScaler;
//!
//! // Composition columns on very different scales
//! let data = Matrix::from_vec(4, 2, vec![
//!     49.0, 0.5,
//!     50.0, 1.0,
//!     51.0, 1.5,
//!     52.0, 2.0,
//! ]).expect("valid matrix dimensions");
//!
//! let mut scaler = StandardScaler::new();
//! let scaled = scaler.fit_transform(&data).expect("fit_transform should succeed");
//!
//! // Each column now has mean ≈ 0 and std ≈ 1
//! assert!(scaled.get(0, 0).abs() < 2.0);
//! ```

use crate::error::{EnsembleError, Result};
use crate::primitives::Matrix;
use crate::traits::Transformer;
use serde::{Deserialize, Serialize};

/// Standardizes features by removing mean and scaling to unit variance.
///
/// The standard score of a sample x is: z = (x - mean) / std
///
/// Uses the population standard deviation (divide by n). Constant columns
/// are centered but not scaled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Mean of each feature (computed during fit).
    mean: Option<Vec<f32>>,
    /// Standard deviation of each feature (computed during fit).
    std: Option<Vec<f32>>,
    /// Whether to center the data (subtract mean).
    with_mean: bool,
    /// Whether to scale the data (divide by std).
    with_std: bool,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    /// Creates a new `StandardScaler` with default settings.
    ///
    /// By default, both centering (subtract mean) and scaling (divide by std)
    /// are enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
            with_mean: true,
            with_std: true,
        }
    }

    /// Sets whether to center the data by subtracting the mean.
    #[must_use]
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.with_mean = with_mean;
        self
    }

    /// Sets whether to scale the data by dividing by standard deviation.
    #[must_use]
    pub fn with_std(mut self, with_std: bool) -> Self {
        self.with_std = with_std;
        self
    }

    /// Returns the mean of each feature, if fitted.
    #[must_use]
    pub fn mean(&self) -> Option<&[f32]> {
        self.mean.as_deref()
    }

    /// Returns the standard deviation of each feature, if fitted.
    #[must_use]
    pub fn std(&self) -> Option<&[f32]> {
        self.std.as_deref()
    }

    /// Returns true if the scaler has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    fn fitted_stats(&self) -> Result<(&[f32], &[f32])> {
        match (&self.mean, &self.std) {
            (Some(mean), Some(std)) => Ok((mean, std)),
            _ => Err(EnsembleError::not_fitted("StandardScaler")),
        }
    }

    /// Transforms data back to original scale.
    ///
    /// # Errors
    ///
    /// Returns an error if the scaler is not fitted or dimensions mismatch.
    pub fn inverse_transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        let (mean, std) = self.fitted_stats()?;

        let (n_samples, n_features) = x.shape();
        if n_features != mean.len() {
            return Err(EnsembleError::dimension_mismatch(
                "features",
                mean.len(),
                n_features,
            ));
        }

        let mut result = vec![0.0; n_samples * n_features];

        for i in 0..n_samples {
            for j in 0..n_features {
                let mut val = x.get(i, j);

                if self.with_std && std[j] > 1e-10 {
                    val *= std[j];
                }
                if self.with_mean {
                    val += mean[j];
                }

                result[i * n_features + j] = val;
            }
        }

        Matrix::from_vec(n_samples, n_features, result)
    }
}

impl Transformer for StandardScaler {
    /// Computes the mean and standard deviation of each feature.
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()> {
        let (n_samples, n_features) = x.shape();

        if n_samples == 0 {
            return Err(EnsembleError::empty_input("StandardScaler::fit"));
        }

        // Accumulate in f64; composition percentages sum to 100 and lose
        // digits quickly in f32 sums of squares.
        let mut mean = vec![0.0_f32; n_features];
        let mut std = vec![0.0_f32; n_features];
        for j in 0..n_features {
            let sum: f64 = (0..n_samples).map(|i| f64::from(x.get(i, j))).sum();
            let mean_j = sum / n_samples as f64;
            let sum_sq: f64 = (0..n_samples)
                .map(|i| (f64::from(x.get(i, j)) - mean_j).powi(2))
                .sum();
            mean[j] = mean_j as f32;
            std[j] = (sum_sq / n_samples as f64).sqrt() as f32;
        }

        self.mean = Some(mean);
        self.std = Some(std);

        Ok(())
    }

    /// Standardizes the data using fitted mean and std.
    fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        let (mean, std) = self.fitted_stats()?;

        let (n_samples, n_features) = x.shape();
        if n_features != mean.len() {
            return Err(EnsembleError::dimension_mismatch(
                "features",
                mean.len(),
                n_features,
            ));
        }

        let mut result = vec![0.0; n_samples * n_features];

        for i in 0..n_samples {
            for j in 0..n_features {
                let mut val = x.get(i, j);

                if self.with_mean {
                    val -= mean[j];
                }
                if self.with_std && std[j] > 1e-10 {
                    val /= std[j];
                }

                result[i * n_features + j] = val;
            }
        }

        Matrix::from_vec(n_samples, n_features, result)
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
