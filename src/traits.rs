//! Core traits for regressors and transformers.
//!
//! These traits define the API contracts shared by every base model of the
//! ensemble.

use crate::error::Result;
use crate::primitives::{Matrix, Vector};

/// Supervised regression model.
///
/// Regressors implement fit/predict/score following sklearn conventions.
/// Unlike a panicking `predict`, prediction on an unfitted model or with the
/// wrong number of features returns an error.
///
/// # Examples
///
/// ```
/// use alloy_ensemble::prelude::*;
///
/// let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let y = Vector::from_slice(&[2.0, 4.0, 6.0, 8.0]);
///
/// let mut knn = KNeighborsRegressor::new(1);
/// knn.fit(&x, &y).unwrap();
/// let predictions = knn.predict(&x).unwrap();
/// assert_eq!(predictions.as_slice(), y.as_slice());
/// ```
pub trait Regressor: std::fmt::Debug + Send + Sync {
    /// Fits the model to training data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails (dimension mismatch, empty input,
    /// invalid hyperparameters).
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()>;

    /// Predicts target values for input data.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or the feature count
    /// differs from training.
    fn predict(&self, x: &Matrix<f32>) -> Result<Vector<f32>>;

    /// Computes the R² score on `x` against `y`.
    ///
    /// # Errors
    ///
    /// Propagates prediction errors.
    fn score(&self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<f32> {
        let predictions = self.predict(x)?;
        Ok(crate::metrics::r_squared(&predictions, y))
    }

    /// Impurity-based feature importances, for models that expose them.
    fn feature_importances(&self) -> Option<Vec<f32>> {
        None
    }
}

/// Trait for data transformers (scalers).
///
/// ```text
/// let mut scaler = StandardScaler::new();
/// let x_scaled = scaler.fit_transform(&x)?;
/// let x_test_scaled = scaler.transform(&x_test)?;
/// ```
pub trait Transformer {
    /// Fits the transformer to data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()>;

    /// Transforms data using fitted parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if transformer is not fitted.
    fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>>;

    /// Fits and transforms in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit_transform(&mut self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        self.fit(x)?;
        self.transform(x)
    }
}
