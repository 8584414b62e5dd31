//! Regression metrics used by the ensemble evaluator and the reports.
//!
//! Sums are accumulated in `f64`; the objective minimised by the weight
//! optimizer is `rmse` over a few hundred out-of-fold predictions and must
//! be reproducible to the last bit for a fixed input.

use crate::primitives::Vector;

fn sum_sq_error(y_pred: &Vector<f32>, y_true: &Vector<f32>) -> f64 {
    y_true
        .as_slice()
        .iter()
        .zip(y_pred.as_slice().iter())
        .map(|(&t, &p)| (f64::from(t) - f64::from(p)).powi(2))
        .sum()
}

/// Computes the coefficient of determination (R²).
///
/// R² = 1 - (`SS_res` / `SS_tot`)
///
/// where `SS_res` is the residual sum of squares and `SS_tot` is the total
/// sum of squares. Returns 0.0 for a constant target.
///
/// # Examples
///
/// ```
/// use alloy_ensemble::metrics::r_squared;
/// use alloy_ensemble::primitives::Vector;
///
/// let y_true = Vector::from_slice(&[3.0, -0.5, 2.0, 7.0]);
/// let y_pred = Vector::from_slice(&[2.5, 0.0, 2.0, 8.0]);
/// let r2 = r_squared(&y_pred, &y_true);
/// assert!(r2 > 0.9);
/// ```
///
/// # Panics
///
/// Panics if vectors have different lengths.
#[must_use]
pub fn r_squared(y_pred: &Vector<f32>, y_true: &Vector<f32>) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");

    if y_true.is_empty() {
        return 0.0;
    }

    let n = y_true.len() as f64;
    let y_mean = y_true.iter().map(|&t| f64::from(t)).sum::<f64>() / n;

    let ss_res = sum_sq_error(y_pred, y_true);
    let ss_tot: f64 = y_true
        .iter()
        .map(|&t| (f64::from(t) - y_mean).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return 0.0;
    }

    (1.0 - ss_res / ss_tot) as f32
}

/// Computes the Mean Squared Error (MSE).
///
/// MSE = (1/n) * `Σ(y_true` - `y_pred)²`
///
/// # Examples
///
/// ```
/// use alloy_ensemble::metrics::mse;
/// use alloy_ensemble::primitives::Vector;
///
/// let y_true = Vector::from_slice(&[3.0, -0.5, 2.0, 7.0]);
/// let y_pred = Vector::from_slice(&[2.5, 0.0, 2.0, 8.0]);
/// let error = mse(&y_pred, &y_true);
/// assert!((error - 0.375).abs() < 1e-6);
/// ```
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
#[must_use]
pub fn mse(y_pred: &Vector<f32>, y_true: &Vector<f32>) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors cannot be empty");

    (sum_sq_error(y_pred, y_true) / y_true.len() as f64) as f32
}

/// Computes the Mean Absolute Error (MAE).
///
/// MAE = (1/n) * `Σ|y_true` - `y_pred`|
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
#[must_use]
pub fn mae(y_pred: &Vector<f32>, y_true: &Vector<f32>) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors cannot be empty");

    let sum_abs_error: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&t, &p)| (f64::from(t) - f64::from(p)).abs())
        .sum();

    (sum_abs_error / y_true.len() as f64) as f32
}

/// Computes the Root Mean Squared Error (RMSE).
///
/// RMSE = sqrt(MSE)
///
/// # Examples
///
/// ```
/// use alloy_ensemble::metrics::rmse;
/// use alloy_ensemble::primitives::Vector;
///
/// let y_true = Vector::from_slice(&[3.0, -0.5, 2.0, 7.0]);
/// let y_pred = Vector::from_slice(&[2.5, 0.0, 2.0, 8.0]);
/// let error = rmse(&y_pred, &y_true);
/// assert!(error < 1.0);
/// ```
///
/// # Panics
///
/// Panics if vectors have different lengths or are empty.
#[must_use]
pub fn rmse(y_pred: &Vector<f32>, y_true: &Vector<f32>) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    assert!(!y_true.is_empty(), "Vectors cannot be empty");

    (sum_sq_error(y_pred, y_true) / y_true.len() as f64).sqrt() as f32
}

/// Population standard deviation of the residuals `y_true - y_pred`.
///
/// This is the σ used for the uncertainty bands of the performance report.
///
/// # Panics
///
/// Panics if vectors have different lengths.
#[must_use]
pub fn residual_std(y_pred: &Vector<f32>, y_true: &Vector<f32>) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    if y_true.is_empty() {
        return 0.0;
    }

    let residuals: Vec<f64> = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&t, &p)| f64::from(t) - f64::from(p))
        .collect();
    let n = residuals.len() as f64;
    let mean = residuals.iter().sum::<f64>() / n;
    let var = residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    var.sqrt() as f32
}
