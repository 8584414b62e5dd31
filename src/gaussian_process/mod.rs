//! Exact Gaussian process regression.
//!
//! Used twice in the crate: as one of the ensemble's base regressors
//! (fixed RBF kernel, `f32` API through [`Regressor`]) and as the surrogate
//! of the Bayesian weight optimizer (Matérn 5/2, `f64` points, predictive
//! standard deviation).
//!
//! # Example
//!
//! ```
//! use alloy_ensemble::gaussian_process::{GaussianProcessRegressor, Kernel};
//!
//! let points = vec![vec![0.0], vec![1.0], vec![2.0]];
//! let targets = vec![0.0, 1.0, 4.0];
//!
//! let mut gp = GaussianProcessRegressor::new(Kernel::rbf(1.0)).with_alpha(1e-8);
//! gp.fit_points(&points, &targets).expect("fit should succeed");
//!
//! let (mean, std) = gp.predict_point(&[1.0]).expect("fitted");
//! assert!((mean - 1.0).abs() < 1e-4);
//! assert!(std < 1e-2);
//! ```

mod kernels;

pub use kernels::{Kernel, KernelKind};

use crate::error::{EnsembleError, Result};
use crate::primitives::{Cholesky, Matrix, Vector};
use crate::traits::Regressor;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Log-spaced grid over which the length scale is chosen by maximum
/// marginal likelihood.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthScaleSearch {
    /// Smallest candidate length scale
    pub lower: f64,
    /// Largest candidate length scale
    pub upper: f64,
    /// Number of grid points (log-spaced, inclusive)
    pub n_grid: usize,
}

impl LengthScaleSearch {
    fn candidates(&self) -> Vec<f64> {
        if self.n_grid <= 1 || self.upper <= self.lower {
            return vec![self.lower];
        }
        let (lo, hi) = (self.lower.ln(), self.upper.ln());
        (0..self.n_grid)
            .map(|i| (lo + (hi - lo) * i as f64 / (self.n_grid - 1) as f64).exp())
            .collect()
    }
}

#[derive(Debug, Clone)]
struct FittedGp {
    points: Vec<Vec<f64>>,
    kernel: Kernel,
    chol: Cholesky,
    weights: Vec<f64>,
    y_mean: f64,
    y_std: f64,
    log_marginal_likelihood: f64,
}

/// Gaussian process regressor with a zero (or empirical, with
/// `normalize_y`) prior mean.
#[derive(Debug, Clone)]
pub struct GaussianProcessRegressor {
    kernel: Kernel,
    alpha: f64,
    normalize_y: bool,
    length_scale_search: Option<LengthScaleSearch>,
    fitted: Option<FittedGp>,
}

impl GaussianProcessRegressor {
    /// Creates a regressor with the given kernel and `alpha = 1e-10`.
    #[must_use]
    pub fn new(kernel: Kernel) -> Self {
        Self {
            kernel,
            alpha: 1e-10,
            normalize_y: false,
            length_scale_search: None,
            fitted: None,
        }
    }

    /// Value added to the diagonal of the kernel matrix during fitting.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Standardises targets before fitting and undoes it on prediction.
    #[must_use]
    pub fn with_normalize_y(mut self, normalize_y: bool) -> Self {
        self.normalize_y = normalize_y;
        self
    }

    /// Picks the length scale by maximum marginal likelihood over a grid.
    #[must_use]
    pub fn with_length_scale_search(mut self, search: LengthScaleSearch) -> Self {
        self.length_scale_search = Some(search);
        self
    }

    /// Kernel used for prediction (after length-scale selection, if any).
    #[must_use]
    pub fn kernel(&self) -> Kernel {
        self.fitted.as_ref().map_or(self.kernel, |f| f.kernel)
    }

    /// Log marginal likelihood of the training targets under the fitted
    /// kernel, in normalised units when `normalize_y` is set.
    #[must_use]
    pub fn log_marginal_likelihood(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.log_marginal_likelihood)
    }

    /// Fits on `f64` points (one `Vec` per row).
    ///
    /// # Errors
    ///
    /// Returns an error on empty or ragged input, a non-positive `alpha`
    /// or a kernel matrix that stays indefinite after jitter.
    pub fn fit_points(&mut self, points: &[Vec<f64>], targets: &[f64]) -> Result<()> {
        let n = points.len();
        if n != targets.len() {
            return Err(EnsembleError::dimension_mismatch("samples", n, targets.len()));
        }
        if n == 0 {
            return Err(EnsembleError::empty_input("GaussianProcessRegressor::fit"));
        }
        let dim = points[0].len();
        if let Some(bad) = points.iter().find(|p| p.len() != dim) {
            return Err(EnsembleError::dimension_mismatch("features", dim, bad.len()));
        }
        if !(self.alpha >= 0.0) {
            return Err(EnsembleError::invalid_hyperparameter("alpha", self.alpha, ">= 0"));
        }

        let (y_mean, y_std) = if self.normalize_y {
            let mean = targets.iter().sum::<f64>() / n as f64;
            let var = targets.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n as f64;
            let std = var.sqrt();
            (mean, if std > 0.0 { std } else { 1.0 })
        } else {
            (0.0, 1.0)
        };
        let y: Vec<f64> = targets.iter().map(|t| (t - y_mean) / y_std).collect();

        let kernels = match &self.length_scale_search {
            Some(search) => search
                .candidates()
                .into_iter()
                .map(|ls| self.kernel.with_length_scale(ls))
                .collect(),
            None => vec![self.kernel],
        };

        let fits = kernels
            .into_iter()
            .map(|kernel| fit_with_kernel(points, &y, kernel, self.alpha, y_mean, y_std));
        self.fitted = Some(most_likely(fits)?);
        Ok(())
    }

    /// Predictive mean and standard deviation at one point.
    ///
    /// # Errors
    ///
    /// Returns `NotFitted` before fitting and `DimensionMismatch` for a
    /// point of the wrong dimension.
    pub fn predict_point(&self, point: &[f64]) -> Result<(f64, f64)> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| EnsembleError::not_fitted("GaussianProcessRegressor"))?;
        let dim = fitted.points[0].len();
        if point.len() != dim {
            return Err(EnsembleError::dimension_mismatch("features", dim, point.len()));
        }

        let k_star: Vec<f64> = fitted
            .points
            .iter()
            .map(|p| fitted.kernel.eval(p, point))
            .collect();
        let mean: f64 = k_star
            .iter()
            .zip(fitted.weights.iter())
            .map(|(k, w)| k * w)
            .sum();

        let v = fitted.chol.solve_lower(&k_star);
        let var = (fitted.kernel.diag() - v.iter().map(|x| x * x).sum::<f64>()).max(0.0);

        Ok((
            mean * fitted.y_std + fitted.y_mean,
            var.sqrt() * fitted.y_std,
        ))
    }

    /// Predictive mean and standard deviation for every row of `x`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::predict_point`].
    pub fn predict_with_std(&self, x: &Matrix<f32>) -> Result<(Vector<f32>, Vector<f32>)> {
        let mut means = Vec::with_capacity(x.n_rows());
        let mut stds = Vec::with_capacity(x.n_rows());
        for i in 0..x.n_rows() {
            let (m, s) = self.predict_point(&to_f64(x.row_slice(i)))?;
            means.push(m as f32);
            stds.push(s as f32);
        }
        Ok((Vector::from_vec(means), Vector::from_vec(stds)))
    }
}

fn to_f64(row: &[f32]) -> Vec<f64> {
    row.iter().map(|&v| f64::from(v)).collect()
}

/// Factorises `K + alpha I`, adding jitter when the factorisation fails.
fn factor_kernel(points: &[Vec<f64>], kernel: Kernel, alpha: f64) -> Result<Cholesky> {
    let n = points.len();
    let mut gram = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let k = kernel.eval(&points[i], &points[j]);
            gram[i * n + j] = k;
            gram[j * n + i] = k;
        }
        gram[i * n + i] += alpha;
    }

    let mut jitter = 0.0;
    for attempt in 0..6 {
        if attempt > 0 {
            jitter = if jitter == 0.0 { 1e-10 } else { jitter * 100.0 };
            for i in 0..n {
                gram[i * n + i] += jitter;
            }
            warn!(jitter, "kernel matrix not positive definite, adding jitter");
        }
        match Cholesky::factor(&gram, n) {
            Ok(chol) => return Ok(chol),
            Err(EnsembleError::NotPositiveDefinite) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(EnsembleError::NotPositiveDefinite)
}

fn fit_with_kernel(
    points: &[Vec<f64>],
    y: &[f64],
    kernel: Kernel,
    alpha: f64,
    y_mean: f64,
    y_std: f64,
) -> Result<FittedGp> {
    let chol = factor_kernel(points, kernel, alpha)?;
    let weights = chol.solve(y);
    let data_fit: f64 = y.iter().zip(weights.iter()).map(|(a, b)| a * b).sum();
    let n = y.len() as f64;
    let log_marginal_likelihood = -0.5 * data_fit - 0.5 * chol.log_det() - 0.5 * n * LN_2PI;

    Ok(FittedGp {
        points: points.to_vec(),
        kernel,
        chol,
        weights,
        y_mean,
        y_std,
        log_marginal_likelihood,
    })
}

/// Candidate with the largest log marginal likelihood.
///
/// Kernels whose Gram matrix stays indefinite after jitter are skipped;
/// `NotPositiveDefinite` is returned only when every candidate fails.
fn most_likely<I>(fits: I) -> Result<FittedGp>
where
    I: IntoIterator<Item = Result<FittedGp>>,
{
    let mut best: Option<FittedGp> = None;
    for fit in fits {
        let candidate = match fit {
            Ok(candidate) => candidate,
            Err(EnsembleError::NotPositiveDefinite) => {
                debug!("kernel candidate skipped, Gram matrix indefinite");
                continue;
            }
            Err(e) => return Err(e),
        };
        if best
            .as_ref()
            .map_or(true, |b| candidate.log_marginal_likelihood > b.log_marginal_likelihood)
        {
            best = Some(candidate);
        }
    }
    best.ok_or(EnsembleError::NotPositiveDefinite)
}

impl Regressor for GaussianProcessRegressor {
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        if x.n_rows() != y.len() {
            return Err(EnsembleError::dimension_mismatch("samples", x.n_rows(), y.len()));
        }
        let points: Vec<Vec<f64>> = (0..x.n_rows()).map(|i| to_f64(x.row_slice(i))).collect();
        let targets: Vec<f64> = y.iter().map(|&t| f64::from(t)).collect();
        self.fit_points(&points, &targets)
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vector<f32>> {
        let (means, _) = self.predict_with_std(x)?;
        Ok(means)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolates_with_small_noise() {
        let points: Vec<Vec<f64>> = (0..6).map(|i| vec![f64::from(i) * 0.5]).collect();
        let targets: Vec<f64> = points.iter().map(|p| p[0].sin()).collect();

        let mut gp = GaussianProcessRegressor::new(Kernel::rbf(1.0)).with_alpha(1e-10);
        gp.fit_points(&points, &targets).expect("fit should succeed");

        for (p, t) in points.iter().zip(targets.iter()) {
            let (mean, std) = gp.predict_point(p).expect("fitted");
            assert!((mean - t).abs() < 1e-4);
            assert!(std < 1e-3);
        }
    }

    #[test]
    fn test_uncertainty_grows_away_from_data() {
        let points = vec![vec![0.0], vec![1.0]];
        let mut gp = GaussianProcessRegressor::new(Kernel::rbf(0.5)).with_alpha(1e-6);
        gp.fit_points(&points, &[1.0, 2.0]).expect("fit should succeed");

        let (_, near) = gp.predict_point(&[0.5]).expect("fitted");
        let (mean_far, far) = gp.predict_point(&[10.0]).expect("fitted");
        assert!(far > near);
        // Zero prior mean far from the data
        assert!(mean_far.abs() < 1e-6);
        assert!((far - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_y_reverts_to_target_mean() {
        let points = vec![vec![0.0], vec![1.0], vec![2.0]];
        let targets = [100.0, 102.0, 104.0];
        let mut gp = GaussianProcessRegressor::new(Kernel::matern52(0.5))
            .with_alpha(1e-6)
            .with_normalize_y(true);
        gp.fit_points(&points, &targets).expect("fit should succeed");

        let (mean_far, _) = gp.predict_point(&[50.0]).expect("fitted");
        assert!((mean_far - 102.0).abs() < 1e-6);
    }

    #[test]
    fn test_length_scale_search_prefers_smooth_fit() {
        let points: Vec<Vec<f64>> = (0..10).map(|i| vec![f64::from(i) / 9.0]).collect();
        let targets: Vec<f64> = points.iter().map(|p| 2.0 * p[0]).collect();

        let mut gp = GaussianProcessRegressor::new(Kernel::matern52(1.0))
            .with_alpha(1e-6)
            .with_normalize_y(true)
            .with_length_scale_search(LengthScaleSearch {
                lower: 0.01,
                upper: 10.0,
                n_grid: 13,
            });
        gp.fit_points(&points, &targets).expect("fit should succeed");

        // A straight line is explained best by a long length scale
        assert!(gp.kernel().length_scale > 0.3);
        let fixed_short = {
            let mut g = GaussianProcessRegressor::new(Kernel::matern52(0.01))
                .with_alpha(1e-6)
                .with_normalize_y(true);
            g.fit_points(&points, &targets).expect("fit should succeed");
            g.log_marginal_likelihood().expect("fitted")
        };
        assert!(gp.log_marginal_likelihood().expect("fitted") >= fixed_short);
    }

    #[test]
    fn test_regressor_api_matches_point_api() {
        let x = Matrix::from_vec(3, 2, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]).expect("valid");
        let y = Vector::from_slice(&[1.0, 2.0, 3.0]);
        let mut gp = GaussianProcessRegressor::new(Kernel::rbf(1.0)).with_alpha(0.07);
        gp.fit(&x, &y).expect("fit should succeed");

        let predictions = gp.predict(&x).expect("fitted");
        let (m, _) = gp.predict_point(&[1.0, 0.0]).expect("fitted");
        assert!((f64::from(predictions[1]) - m).abs() < 1e-5);
    }

    #[test]
    fn test_predict_before_fit() {
        let gp = GaussianProcessRegressor::new(Kernel::rbf(1.0));
        assert!(matches!(
            gp.predict_point(&[0.0]),
            Err(EnsembleError::NotFitted { .. })
        ));
    }

    #[test]
    fn test_duplicate_points_are_handled_with_jitter() {
        let points = vec![vec![0.5], vec![0.5], vec![0.5]];
        let mut gp = GaussianProcessRegressor::new(Kernel::rbf(1.0)).with_alpha(0.0);
        gp.fit_points(&points, &[1.0, 1.0, 1.0]).expect("jitter recovers");
        let (mean, _) = gp.predict_point(&[0.5]).expect("fitted");
        assert!((mean - 1.0).abs() < 1e-3);
    }

    fn line_fit(length_scale: f64) -> FittedGp {
        let points: Vec<Vec<f64>> = (0..5).map(|i| vec![f64::from(i) / 4.0]).collect();
        let y: Vec<f64> = points.iter().map(|p| p[0]).collect();
        fit_with_kernel(&points, &y, Kernel::matern52(length_scale), 1e-6, 0.0, 1.0)
            .expect("fit should succeed")
    }

    #[test]
    fn test_indefinite_candidates_are_skipped() {
        let short = line_fit(0.05);
        let long = line_fit(2.0);
        let expected = short.log_marginal_likelihood.max(long.log_marginal_likelihood);

        let best = most_likely(vec![
            Err(EnsembleError::NotPositiveDefinite),
            Ok(short),
            Err(EnsembleError::NotPositiveDefinite),
            Ok(long),
        ])
        .expect("two candidates succeed");
        assert_eq!(best.log_marginal_likelihood, expected);
    }

    #[test]
    fn test_all_candidates_indefinite_is_an_error() {
        let fits = vec![
            Err(EnsembleError::NotPositiveDefinite),
            Err(EnsembleError::NotPositiveDefinite),
        ];
        assert!(matches!(most_likely(fits), Err(EnsembleError::NotPositiveDefinite)));
        assert!(matches!(
            most_likely(Vec::new()),
            Err(EnsembleError::NotPositiveDefinite)
        ));
    }

    #[test]
    fn test_other_candidate_errors_propagate() {
        let fits = vec![Ok(line_fit(1.0)), Err(EnsembleError::empty_input("points"))];
        assert!(matches!(most_likely(fits), Err(EnsembleError::EmptyInput { .. })));
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut gp = GaussianProcessRegressor::new(Kernel::rbf(1.0));
        gp.fit_points(&[vec![0.0, 1.0]], &[1.0]).expect("fit should succeed");
        assert!(gp.predict_point(&[0.0]).is_err());
    }
}
