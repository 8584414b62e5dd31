//! Support vector regression.
//!
//! Epsilon-insensitive SVR with an RBF or linear kernel. The dual problem is
//! solved by SMO on the full Gram matrix, so it suits the few-hundred-row
//! training sets the ensemble works with.
//!
//! # Example
//!
//! ```
//! use alloy_ensemble::prelude::*;
//! use alloy_ensemble::svm::{SvrGamma, SVR};
//!
//! let x = Matrix::from_vec(5, 1, vec![0.0, 1.0, 2.0, 3.0, 4.0]).expect("5x1 matrix");
//! let y = Vector::from_slice(&[0.0, 1.0, 2.0, 3.0, 4.0]);
//!
//! let mut svr = SVR::new()
//!     .with_c(100.0)
//!     .with_epsilon(0.01)
//!     .with_gamma(SvrGamma::Value(0.1));
//! svr.fit(&x, &y).expect("fit should succeed");
//!
//! let predictions = svr.predict(&x).expect("fitted");
//! assert!((predictions[2] - 2.0).abs() < 0.1);
//! ```

mod smo;

use crate::error::{EnsembleError, Result};
use crate::primitives::{Matrix, Vector};
use crate::traits::Regressor;
use serde::{Deserialize, Serialize};
use smo::SmoSolver;
use tracing::{debug, warn};

/// Kernel coefficient for the RBF kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SvrGamma {
    /// `1 / (n_features · Var(X))`, computed at fit time.
    Scale,
    /// Fixed coefficient.
    Value(f64),
}

/// Kernel function of the SVR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SvrKernel {
    /// `exp(-γ ‖x − x'‖²)`
    #[default]
    Rbf,
    /// `x · x'`
    Linear,
}

/// Epsilon-support vector regressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVR {
    kernel: SvrKernel,
    c: f64,
    epsilon: f64,
    gamma: SvrGamma,
    tol: f64,
    max_iter: Option<usize>,
    /// Training rows with non-zero dual coefficient
    support_vectors: Option<Matrix<f32>>,
    dual_coef: Vec<f64>,
    intercept: f64,
    /// Gamma resolved at fit time
    fitted_gamma: f64,
}

impl SVR {
    /// Creates an RBF SVR with `C = 1`, `epsilon = 0.1` and `gamma = scale`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kernel: SvrKernel::Rbf,
            c: 1.0,
            epsilon: 0.1,
            gamma: SvrGamma::Scale,
            tol: 1e-3,
            max_iter: None,
            support_vectors: None,
            dual_coef: Vec::new(),
            intercept: 0.0,
            fitted_gamma: 0.0,
        }
    }

    /// Sets the kernel.
    #[must_use]
    pub fn with_kernel(mut self, kernel: SvrKernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Sets the regularization parameter C.
    ///
    /// Larger C penalises errors outside the epsilon tube more strongly.
    #[must_use]
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Sets the half-width of the insensitive tube.
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Sets the RBF kernel coefficient.
    #[must_use]
    pub fn with_gamma(mut self, gamma: SvrGamma) -> Self {
        self.gamma = gamma;
        self
    }

    /// Sets the KKT-gap tolerance used as stopping criterion.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Caps the number of SMO iterations.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = Some(max_iter);
        self
    }

    /// Number of support vectors after fitting.
    #[must_use]
    pub fn n_support(&self) -> usize {
        self.dual_coef.len()
    }

    /// Intercept of the decision function.
    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    fn validate(&self) -> Result<()> {
        if !(self.c > 0.0) {
            return Err(EnsembleError::invalid_hyperparameter("C", self.c, "> 0"));
        }
        if !(self.epsilon >= 0.0) {
            return Err(EnsembleError::invalid_hyperparameter(
                "epsilon",
                self.epsilon,
                ">= 0",
            ));
        }
        if let SvrGamma::Value(g) = self.gamma {
            if !(g > 0.0) {
                return Err(EnsembleError::invalid_hyperparameter("gamma", g, "> 0"));
            }
        }
        Ok(())
    }

    fn resolve_gamma(&self, x: &Matrix<f32>) -> f64 {
        match self.gamma {
            SvrGamma::Value(g) => g,
            SvrGamma::Scale => {
                let var = f64::from(x.variance());
                if var > 0.0 {
                    1.0 / (x.n_cols() as f64 * var)
                } else {
                    1.0
                }
            }
        }
    }

    fn kernel_value(&self, a: &[f32], b: &[f32]) -> f64 {
        match self.kernel {
            SvrKernel::Rbf => {
                let sq_dist: f64 = a
                    .iter()
                    .zip(b.iter())
                    .map(|(&u, &v)| (f64::from(u) - f64::from(v)).powi(2))
                    .sum();
                (-self.fitted_gamma * sq_dist).exp()
            }
            SvrKernel::Linear => a
                .iter()
                .zip(b.iter())
                .map(|(&u, &v)| f64::from(u) * f64::from(v))
                .sum(),
        }
    }
}

impl Default for SVR {
    fn default() -> Self {
        Self::new()
    }
}

impl Regressor for SVR {
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        let n = x.n_rows();
        if n != y.len() {
            return Err(EnsembleError::dimension_mismatch("samples", n, y.len()));
        }
        if n == 0 {
            return Err(EnsembleError::empty_input("SVR::fit"));
        }
        self.validate()?;
        self.fitted_gamma = self.resolve_gamma(x);

        let mut gram = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..=i {
                let k = self.kernel_value(x.row_slice(i), x.row_slice(j));
                gram[i * n + j] = k;
                gram[j * n + i] = k;
            }
        }

        let targets: Vec<f64> = y.iter().map(|&t| f64::from(t)).collect();
        let max_iter = self.max_iter.unwrap_or_else(|| (100 * n).max(10_000_000));
        let solution = SmoSolver::new(&gram, &targets, self.c, self.epsilon, self.tol).solve(max_iter);

        if solution.converged {
            debug!(iterations = solution.iterations, "SVR solver converged");
        } else {
            warn!(
                iterations = solution.iterations,
                "SVR solver reached the iteration cap before convergence"
            );
        }

        let support: Vec<usize> = (0..n).filter(|&i| solution.dual_coef[i] != 0.0).collect();
        self.dual_coef = support.iter().map(|&i| solution.dual_coef[i]).collect();
        self.support_vectors = Some(x.select_rows(&support));
        self.intercept = -solution.rho;
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vector<f32>> {
        let support = self
            .support_vectors
            .as_ref()
            .ok_or_else(|| EnsembleError::not_fitted("SVR"))?;
        if support.n_rows() > 0 && x.n_cols() != support.n_cols() {
            return Err(EnsembleError::dimension_mismatch(
                "features",
                support.n_cols(),
                x.n_cols(),
            ));
        }

        Ok((0..x.n_rows())
            .map(|i| {
                let row = x.row_slice(i);
                let f: f64 = self
                    .dual_coef
                    .iter()
                    .enumerate()
                    .map(|(s, &coef)| coef * self.kernel_value(support.row_slice(s), row))
                    .sum();
                (f + self.intercept) as f32
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_data(n: usize) -> (Matrix<f32>, Vector<f32>) {
        let xs: Vec<f32> = (0..n).map(|i| i as f32 * 6.0 / (n - 1) as f32).collect();
        let ys: Vec<f32> = xs.iter().map(|v| v.sin()).collect();
        (
            Matrix::from_vec(n, 1, xs).expect("valid"),
            Vector::from_vec(ys),
        )
    }

    #[test]
    fn test_fits_smooth_function() {
        let (x, y) = sine_data(40);
        let mut svr = SVR::new()
            .with_c(100.0)
            .with_epsilon(0.01)
            .with_gamma(SvrGamma::Value(0.5));
        svr.fit(&x, &y).expect("fit should succeed");

        let predictions = svr.predict(&x).expect("fitted");
        let max_err = predictions
            .iter()
            .zip(y.iter())
            .map(|(p, t)| (p - t).abs())
            .fold(0.0_f32, f32::max);
        assert!(max_err < 0.05, "max error {max_err}");
    }

    #[test]
    fn test_residuals_respect_tube_for_free_vectors() {
        let (x, y) = sine_data(30);
        let epsilon = 0.2;
        let mut svr = SVR::new()
            .with_c(1000.0)
            .with_epsilon(epsilon)
            .with_gamma(SvrGamma::Value(0.5));
        svr.fit(&x, &y).expect("fit should succeed");
        let predictions = svr.predict(&x).expect("fitted");
        // Large C: every residual lies within the tube up to solver tolerance
        for (p, t) in predictions.iter().zip(y.iter()) {
            assert!((p - t).abs() <= epsilon as f32 + 0.01);
        }
    }

    #[test]
    fn test_wide_tube_gives_constant_model() {
        let (x, y) = sine_data(20);
        let mut svr = SVR::new().with_epsilon(5.0);
        svr.fit(&x, &y).expect("fit should succeed");
        assert_eq!(svr.n_support(), 0);
        let predictions = svr.predict(&x).expect("fitted");
        let first = predictions[0];
        assert!(predictions.iter().all(|&p| (p - first).abs() < 1e-6));
    }

    #[test]
    fn test_linear_kernel_recovers_slope() {
        let x = Matrix::from_vec(5, 1, vec![-2.0, -1.0, 0.0, 1.0, 2.0]).expect("valid");
        let y = Vector::from_slice(&[-4.0, -2.0, 0.0, 2.0, 4.0]);
        let mut svr = SVR::new()
            .with_kernel(SvrKernel::Linear)
            .with_c(100.0)
            .with_epsilon(0.01);
        svr.fit(&x, &y).expect("fit should succeed");
        let query = Matrix::from_vec(1, 1, vec![1.5]).expect("valid");
        assert!((svr.predict(&query).expect("fitted")[0] - 3.0).abs() < 0.05);
    }

    #[test]
    fn test_deterministic() {
        let (x, y) = sine_data(25);
        let fit = || {
            let mut svr = SVR::new().with_c(10.0);
            svr.fit(&x, &y).expect("fit should succeed");
            svr.predict(&x).expect("fitted").into_vec()
        };
        assert_eq!(fit(), fit());
    }

    #[test]
    fn test_iteration_cap_still_predicts() {
        let (x, y) = sine_data(20);
        let mut capped = SVR::new().with_c(10.0).with_max_iter(2);
        capped.fit(&x, &y).expect("capped solver returns its iterate");
        assert!(capped.predict(&x).expect("fitted").iter().all(|p| p.is_finite()));

        let mut tight = SVR::new().with_c(10.0).with_tolerance(1e-5);
        tight.fit(&x, &y).expect("fit should succeed");
        let mut loose = SVR::new().with_c(10.0);
        loose.fit(&x, &y).expect("fit should succeed");
        let gap = tight
            .predict(&x)
            .expect("fitted")
            .iter()
            .zip(loose.predict(&x).expect("fitted").iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f32, f32::max);
        assert!(gap < 0.05, "tolerance changed the fit by {gap}");
    }

    #[test]
    fn test_invalid_c() {
        let (x, y) = sine_data(5);
        let mut svr = SVR::new().with_c(0.0);
        assert!(matches!(
            svr.fit(&x, &y),
            Err(EnsembleError::InvalidHyperparameter { .. })
        ));
    }

    #[test]
    fn test_predict_before_fit() {
        let (x, _) = sine_data(5);
        assert!(matches!(
            SVR::new().predict(&x),
            Err(EnsembleError::NotFitted { .. })
        ));
    }
}
