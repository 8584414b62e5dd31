//! Cholesky factorisation for symmetric positive definite systems.
//!
//! Kernel matrices are solved in double precision: GP and SVR kernels
//! with small noise terms are too ill-conditioned for `f32`.

use crate::error::{EnsembleError, Result};

/// Lower-triangular factor `L` with `A = L Lᵀ` (row-major, `n × n`).
#[derive(Debug, Clone)]
pub struct Cholesky {
    l: Vec<f64>,
    n: usize,
}

impl Cholesky {
    /// Factorises the row-major `n × n` matrix `a`.
    ///
    /// # Errors
    ///
    /// Returns `NotPositiveDefinite` if a pivot is not strictly positive
    /// and `DimensionMismatch` if `a` is not `n × n`.
    pub fn factor(a: &[f64], n: usize) -> Result<Self> {
        if a.len() != n * n {
            return Err(EnsembleError::dimension_mismatch("n*n", n * n, a.len()));
        }

        let mut l = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..=i {
                let mut sum = 0.0;
                for k in 0..j {
                    sum += l[i * n + k] * l[j * n + k];
                }
                if i == j {
                    let diag = a[i * n + i] - sum;
                    if diag <= 0.0 || !diag.is_finite() {
                        return Err(EnsembleError::NotPositiveDefinite);
                    }
                    l[i * n + i] = diag.sqrt();
                } else {
                    l[i * n + j] = (a[i * n + j] - sum) / l[j * n + j];
                }
            }
        }

        Ok(Self { l, n })
    }

    /// Dimension of the factorised matrix.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Forward substitution: solves `L y = b`.
    ///
    /// # Panics
    ///
    /// Panics if `b.len() != dim()`.
    #[must_use]
    pub fn solve_lower(&self, b: &[f64]) -> Vec<f64> {
        let n = self.n;
        assert_eq!(b.len(), n, "right-hand side length must match factor");
        let mut y = vec![0.0; n];
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..i {
                sum += self.l[i * n + j] * y[j];
            }
            y[i] = (b[i] - sum) / self.l[i * n + i];
        }
        y
    }

    /// Solves `A x = b` by forward then backward substitution.
    ///
    /// # Panics
    ///
    /// Panics if `b.len() != dim()`.
    #[must_use]
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let n = self.n;
        let y = self.solve_lower(b);
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = 0.0;
            for j in (i + 1)..n {
                sum += self.l[j * n + i] * x[j];
            }
            x[i] = (y[i] - sum) / self.l[i * n + i];
        }
        x
    }

    /// `log |A| = 2 Σ log L_ii`.
    #[must_use]
    pub fn log_det(&self) -> f64 {
        2.0 * (0..self.n).map(|i| self.l[i * self.n + i].ln()).sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_spd_system() {
        // A = [[4, 2], [2, 3]], b = [2, 1] -> x = [0.5, 0]
        let chol = Cholesky::factor(&[4.0, 2.0, 2.0, 3.0], 2).expect("matrix is SPD");
        let x = chol.solve(&[2.0, 1.0]);
        assert!((x[0] - 0.5).abs() < 1e-12);
        assert!(x[1].abs() < 1e-12);
    }

    #[test]
    fn test_log_det() {
        let chol = Cholesky::factor(&[4.0, 2.0, 2.0, 3.0], 2).expect("matrix is SPD");
        // det = 12 - 4 = 8
        assert!((chol.log_det() - 8.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_not_positive_definite() {
        let result = Cholesky::factor(&[1.0, 2.0, 2.0, 1.0], 2);
        assert!(matches!(result, Err(EnsembleError::NotPositiveDefinite)));
    }

    #[test]
    fn test_wrong_size() {
        assert!(Cholesky::factor(&[1.0, 0.0, 0.0], 2).is_err());
    }

    #[test]
    fn test_solve_lower_identity() {
        let chol = Cholesky::factor(&[1.0, 0.0, 0.0, 1.0], 2).expect("identity is SPD");
        assert_eq!(chol.solve_lower(&[3.0, -2.0]), vec![3.0, -2.0]);
        assert_eq!(chol.dim(), 2);
    }
}
