//! Acquisition functions for minimisation.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, SQRT_2};

/// Criterion used to pick the next point from the surrogate.
///
/// All variants are expressed as a utility to *maximise* for a
/// *minimisation* problem.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Acquisition {
    /// `E[max(best − f(x) − xi, 0)]`
    ExpectedImprovement { xi: f64 },
    /// `P(f(x) < best − xi)`
    ProbabilityOfImprovement { xi: f64 },
    /// `−(μ − κσ)`
    LowerConfidenceBound { kappa: f64 },
}

impl Default for Acquisition {
    fn default() -> Self {
        Acquisition::ExpectedImprovement { xi: 0.01 }
    }
}

impl Acquisition {
    /// Utility of a candidate with predictive `mean` and `std`, given the
    /// best (lowest) observed value.
    #[must_use]
    pub fn utility(&self, mean: f64, std: f64, best: f64) -> f64 {
        match *self {
            Acquisition::ExpectedImprovement { xi } => {
                let improvement = best - mean - xi;
                if std < 1e-12 {
                    return improvement.max(0.0);
                }
                let z = improvement / std;
                improvement * normal_cdf(z) + std * normal_pdf(z)
            }
            Acquisition::ProbabilityOfImprovement { xi } => {
                let improvement = best - mean - xi;
                if std < 1e-12 {
                    return if improvement > 0.0 { 1.0 } else { 0.0 };
                }
                normal_cdf(improvement / std)
            }
            Acquisition::LowerConfidenceBound { kappa } => -(mean - kappa * std),
        }
    }
}

fn normal_pdf(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * PI).sqrt()
}

fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / SQRT_2))
}

/// Abramowitz and Stegun 7.1.26 (absolute error below 1.5e-7).
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erf_reference_values() {
        assert!(erf(0.0).abs() < 1e-7);
        assert!((erf(1.0) - 0.842_700_79).abs() < 1e-6);
        assert!((erf(-1.0) + 0.842_700_79).abs() < 1e-6);
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-3);
    }

    #[test]
    fn test_ei_prefers_lower_mean_and_higher_std() {
        let ei = Acquisition::default();
        assert!(ei.utility(0.5, 0.1, 1.0) > ei.utility(0.9, 0.1, 1.0));
        assert!(ei.utility(1.0, 0.5, 1.0) > ei.utility(1.0, 0.1, 1.0));
        assert!(ei.utility(2.0, 0.1, 1.0) >= 0.0);
    }

    #[test]
    fn test_ei_deterministic_limit() {
        let ei = Acquisition::ExpectedImprovement { xi: 0.0 };
        assert!((ei.utility(0.4, 0.0, 1.0) - 0.6).abs() < 1e-12);
        assert_eq!(ei.utility(1.4, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_pi_is_probability() {
        let pi = Acquisition::ProbabilityOfImprovement { xi: 0.01 };
        let u = pi.utility(1.0, 0.5, 1.2);
        assert!(u > 0.5 && u < 1.0);
        assert!((pi.utility(1.0, 1e3, 1.0) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_lcb() {
        let lcb = Acquisition::LowerConfidenceBound { kappa: 1.96 };
        assert!((lcb.utility(1.0, 0.5, 0.0) - (-(1.0 - 0.98))).abs() < 1e-12);
    }
}
