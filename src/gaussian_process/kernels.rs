//! Stationary covariance functions.

use serde::{Deserialize, Serialize};

/// Shape of a stationary kernel as a function of distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum KernelKind {
    /// Squared exponential: `exp(-r² / 2l²)`
    #[default]
    Rbf,
    /// Matérn with ν = 5/2: `(1 + √5 r/l + 5r²/3l²) exp(-√5 r/l)`
    Matern52,
}

/// `amplitude × k(‖x − x'‖ / length_scale)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kernel {
    /// Radial profile
    pub kind: KernelKind,
    /// Signal variance multiplying the profile
    pub amplitude: f64,
    /// Isotropic length scale
    pub length_scale: f64,
}

impl Kernel {
    /// RBF kernel with unit amplitude.
    #[must_use]
    pub fn rbf(length_scale: f64) -> Self {
        Self {
            kind: KernelKind::Rbf,
            amplitude: 1.0,
            length_scale,
        }
    }

    /// Matérn 5/2 kernel with unit amplitude.
    #[must_use]
    pub fn matern52(length_scale: f64) -> Self {
        Self {
            kind: KernelKind::Matern52,
            amplitude: 1.0,
            length_scale,
        }
    }

    /// Sets the signal variance.
    #[must_use]
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Returns a copy with another length scale.
    #[must_use]
    pub fn with_length_scale(mut self, length_scale: f64) -> Self {
        self.length_scale = length_scale;
        self
    }

    /// Covariance between two points.
    #[must_use]
    pub fn eval(&self, a: &[f64], b: &[f64]) -> f64 {
        let sq_dist: f64 = a.iter().zip(b.iter()).map(|(u, v)| (u - v).powi(2)).sum();
        let scaled_sq = sq_dist / (self.length_scale * self.length_scale);

        let profile = match self.kind {
            KernelKind::Rbf => (-0.5 * scaled_sq).exp(),
            KernelKind::Matern52 => {
                let r = (5.0 * scaled_sq).sqrt();
                (1.0 + r + r * r / 3.0) * (-r).exp()
            }
        };
        self.amplitude * profile
    }

    /// Value at zero distance.
    #[must_use]
    pub fn diag(&self) -> f64 {
        self.amplitude
    }
}
