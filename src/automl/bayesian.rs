//! Sequential model-based minimisation with a Gaussian-process surrogate.

use super::acquisition::Acquisition;
use super::space::SearchSpace;
use crate::error::{EnsembleError, Result};
use crate::gaussian_process::{GaussianProcessRegressor, Kernel, LengthScaleSearch};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of [`BayesianOptimizer::minimize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Best point found
    pub x: Vec<f64>,
    /// Objective value at `x`
    pub fun: f64,
    /// Every evaluated point, in evaluation order
    pub x_iters: Vec<Vec<f64>>,
    /// Objective value of every evaluated point
    pub func_vals: Vec<f64>,
}

impl OptimizationResult {
    /// Number of objective evaluations.
    #[must_use]
    pub fn n_calls(&self) -> usize {
        self.func_vals.len()
    }

    /// Running minimum of `func_vals`.
    #[must_use]
    pub fn convergence(&self) -> Vec<f64> {
        self.func_vals
            .iter()
            .scan(f64::INFINITY, |best, &v| {
                *best = best.min(v);
                Some(*best)
            })
            .collect()
    }
}

/// Bayesian optimiser over a box-bounded [`SearchSpace`].
///
/// The first `n_initial_points` calls are uniform random; each later call
/// fits a Matérn 5/2 GP (normalised targets, length scale picked by
/// marginal likelihood) to all observations in the unit cube and evaluates
/// the point maximising the acquisition over `n_candidates` random
/// candidates.
///
/// # Example
///
/// ```
/// use alloy_ensemble::automl::{BayesianOptimizer, SearchSpace};
///
/// let space = SearchSpace::new().add_real("x", -2.0, 2.0);
/// let result = BayesianOptimizer::new()
///     .with_n_calls(12)
///     .with_n_initial_points(4)
///     .with_n_candidates(200)
///     .minimize(&space, |p| Ok((p[0] - 0.5).powi(2)))
///     .expect("objective never fails");
/// assert_eq!(result.func_vals.len(), 12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesianOptimizer {
    n_calls: usize,
    n_initial_points: usize,
    n_candidates: usize,
    acquisition: Acquisition,
    seed: Option<u64>,
    noise: f64,
}

impl Default for BayesianOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl BayesianOptimizer {
    /// 50 calls, 10 random initial points, 10 000 candidates, EI, seed 42.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_calls: 50,
            n_initial_points: 10,
            n_candidates: 10_000,
            acquisition: Acquisition::default(),
            seed: Some(42),
            noise: 1e-6,
        }
    }

    /// Total number of objective evaluations.
    #[must_use]
    pub fn with_n_calls(mut self, n_calls: usize) -> Self {
        self.n_calls = n_calls;
        self
    }

    /// Number of uniform random evaluations before the surrogate is used.
    #[must_use]
    pub fn with_n_initial_points(mut self, n_initial_points: usize) -> Self {
        self.n_initial_points = n_initial_points;
        self
    }

    /// Number of random candidates scored by the acquisition per call.
    #[must_use]
    pub fn with_n_candidates(mut self, n_candidates: usize) -> Self {
        self.n_candidates = n_candidates;
        self
    }

    #[must_use]
    pub fn with_acquisition(mut self, acquisition: Acquisition) -> Self {
        self.acquisition = acquisition;
        self
    }

    /// Seed for all random draws; `None` seeds from entropy.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Noise added to the surrogate's kernel diagonal.
    #[must_use]
    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    #[must_use]
    pub fn n_calls(&self) -> usize {
        self.n_calls
    }

    #[must_use]
    pub fn n_initial_points(&self) -> usize {
        self.n_initial_points
    }

    #[must_use]
    pub fn acquisition(&self) -> Acquisition {
        self.acquisition
    }

    fn validate(&self, space: &SearchSpace) -> Result<()> {
        space.validate()?;
        if self.n_calls == 0 {
            return Err(EnsembleError::invalid_hyperparameter("n_calls", self.n_calls, ">= 1"));
        }
        if self.n_initial_points == 0 {
            return Err(EnsembleError::invalid_hyperparameter(
                "n_initial_points",
                self.n_initial_points,
                ">= 1",
            ));
        }
        if self.n_candidates == 0 {
            return Err(EnsembleError::invalid_hyperparameter(
                "n_candidates",
                self.n_candidates,
                ">= 1",
            ));
        }
        if !(self.noise >= 0.0) {
            return Err(EnsembleError::invalid_hyperparameter("noise", self.noise, ">= 0"));
        }
        Ok(())
    }

    /// Minimises `objective` over `space`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid space or budget, and propagates the
    /// first error returned by `objective`. A non-finite objective value is
    /// an error.
    pub fn minimize<F>(&self, space: &SearchSpace, mut objective: F) -> Result<OptimizationResult>
    where
        F: FnMut(&[f64]) -> Result<f64>,
    {
        self.validate(space)?;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut unit_points: Vec<Vec<f64>> = Vec::with_capacity(self.n_calls);
        let mut x_iters: Vec<Vec<f64>> = Vec::with_capacity(self.n_calls);
        let mut func_vals: Vec<f64> = Vec::with_capacity(self.n_calls);
        let mut best_idx = 0;

        for call in 0..self.n_calls {
            let unit = if call < self.n_initial_points {
                space.sample_unit(&mut rng)
            } else {
                self.propose(space, &unit_points, &func_vals, &mut rng)?
            };
            let point = space.from_unit(&unit);

            let start = Instant::now();
            let value = objective(&point)?;
            if !value.is_finite() {
                return Err(EnsembleError::Other(format!(
                    "objective returned non-finite value {value} at call {}",
                    call + 1
                )));
            }
            debug!(
                call = call + 1,
                value,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "objective evaluated"
            );

            if func_vals.is_empty() || value < func_vals[best_idx] {
                best_idx = func_vals.len();
            }
            unit_points.push(unit);
            x_iters.push(point);
            func_vals.push(value);

            info!(
                call = call + 1,
                n_calls = self.n_calls,
                value,
                best = func_vals[best_idx],
                "optimizer step"
            );
        }

        Ok(OptimizationResult {
            x: x_iters[best_idx].clone(),
            fun: func_vals[best_idx],
            x_iters,
            func_vals,
        })
    }

    /// Next unit-cube point: acquisition argmax over random candidates, or a
    /// random point when the surrogate cannot be fitted.
    fn propose(
        &self,
        space: &SearchSpace,
        unit_points: &[Vec<f64>],
        func_vals: &[f64],
        rng: &mut StdRng,
    ) -> Result<Vec<f64>> {
        let mut surrogate = GaussianProcessRegressor::new(Kernel::matern52(1.0))
            .with_alpha(self.noise)
            .with_normalize_y(true)
            .with_length_scale_search(LengthScaleSearch {
                lower: 0.01,
                upper: 10.0,
                n_grid: 16,
            });

        let candidates: Vec<Vec<f64>> = (0..self.n_candidates)
            .map(|_| space.sample_unit(rng))
            .collect();

        if let Err(err) = surrogate.fit_points(unit_points, func_vals) {
            warn!(%err, "surrogate fit failed, falling back to a random candidate");
            return Ok(candidates.into_iter().next().unwrap_or_else(|| space.sample_unit(rng)));
        }

        let best = func_vals.iter().copied().fold(f64::INFINITY, f64::min);
        let mut chosen = 0;
        let mut chosen_utility = f64::NEG_INFINITY;
        for (i, candidate) in candidates.iter().enumerate() {
            let (mean, std) = surrogate.predict_point(candidate)?;
            let utility = self.acquisition.utility(mean, std, best);
            if utility > chosen_utility {
                chosen = i;
                chosen_utility = utility;
            }
        }
        debug!(
            utility = chosen_utility,
            length_scale = surrogate.kernel().length_scale,
            "acquisition maximised"
        );

        Ok(candidates.into_iter().nth(chosen).unwrap_or_else(|| space.sample_unit(rng)))
    }
}
