//! Black-box optimisation of the ensemble weights.
//!
//! A [`SearchSpace`] of real intervals, [`Acquisition`] functions and a
//! Gaussian-process [`BayesianOptimizer`] that minimises an objective
//! closure under a fixed evaluation budget.
//!
//! # Example
//!
//! ```
//! use alloy_ensemble::automl::{Acquisition, BayesianOptimizer, SearchSpace};
//!
//! let space = SearchSpace::new()
//!     .add_real("a", 0.0, 1.0)
//!     .add_real("b", 0.0, 1.0);
//!
//! let result = BayesianOptimizer::new()
//!     .with_n_calls(8)
//!     .with_n_initial_points(4)
//!     .with_n_candidates(100)
//!     .with_acquisition(Acquisition::LowerConfidenceBound { kappa: 1.96 })
//!     .minimize(&space, |p| Ok(p[0] + p[1]))
//!     .expect("objective never fails");
//!
//! assert!(space.contains(&result.x));
//! ```

mod acquisition;
mod bayesian;
mod space;

pub use acquisition::Acquisition;
pub use bayesian::{BayesianOptimizer, OptimizationResult};
pub use space::{Dimension, SearchSpace};
