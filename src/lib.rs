//! Weighted regression ensembles for shape-memory alloy transformation
//! temperatures.
//!
//! Five regressors (SVR, random forest, extra trees, Gaussian process and
//! k-nearest neighbours), each behind a standard scaler, are blended with
//! one weight per model. The weights are chosen by a Gaussian-process
//! Bayesian optimiser minimising the K-fold out-of-fold RMSE; the result is
//! reported as train/test metrics with σ bands, a weighted feature
//! importance ranking and predicted-temperature sweeps over ternary
//! compositions.
//!
//! # Quick Start
//!
//! ```
//! use alloy_ensemble::prelude::*;
//!
//! // Blend of two models on a tiny linear problem
//! let x = Matrix::from_vec(20, 1, (0..20).map(|i| i as f32).collect()).unwrap();
//! let y: Vector<f32> = (0..20).map(|i| 2.0 * i as f32 + 1.0).collect();
//!
//! let weights = EnsembleWeights::from_raw(&[0.0, 0.0, 0.5, 0.0, 0.5]).unwrap();
//! let config = BaseModelConfig::default().with_n_estimators(10, 10);
//! let ensemble = FittedEnsemble::fit(&config, weights, &x, &y).unwrap();
//!
//! let predictions = ensemble.predict(&x).unwrap();
//! assert!(r_squared(&predictions, &y) > 0.9);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Core Vector and Matrix types, Cholesky factorisation
//! - [`data`]: CSV dataset loading
//! - [`preprocessing`]: Standard scaling
//! - [`model_selection`]: Train/test splitting and K-fold cross-validation
//! - [`metrics`]: Regression metrics
//! - [`svm`]: Epsilon support vector regression
//! - [`tree`]: Decision trees, random forests, extra trees
//! - [`gaussian_process`]: Exact Gaussian process regression
//! - [`neighbors`]: k-nearest-neighbours regression
//! - [`ensemble`]: Base model registry, blending weights, cross-validated evaluation
//! - [`automl`]: Search spaces and Bayesian optimisation
//! - [`report`]: Performance tables, uncertainty bands, composition sweeps
//! - [`config`]: Experiment configuration
//! - [`experiment`]: End-to-end runs

pub mod automl;
pub mod config;
pub mod data;
pub mod ensemble;
pub mod error;
pub mod experiment;
pub mod gaussian_process;
pub mod metrics;
pub mod model_selection;
pub mod neighbors;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod report;
pub mod svm;
pub mod traits;
pub mod tree;

pub use error::{EnsembleError, Result};
pub use primitives::{Matrix, Vector};
pub use traits::{Regressor, Transformer};
