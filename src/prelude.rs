//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use alloy_ensemble::prelude::*;
//! ```

pub use crate::automl::{Acquisition, BayesianOptimizer, SearchSpace};
pub use crate::config::ExperimentConfig;
pub use crate::data::Dataset;
pub use crate::ensemble::{
    BaseModel, BaseModelConfig, CrossValidatedEnsemble, EnsembleWeights, FittedEnsemble,
};
pub use crate::experiment::Experiment;
pub use crate::gaussian_process::GaussianProcessRegressor;
pub use crate::metrics::{mae, mse, r_squared, rmse};
pub use crate::model_selection::{train_test_split, KFold};
pub use crate::neighbors::KNeighborsRegressor;
pub use crate::preprocessing::StandardScaler;
pub use crate::primitives::{Matrix, Vector};
pub use crate::svm::SVR;
pub use crate::traits::{Regressor, Transformer};
pub use crate::tree::{DecisionTreeRegressor, ExtraTreesRegressor, RandomForestRegressor};
