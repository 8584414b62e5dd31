//! Weighted ensemble of the five base regressors.
//!
//! - [`BaseModel`] / [`BaseModelConfig`]: which models exist and how each is built
//! - [`EnsembleWeights`]: normalised, name-keyed blending weights
//! - [`CrossValidatedEnsemble`]: K-fold out-of-fold evaluation of a weight vector
//! - [`FittedEnsemble`]: members refitted on the whole training set, for
//!   sweeps and feature importance

mod evaluator;
mod fitted;
mod model;
mod weights;

pub use evaluator::{
    CrossValidatedEnsemble, EnsembleEvaluation, FoldPredictions, FoldResult, ModelPredictions,
};
pub use fitted::{ensemble_feature_importances, FeatureImportance, FittedEnsemble};
pub use model::{
    BaseModel, BaseModelConfig, ForestConfig, GpConfig, KnnConfig, ScaledRegressor, SvrConfig,
};
pub use weights::{EnsembleWeights, MIN_WEIGHT_SUM};
