//! The five base models and their fixed configuration.

use crate::error::{EnsembleError, Result};
use crate::gaussian_process::{GaussianProcessRegressor, Kernel};
use crate::neighbors::{DistanceMetric, KNeighborsRegressor, NeighborWeights};
use crate::preprocessing::StandardScaler;
use crate::primitives::{Matrix, Vector};
use crate::svm::{SvrGamma, SVR};
use crate::traits::{Regressor, Transformer};
use crate::tree::{ExtraTreesRegressor, RandomForestRegressor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies one member of the ensemble.
///
/// The declaration order is the canonical order of weight vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BaseModel {
    /// Epsilon-SVR with RBF kernel
    #[serde(rename = "svr")]
    Svr,
    /// Bagged best-split trees
    #[serde(rename = "rf")]
    RandomForest,
    /// Bagged randomised-threshold trees
    #[serde(rename = "et")]
    ExtraTrees,
    /// Exact GP regression
    #[serde(rename = "gp")]
    GaussianProcess,
    /// k-nearest-neighbours regression
    #[serde(rename = "knn")]
    Knn,
}

impl BaseModel {
    /// All models in canonical order.
    pub const ALL: [BaseModel; 5] = [
        BaseModel::Svr,
        BaseModel::RandomForest,
        BaseModel::ExtraTrees,
        BaseModel::GaussianProcess,
        BaseModel::Knn,
    ];

    /// Position in [`BaseModel::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            BaseModel::Svr => 0,
            BaseModel::RandomForest => 1,
            BaseModel::ExtraTrees => 2,
            BaseModel::GaussianProcess => 3,
            BaseModel::Knn => 4,
        }
    }

    /// Short name used on the command line and in JSON.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            BaseModel::Svr => "svr",
            BaseModel::RandomForest => "rf",
            BaseModel::ExtraTrees => "et",
            BaseModel::GaussianProcess => "gp",
            BaseModel::Knn => "knn",
        }
    }

    /// Name of the optimizer dimension holding this model's weight.
    #[must_use]
    pub fn weight_param(self) -> &'static str {
        match self {
            BaseModel::Svr => "svr_weight",
            BaseModel::RandomForest => "rf_weight",
            BaseModel::ExtraTrees => "et_weight",
            BaseModel::GaussianProcess => "gp_weight",
            BaseModel::Knn => "knn_weight",
        }
    }
}

impl fmt::Display for BaseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BaseModel::Svr => "SVR",
            BaseModel::RandomForest => "RandomForest",
            BaseModel::ExtraTrees => "ExtraTrees",
            BaseModel::GaussianProcess => "GaussianProcess",
            BaseModel::Knn => "KNN",
        };
        f.write_str(label)
    }
}

impl FromStr for BaseModel {
    type Err = EnsembleError;

    /// Accepts the short name or the display name, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        BaseModel::ALL
            .into_iter()
            .find(|m| m.name() == wanted || m.to_string().to_ascii_lowercase() == wanted)
            .ok_or_else(|| EnsembleError::Other(format!("unknown model '{s}' (expected svr, rf, et, gp or knn)")))
    }
}

/// SVR hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvrConfig {
    pub c: f64,
    pub epsilon: f64,
    pub gamma: SvrGamma,
}

impl Default for SvrConfig {
    fn default() -> Self {
        Self {
            c: 1000.0,
            epsilon: 1.0,
            gamma: SvrGamma::Value(0.000_766_518_968_958_527_5),
        }
    }
}

/// Hyperparameters shared by both forests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
    pub random_state: Option<u64>,
}

impl ForestConfig {
    /// 300 trees of depth ≤ 30.
    #[must_use]
    pub fn random_forest() -> Self {
        Self {
            n_estimators: 300,
            max_depth: Some(30),
            min_samples_split: 3,
            min_samples_leaf: 1,
            bootstrap: true,
            random_state: Some(42),
        }
    }

    /// 50 shallow trees of depth ≤ 5.
    #[must_use]
    pub fn extra_trees() -> Self {
        Self {
            n_estimators: 50,
            max_depth: Some(5),
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            random_state: Some(42),
        }
    }

    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }
}

/// Gaussian process hyperparameters (the kernel is not refitted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpConfig {
    pub amplitude: f64,
    pub length_scale: f64,
    pub alpha: f64,
    pub normalize_y: bool,
}

impl Default for GpConfig {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            length_scale: 1.0,
            alpha: 0.076_530_542_850_552_39,
            normalize_y: false,
        }
    }
}

/// KNN hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnConfig {
    pub n_neighbors: usize,
    /// Minkowski exponent
    pub p: f32,
    pub weights: NeighborWeights,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 3,
            p: 1.0,
            weights: NeighborWeights::Uniform,
        }
    }
}

/// Fixed configuration of all five base models.
///
/// Built once and shared by cross-validation, importance and sweeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseModelConfig {
    pub svr: SvrConfig,
    pub random_forest: ForestConfig,
    pub extra_trees: ForestConfig,
    pub gaussian_process: GpConfig,
    pub knn: KnnConfig,
}

impl Default for BaseModelConfig {
    fn default() -> Self {
        Self {
            svr: SvrConfig::default(),
            random_forest: ForestConfig::random_forest(),
            extra_trees: ForestConfig::extra_trees(),
            gaussian_process: GpConfig::default(),
            knn: KnnConfig::default(),
        }
    }
}

impl BaseModelConfig {
    /// Reseeds both forests.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_forest.random_state = Some(seed);
        self.extra_trees.random_state = Some(seed);
        self
    }

    /// Overrides the tree counts of both forests.
    #[must_use]
    pub fn with_n_estimators(mut self, random_forest: usize, extra_trees: usize) -> Self {
        self.random_forest.n_estimators = random_forest;
        self.extra_trees.n_estimators = extra_trees;
        self
    }

    /// Builds an unfitted, scaled instance of `model`.
    #[must_use]
    pub fn build(&self, model: BaseModel) -> ScaledRegressor {
        let regressor: Box<dyn Regressor> = match model {
            BaseModel::Svr => Box::new(
                SVR::new()
                    .with_c(self.svr.c)
                    .with_epsilon(self.svr.epsilon)
                    .with_gamma(self.svr.gamma),
            ),
            BaseModel::RandomForest => {
                let cfg = &self.random_forest;
                let mut rf = RandomForestRegressor::new(cfg.n_estimators)
                    .with_min_samples_split(cfg.min_samples_split)
                    .with_min_samples_leaf(cfg.min_samples_leaf)
                    .with_bootstrap(cfg.bootstrap);
                if let Some(depth) = cfg.max_depth {
                    rf = rf.with_max_depth(depth);
                }
                if let Some(seed) = cfg.random_state {
                    rf = rf.with_random_state(seed);
                }
                Box::new(rf)
            }
            BaseModel::ExtraTrees => {
                let cfg = &self.extra_trees;
                let mut et = ExtraTreesRegressor::new(cfg.n_estimators)
                    .with_min_samples_split(cfg.min_samples_split)
                    .with_min_samples_leaf(cfg.min_samples_leaf)
                    .with_bootstrap(cfg.bootstrap);
                if let Some(depth) = cfg.max_depth {
                    et = et.with_max_depth(depth);
                }
                if let Some(seed) = cfg.random_state {
                    et = et.with_random_state(seed);
                }
                Box::new(et)
            }
            BaseModel::GaussianProcess => {
                let cfg = &self.gaussian_process;
                Box::new(
                    GaussianProcessRegressor::new(
                        Kernel::rbf(cfg.length_scale).with_amplitude(cfg.amplitude),
                    )
                    .with_alpha(cfg.alpha)
                    .with_normalize_y(cfg.normalize_y),
                )
            }
            BaseModel::Knn => Box::new(
                KNeighborsRegressor::new(self.knn.n_neighbors)
                    .with_metric(DistanceMetric::from_p(self.knn.p))
                    .with_weights(self.knn.weights),
            ),
        };

        ScaledRegressor::new(model, regressor)
    }
}

/// A base model behind its own [`StandardScaler`].
///
/// The scaler is fitted on exactly the rows the model is fitted on.
#[derive(Debug)]
pub struct ScaledRegressor {
    kind: BaseModel,
    scaler: StandardScaler,
    model: Box<dyn Regressor>,
}

impl ScaledRegressor {
    /// Wraps `model` with an unfitted scaler.
    #[must_use]
    pub fn new(kind: BaseModel, model: Box<dyn Regressor>) -> Self {
        Self {
            kind,
            scaler: StandardScaler::new(),
            model,
        }
    }

    /// Which base model this is.
    #[must_use]
    pub fn kind(&self) -> BaseModel {
        self.kind
    }
}

impl Regressor for ScaledRegressor {
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        let scaled = self.scaler.fit_transform(x)?;
        self.model.fit(&scaled, y)
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vector<f32>> {
        let scaled = self.scaler.transform(x)?;
        self.model.predict(&scaled)
    }

    fn feature_importances(&self) -> Option<Vec<f32>> {
        self.model.feature_importances()
    }
}
