//! Decision tree regressors and tree ensembles.
//!
//! This module implements:
//! - CART regression trees with variance (MSE) reduction
//! - Random forests (bootstrap aggregation of best-split trees)
//! - Extra-trees (randomised thresholds)
//! - Mean-decrease-in-impurity feature importances
//!
//! # Example
//!
//! ```rust
//! use alloy_ensemble::prelude::*;
//! use alloy_ensemble::tree::DecisionTreeRegressor;
//!
//! let x = Matrix::from_vec(6, 1, vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0])
//!     .expect("Matrix creation should succeed in tests");
//! let y = Vector::from_slice(&[5.0, 5.0, 5.0, 20.0, 20.0, 20.0]);
//!
//! let mut tree = DecisionTreeRegressor::new().with_max_depth(2);
//! tree.fit(&x, &y).expect("fit should succeed");
//!
//! let predictions = tree.predict(&x).expect("fitted");
//! assert!((predictions[0] - 5.0).abs() < 1e-6);
//! assert!((predictions[5] - 20.0).abs() < 1e-6);
//! ```

mod forest;
mod helpers;

pub use forest::{ExtraTreesRegressor, RandomForestRegressor};

use crate::error::{EnsembleError, Result};
use crate::primitives::{Matrix, Vector};
use crate::traits::Regressor;
use helpers::GrowthLimits;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Strategy used to choose the threshold at each node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Splitter {
    /// Scan every midpoint between consecutive distinct values.
    #[default]
    Best,
    /// Draw one uniform threshold per feature and keep the best feature.
    Random,
}

/// Leaf node in a regression tree.
///
/// Contains the predicted value (mean of training samples) and number of
/// training samples that reached this leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionLeaf {
    /// Predicted value for this leaf (mean of y values)
    pub value: f32,
    /// Number of training samples in this leaf
    pub n_samples: usize,
}

/// Internal node in a regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionNode {
    /// Index of the feature to split on
    pub feature_idx: usize,
    /// Threshold value for the split
    pub threshold: f32,
    /// Reduction of the sum of squared errors achieved by this split
    pub impurity_decrease: f64,
    /// Number of training samples reaching this node
    pub n_samples: usize,
    /// Left subtree (samples where feature <= threshold)
    pub left: Box<RegressionTreeNode>,
    /// Right subtree (samples where feature > threshold)
    pub right: Box<RegressionTreeNode>,
}

/// A node in a regression tree (either internal node or leaf).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegressionTreeNode {
    /// Internal decision node with split condition
    Node(RegressionNode),
    /// Leaf node with value prediction
    Leaf(RegressionLeaf),
}

impl RegressionTreeNode {
    /// Returns the depth of the tree rooted at this node.
    ///
    /// Leaf nodes have depth 0, internal nodes have depth 1 + max(left, right).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            RegressionTreeNode::Leaf(_) => 0,
            RegressionTreeNode::Node(node) => 1 + node.left.depth().max(node.right.depth()),
        }
    }

    /// Number of leaves below this node.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        match self {
            RegressionTreeNode::Leaf(_) => 1,
            RegressionTreeNode::Node(node) => node.left.n_leaves() + node.right.n_leaves(),
        }
    }

    fn predict_one(&self, sample: &[f32]) -> f32 {
        let mut node = self;
        loop {
            match node {
                RegressionTreeNode::Leaf(leaf) => return leaf.value,
                RegressionTreeNode::Node(internal) => {
                    node = if sample[internal.feature_idx] <= internal.threshold {
                        &internal.left
                    } else {
                        &internal.right
                    };
                }
            }
        }
    }
}

/// Decision tree regressor using the CART algorithm.
///
/// Uses Mean Squared Error (MSE) for splitting criterion and builds trees recursively.
/// Leaf nodes predict the mean of target values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    tree: Option<RegressionTreeNode>,
    n_features: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    splitter: Splitter,
    random_state: Option<u64>,
}

impl DecisionTreeRegressor {
    /// Creates a new decision tree regressor with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: None,
            n_features: 0,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            splitter: Splitter::Best,
            random_state: None,
        }
    }

    /// Sets the maximum depth of the tree.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets the minimum number of samples required to split an internal node.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Sets the minimum number of samples required in each leaf.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Sets the split strategy.
    #[must_use]
    pub fn with_splitter(mut self, splitter: Splitter) -> Self {
        self.splitter = splitter;
        self
    }

    /// Seeds the generator used by the random splitter.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Root of the fitted tree.
    #[must_use]
    pub fn tree(&self) -> Option<&RegressionTreeNode> {
        self.tree.as_ref()
    }

    /// Depth of the fitted tree.
    #[must_use]
    pub fn depth(&self) -> Option<usize> {
        self.tree.as_ref().map(RegressionTreeNode::depth)
    }

    fn validate(&self) -> Result<()> {
        if self.min_samples_split < 2 {
            return Err(EnsembleError::invalid_hyperparameter(
                "min_samples_split",
                self.min_samples_split,
                ">= 2",
            ));
        }
        if self.min_samples_leaf < 1 {
            return Err(EnsembleError::invalid_hyperparameter(
                "min_samples_leaf",
                self.min_samples_leaf,
                ">= 1",
            ));
        }
        Ok(())
    }

    /// Unnormalised impurity decrease per feature.
    pub(crate) fn raw_importances(&self) -> Option<Vec<f64>> {
        let tree = self.tree.as_ref()?;
        let mut importances = vec![0.0; self.n_features];
        helpers::accumulate_importances(tree, &mut importances);
        Some(importances)
    }
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Regressor for DecisionTreeRegressor {
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        let (n_rows, n_cols) = x.shape();
        if n_rows != y.len() {
            return Err(EnsembleError::dimension_mismatch("samples", n_rows, y.len()));
        }
        if n_rows == 0 {
            return Err(EnsembleError::empty_input("DecisionTreeRegressor::fit"));
        }
        self.validate()?;

        let mut rng = match self.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let limits = GrowthLimits {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
        };

        self.tree = Some(helpers::build_tree(
            x,
            y.as_slice(),
            (0..n_rows).collect(),
            0,
            self.splitter,
            &limits,
            &mut rng,
        ));
        self.n_features = n_cols;
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vector<f32>> {
        let tree = self
            .tree
            .as_ref()
            .ok_or_else(|| EnsembleError::not_fitted("DecisionTreeRegressor"))?;
        if x.n_cols() != self.n_features {
            return Err(EnsembleError::dimension_mismatch(
                "features",
                self.n_features,
                x.n_cols(),
            ));
        }

        Ok((0..x.n_rows())
            .map(|row| tree.predict_one(x.row_slice(row)))
            .collect())
    }

    /// Impurity decreases normalised to sum to 1.
    fn feature_importances(&self) -> Option<Vec<f32>> {
        let raw = self.raw_importances()?;
        Some(normalize(&raw))
    }
}

/// Scales non-negative values to sum to 1 (all zeros stay zero).
pub(crate) fn normalize(values: &[f64]) -> Vec<f32> {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        values.iter().map(|&v| (v / total) as f32).collect()
    } else {
        vec![0.0; values.len()]
    }
}
