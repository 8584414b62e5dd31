//! Bagged tree ensembles: random forest and extra-trees.
//!
//! Tree `i` owns the stream seeded with `random_state + i`: it first draws
//! the bootstrap rows, then the seed of the tree's splitter. Fitting order
//! does not affect the result. With the `parallel` feature the trees are
//! fitted on the rayon pool.

use super::helpers::bootstrap_sample;
use super::{normalize, DecisionTreeRegressor, Splitter};
use crate::error::{EnsembleError, Result};
use crate::primitives::{Matrix, Vector};
use crate::traits::Regressor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Hyperparameters shared by both forest flavours.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ForestParams {
    n_estimators: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    bootstrap: bool,
    random_state: Option<u64>,
}

impl ForestParams {
    fn new(n_estimators: usize, bootstrap: bool) -> Self {
        Self {
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap,
            random_state: None,
        }
    }

    /// Bootstrap rows (when enabled) and splitter seed of tree `index`.
    fn tree_draws(&self, index: usize, n_rows: usize) -> (Option<Vec<usize>>, u64) {
        let mut rng = match self.random_state {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_entropy(),
        };
        let rows = self.bootstrap.then(|| bootstrap_sample(n_rows, &mut rng));
        (rows, rng.gen())
    }

    fn fit_one(
        &self,
        index: usize,
        splitter: Splitter,
        x: &Matrix<f32>,
        y: &Vector<f32>,
    ) -> Result<DecisionTreeRegressor> {
        let (rows, splitter_seed) = self.tree_draws(index, x.n_rows());

        let mut tree = DecisionTreeRegressor::new()
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_splitter(splitter)
            .with_random_state(splitter_seed);
        if let Some(depth) = self.max_depth {
            tree = tree.with_max_depth(depth);
        }

        match rows {
            Some(indices) => tree.fit(&x.select_rows(&indices), &y.select(&indices))?,
            None => tree.fit(x, y)?,
        }
        Ok(tree)
    }

    fn fit_trees(
        &self,
        splitter: Splitter,
        x: &Matrix<f32>,
        y: &Vector<f32>,
    ) -> Result<Vec<DecisionTreeRegressor>> {
        if self.n_estimators == 0 {
            return Err(EnsembleError::invalid_hyperparameter(
                "n_estimators",
                self.n_estimators,
                ">= 1",
            ));
        }
        if x.n_rows() != y.len() {
            return Err(EnsembleError::dimension_mismatch("samples", x.n_rows(), y.len()));
        }
        if x.n_rows() == 0 {
            return Err(EnsembleError::empty_input("forest fit"));
        }

        #[cfg(feature = "parallel")]
        let trees = (0..self.n_estimators)
            .into_par_iter()
            .map(|i| self.fit_one(i, splitter, x, y))
            .collect::<Result<Vec<_>>>()?;

        #[cfg(not(feature = "parallel"))]
        let trees = (0..self.n_estimators)
            .map(|i| self.fit_one(i, splitter, x, y))
            .collect::<Result<Vec<_>>>()?;

        Ok(trees)
    }
}

fn predict_mean(trees: &[DecisionTreeRegressor], x: &Matrix<f32>, model: &str) -> Result<Vector<f32>> {
    if trees.is_empty() {
        return Err(EnsembleError::not_fitted(model));
    }

    let mut sums = vec![0.0_f64; x.n_rows()];
    for tree in trees {
        let predictions = tree.predict(x)?;
        for (sum, &p) in sums.iter_mut().zip(predictions.iter()) {
            *sum += f64::from(p);
        }
    }

    let n_trees = trees.len() as f64;
    Ok(sums.into_iter().map(|s| (s / n_trees) as f32).collect())
}

/// Per-tree normalised importances averaged over trees, then renormalised.
/// Trees that never split are left out.
fn mean_importances(trees: &[DecisionTreeRegressor]) -> Option<Vec<f32>> {
    let first = trees.first()?.raw_importances()?;
    let mut total = vec![0.0_f64; first.len()];
    let mut n_used = 0usize;

    for tree in trees {
        let raw = tree.raw_importances()?;
        if raw.iter().all(|&v| v == 0.0) {
            continue;
        }
        for (t, v) in total.iter_mut().zip(normalize(&raw)) {
            *t += f64::from(v);
        }
        n_used += 1;
    }

    if n_used > 0 {
        for t in &mut total {
            *t /= n_used as f64;
        }
    }
    Some(normalize(&total))
}

macro_rules! forest_builders {
    () => {
        /// Sets the maximum depth for each tree.
        #[must_use]
        pub fn with_max_depth(mut self, max_depth: usize) -> Self {
            self.params.max_depth = Some(max_depth);
            self
        }

        /// Sets the minimum number of samples required to split a node.
        #[must_use]
        pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
            self.params.min_samples_split = min_samples;
            self
        }

        /// Sets the minimum number of samples in each leaf.
        #[must_use]
        pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
            self.params.min_samples_leaf = min_samples;
            self
        }

        /// Enables or disables bootstrap sampling.
        #[must_use]
        pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
            self.params.bootstrap = bootstrap;
            self
        }

        /// Sets the random state for reproducibility.
        #[must_use]
        pub fn with_random_state(mut self, random_state: u64) -> Self {
            self.params.random_state = Some(random_state);
            self
        }

        /// Number of trees.
        #[must_use]
        pub fn n_estimators(&self) -> usize {
            self.params.n_estimators
        }

        /// Fitted trees.
        #[must_use]
        pub fn trees(&self) -> &[DecisionTreeRegressor] {
            &self.trees
        }
    };
}

/// Random Forest regressor.
///
/// Averages best-split CART trees, each grown on a bootstrap sample.
///
/// # Examples
///
/// ```
/// use alloy_ensemble::prelude::*;
/// use alloy_ensemble::tree::RandomForestRegressor;
///
/// let x = Matrix::from_vec(5, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0]).expect("Matrix creation should succeed in tests");
/// let y = Vector::from_slice(&[2.0, 4.0, 6.0, 8.0, 10.0]);
///
/// let mut rf = RandomForestRegressor::new(10).with_max_depth(5).with_random_state(42);
/// rf.fit(&x, &y).expect("fit should succeed");
/// let predictions = rf.predict(&x).expect("fitted");
/// assert_eq!(predictions.len(), 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTreeRegressor>,
    params: ForestParams,
}

impl RandomForestRegressor {
    /// Creates a new Random Forest regressor with bootstrap enabled.
    ///
    /// # Arguments
    ///
    /// * `n_estimators` - Number of trees in the forest
    #[must_use]
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            params: ForestParams::new(n_estimators, true),
        }
    }

    forest_builders!();
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        self.trees = self.params.fit_trees(Splitter::Best, x, y)?;
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vector<f32>> {
        predict_mean(&self.trees, x, "RandomForestRegressor")
    }

    fn feature_importances(&self) -> Option<Vec<f32>> {
        mean_importances(&self.trees)
    }
}

/// Extremely randomised trees regressor.
///
/// Each node draws one random threshold per feature and keeps the feature
/// with the largest variance reduction. Bootstrap is off by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraTreesRegressor {
    trees: Vec<DecisionTreeRegressor>,
    params: ForestParams,
}

impl ExtraTreesRegressor {
    /// Creates a new extra-trees regressor with `n_estimators` trees.
    #[must_use]
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            params: ForestParams::new(n_estimators, false),
        }
    }

    forest_builders!();
}

impl Default for ExtraTreesRegressor {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Regressor for ExtraTreesRegressor {
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        self.trees = self.params.fit_trees(Splitter::Random, x, y)?;
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vector<f32>> {
        predict_mean(&self.trees, x, "ExtraTreesRegressor")
    }

    fn feature_importances(&self) -> Option<Vec<f32>> {
        mean_importances(&self.trees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(bootstrap: bool) -> ForestParams {
        ForestParams {
            random_state: Some(42),
            ..ForestParams::new(3, bootstrap)
        }
    }

    #[test]
    fn test_bootstrap_rows_come_from_tree_seed() {
        let (rows, _) = seeded(true).tree_draws(1, 20);
        let expected = bootstrap_sample(20, &mut StdRng::seed_from_u64(43));
        assert_eq!(rows, Some(expected));
    }

    #[test]
    fn test_splitter_seed_continues_after_bootstrap() {
        let (_, splitter_seed) = seeded(true).tree_draws(0, 20);
        assert_ne!(splitter_seed, 42);

        let mut stream = StdRng::seed_from_u64(42);
        let _ = bootstrap_sample(20, &mut stream);
        assert_eq!(splitter_seed, stream.gen::<u64>());
    }

    #[test]
    fn test_tree_draws_are_reproducible_and_distinct_per_tree() {
        let params = seeded(false);
        let (rows, a) = params.tree_draws(0, 20);
        assert!(rows.is_none());
        assert_eq!(params.tree_draws(0, 20).1, a);
        assert_ne!(params.tree_draws(1, 20).1, a);
    }
}
