//! Model selection utilities for train/test splitting and K-fold
//! cross-validation.
//!
//! Both splitters are deterministic under a seed: the ensemble evaluator
//! relies on recomputing the identical fold partition on every call so that
//! RMSE values for different weight vectors are comparable.

use crate::error::{EnsembleError, Result};
use crate::primitives::{Matrix, Vector};
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Train/validation index pair for one fold.
pub type FoldIndices = (Vec<usize>, Vec<usize>);

/// K-Fold cross-validator.
///
/// Splits data into K consecutive folds (after an optional seeded shuffle).
/// Each fold is used once as validation set while the remaining K-1 folds
/// form the training set. The first `n % k` folds receive one extra sample.
///
/// # Example
///
/// ```rust
/// use alloy_ensemble::model_selection::KFold;
///
/// let kfold = KFold::new(5).with_random_state(42);
///
/// for (train_idx, valid_idx) in kfold.split(10).expect("10 samples, 5 folds") {
///     assert_eq!(train_idx.len() + valid_idx.len(), 10);
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KFold {
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
}

impl KFold {
    /// Create a new K-Fold cross-validator.
    ///
    /// # Arguments
    ///
    /// * `n_splits` - Number of folds. Must be at least 2.
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: false,
            random_state: None,
        }
    }

    /// Enable shuffling before splitting into batches.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Set random state for reproducible shuffling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self.shuffle = true; // Shuffle is implied when random_state is set
        self
    }

    /// Number of folds.
    #[must_use]
    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Generate train/validation indices for each fold.
    ///
    /// # Errors
    ///
    /// Returns an error if `n_splits < 2` or `n_samples < n_splits`.
    pub fn split(&self, n_samples: usize) -> Result<Vec<FoldIndices>> {
        if self.n_splits < 2 {
            return Err(EnsembleError::invalid_hyperparameter(
                "n_splits",
                self.n_splits,
                ">= 2",
            ));
        }
        if n_samples < self.n_splits {
            return Err(EnsembleError::DimensionMismatch {
                expected: format!("at least {} samples", self.n_splits),
                actual: format!("{n_samples} samples"),
            });
        }

        let indices = if self.shuffle {
            shuffle_indices(n_samples, self.random_state)
        } else {
            (0..n_samples).collect()
        };

        let fold_size = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut result = Vec::with_capacity(self.n_splits);
        let mut start = 0;

        for i in 0..self.n_splits {
            // Distribute remainder across first folds
            let current_fold_size = if i < remainder {
                fold_size + 1
            } else {
                fold_size
            };
            let end = start + current_fold_size;

            let valid_indices: Vec<usize> = indices[start..end].to_vec();

            let mut train_indices = Vec::with_capacity(n_samples - current_fold_size);
            train_indices.extend_from_slice(&indices[..start]);
            train_indices.extend_from_slice(&indices[end..]);

            result.push((train_indices, valid_indices));
            start = end;
        }

        Ok(result)
    }
}

/// Shuffles `0..n_samples` with an optional seed.
fn shuffle_indices(n_samples: usize, random_state: Option<u64>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n_samples).collect();

    if let Some(seed) = random_state {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
    } else {
        let mut rng = rand::thread_rng();
        indices.shuffle(&mut rng);
    }

    indices
}

/// Rows of a dataset after a train/test split.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    /// Training features
    pub x_train: Matrix<f32>,
    /// Test features
    pub x_test: Matrix<f32>,
    /// Training targets
    pub y_train: Vector<f32>,
    /// Test targets
    pub y_test: Vector<f32>,
    /// Original row index of each training row
    pub train_indices: Vec<usize>,
    /// Original row index of each test row
    pub test_indices: Vec<usize>,
}

/// Validates inputs for train_test_split and returns (n_train, n_test).
fn validate_split_inputs(n_samples: usize, n_targets: usize, test_size: f32) -> Result<(usize, usize)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(EnsembleError::invalid_hyperparameter(
            "test_size",
            test_size,
            "between 0 and 1 (exclusive)",
        ));
    }

    if n_samples != n_targets {
        return Err(EnsembleError::dimension_mismatch("samples", n_samples, n_targets));
    }

    // The test share is rounded up, the train share gets the rest.
    let n_test = (n_samples as f32 * test_size).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);

    if n_test == 0 || n_train == 0 {
        return Err(EnsembleError::Other(format!(
            "Split would result in empty train or test set (n_train={n_train}, n_test={n_test})"
        )));
    }

    Ok((n_train, n_test))
}

/// Split arrays into random train and test subsets.
///
/// The permutation is drawn once from `random_state`; the first `n_train`
/// shuffled rows form the training set, in shuffled order.
///
/// # Example
///
/// ```rust
/// use alloy_ensemble::model_selection::train_test_split;
/// use alloy_ensemble::primitives::{Matrix, Vector};
///
/// let x = Matrix::from_vec(10, 2, (0..20).map(|i| i as f32).collect()).expect("10x2");
/// let y = Vector::from_slice(&[0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
///
/// let split = train_test_split(&x, &y, 0.2, Some(42)).expect("valid split");
/// assert_eq!(split.x_train.n_rows(), 8);
/// assert_eq!(split.x_test.n_rows(), 2);
/// ```
///
/// # Errors
///
/// Returns an error if `test_size` is outside (0, 1), the sample counts
/// differ, or either side of the split would be empty.
pub fn train_test_split(
    x: &Matrix<f32>,
    y: &Vector<f32>,
    test_size: f32,
    random_state: Option<u64>,
) -> Result<TrainTestSplit> {
    let n_samples = x.n_rows();
    let (n_train, _) = validate_split_inputs(n_samples, y.len(), test_size)?;

    let indices = shuffle_indices(n_samples, random_state);
    let train_indices = indices[..n_train].to_vec();
    let test_indices = indices[n_train..].to_vec();

    Ok(TrainTestSplit {
        x_train: x.select_rows(&train_indices),
        x_test: x.select_rows(&test_indices),
        y_train: y.select(&train_indices),
        y_test: y.select(&test_indices),
        train_indices,
        test_indices,
    })
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
