//! Nearest-neighbour regression.

use crate::error::{EnsembleError, Result};
use crate::primitives::{Matrix, Vector};
use crate::traits::Regressor;
use serde::{Deserialize, Serialize};

/// Distance metric for K-Nearest Neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Euclidean distance: `sqrt(sum((x_i` - `y_i)^2`))
    Euclidean,
    /// Manhattan distance: `sum(|x_i` - `y_i`|)
    Manhattan,
    /// Minkowski distance with parameter p
    Minkowski(f32),
}

impl DistanceMetric {
    /// Metric matching a Minkowski exponent (`p = 1` Manhattan, `p = 2` Euclidean).
    #[must_use]
    pub fn from_p(p: f32) -> Self {
        if p == 1.0 {
            Self::Manhattan
        } else if p == 2.0 {
            Self::Euclidean
        } else {
            Self::Minkowski(p)
        }
    }

    fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        let pairs = a.iter().zip(b.iter());
        match self {
            Self::Euclidean => pairs.map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt(),
            Self::Manhattan => pairs.map(|(x, y)| (x - y).abs()).sum(),
            Self::Minkowski(p) => pairs
                .map(|(x, y)| (x - y).abs().powf(p))
                .sum::<f32>()
                .powf(1.0 / p),
        }
    }
}

/// How the k neighbours are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NeighborWeights {
    /// Plain average of the neighbours' targets.
    #[default]
    Uniform,
    /// Inverse-distance weighted average; exact matches take all the weight.
    Distance,
}

/// K-Nearest Neighbors regressor.
///
/// Predicts the (optionally distance-weighted) mean target of the `k`
/// closest training rows. Ties in distance are broken by training row order.
///
/// # Example
///
/// ```
/// use alloy_ensemble::prelude::*;
/// use alloy_ensemble::neighbors::{DistanceMetric, KNeighborsRegressor};
///
/// let x = Matrix::from_vec(4, 1, vec![0.0, 1.0, 10.0, 11.0]).expect("4x1 matrix");
/// let y = Vector::from_slice(&[1.0, 3.0, 10.0, 12.0]);
///
/// let mut knn = KNeighborsRegressor::new(2).with_metric(DistanceMetric::Manhattan);
/// knn.fit(&x, &y).expect("Valid training data with 4 samples");
///
/// let test = Matrix::from_vec(1, 1, vec![0.4]).expect("1x1 test matrix");
/// let predictions = knn.predict(&test).expect("Predict should succeed");
/// assert!((predictions[0] - 2.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNeighborsRegressor {
    /// Number of neighbors to use
    k: usize,
    /// Distance metric
    metric: DistanceMetric,
    /// Neighbour weighting
    weights: NeighborWeights,
    /// Training feature matrix (stored during fit)
    x_train: Option<Matrix<f32>>,
    /// Training targets (stored during fit)
    y_train: Option<Vector<f32>>,
}

impl KNeighborsRegressor {
    /// Creates a new regressor with `k` neighbours and Euclidean distance.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k,
            metric: DistanceMetric::Euclidean,
            weights: NeighborWeights::Uniform,
            x_train: None,
            y_train: None,
        }
    }

    /// Sets the distance metric.
    #[must_use]
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Sets the neighbour weighting.
    #[must_use]
    pub fn with_weights(mut self, weights: NeighborWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Number of neighbours.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    fn combine(&self, neighbors: &[(f32, usize)], y_train: &Vector<f32>) -> f32 {
        match self.weights {
            NeighborWeights::Uniform => {
                let sum: f64 = neighbors.iter().map(|&(_, j)| f64::from(y_train[j])).sum();
                (sum / neighbors.len() as f64) as f32
            }
            NeighborWeights::Distance => {
                let exact: Vec<usize> = neighbors
                    .iter()
                    .filter(|(d, _)| *d == 0.0)
                    .map(|&(_, j)| j)
                    .collect();
                if !exact.is_empty() {
                    let sum: f64 = exact.iter().map(|&j| f64::from(y_train[j])).sum();
                    return (sum / exact.len() as f64) as f32;
                }
                let (num, den) = neighbors.iter().fold((0.0_f64, 0.0_f64), |(n, d), &(dist, j)| {
                    let w = 1.0 / f64::from(dist);
                    (n + w * f64::from(y_train[j]), d + w)
                });
                (num / den) as f32
            }
        }
    }
}

impl Regressor for KNeighborsRegressor {
    /// Stores the training data; kNN defers all work to prediction time.
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        let n_samples = x.n_rows();
        if n_samples != y.len() {
            return Err(EnsembleError::dimension_mismatch("samples", n_samples, y.len()));
        }
        if n_samples == 0 {
            return Err(EnsembleError::empty_input("KNeighborsRegressor::fit"));
        }
        if self.k == 0 || self.k > n_samples {
            return Err(EnsembleError::invalid_hyperparameter(
                "k",
                self.k,
                &format!("between 1 and n_samples ({n_samples})"),
            ));
        }
        if let DistanceMetric::Minkowski(p) = self.metric {
            if !(p >= 1.0) {
                return Err(EnsembleError::invalid_hyperparameter("p", p, ">= 1"));
            }
        }

        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vector<f32>> {
        let (Some(x_train), Some(y_train)) = (&self.x_train, &self.y_train) else {
            return Err(EnsembleError::not_fitted("KNeighborsRegressor"));
        };
        if x.n_cols() != x_train.n_cols() {
            return Err(EnsembleError::dimension_mismatch(
                "features",
                x_train.n_cols(),
                x.n_cols(),
            ));
        }

        let mut predictions = Vec::with_capacity(x.n_rows());
        for i in 0..x.n_rows() {
            let query = x.row_slice(i);
            let mut distances: Vec<(f32, usize)> = (0..x_train.n_rows())
                .map(|j| (self.metric.distance(query, x_train.row_slice(j)), j))
                .collect();

            // Stable sort keeps training order among equal distances
            distances.sort_by(|a, b| a.0.total_cmp(&b.0));
            predictions.push(self.combine(&distances[..self.k], y_train));
        }

        Ok(Vector::from_vec(predictions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> (Matrix<f32>, Vector<f32>) {
        let x = Matrix::from_vec(5, 1, vec![0.0, 1.0, 2.0, 3.0, 4.0]).expect("valid");
        let y = Vector::from_slice(&[0.0, 10.0, 20.0, 30.0, 40.0]);
        (x, y)
    }

    #[test]
    fn test_k1_reproduces_training_targets() {
        let (x, y) = line();
        let mut knn = KNeighborsRegressor::new(1);
        knn.fit(&x, &y).expect("fit");
        assert_eq!(knn.predict(&x).expect("predict").as_slice(), y.as_slice());
    }

    #[test]
    fn test_uniform_average_of_three() {
        let (x, y) = line();
        let mut knn = KNeighborsRegressor::new(3).with_metric(DistanceMetric::Manhattan);
        knn.fit(&x, &y).expect("fit");
        let query = Matrix::from_vec(1, 1, vec![2.1]).expect("valid");
        // Neighbours 2, 3, 1 -> (20 + 30 + 10) / 3
        let p = knn.predict(&query).expect("predict");
        assert!((p[0] - 20.0).abs() < 1e-5);
    }

    #[test]
    fn test_ties_broken_by_training_order() {
        let (x, y) = line();
        let mut knn = KNeighborsRegressor::new(1);
        knn.fit(&x, &y).expect("fit");
        // Equidistant from rows 1 and 2, row 1 comes first
        let query = Matrix::from_vec(1, 1, vec![1.5]).expect("valid");
        assert_eq!(knn.predict(&query).expect("predict")[0], 10.0);
    }

    #[test]
    fn test_distance_weights_exact_match_dominates() {
        let (x, y) = line();
        let mut knn = KNeighborsRegressor::new(3).with_weights(NeighborWeights::Distance);
        knn.fit(&x, &y).expect("fit");
        let query = Matrix::from_vec(1, 1, vec![3.0]).expect("valid");
        assert_eq!(knn.predict(&query).expect("predict")[0], 30.0);
    }

    #[test]
    fn test_distance_weights_inverse_distance() {
        let x = Matrix::from_vec(2, 1, vec![0.0, 3.0]).expect("valid");
        let y = Vector::from_slice(&[0.0, 30.0]);
        let mut knn = KNeighborsRegressor::new(2).with_weights(NeighborWeights::Distance);
        knn.fit(&x, &y).expect("fit");
        let query = Matrix::from_vec(1, 1, vec![1.0]).expect("valid");
        // weights 1/1 and 1/2 -> (0 + 15) / 1.5
        assert!((knn.predict(&query).expect("predict")[0] - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_manhattan_vs_euclidean() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert_eq!(DistanceMetric::Manhattan.distance(&a, &b), 7.0);
        assert_eq!(DistanceMetric::Euclidean.distance(&a, &b), 5.0);
        assert_eq!(DistanceMetric::from_p(1.0), DistanceMetric::Manhattan);
        assert_eq!(DistanceMetric::from_p(2.0), DistanceMetric::Euclidean);
    }

    #[test]
    fn test_k_larger_than_samples_rejected() {
        let (x, y) = line();
        let mut knn = KNeighborsRegressor::new(6);
        assert!(matches!(
            knn.fit(&x, &y),
            Err(EnsembleError::InvalidHyperparameter { .. })
        ));
    }

    #[test]
    fn test_predict_before_fit() {
        let (x, _) = line();
        assert!(matches!(
            KNeighborsRegressor::new(1).predict(&x),
            Err(EnsembleError::NotFitted { .. })
        ));
    }
}
