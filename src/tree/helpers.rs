//! Split search and recursive tree construction.
//!
//! The builder works on row indices into the training matrix; rows are never
//! copied while growing a tree.

use super::{RegressionLeaf, RegressionNode, RegressionTreeNode, Splitter};
use crate::primitives::Matrix;
use rand::rngs::StdRng;
use rand::Rng;

/// Candidate split of one node.
#[derive(Debug, Clone, Copy)]
pub(super) struct SplitCandidate {
    pub feature_idx: usize,
    pub threshold: f32,
    /// Sum of squared errors of both children.
    pub children_sse: f64,
}

/// Stopping rules shared by the builder.
#[derive(Debug, Clone, Copy)]
pub(super) struct GrowthLimits {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

/// Mean and sum of squared deviations of `y` over `indices`.
pub(super) fn node_stats(y: &[f32], indices: &[usize]) -> (f64, f64) {
    let n = indices.len() as f64;
    let sum: f64 = indices.iter().map(|&i| f64::from(y[i])).sum();
    let mean = sum / n;
    let sse: f64 = indices
        .iter()
        .map(|&i| (f64::from(y[i]) - mean).powi(2))
        .sum();
    (mean, sse)
}

fn sse_from_sums(sum: f64, sum_sq: f64, n: f64) -> f64 {
    (sum_sq - sum * sum / n).max(0.0)
}

/// Exhaustive search over midpoints between consecutive distinct values.
pub(super) fn best_split_for_feature(
    x: &Matrix<f32>,
    y: &[f32],
    indices: &[usize],
    feature_idx: usize,
    min_samples_leaf: usize,
) -> Option<SplitCandidate> {
    let n = indices.len();
    let mut sorted: Vec<usize> = indices.to_vec();
    sorted.sort_by(|&a, &b| x.get(a, feature_idx).total_cmp(&x.get(b, feature_idx)));

    let total_sum: f64 = sorted.iter().map(|&i| f64::from(y[i])).sum();
    let total_sq: f64 = sorted.iter().map(|&i| f64::from(y[i]).powi(2)).sum();

    let mut left_sum = 0.0;
    let mut left_sq = 0.0;
    let mut best: Option<SplitCandidate> = None;

    for pos in 1..n {
        let yi = f64::from(y[sorted[pos - 1]]);
        left_sum += yi;
        left_sq += yi * yi;

        if pos < min_samples_leaf || n - pos < min_samples_leaf {
            continue;
        }
        let lo = x.get(sorted[pos - 1], feature_idx);
        let hi = x.get(sorted[pos], feature_idx);
        if lo >= hi {
            continue;
        }

        let n_left = pos as f64;
        let n_right = (n - pos) as f64;
        let children_sse = sse_from_sums(left_sum, left_sq, n_left)
            + sse_from_sums(total_sum - left_sum, total_sq - left_sq, n_right);

        if best.map_or(true, |b| children_sse < b.children_sse) {
            let mut threshold = lo + (hi - lo) / 2.0;
            // Midpoint can round up to `hi` for adjacent floats
            if threshold >= hi {
                threshold = lo;
            }
            best = Some(SplitCandidate {
                feature_idx,
                threshold,
                children_sse,
            });
        }
    }

    best
}

/// One uniformly drawn threshold between the node's min and max value.
pub(super) fn random_split_for_feature(
    x: &Matrix<f32>,
    y: &[f32],
    indices: &[usize],
    feature_idx: usize,
    min_samples_leaf: usize,
    rng: &mut StdRng,
) -> Option<SplitCandidate> {
    let (min, max) = indices.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &i| {
        let v = x.get(i, feature_idx);
        (lo.min(v), hi.max(v))
    });
    if !(max > min) {
        return None;
    }

    let threshold: f32 = rng.gen_range(min..max);

    let (mut n_l, mut sum_l, mut sq_l) = (0usize, 0.0_f64, 0.0_f64);
    let (mut n_r, mut sum_r, mut sq_r) = (0usize, 0.0_f64, 0.0_f64);
    for &i in indices {
        let yi = f64::from(y[i]);
        if x.get(i, feature_idx) <= threshold {
            n_l += 1;
            sum_l += yi;
            sq_l += yi * yi;
        } else {
            n_r += 1;
            sum_r += yi;
            sq_r += yi * yi;
        }
    }
    if n_l < min_samples_leaf.max(1) || n_r < min_samples_leaf.max(1) {
        return None;
    }

    Some(SplitCandidate {
        feature_idx,
        threshold,
        children_sse: sse_from_sums(sum_l, sq_l, n_l as f64)
            + sse_from_sums(sum_r, sq_r, n_r as f64),
    })
}

/// Best split across all features, or `None` when no valid split exists.
pub(super) fn find_split(
    x: &Matrix<f32>,
    y: &[f32],
    indices: &[usize],
    splitter: Splitter,
    min_samples_leaf: usize,
    rng: &mut StdRng,
) -> Option<SplitCandidate> {
    let mut best: Option<SplitCandidate> = None;
    for feature_idx in 0..x.n_cols() {
        let candidate = match splitter {
            Splitter::Best => best_split_for_feature(x, y, indices, feature_idx, min_samples_leaf),
            Splitter::Random => {
                random_split_for_feature(x, y, indices, feature_idx, min_samples_leaf, rng)
            }
        };
        if let Some(c) = candidate {
            if best.map_or(true, |b| c.children_sse < b.children_sse) {
                best = Some(c);
            }
        }
    }
    best
}

fn should_stop(n_samples: usize, depth: usize, sse: f64, limits: &GrowthLimits) -> bool {
    limits.max_depth.is_some_and(|d| depth >= d)
        || n_samples < limits.min_samples_split
        || n_samples < 2 * limits.min_samples_leaf
        || sse <= 1e-12
}

/// Grows a regression tree over `indices`.
pub(super) fn build_tree(
    x: &Matrix<f32>,
    y: &[f32],
    indices: Vec<usize>,
    depth: usize,
    splitter: Splitter,
    limits: &GrowthLimits,
    rng: &mut StdRng,
) -> RegressionTreeNode {
    let n_samples = indices.len();
    let (mean, sse) = node_stats(y, &indices);
    let leaf = || {
        RegressionTreeNode::Leaf(RegressionLeaf {
            value: mean as f32,
            n_samples,
        })
    };

    if should_stop(n_samples, depth, sse, limits) {
        return leaf();
    }

    let Some(split) = find_split(x, y, &indices, splitter, limits.min_samples_leaf, rng) else {
        return leaf();
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .into_iter()
        .partition(|&i| x.get(i, split.feature_idx) <= split.threshold);

    let left = build_tree(x, y, left_idx, depth + 1, splitter, limits, rng);
    let right = build_tree(x, y, right_idx, depth + 1, splitter, limits, rng);

    RegressionTreeNode::Node(RegressionNode {
        feature_idx: split.feature_idx,
        threshold: split.threshold,
        impurity_decrease: (sse - split.children_sse).max(0.0),
        n_samples,
        left: Box::new(left),
        right: Box::new(right),
    })
}

/// Adds each node's impurity decrease to its feature's slot.
pub(super) fn accumulate_importances(node: &RegressionTreeNode, importances: &mut [f64]) {
    if let RegressionTreeNode::Node(n) = node {
        importances[n.feature_idx] += n.impurity_decrease;
        accumulate_importances(&n.left, importances);
        accumulate_importances(&n.right, importances);
    }
}

/// Draws `n_samples` indices with replacement.
pub(super) fn bootstrap_sample(n_samples: usize, rng: &mut StdRng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}
