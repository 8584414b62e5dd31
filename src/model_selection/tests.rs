use super::*;
use proptest::prelude::*;
use std::collections::HashSet;

fn toy_data(n: usize) -> (Matrix<f32>, Vector<f32>) {
    let x = Matrix::from_vec(n, 2, (0..n * 2).map(|i| i as f32).collect())
        .expect("Matrix creation should succeed with valid test data");
    let y = Vector::from_vec((0..n).map(|i| i as f32 * 10.0).collect());
    (x, y)
}

#[test]
fn test_train_test_split_basic() {
    let (x, y) = toy_data(10);

    let split = train_test_split(&x, &y, 0.2, Some(42)).expect("valid split");

    assert_eq!(split.x_train.shape(), (8, 2));
    assert_eq!(split.x_test.shape(), (2, 2));
    assert_eq!(split.y_train.len(), 8);
    assert_eq!(split.y_test.len(), 2);
}

#[test]
fn test_train_test_split_rows_stay_aligned() {
    let (x, y) = toy_data(20);
    let split = train_test_split(&x, &y, 0.25, Some(7)).expect("valid split");

    for (row, &orig) in split.train_indices.iter().enumerate() {
        assert_eq!(split.x_train.row_slice(row), x.row_slice(orig));
        assert_eq!(split.y_train[row], y[orig]);
    }
    for (row, &orig) in split.test_indices.iter().enumerate() {
        assert_eq!(split.x_test.row_slice(row), x.row_slice(orig));
        assert_eq!(split.y_test[row], y[orig]);
    }
}

#[test]
fn test_train_test_split_test_share_rounds_up() {
    let (x, y) = toy_data(11);
    let split = train_test_split(&x, &y, 0.2, Some(42)).expect("valid split");
    // ceil(0.2 * 11) = 3
    assert_eq!(split.x_test.n_rows(), 3);
    assert_eq!(split.x_train.n_rows(), 8);
}

#[test]
fn test_train_test_split_reproducibility() {
    let (x, y) = toy_data(30);
    let a = train_test_split(&x, &y, 0.2, Some(42)).expect("valid split");
    let b = train_test_split(&x, &y, 0.2, Some(42)).expect("valid split");
    assert_eq!(a.train_indices, b.train_indices);
    assert_eq!(a.test_indices, b.test_indices);
}

#[test]
fn test_train_test_split_different_seeds() {
    let (x, y) = toy_data(30);
    let a = train_test_split(&x, &y, 0.2, Some(1)).expect("valid split");
    let b = train_test_split(&x, &y, 0.2, Some(2)).expect("valid split");
    assert_ne!(a.train_indices, b.train_indices);
}

#[test]
fn test_train_test_split_invalid_test_size() {
    let (x, y) = toy_data(10);
    assert!(train_test_split(&x, &y, 0.0, Some(42)).is_err());
    assert!(train_test_split(&x, &y, 1.0, Some(42)).is_err());
    assert!(train_test_split(&x, &y, f32::NAN, Some(42)).is_err());
}

#[test]
fn test_train_test_split_length_mismatch() {
    let (x, _) = toy_data(10);
    let y = Vector::from_slice(&[1.0, 2.0]);
    assert!(matches!(
        train_test_split(&x, &y, 0.2, Some(42)),
        Err(EnsembleError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_kfold_basic() {
    let kfold = KFold::new(5);
    let splits = kfold.split(10).expect("valid split");

    assert_eq!(splits.len(), 5);
    for (train_idx, valid_idx) in &splits {
        assert_eq!(train_idx.len(), 8);
        assert_eq!(valid_idx.len(), 2);
    }
}

#[test]
fn test_kfold_no_shuffle() {
    let kfold = KFold::new(3);
    let splits = kfold.split(6).expect("valid split");
    assert_eq!(splits[0].1, vec![0, 1]);
    assert_eq!(splits[1].1, vec![2, 3]);
    assert_eq!(splits[2].1, vec![4, 5]);
}

#[test]
fn test_kfold_shuffle_can_be_disabled() {
    let splits = KFold::new(3)
        .with_random_state(42)
        .with_shuffle(false)
        .split(6)
        .expect("valid split");
    assert_eq!(splits[0].1, vec![0, 1]);

    let shuffled = KFold::new(3).with_shuffle(true).split(6).expect("valid split");
    let mut seen: Vec<usize> = shuffled.iter().flat_map(|(_, v)| v.clone()).collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..6).collect::<Vec<_>>());
}

#[test]
fn test_kfold_shuffle_reproducible() {
    let kfold = KFold::new(5).with_random_state(42);
    assert_eq!(
        kfold.split(23).expect("valid split"),
        kfold.split(23).expect("valid split")
    );
}

#[test]
fn test_kfold_shuffle_different_states() {
    let a = KFold::new(5).with_random_state(42).split(50).expect("valid split");
    let b = KFold::new(5).with_random_state(43).split(50).expect("valid split");
    assert_ne!(a, b);
}

#[test]
fn test_kfold_uneven_split() {
    let splits = KFold::new(3).split(10).expect("valid split");
    let sizes: Vec<usize> = splits.iter().map(|(_, v)| v.len()).collect();
    assert_eq!(sizes, vec![4, 3, 3]);
}

#[test]
fn test_kfold_rejects_single_split() {
    assert!(KFold::new(1).split(10).is_err());
}

#[test]
fn test_kfold_rejects_too_few_samples() {
    assert!(KFold::new(5).split(4).is_err());
}

#[test]
fn test_kfold_random_state_implies_shuffle() {
    let kfold = KFold::new(2).with_random_state(3);
    assert!(kfold.shuffle);
    assert_eq!(kfold.n_splits(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every sample appears in exactly one validation fold.
    #[test]
    fn prop_kfold_validation_partition(k in 2_usize..=10, n in 10_usize..=80, seed in any::<u64>()) {
        let splits = KFold::new(k).with_random_state(seed).split(n).expect("n >= k");
        prop_assert_eq!(splits.len(), k);

        let mut seen = vec![0_usize; n];
        for (train, valid) in &splits {
            let train_set: HashSet<usize> = train.iter().copied().collect();
            prop_assert_eq!(train.len() + valid.len(), n);
            for &v in valid {
                prop_assert!(!train_set.contains(&v));
                seen[v] += 1;
            }
        }
        prop_assert!(seen.iter().all(|&c| c == 1));
    }
}
