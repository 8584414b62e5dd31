//! Tests for preprocessing module.

use super::*;

fn composition_data() -> Matrix<f32> {
    Matrix::from_vec(
        5,
        2,
        vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0, 5.0, 50.0],
    )
    .expect("valid matrix dimensions")
}

#[test]
fn test_new() {
    let scaler = StandardScaler::new();
    assert!(!scaler.is_fitted());
    assert!(scaler.mean().is_none());
}

#[test]
fn test_default() {
    let scaler = StandardScaler::default();
    assert!(!scaler.is_fitted());
}

#[test]
fn test_fit_basic() {
    let data = Matrix::from_vec(3, 2, vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0])
        .expect("valid matrix dimensions");

    let mut scaler = StandardScaler::new();
    scaler
        .fit(&data)
        .expect("fit should succeed with valid data");

    assert!(scaler.is_fitted());

    // Mean should be [2.0, 20.0]
    let mean = scaler.mean().expect("fitted");
    assert!((mean[0] - 2.0).abs() < 1e-6);
    assert!((mean[1] - 20.0).abs() < 1e-6);

    // Std should be sqrt(2/3) ≈ 0.8165
    let std = scaler.std().expect("fitted");
    let expected_std = (2.0_f32 / 3.0).sqrt();
    assert!((std[0] - expected_std).abs() < 1e-4);
    assert!((std[1] - expected_std * 10.0).abs() < 1e-3);
}

#[test]
fn test_zero_mean_unit_variance() {
    let mut scaler = StandardScaler::new();
    let transformed = scaler
        .fit_transform(&composition_data())
        .expect("fit_transform should succeed");

    let (n, p) = transformed.shape();
    for j in 0..p {
        let mean: f32 = (0..n).map(|i| transformed.get(i, j)).sum::<f32>() / n as f32;
        let var: f32 = (0..n)
            .map(|i| (transformed.get(i, j) - mean).powi(2))
            .sum::<f32>()
            / n as f32;
        assert!(mean.abs() < 1e-5, "column {j} mean={mean}");
        assert!((var - 1.0).abs() < 1e-4, "column {j} var={var}");
    }
}

#[test]
fn test_constant_column_is_centered_not_scaled() {
    let data = Matrix::from_vec(3, 2, vec![5.0, 1.0, 5.0, 2.0, 5.0, 3.0])
        .expect("valid matrix dimensions");
    let mut scaler = StandardScaler::new();
    let transformed = scaler.fit_transform(&data).expect("fit_transform");
    for i in 0..3 {
        assert_eq!(transformed.get(i, 0), 0.0);
        assert!(transformed.get(i, 0).is_finite());
    }
}

#[test]
fn test_transform_uses_training_statistics() {
    let mut scaler = StandardScaler::new();
    scaler.fit(&composition_data()).expect("fit");

    // Unseen row: mean of column 0 is 3, std is sqrt(2)
    let unseen = Matrix::from_vec(1, 2, vec![3.0, 30.0]).expect("valid");
    let transformed = scaler.transform(&unseen).expect("transform");
    assert!(transformed.get(0, 0).abs() < 1e-6);
    assert!(transformed.get(0, 1).abs() < 1e-6);
}

#[test]
fn test_inverse_transform_roundtrip() {
    let data = composition_data();
    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(&data).expect("fit_transform");
    let restored = scaler.inverse_transform(&scaled).expect("inverse");
    for (a, b) in data.as_slice().iter().zip(restored.as_slice()) {
        assert!((a - b).abs() < 1e-4);
    }
}

#[test]
fn test_without_mean() {
    let mut scaler = StandardScaler::new().with_mean(false);
    let scaled = scaler.fit_transform(&composition_data()).expect("fit_transform");
    // Positive data stays positive when not centered
    assert!(scaled.as_slice().iter().all(|&v| v > 0.0));
}

#[test]
fn test_without_std() {
    let mut scaler = StandardScaler::new().with_std(false);
    let scaled = scaler.fit_transform(&composition_data()).expect("fit_transform");
    assert!((scaled.get(0, 1) - (-20.0)).abs() < 1e-5);
}

#[test]
fn test_transform_before_fit_errors() {
    let scaler = StandardScaler::new();
    let err = scaler
        .transform(&composition_data())
        .expect_err("unfitted scaler must fail");
    assert!(matches!(err, EnsembleError::NotFitted { .. }));
}

#[test]
fn test_transform_feature_mismatch() {
    let mut scaler = StandardScaler::new();
    scaler.fit(&composition_data()).expect("fit");
    let wrong = Matrix::from_vec(1, 3, vec![1.0, 2.0, 3.0]).expect("valid");
    assert!(matches!(
        scaler.transform(&wrong),
        Err(EnsembleError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_fit_empty_errors() {
    let empty = Matrix::from_vec(0, 2, Vec::new()).expect("valid empty matrix");
    let mut scaler = StandardScaler::new();
    assert!(matches!(
        scaler.fit(&empty),
        Err(EnsembleError::EmptyInput { .. })
    ));
}
