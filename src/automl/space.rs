//! Box-bounded search spaces.

use crate::error::{EnsembleError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One real-valued dimension `[low, high]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    /// Parameter name
    pub name: String,
    /// Lower bound (inclusive)
    pub low: f64,
    /// Upper bound (inclusive)
    pub high: f64,
}

impl Dimension {
    fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// Product of real intervals.
///
/// # Example
///
/// ```
/// use alloy_ensemble::automl::SearchSpace;
///
/// let space = SearchSpace::new()
///     .add_real("svr_weight", 0.0, 1.0)
///     .add_real("rf_weight", 0.0, 1.0);
/// assert_eq!(space.len(), 2);
/// assert!(space.contains(&[0.5, 1.0]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    dimensions: Vec<Dimension>,
}

impl SearchSpace {
    /// Empty search space.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a real dimension.
    #[must_use]
    pub fn add_real(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.dimensions.push(Dimension {
            name: name.into(),
            low,
            high,
        });
        self
    }

    /// Number of dimensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    /// True if the space has no dimensions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Dimensions in insertion order.
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Dimension names in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.dimensions.iter().map(|d| d.name.clone()).collect()
    }

    /// Checks that the space is non-empty with finite, ordered bounds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` naming the offending dimension.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(EnsembleError::empty_input("search space"));
        }
        for d in &self.dimensions {
            if !(d.low.is_finite() && d.high.is_finite() && d.low < d.high) {
                return Err(EnsembleError::invalid_hyperparameter(
                    &d.name,
                    format!("[{}, {}]", d.low, d.high),
                    "finite bounds with low < high",
                ));
            }
        }
        Ok(())
    }

    /// True if `point` lies inside the box.
    #[must_use]
    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.len()
            && self
                .dimensions
                .iter()
                .zip(point)
                .all(|(d, &v)| v >= d.low && v <= d.high)
    }

    /// Uniform sample from the box.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        self.from_unit(&self.sample_unit(rng))
    }

    /// Uniform sample from the unit cube of matching dimension.
    pub fn sample_unit<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        (0..self.len()).map(|_| rng.gen::<f64>()).collect()
    }

    /// Maps a point of the box onto the unit cube.
    #[must_use]
    pub fn to_unit(&self, point: &[f64]) -> Vec<f64> {
        self.dimensions
            .iter()
            .zip(point)
            .map(|(d, &v)| (v - d.low) / d.width())
            .collect()
    }

    /// Maps a unit-cube point back onto the box, clamped to the bounds.
    #[must_use]
    pub fn from_unit(&self, unit: &[f64]) -> Vec<f64> {
        self.dimensions
            .iter()
            .zip(unit)
            .map(|(d, &u)| (d.low + u * d.width()).clamp(d.low, d.high))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn space() -> SearchSpace {
        SearchSpace::new().add_real("a", 0.0, 1.0).add_real("b", -2.0, 2.0)
    }

    #[test]
    fn test_samples_within_bounds() {
        let space = space();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            assert!(space.contains(&space.sample(&mut rng)));
        }
    }

    #[test]
    fn test_unit_mapping() {
        let space = space();
        assert_eq!(space.to_unit(&[0.25, 0.0]), vec![0.25, 0.5]);
        assert_eq!(space.from_unit(&[0.25, 0.5]), vec![0.25, 0.0]);
        assert_eq!(space.from_unit(&[1.5, -0.5]), vec![1.0, -2.0]);
    }

    #[test]
    fn test_validate() {
        assert!(space().validate().is_ok());
        assert!(SearchSpace::new().validate().is_err());
        assert!(SearchSpace::new().add_real("x", 1.0, 1.0).validate().is_err());
    }

    #[test]
    fn test_names_in_order() {
        assert_eq!(space().names(), vec!["a".to_string(), "b".to_string()]);
    }
}
