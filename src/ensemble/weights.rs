//! Blending weights over the five base models.

use super::BaseModel;
use crate::error::{EnsembleError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Raw weight vectors summing to less than this are rejected.
pub const MIN_WEIGHT_SUM: f64 = 1e-9;

/// Non-negative weights keyed by [`BaseModel`], normalised to sum to 1.
///
/// # Examples
///
/// ```
/// use alloy_ensemble::ensemble::{BaseModel, EnsembleWeights};
///
/// let w: EnsembleWeights = "svr=1, rf=3".parse().expect("valid weights");
/// assert_eq!(w.weight(BaseModel::RandomForest), 0.75);
/// assert_eq!(w.weight(BaseModel::Knn), 0.0);
///
/// assert!(EnsembleWeights::from_raw(&[0.0; 5]).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<BaseModel, f64>", try_from = "BTreeMap<BaseModel, f64>")]
pub struct EnsembleWeights {
    weights: [f64; 5],
}

impl EnsembleWeights {
    /// Normalises a raw vector in canonical order (SVR, RF, ET, GP, KNN).
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` unless `raw` has five entries; `DegenerateWeights`
    /// if an entry is negative or non-finite, or the sum is below
    /// [`MIN_WEIGHT_SUM`].
    pub fn from_raw(raw: &[f64]) -> Result<Self> {
        if raw.len() != BaseModel::ALL.len() {
            return Err(EnsembleError::dimension_mismatch(
                "weights",
                BaseModel::ALL.len(),
                raw.len(),
            ));
        }

        let sum: f64 = raw.iter().sum();
        if raw.iter().any(|w| !w.is_finite() || *w < 0.0) || !(sum >= MIN_WEIGHT_SUM) {
            return Err(EnsembleError::DegenerateWeights { sum });
        }

        let mut weights = [0.0; 5];
        for (w, r) in weights.iter_mut().zip(raw) {
            *w = r / sum;
        }
        Ok(Self { weights })
    }

    /// Builds weights from `(model, raw weight)` pairs; missing models get 0.
    ///
    /// # Errors
    ///
    /// As [`Self::from_raw`]; a model listed twice is an error.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (BaseModel, f64)>,
    {
        let mut raw = [0.0; 5];
        let mut seen = [false; 5];
        for (model, w) in pairs {
            if seen[model.index()] {
                return Err(EnsembleError::Other(format!("weight for {model} given twice")));
            }
            seen[model.index()] = true;
            raw[model.index()] = w;
        }
        Self::from_raw(&raw)
    }

    /// Equal weight for every model.
    #[must_use]
    pub fn uniform() -> Self {
        Self {
            weights: [0.2; 5],
        }
    }

    /// All weight on one model.
    #[must_use]
    pub fn one_hot(model: BaseModel) -> Self {
        let mut weights = [0.0; 5];
        weights[model.index()] = 1.0;
        Self { weights }
    }

    /// Normalised weight of `model`.
    #[must_use]
    pub fn weight(&self, model: BaseModel) -> f64 {
        self.weights[model.index()]
    }

    /// Weights in canonical order.
    #[must_use]
    pub fn as_array(&self) -> [f64; 5] {
        self.weights
    }

    /// `(model, weight)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (BaseModel, f64)> + '_ {
        BaseModel::ALL.into_iter().map(move |m| (m, self.weight(m)))
    }

    /// Models with a strictly positive weight.
    pub fn active_models(&self) -> impl Iterator<Item = BaseModel> + '_ {
        self.iter().filter(|(_, w)| *w > 0.0).map(|(m, _)| m)
    }
}

impl From<EnsembleWeights> for BTreeMap<BaseModel, f64> {
    fn from(weights: EnsembleWeights) -> Self {
        weights.iter().collect()
    }
}

impl TryFrom<BTreeMap<BaseModel, f64>> for EnsembleWeights {
    type Error = EnsembleError;

    fn try_from(map: BTreeMap<BaseModel, f64>) -> Result<Self> {
        Self::from_pairs(map)
    }
}

impl fmt::Display for EnsembleWeights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (model, w)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={w:.4}", model.name())?;
        }
        Ok(())
    }
}

impl FromStr for EnsembleWeights {
    type Err = EnsembleError;

    /// Parses `name=value` pairs separated by commas, e.g. `svr=0.2,rf=0.8`.
    fn from_str(s: &str) -> Result<Self> {
        let mut pairs = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = part.split_once('=').ok_or_else(|| {
                EnsembleError::Other(format!("expected name=value, got '{part}'"))
            })?;
            let model: BaseModel = name.parse()?;
            let value: f64 = value.trim().parse().map_err(|_| {
                EnsembleError::Other(format!("invalid weight '{}' for {model}", value.trim()))
            })?;
            pairs.push((model, value));
        }
        Self::from_pairs(pairs)
    }
}
