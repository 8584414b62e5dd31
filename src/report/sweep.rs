//! Predicted temperature over Ni–Ti–X ternary compositions.

use crate::ensemble::FittedEnsemble;
use crate::error::{EnsembleError, Result};
use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Third elements swept by default.
pub const DEFAULT_SWEEP_ELEMENTS: [&str; 4] = ["Zr", "Hf", "Pd", "Pt"];

/// Atomic percentages of one ternary alloy; the parts sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TernaryComposition {
    pub ni: u32,
    pub ti: u32,
    pub third: u32,
}

/// Every `(ni, ti, third)` of strictly positive integers summing to 100.
///
/// Ordered by `ti` then `ni`, both ascending.
///
/// ```
/// let grid = alloy_ensemble::report::ternary_compositions();
/// assert_eq!(grid.len(), 4851);
/// assert_eq!((grid[0].ni, grid[0].ti, grid[0].third), (1, 1, 98));
/// ```
#[must_use]
pub fn ternary_compositions() -> Vec<TernaryComposition> {
    let mut grid = Vec::with_capacity(4851);
    for ti in 1..=100_u32 {
        for ni in 1..(101 - ti) {
            let third = 100 - ni - ti;
            if third > 0 {
                grid.push(TernaryComposition { ni, ti, third });
            }
        }
    }
    grid
}

/// One row of a sweep file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub composition: TernaryComposition,
    pub predicted_temperature: f64,
}

/// Ensemble predictions over [`ternary_compositions`] for Ni, Ti and one
/// third element; all other features are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionSweep {
    element: String,
    points: Vec<SweepPoint>,
}

impl CompositionSweep {
    /// Predicts every composition of the Ni–Ti–`element` system.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if `Ni`, `Ti` or `element` is not a
    /// feature, and propagates prediction errors.
    pub fn predict(ensemble: &FittedEnsemble, feature_names: &[String], element: &str) -> Result<Self> {
        let column = |name: &str| -> Result<usize> {
            feature_names.iter().position(|f| f == name).ok_or_else(|| {
                EnsembleError::invalid_hyperparameter(
                    "sweep element",
                    name,
                    &format!("one of the feature columns {feature_names:?}"),
                )
            })
        };
        let (ni_col, ti_col, third_col) = (column("Ni")?, column("Ti")?, column(element)?);
        if third_col == ni_col || third_col == ti_col {
            return Err(EnsembleError::invalid_hyperparameter(
                "sweep element",
                element,
                "different from Ni and Ti",
            ));
        }

        let grid = ternary_compositions();
        let n_features = feature_names.len();
        let mut x = Matrix::zeros(grid.len(), n_features);
        for (i, c) in grid.iter().enumerate() {
            x.set(i, ni_col, c.ni as f32);
            x.set(i, ti_col, c.ti as f32);
            x.set(i, third_col, c.third as f32);
        }

        let predictions = ensemble.predict(&x)?;
        let points = grid
            .into_iter()
            .zip(predictions.iter())
            .map(|(composition, &p)| SweepPoint {
                composition,
                predicted_temperature: f64::from(p),
            })
            .collect();

        Ok(Self {
            element: element.to_string(),
            points,
        })
    }

    /// Third element of the system.
    #[must_use]
    pub fn element(&self) -> &str {
        &self.element
    }

    #[must_use]
    pub fn points(&self) -> &[SweepPoint] {
        &self.points
    }

    /// `Ni_Ti_<X>_combinations.csv`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("Ni_Ti_{}_combinations.csv", self.element)
    }

    /// Writes `Ni, Ti, <X>, Predicted Temperature` rows.
    ///
    /// # Errors
    ///
    /// Returns `Csv` or `Io` errors from the writer.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["Ni", "Ti", self.element.as_str(), "Predicted Temperature"])?;
        for p in &self.points {
            wtr.write_record([
                p.composition.ni.to_string(),
                p.composition.ti.to_string(),
                p.composition.third.to_string(),
                p.predicted_temperature.to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Writes [`Self::file_name`] into `dir` and returns its path.
    ///
    /// # Errors
    ///
    /// See [`Self::write_csv`].
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        self.write_csv(std::fs::File::create(&path)?)?;
        info!(path = %path.display(), rows = self.points.len(), "composition sweep saved");
        Ok(path)
    }
}
