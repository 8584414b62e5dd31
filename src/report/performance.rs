//! Train/test performance, residual σ bands and the performance table.

use crate::ensemble::EnsembleEvaluation;
use crate::error::{EnsembleError, Result};
use crate::metrics::{r_squared, residual_std, rmse};
use crate::primitives::Vector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

/// Number of points on the decision line.
pub const DECISION_LINE_POINTS: usize = 100;

/// Column headers of the performance table, in file order.
pub const PERFORMANCE_COLUMNS: [&str; 10] = [
    "Prediction Train",
    "Actual Train",
    "Prediction Test",
    "Actual Test",
    "Decision Line X",
    "Decision Line Y",
    "Upper Sigma",
    "Lower Sigma",
    "Upper 2Sigma",
    "Lower 2Sigma",
];

/// RMSE, R² and residual σ on the training (out-of-fold) and test sets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub train_rmse: f64,
    pub train_r2: f64,
    pub test_rmse: f64,
    pub test_r2: f64,
    /// Population std of the out-of-fold residuals
    pub train_sigma: f64,
    /// Population std of the test residuals
    pub test_sigma: f64,
}

impl PerformanceSummary {
    /// Scores out-of-fold predictions against `y_train` and fold-averaged
    /// test predictions against `y_test`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if a prediction vector and its targets
    /// differ in length, and `EmptyInput` if either set is empty.
    pub fn from_predictions(
        train_pred: &Vector<f32>,
        y_train: &Vector<f32>,
        test_pred: &Vector<f32>,
        y_test: &Vector<f32>,
    ) -> Result<Self> {
        check_pair("train predictions", train_pred, y_train)?;
        check_pair("test predictions", test_pred, y_test)?;
        Ok(Self {
            train_rmse: f64::from(rmse(train_pred, y_train)),
            train_r2: f64::from(r_squared(train_pred, y_train)),
            test_rmse: f64::from(rmse(test_pred, y_test)),
            test_r2: f64::from(r_squared(test_pred, y_test)),
            train_sigma: f64::from(residual_std(train_pred, y_train)),
            test_sigma: f64::from(residual_std(test_pred, y_test)),
        })
    }

    /// Convenience wrapper over [`Self::from_predictions`].
    ///
    /// # Errors
    ///
    /// See [`Self::from_predictions`].
    pub fn from_evaluation(
        evaluation: &EnsembleEvaluation,
        y_train: &Vector<f32>,
        y_test: &Vector<f32>,
    ) -> Result<Self> {
        Self::from_predictions(
            &evaluation.oof_predictions,
            y_train,
            &evaluation.test_predictions,
            y_test,
        )
    }

    /// `(train_sigma + test_sigma) / 2`.
    #[must_use]
    pub fn mean_sigma(&self) -> f64 {
        (self.train_sigma + self.test_sigma) / 2.0
    }
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Training Set - RMSE: {:.4}, R²: {:.4}",
            self.train_rmse, self.train_r2
        )?;
        writeln!(
            f,
            "Testing Set - RMSE: {:.4}, R²: {:.4}",
            self.test_rmse, self.test_r2
        )?;
        writeln!(f, "Training ±σ: +{0:.4}, -{0:.4}", self.train_sigma)?;
        writeln!(f, "Testing ±σ: +{0:.4}, -{0:.4}", self.test_sigma)?;
        writeln!(f, "Training ±2σ: +{0:.4}, -{0:.4}", 2.0 * self.train_sigma)?;
        write!(f, "Testing ±2σ: +{0:.4}, -{0:.4}", 2.0 * self.test_sigma)
    }
}

fn check_pair(context: &str, pred: &Vector<f32>, truth: &Vector<f32>) -> Result<()> {
    if pred.len() != truth.len() {
        return Err(EnsembleError::dimension_mismatch(context, truth.len(), pred.len()));
    }
    if truth.is_empty() {
        return Err(EnsembleError::empty_input(context));
    }
    Ok(())
}

/// The `y = x` line and the ±σ / ±2σ bands around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyBands {
    pub mean_sigma: f64,
    pub decision_line: Vec<f64>,
    pub upper_sigma: Vec<f64>,
    pub lower_sigma: Vec<f64>,
    pub upper_2sigma: Vec<f64>,
    pub lower_2sigma: Vec<f64>,
}

impl UncertaintyBands {
    /// Builds [`DECISION_LINE_POINTS`] evenly spaced points from the smallest
    /// to the largest actual value of either set.
    ///
    /// # Errors
    ///
    /// Returns `EmptyInput` if both target vectors are empty.
    pub fn new(summary: &PerformanceSummary, y_train: &Vector<f32>, y_test: &Vector<f32>) -> Result<Self> {
        let actual = y_train.iter().chain(y_test.iter()).map(|&v| f64::from(v));
        let (lo, hi) = actual.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if lo > hi {
            return Err(EnsembleError::empty_input("uncertainty bands"));
        }

        let mean_sigma = summary.mean_sigma();
        let decision_line = linspace(lo, hi, DECISION_LINE_POINTS);
        let shifted = |k: f64| -> Vec<f64> {
            decision_line.iter().map(|v| v + k * mean_sigma).collect()
        };

        Ok(Self {
            mean_sigma,
            upper_sigma: shifted(1.0),
            lower_sigma: shifted(-1.0),
            upper_2sigma: shifted(2.0),
            lower_2sigma: shifted(-2.0),
            decision_line,
        })
    }
}

/// Inclusive evenly spaced points.
pub(crate) fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Column-oriented performance table; shorter columns are padded with NaN
/// up to the longest one.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceTable {
    columns: Vec<Vec<f64>>,
}

impl PerformanceTable {
    /// Assembles the ten columns of [`PERFORMANCE_COLUMNS`].
    #[must_use]
    pub fn new(
        train_pred: &Vector<f32>,
        y_train: &Vector<f32>,
        test_pred: &Vector<f32>,
        y_test: &Vector<f32>,
        bands: &UncertaintyBands,
    ) -> Self {
        let widen = |v: &Vector<f32>| -> Vec<f64> { v.iter().map(|&x| f64::from(x)).collect() };
        let mut columns = vec![
            widen(train_pred),
            widen(y_train),
            widen(test_pred),
            widen(y_test),
            bands.decision_line.clone(),
            bands.decision_line.clone(),
            bands.upper_sigma.clone(),
            bands.lower_sigma.clone(),
            bands.upper_2sigma.clone(),
            bands.lower_2sigma.clone(),
        ];
        let n_rows = columns.iter().map(Vec::len).max().unwrap_or(0);
        for column in &mut columns {
            column.resize(n_rows, f64::NAN);
        }
        Self { columns }
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Column by header name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        PERFORMANCE_COLUMNS
            .iter()
            .position(|&c| c == name)
            .map(|j| self.columns[j].as_slice())
    }

    /// Writes the table as CSV; NaN padding is written as an empty cell.
    ///
    /// # Errors
    ///
    /// Returns `Csv` or `Io` errors from the writer.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(PERFORMANCE_COLUMNS)?;
        for i in 0..self.n_rows() {
            wtr.write_record(self.columns.iter().map(|c| format_cell(c[i])))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Writes the table to `path`.
    ///
    /// # Errors
    ///
    /// See [`Self::write_csv`].
    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }

    /// Reads a table written by [`Self::write_csv`]; empty cells become NaN.
    ///
    /// # Errors
    ///
    /// Returns `Csv` if the header differs from [`PERFORMANCE_COLUMNS`] or a
    /// cell is not a number.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.clone();
        if !headers.iter().eq(PERFORMANCE_COLUMNS.iter().copied()) {
            return Err(EnsembleError::Csv(format!(
                "unexpected performance table header: {headers:?}"
            )));
        }

        let mut columns = vec![Vec::new(); PERFORMANCE_COLUMNS.len()];
        for record in rdr.records() {
            let record = record?;
            for (column, cell) in columns.iter_mut().zip(record.iter()) {
                let value = if cell.is_empty() {
                    f64::NAN
                } else {
                    cell.parse::<f64>()
                        .map_err(|_| EnsembleError::Csv(format!("'{cell}' is not a number")))?
                };
                column.push(value);
            }
        }
        Ok(Self { columns })
    }
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}
