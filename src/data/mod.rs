//! Alloy dataset loading.
//!
//! The input is a CSV file with a header row. Features are a contiguous
//! range of columns (composition percentages) and the target is a single
//! column (the transformation temperature).
//!
//! # Examples
//!
//! ```
//! use alloy_ensemble::data::Dataset;
//!
//! let csv = "id,Ni,Ti,Am\n1,50.0,50.0,60.0\n2,49.5,50.5,40.0\n";
//! let ds = Dataset::from_reader(csv.as_bytes(), 1..3, 3).expect("well-formed CSV");
//! assert_eq!(ds.feature_names(), ["Ni", "Ti"]);
//! assert_eq!(ds.target_name(), "Am");
//! assert_eq!(ds.n_samples(), 2);
//! ```

use crate::error::{EnsembleError, Result};
use crate::primitives::{Matrix, Vector};
use std::io::Read;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

/// Features, target and their column names.
#[derive(Debug, Clone)]
pub struct Dataset {
    feature_names: Vec<String>,
    target_name: String,
    x: Matrix<f32>,
    y: Vector<f32>,
}

impl Dataset {
    /// Creates a dataset from in-memory data.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the names do not match the columns of
    /// `x` or `x` and `y` differ in length, and `EmptyInput` for zero rows.
    pub fn new(
        feature_names: Vec<String>,
        target_name: impl Into<String>,
        x: Matrix<f32>,
        y: Vector<f32>,
    ) -> Result<Self> {
        if feature_names.len() != x.n_cols() {
            return Err(EnsembleError::dimension_mismatch(
                "feature names",
                x.n_cols(),
                feature_names.len(),
            ));
        }
        if x.n_rows() != y.len() {
            return Err(EnsembleError::dimension_mismatch("samples", x.n_rows(), y.len()));
        }
        if x.n_rows() == 0 {
            return Err(EnsembleError::empty_input("dataset"));
        }
        Ok(Self {
            feature_names,
            target_name: target_name.into(),
            x,
            y,
        })
    }

    /// Loads `features` columns and the `target` column from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns `Csv` if the file cannot be read, a selected column is
    /// missing, or a selected cell is not a number.
    pub fn from_csv<P: AsRef<Path>>(path: P, features: Range<usize>, target: usize) -> Result<Self> {
        let path = path.as_ref();
        let reader = csv::Reader::from_path(path)
            .map_err(|e| EnsembleError::Csv(format!("{}: {e}", path.display())))?;
        let dataset = Self::from_csv_reader(reader, features, target)?;
        debug!(
            path = %path.display(),
            rows = dataset.n_samples(),
            features = dataset.n_features(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Same as [`Self::from_csv`] over any reader.
    ///
    /// # Errors
    ///
    /// See [`Self::from_csv`].
    pub fn from_reader<R: Read>(rdr: R, features: Range<usize>, target: usize) -> Result<Self> {
        Self::from_csv_reader(csv::Reader::from_reader(rdr), features, target)
    }

    fn from_csv_reader<R: Read>(
        mut reader: csv::Reader<R>,
        features: Range<usize>,
        target: usize,
    ) -> Result<Self> {
        if features.is_empty() {
            return Err(EnsembleError::invalid_hyperparameter(
                "feature_columns",
                format!("{}..{}", features.start, features.end),
                "non-empty range",
            ));
        }

        let headers = reader.headers()?.clone();
        let n_columns = headers.len();
        let last = features.end.max(target + 1);
        if last > n_columns {
            return Err(EnsembleError::Csv(format!(
                "column {} requested but the header has {n_columns} columns",
                last - 1
            )));
        }
        let feature_names: Vec<String> =
            features.clone().map(|j| headers[j].trim().to_string()).collect();
        let target_name = headers[target].trim().to_string();

        let n_features = features.len();
        let mut x = Vec::new();
        let mut y = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            // header is line 1
            let line = row + 2;
            for j in features.clone() {
                x.push(parse_cell(record.get(j), line, &headers[j])?);
            }
            y.push(parse_cell(record.get(target), line, &target_name)?);
        }

        let n_rows = y.len();
        Self::new(
            feature_names,
            target_name,
            Matrix::from_vec(n_rows, n_features, x)?,
            Vector::from_vec(y),
        )
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Feature matrix (`n_samples × n_features`).
    #[must_use]
    pub fn x(&self) -> &Matrix<f32> {
        &self.x
    }

    /// Target vector.
    #[must_use]
    pub fn y(&self) -> &Vector<f32> {
        &self.y
    }

    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.x.n_rows()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.x.n_cols()
    }

    /// Column position of the feature called `name`.
    #[must_use]
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|f| f == name)
    }
}

fn parse_cell(cell: Option<&str>, line: usize, column: &str) -> Result<f32> {
    let raw = cell.ok_or_else(|| {
        EnsembleError::Csv(format!("line {line}: missing value for column '{column}'"))
    })?;
    raw.trim().parse::<f32>().map_err(|_| {
        EnsembleError::Csv(format!(
            "line {line}: column '{column}' value '{raw}' is not a number"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ALLOYS: &str = "\
id,Ni,Ti,Hf,Zr,Pd,Pt,Am
1,50.0,50.0,0,0,0,0,60.5
2,49.0,36.0,15.0,0,0,0,180.0
3,50.5,49.5,0,0,0,0,-20.0
";

    #[test]
    fn test_from_csv_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(ALLOYS.as_bytes()).expect("write csv");

        let ds = Dataset::from_csv(file.path(), 1..7, 7).expect("load csv");
        assert_eq!(ds.n_samples(), 3);
        assert_eq!(ds.n_features(), 6);
        assert_eq!(ds.feature_names(), ["Ni", "Ti", "Hf", "Zr", "Pd", "Pt"]);
        assert_eq!(ds.target_name(), "Am");
        assert_eq!(ds.x().get(1, 2), 15.0);
        assert_eq!(ds.y().as_slice(), &[60.5, 180.0, -20.0]);
        assert_eq!(ds.feature_index("Zr"), Some(3));
        assert_eq!(ds.feature_index("Cu"), None);
    }

    #[test]
    fn test_target_before_features() {
        let csv = "Am,Ni,Ti\n10,50,50\n20,51,49\n";
        let ds = Dataset::from_reader(csv.as_bytes(), 1..3, 0).expect("load csv");
        assert_eq!(ds.y().as_slice(), &[10.0, 20.0]);
        assert_eq!(ds.x().row_slice(1), &[51.0, 49.0]);
    }

    #[test]
    fn test_missing_column() {
        let err = Dataset::from_reader(ALLOYS.as_bytes(), 1..7, 18).expect_err("no column 18");
        assert!(matches!(err, EnsembleError::Csv(_)));
    }

    #[test]
    fn test_non_numeric_cell() {
        let csv = "id,Ni,Am\n1,fifty,10\n";
        let err = Dataset::from_reader(csv.as_bytes(), 1..2, 2).expect_err("bad cell");
        let msg = err.to_string();
        assert!(msg.contains("line 2"), "{msg}");
        assert!(msg.contains("Ni"), "{msg}");
    }

    #[test]
    fn test_ragged_row() {
        let csv = "id,Ni,Am\n1,50\n";
        assert!(Dataset::from_reader(csv.as_bytes(), 1..2, 2).is_err());
    }

    #[test]
    fn test_header_only_is_empty() {
        let csv = "id,Ni,Am\n";
        let err = Dataset::from_reader(csv.as_bytes(), 1..2, 2).expect_err("no rows");
        assert!(matches!(err, EnsembleError::EmptyInput { .. }));
    }

    #[test]
    fn test_empty_feature_range() {
        assert!(Dataset::from_reader(ALLOYS.as_bytes(), 3..3, 7).is_err());
    }

    #[test]
    fn test_new_validates_shapes() {
        let x = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).expect("2x2");
        let y = Vector::from_slice(&[1.0, 2.0]);
        assert!(Dataset::new(vec!["a".into()], "t", x.clone(), y.clone()).is_err());
        assert!(Dataset::new(vec!["a".into(), "b".into()], "t", x.clone(), Vector::from_slice(&[1.0])).is_err());
        assert!(Dataset::new(vec!["a".into(), "b".into()], "t", x, y).is_ok());
    }
}
