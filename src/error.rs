//! Error types for ensemble fitting, evaluation and reporting.
//!
//! Provides rich error context for library consumers.

use std::fmt;

/// Main error type for alloy-ensemble operations.
///
/// Covers shape problems in the numeric core, invalid model configuration,
/// degenerate ensemble weights and the I/O performed by the data and report
/// layers.
///
/// # Examples
///
/// ```
/// use alloy_ensemble::error::EnsembleError;
///
/// let err = EnsembleError::DimensionMismatch {
///     expected: "100x6".to_string(),
///     actual: "100x5".to_string(),
/// };
/// assert!(err.to_string().contains("dimension mismatch"));
/// ```
#[derive(Debug)]
pub enum EnsembleError {
    /// Matrix/vector dimensions don't match for the operation.
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Invalid hyperparameter value provided.
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// A model was used for prediction before `fit`.
    NotFitted {
        /// Model name
        model: String,
    },

    /// Kernel matrix could not be factorised.
    NotPositiveDefinite,

    /// Raw ensemble weights cannot be normalised onto the simplex.
    DegenerateWeights {
        /// Sum of the raw weights
        sum: f64,
    },

    /// Input with no rows or no columns.
    EmptyInput {
        /// What was empty
        context: String,
    },

    /// CSV parsing or column-selection failure.
    Csv(String),

    /// Serialization/deserialization error.
    Serialization(String),

    /// I/O error (file not found, permission denied, etc.).
    Io(std::io::Error),

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for EnsembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnsembleError::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "Matrix dimension mismatch: expected {expected}, got {actual}"
                )
            }
            EnsembleError::InvalidHyperparameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid hyperparameter: {param} = {value}, expected {constraint}"
                )
            }
            EnsembleError::NotFitted { model } => {
                write!(f, "{model} is not fitted, call fit() first")
            }
            EnsembleError::NotPositiveDefinite => {
                write!(f, "Kernel matrix is not positive definite")
            }
            EnsembleError::DegenerateWeights { sum } => {
                write!(
                    f,
                    "Degenerate ensemble weights: raw sum {sum} cannot be normalized"
                )
            }
            EnsembleError::EmptyInput { context } => write!(f, "empty input: {context}"),
            EnsembleError::Csv(msg) => write!(f, "CSV error: {msg}"),
            EnsembleError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            EnsembleError::Io(e) => write!(f, "I/O error: {e}"),
            EnsembleError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for EnsembleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EnsembleError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EnsembleError {
    fn from(err: std::io::Error) -> Self {
        EnsembleError::Io(err)
    }
}

impl From<csv::Error> for EnsembleError {
    fn from(err: csv::Error) -> Self {
        EnsembleError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for EnsembleError {
    fn from(err: serde_json::Error) -> Self {
        EnsembleError::Serialization(err.to_string())
    }
}

impl From<&str> for EnsembleError {
    fn from(msg: &str) -> Self {
        EnsembleError::Other(msg.to_string())
    }
}

impl From<String> for EnsembleError {
    fn from(msg: String) -> Self {
        EnsembleError::Other(msg)
    }
}

impl EnsembleError {
    /// Create a dimension mismatch error with descriptive context
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Create an empty input error
    #[must_use]
    pub fn empty_input(context: &str) -> Self {
        Self::EmptyInput {
            context: context.to_string(),
        }
    }

    /// Create a not-fitted error for the named model
    #[must_use]
    pub fn not_fitted(model: &str) -> Self {
        Self::NotFitted {
            model: model.to_string(),
        }
    }

    /// Create an invalid hyperparameter error
    #[must_use]
    pub fn invalid_hyperparameter(param: &str, value: impl fmt::Display, constraint: &str) -> Self {
        Self::InvalidHyperparameter {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, EnsembleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_display() {
        let err = EnsembleError::DimensionMismatch {
            expected: "100x6".to_string(),
            actual: "100x5".to_string(),
        };
        assert!(err.to_string().contains("dimension mismatch"));
        assert!(err.to_string().contains("100x6"));
        assert!(err.to_string().contains("100x5"));
    }

    #[test]
    fn test_invalid_hyperparameter_display() {
        let err = EnsembleError::invalid_hyperparameter("n_neighbors", 0, ">= 1");
        let msg = err.to_string();
        assert!(msg.contains("Invalid hyperparameter"));
        assert!(msg.contains("n_neighbors"));
        assert!(msg.contains(">= 1"));
    }

    #[test]
    fn test_not_fitted_display() {
        let err = EnsembleError::not_fitted("SVR");
        assert_eq!(err.to_string(), "SVR is not fitted, call fit() first");
    }

    #[test]
    fn test_degenerate_weights_display() {
        let err = EnsembleError::DegenerateWeights { sum: 0.0 };
        assert!(err.to_string().contains("Degenerate ensemble weights"));
    }

    #[test]
    fn test_empty_input_helper() {
        let err = EnsembleError::empty_input("training data");
        let msg = err.to_string();
        assert!(msg.contains("empty input"));
        assert!(msg.contains("training data"));
    }

    #[test]
    fn test_dimension_mismatch_helper() {
        let err = EnsembleError::dimension_mismatch("features", 6, 5);
        let msg = err.to_string();
        assert!(msg.contains("features=6"));
        assert!(msg.contains('5'));
    }

    #[test]
    fn test_from_str() {
        let err: EnsembleError = "test error".into();
        assert!(matches!(err, EnsembleError::Other(_)));
        assert_eq!(err.to_string(), "test error");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: EnsembleError = io_err.into();
        assert!(matches!(err, EnsembleError::Io(_)));
    }

    #[test]
    fn test_error_source_io() {
        use std::error::Error;
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = EnsembleError::Io(io_err);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_source_other() {
        use std::error::Error;
        let err = EnsembleError::Other("test".to_string());
        assert!(err.source().is_none());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<u32>("not json").expect_err("must fail");
        let err: EnsembleError = json_err.into();
        assert!(matches!(err, EnsembleError::Serialization(_)));
    }
}
