//! Error types for the alloy-ensemble CLI.

use alloy_ensemble::EnsembleError;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Result type alias for CLI operations
pub(crate) type Result<T> = std::result::Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug)]
pub(crate) enum CliError {
    /// Input file not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// No weights on the command line or in the configuration
    #[error("No weights given: pass --weights svr=..,rf=..,et=..,gp=..,knn=.. or set \"weights\" in the config")]
    MissingWeights,

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Library error
    #[error("{0}")]
    Ensemble(EnsembleError),
}

impl CliError {
    /// Get exit code for this error
    pub(crate) fn exit_code(&self) -> ExitCode {
        match self {
            Self::Ensemble(_) => ExitCode::from(1),
            Self::MissingWeights => ExitCode::from(2),
            Self::FileNotFound(_) => ExitCode::from(3),
            Self::InvalidConfig(_) => ExitCode::from(5),
            Self::Io(_) => ExitCode::from(7),
            Self::Json(_) => ExitCode::from(8),
        }
    }
}

impl From<EnsembleError> for CliError {
    fn from(e: EnsembleError) -> Self {
        match e {
            EnsembleError::InvalidHyperparameter { .. } => Self::InvalidConfig(e.to_string()),
            EnsembleError::Io(io) => Self::Io(io),
            other => Self::Ensemble(other),
        }
    }
}
