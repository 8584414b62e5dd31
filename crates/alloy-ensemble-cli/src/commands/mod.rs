//! Command implementations
//!
//! Every command builds an [`Experiment`] from the configuration file and
//! the global overrides, then runs one stage of it.

pub(crate) mod evaluate;
pub(crate) mod importance;
pub(crate) mod optimize;
pub(crate) mod run;
pub(crate) mod sweep;

use crate::error::{CliError, Result};
use alloy_ensemble::config::ExperimentConfig;
use alloy_ensemble::ensemble::EnsembleWeights;
use alloy_ensemble::experiment::Experiment;
use std::path::{Path, PathBuf};
use tracing::info;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub(crate) struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub data: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub json: bool,
}

impl GlobalArgs {
    /// Configuration file (or defaults) with the command line overrides.
    pub(crate) fn experiment_config(&self) -> Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => {
                require_file(path)?;
                ExperimentConfig::from_json_file(path)?
            }
            None => ExperimentConfig::default(),
        };
        if let Some(data) = &self.data {
            config = config.with_data_path(data);
        }
        if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config.validate()?;
        Ok(config)
    }
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CliError::FileNotFound(path.to_path_buf()))
    }
}

/// Loads the dataset and splits it.
pub(crate) fn load_experiment(config: ExperimentConfig) -> Result<Experiment> {
    require_file(&config.data_path)?;
    info!(path = %config.data_path.display(), "loading dataset");
    Ok(Experiment::load(config)?)
}

/// Command line weights win over configured ones.
pub(crate) fn resolve_weights(
    cli: Option<EnsembleWeights>,
    config: &ExperimentConfig,
) -> Result<EnsembleWeights> {
    cli.or(config.weights).ok_or(CliError::MissingWeights)
}

/// Creates the output directory.
pub(crate) fn output_dir(config: &ExperimentConfig) -> Result<&Path> {
    std::fs::create_dir_all(&config.output_dir)?;
    Ok(config.output_dir.as_path())
}
