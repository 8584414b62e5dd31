//! Evaluate command implementation

use super::{load_experiment, output_dir, resolve_weights, GlobalArgs};
use crate::error::Result;
use alloy_ensemble::ensemble::EnsembleWeights;

/// Cross-validate `weights` and write the performance table.
pub(crate) fn run(globals: &GlobalArgs, weights: Option<EnsembleWeights>) -> Result<()> {
    let config = globals.experiment_config()?;
    let weights = resolve_weights(weights, &config)?;
    let experiment = load_experiment(config)?;
    let report = experiment.evaluate(&weights)?;
    let path = report.save(output_dir(experiment.config())?)?;

    if globals.json {
        println!("{}", serde_json::to_string_pretty(&report.summary)?);
        return Ok(());
    }
    println!("Weights: {weights}");
    println!("{}", report.summary);
    println!("Saved {}", path.display());
    Ok(())
}
