//! Sweep command implementation

use super::{load_experiment, output_dir, resolve_weights, GlobalArgs};
use crate::error::Result;
use alloy_ensemble::ensemble::EnsembleWeights;

/// Predict every Ni-Ti-X composition for each element.
pub(crate) fn run(
    globals: &GlobalArgs,
    weights: Option<EnsembleWeights>,
    elements: Option<Vec<String>>,
) -> Result<()> {
    let mut config = globals.experiment_config()?;
    let weights = resolve_weights(weights, &config)?;
    if let Some(elements) = elements {
        config = config.with_sweep_elements(elements);
    }
    let experiment = load_experiment(config)?;
    let ensemble = experiment.fit_ensemble(weights)?;
    let dir = output_dir(experiment.config())?;

    for sweep in experiment.sweeps(&ensemble)? {
        let path = sweep.save(dir)?;
        println!("File saved: {} ({} rows)", path.display(), sweep.points().len());
    }
    Ok(())
}
