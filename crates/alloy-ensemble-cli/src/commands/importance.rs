//! Importance command implementation

use super::{load_experiment, output_dir, resolve_weights, GlobalArgs};
use crate::error::Result;
use alloy_ensemble::ensemble::EnsembleWeights;
use alloy_ensemble::experiment::IMPORTANCE_FILE;
use alloy_ensemble::report::save_importances;

/// Rank features by weighted tree importance.
pub(crate) fn run(globals: &GlobalArgs, weights: Option<EnsembleWeights>) -> Result<()> {
    let config = globals.experiment_config()?;
    let weights = resolve_weights(weights, &config)?;
    let experiment = load_experiment(config)?;
    let ensemble = experiment.fit_ensemble(weights)?;
    let importances = ensemble.feature_importances(experiment.feature_names())?;

    let path = output_dir(experiment.config())?.join(IMPORTANCE_FILE);
    save_importances(&importances, &path)?;

    if globals.json {
        println!("{}", serde_json::to_string_pretty(&importances)?);
        return Ok(());
    }
    println!("{:<12} {:>10}", "Feature", "Importance");
    for imp in &importances {
        println!("{:<12} {:>10.4}", imp.feature, imp.importance);
    }
    println!("Saved {}", path.display());
    Ok(())
}
