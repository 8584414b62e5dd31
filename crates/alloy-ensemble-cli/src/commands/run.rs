//! Run command implementation

use super::{load_experiment, GlobalArgs};
use crate::error::Result;
use alloy_ensemble::ensemble::EnsembleWeights;

/// Every stage of the experiment in sequence.
pub(crate) fn run(globals: &GlobalArgs, weights: Option<EnsembleWeights>) -> Result<()> {
    let mut config = globals.experiment_config()?;
    if let Some(weights) = weights {
        config = config.with_weights(weights);
    }
    let outputs = load_experiment(config)?.run()?;

    if let Some(search) = &outputs.search {
        println!("Best out-of-fold RMSE: {:.4}", search.result.fun);
    }
    println!("Weights: {}", outputs.weights);
    println!("{}", outputs.summary);
    for path in &outputs.files {
        println!("Saved {}", path.display());
    }
    Ok(())
}
