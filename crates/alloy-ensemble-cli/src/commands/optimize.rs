//! Optimize command implementation

use super::{load_experiment, output_dir, GlobalArgs};
use crate::error::Result;

/// Run the weight search and save `optimization.json`.
pub(crate) fn run(globals: &GlobalArgs, n_calls: Option<usize>) -> Result<()> {
    let mut config = globals.experiment_config()?;
    if let Some(n_calls) = n_calls {
        config.optimizer.n_calls = n_calls;
        config.validate()?;
    }
    let experiment = load_experiment(config)?;
    let search = experiment.optimize_weights()?;
    let path = search.save(output_dir(experiment.config())?)?;

    if globals.json {
        println!("{}", serde_json::to_string_pretty(&search.weights)?);
        return Ok(());
    }
    println!("Optimal Weights: {}", search.weights);
    println!("Best out-of-fold RMSE: {:.4}", search.result.fun);
    println!("Saved {}", path.display());
    Ok(())
}
