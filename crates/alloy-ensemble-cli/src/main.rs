//! alloy-ensemble - weighted ensemble experiments for shape-memory alloys
//!
//! Usage:
//!   alloy-ensemble --data HTSMA_DATA.csv optimize            # Bayesian weight search
//!   alloy-ensemble evaluate --weights svr=0.3,et=0.7         # CV metrics + performance table
//!   alloy-ensemble importance --weights svr=0.3,et=0.7       # Weighted feature importances
//!   alloy-ensemble sweep --weights svr=0.3,et=0.7 -e Zr,Hf   # Ni-Ti-X composition sweeps
//!   alloy-ensemble --config experiment.json run              # Everything above

use alloy_ensemble::ensemble::EnsembleWeights;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

mod commands;
mod error;

use commands::{evaluate, importance, optimize, run, sweep, GlobalArgs};

/// alloy-ensemble - weighted regression ensembles for transformation temperatures
///
/// Fits SVR, random forest, extra trees, Gaussian process and KNN models,
/// searches their blending weights and writes the report tables.
#[derive(Parser)]
#[command(name = "alloy-ensemble")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Experiment configuration (JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Input dataset (CSV), overrides the configuration
    #[arg(short, long, global = true, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Directory for output files, overrides the configuration
    #[arg(short, long, global = true, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Seed for the split, the folds, the forests and the optimizer
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the blending weights that minimise the out-of-fold RMSE
    Optimize {
        /// Number of objective evaluations
        #[arg(long)]
        n_calls: Option<usize>,
    },

    /// Cross-validated metrics, σ bands and the performance table
    Evaluate {
        /// Weights by model name, e.g. svr=0.29,et=0.71
        #[arg(short, long)]
        weights: Option<EnsembleWeights>,
    },

    /// Weighted feature importances of the tree ensembles
    Importance {
        /// Weights by model name, e.g. svr=0.29,et=0.71
        #[arg(short, long)]
        weights: Option<EnsembleWeights>,
    },

    /// Predicted temperature over Ni-Ti-X compositions
    Sweep {
        /// Weights by model name, e.g. svr=0.29,et=0.71
        #[arg(short, long)]
        weights: Option<EnsembleWeights>,

        /// Third elements to sweep
        #[arg(short, long, value_delimiter = ',')]
        elements: Option<Vec<String>>,
    },

    /// Optimize (unless weights are given), evaluate, rank features and sweep
    Run {
        /// Skip the search and use these weights
        #[arg(short, long)]
        weights: Option<EnsembleWeights>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Optimize { .. } => "optimize",
            Self::Evaluate { .. } => "evaluate",
            Self::Importance { .. } => "importance",
            Self::Sweep { .. } => "sweep",
            Self::Run { .. } => "run",
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let globals = GlobalArgs {
        config: cli.config,
        data: cli.data,
        output_dir: cli.output_dir,
        seed: cli.seed,
        json: cli.json,
    };

    let command = cli.command.name();
    info!(command, "starting command");

    let result = match cli.command {
        Commands::Optimize { n_calls } => optimize::run(&globals, n_calls),
        Commands::Evaluate { weights } => evaluate::run(&globals, weights),
        Commands::Importance { weights } => importance::run(&globals, weights),
        Commands::Sweep { weights, elements } => sweep::run(&globals, weights, elements),
        Commands::Run { weights } => run::run(&globals, weights),
    };

    match result {
        Ok(()) => {
            info!(command, "command finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(command, "command failed");
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}
