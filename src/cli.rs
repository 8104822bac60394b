//! Command-line interface definitions and argument parsing

use crate::model::KMeansSettings;
use crate::pipeline::PipelineConfig;
use crate::predict::FeatureSpace;
use crate::sweep::{ModelSelection, SweepConfig};
use clap::Parser;
use std::path::PathBuf;

/// Cluster employee productivity records: sweep k, find the elbow, predict
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, env = "ELBOWFORGE_INPUT", default_value = "data/employee_productivity.csv")]
    pub input: PathBuf,

    /// Directory where fitted models are stored
    #[arg(long, env = "ELBOWFORGE_MODEL_DIR", default_value = "model")]
    pub model_dir: PathBuf,

    /// File name of the stored model
    #[arg(short = 'm', long, env = "ELBOWFORGE_MODEL_NAME", default_value = "model.json")]
    pub model_name: String,

    /// Largest cluster count in the sweep (the sweep starts at 1)
    #[arg(short = 'k', long, env = "ELBOWFORGE_K_MAX", default_value = "10")]
    pub k_max: usize,

    /// Random initializations per cluster count
    #[arg(long, env = "ELBOWFORGE_N_INIT", default_value = "10")]
    pub n_init: usize,

    /// Maximum iterations for K-Means algorithm
    #[arg(long, env = "ELBOWFORGE_MAX_ITERS", default_value = "300")]
    pub max_iters: u64,

    /// Tolerance for K-Means convergence
    #[arg(long, env = "ELBOWFORGE_TOLERANCE", default_value = "1e-4")]
    pub tolerance: f64,

    /// Seed for centroid initialization
    #[arg(long, env = "ELBOWFORGE_SEED", default_value = "42")]
    pub seed: u64,

    /// Which model to persist: last, elbow or fixed:<k>
    #[arg(long, env = "ELBOWFORGE_SELECT", default_value = "last")]
    pub select: ModelSelection,

    /// Feature space used for prediction: scaled or raw
    #[arg(long, env = "ELBOWFORGE_PREDICT_SPACE", default_value = "scaled")]
    pub predict_space: FeatureSpace,

    /// Write the elbow curve to this PNG file
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    /// Build the pipeline configuration
    pub fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        if self.k_max == 0 {
            anyhow::bail!("k-max must be at least 1");
        }
        if self.n_init == 0 {
            anyhow::bail!("n-init must be at least 1");
        }
        if self.max_iters == 0 {
            anyhow::bail!("max-iters must be at least 1");
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            anyhow::bail!("tolerance must be a positive number, got {}", self.tolerance);
        }

        Ok(PipelineConfig {
            input: self.input.clone(),
            model_dir: self.model_dir.clone(),
            model_name: self.model_name.clone(),
            sweep: SweepConfig {
                k_min: 1,
                k_max: self.k_max,
                kmeans: KMeansSettings {
                    n_init: self.n_init,
                    max_iters: self.max_iters,
                    tolerance: self.tolerance,
                    seed: self.seed,
                },
                selection: self.select,
            },
            predict_space: self.predict_space,
        })
    }
}
