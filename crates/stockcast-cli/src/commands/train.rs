//! Train Command Implementation
//!
//! Runs the full training pipeline on a CSV price history and saves the
//! result as a new run directory.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use stockcast_core::{PipelineConfig, StockcastError, TrainingError};
use stockcast_training::StopHandle;
use tracing::{info, warn};

use crate::pipeline;

/// Train a forecaster and save it as a new run
///
/// The configuration file sets the date boundaries, window size and
/// architecture. Hyperparameters given on the command line override the
/// file.
///
/// # Example
///
/// ```bash
/// stockcast train \
///     --data data/MSFT.csv \
///     --config configs/lstm_v1.json \
///     --model-dir models \
///     --epochs 20
/// ```
#[derive(Args, Debug, Clone)]
pub struct TrainCommand {
    /// CSV file with a `Date` column and the target column
    #[arg(long, env = "STOCKCAST_DATA")]
    pub data: PathBuf,

    /// Path to the pipeline configuration file (JSON format)
    #[arg(long, short = 'c', env = "STOCKCAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory that receives the run directory
    #[arg(long, short = 'd', env = "STOCKCAST_MODEL_DIR", default_value = "models")]
    pub model_dir: PathBuf,

    /// Override the number of epochs
    #[arg(long, short = 'e')]
    pub epochs: Option<usize>,

    /// Override the batch size
    #[arg(long, short = 'b')]
    pub batch_size: Option<usize>,

    /// Override the learning rate
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Override the seed for initialization, dropout and shuffling
    #[arg(long)]
    pub seed: Option<u64>,
}

impl TrainCommand {
    /// Loads the configuration and applies command-line overrides.
    pub fn resolve_config(&self) -> Result<PipelineConfig> {
        if self.config.is_none() {
            warn!("No config file provided, using default configuration");
        }
        let mut config = pipeline::load_config(self.config.as_deref())?;
        let training = &mut config.training;
        if let Some(epochs) = self.epochs {
            training.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            training.batch_size = batch_size;
        }
        if let Some(learning_rate) = self.learning_rate {
            training.learning_rate = learning_rate;
        }
        if let Some(seed) = self.seed {
            training.seed = seed;
        }
        Ok(config)
    }

    /// Execute the train command
    ///
    /// Ctrl-C raises the stop handle, so the run ends at the next batch
    /// boundary without saving anything.
    pub fn run(&self) -> Result<()> {
        let stop = StopHandle::new();
        watch_for_interrupt(stop.clone())?;
        self.run_with_stop(stop)
    }

    /// Runs training until it finishes or `stop` is raised.
    pub fn run_with_stop(&self, stop: StopHandle) -> Result<()> {
        let config = self.resolve_config()?;
        info!(
            model = %config.model.name,
            data = %self.data.display(),
            epochs = config.training.epochs,
            batch_size = config.training.batch_size,
            learning_rate = config.training.learning_rate,
            "Starting training"
        );

        let report = pipeline::train(&config, &self.data, &self.model_dir, stop)
            .context("Training run failed")?;

        println!();
        println!("Run saved to {}", report.run_dir.display());
        println!(
            "Epochs completed: {} of {}{}",
            report.history.len(),
            config.training.epochs,
            if report.stopped_early { " (early stop)" } else { "" }
        );
        if let (Some(train), Some(val)) = (
            report.history.final_train(),
            report.history.final_validation(),
        ) {
            println!("Final train loss: {:.6}", train);
            println!("Final validation loss: {:.6}", val);
        }
        Ok(())
    }
}

/// Raises `stop` when the process receives Ctrl-C.
fn watch_for_interrupt(stop: StopHandle) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start signal listener")?;
    std::thread::spawn(move || {
        runtime.block_on(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!("Received interrupt, stopping training");
                    stop.stop();
                }
                Err(e) => warn!("Failed to listen for interrupt: {}", e),
            }
        });
    });
    Ok(())
}

/// Number of completed epochs if `err` comes from an interrupted run.
pub fn interrupted_epochs(err: &anyhow::Error) -> Option<usize> {
    err.chain().find_map(|cause| match cause.downcast_ref::<StockcastError>() {
        Some(StockcastError::Training(TrainingError::Interrupted { completed_epochs })) => {
            Some(*completed_epochs)
        }
        _ => None,
    })
}
