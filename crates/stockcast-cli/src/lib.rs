//! stockcast CLI Library
//!
//! This crate provides the command-line interface for stockcast, including:
//!
//! - **Train**: fit a forecaster on a CSV price history and save a run
//! - **Predict**: load a saved run and forecast forward from a date
//! - **Validate**: check a configuration and print the model summary
//!
//! # Example
//!
//! ```bash
//! # Train with the default configuration
//! stockcast train --data data/MSFT.csv --model-dir models
//!
//! # Forecast 5 trading days from the newest run
//! stockcast predict --data data/MSFT.csv --start-date 2023-01-03 --days 5
//!
//! # Check a configuration file
//! stockcast validate --config configs/lstm_v2.json
//! ```

pub mod commands;
pub mod forecast;
pub mod pipeline;

use clap::{Parser, Subcommand};

pub use commands::{PredictCommand, TrainCommand, ValidateCommand};

/// stockcast - LSTM stock-close forecasting
///
/// Trains recurrent regressors on a single price column with leak-free
/// scaling, and forecasts from saved runs.
#[derive(Parser, Debug)]
#[command(name = "stockcast")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a model and save it as a new run
    Train(TrainCommand),

    /// Forecast with a saved run
    Predict(PredictCommand),

    /// Validate a configuration without training
    Validate(ValidateCommand),
}

/// Result type alias for CLI operations
pub type CliResult<T> = anyhow::Result<T>;
