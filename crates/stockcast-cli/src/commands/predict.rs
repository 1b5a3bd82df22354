//! Predict Command Implementation
//!
//! Restores a saved run (model parameters, scaler and configuration) and
//! forecasts forward from a start date.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;
use stockcast_checkpoint::ArtifactLoader;
use stockcast_data::{CsvSeriesStore, SeriesStore};
use tracing::info;

use crate::forecast::{forecast, mean_absolute_error, ForecastPoint};

/// Forecast with a saved run
///
/// Uses the newest run under `--model-dir` unless `--model-folder` names
/// one. The start date and horizon default to the run's configuration.
///
/// # Example
///
/// ```bash
/// stockcast predict \
///     --data data/MSFT.csv \
///     --model-folder LSTM_v1_20240105-093012 \
///     --start-date 2023-01-03 \
///     --days 5
/// ```
#[derive(Args, Debug, Clone)]
pub struct PredictCommand {
    /// CSV file with a `Date` column and the target column
    #[arg(long, env = "STOCKCAST_DATA")]
    pub data: PathBuf,

    /// Run directory to load, relative to `--model-dir`
    #[arg(long, short = 'm')]
    pub model_folder: Option<PathBuf>,

    /// Directory holding the run directories
    #[arg(long, short = 'd', env = "STOCKCAST_MODEL_DIR", default_value = "models")]
    pub model_dir: PathBuf,

    /// First date to forecast (YYYY-MM-DD)
    #[arg(long, short = 's')]
    pub start_date: Option<NaiveDate>,

    /// Number of periods to roll forward
    #[arg(long, short = 'n')]
    pub days: Option<usize>,
}

impl PredictCommand {
    /// The run directory this command loads.
    pub fn run_dir(&self) -> Result<PathBuf> {
        match &self.model_folder {
            Some(folder) => Ok(self.model_dir.join(folder)),
            None => ArtifactLoader::latest(&self.model_dir).with_context(|| {
                format!("No saved runs under {}", self.model_dir.display())
            }),
        }
    }

    /// Loads the run and computes the forecast.
    pub fn forecast(&self) -> Result<Vec<ForecastPoint>> {
        let run_dir = self.run_dir()?;
        let artifact = ArtifactLoader::load(&run_dir)
            .with_context(|| format!("Failed to load run {}", run_dir.display()))?;
        let model = artifact.rebuild_model()?;
        let scaler = artifact.scaler()?;
        let config = &artifact.config;

        let start = self.start_date.unwrap_or(config.prediction.start_date);
        let days = self.days.unwrap_or(config.prediction.days);
        info!(
            run = %run_dir.display(),
            start = %start,
            days,
            "Forecasting"
        );

        let series = CsvSeriesStore::new(&self.data)
            .load(&config.target_column)
            .with_context(|| format!("Failed to load {}", self.data.display()))?;
        let points = forecast(&model, &scaler, &series, start, days)
            .with_context(|| format!("Cannot forecast from {}", start))?;
        Ok(points)
    }

    /// Execute the predict command
    pub fn run(&self) -> Result<()> {
        let points = self.forecast()?;

        println!(
            "{:>4}  {:<10}  {:>12}  {:>12}  {:>10}",
            "step", "date", "predicted", "actual", "abs_error"
        );
        for point in &points {
            let date = point.date.map_or_else(|| "-".to_string(), |d| d.to_string());
            let actual = point.actual.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v));
            let error = point.error().map_or_else(|| "-".to_string(), |v| format!("{:.4}", v));
            println!(
                "{:>4}  {:<10}  {:>12.4}  {:>12}  {:>10}",
                point.step, date, point.predicted, actual, error
            );
        }
        if let Some(mae) = mean_absolute_error(&points) {
            println!("Mean absolute error: {:.4}", mae);
        }
        Ok(())
    }
}
