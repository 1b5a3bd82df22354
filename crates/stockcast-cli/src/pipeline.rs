//! The training pipeline shared by the `train` and `validate` commands.
//!
//! Stages run in a fixed order and each receives the configuration
//! explicitly: load, optional start filter, split, fit the scaler on the
//! train range, scale, window, build, train, save.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stockcast_checkpoint::{ArtifactWriter, TrainingArtifact};
use stockcast_core::{PipelineConfig, StockcastError};
use stockcast_data::{
    CsvSeriesStore, DateRange, DateRangeSplitter, Partition, Scaler, Series, SeriesStore, Split,
    WindowBuilder, WindowSet,
};
use stockcast_layers::{ArchitectureBuilder, Sequential};
use stockcast_training::{LoggingHook, LossHistory, StopHandle, TrainingRunner};
use tracing::info;

/// Reads the configuration file, or the defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            PipelineConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Config and architecture checks that need no data.
pub fn preflight(config: &PipelineConfig) -> Result<Sequential, StockcastError> {
    config.validate()?;
    let model = ArchitectureBuilder::new()
        .with_seed(config.training.seed)
        .build(&config.model.layers, config.window_size)?;
    Ok(model)
}

/// Scaled, windowed training inputs.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub split: Split,
    pub scaler: Scaler,
    pub train: WindowSet,
    pub validation: WindowSet,
}

/// Splits `series`, fits the scaler on the train range and builds windows.
///
/// Rows before `train_start_date` are dropped first. Validation windows
/// are built from the validation partition alone.
pub fn prepare(config: &PipelineConfig, series: &Series) -> Result<PreparedData, StockcastError> {
    let series = match config.train_start_date {
        Some(start) => series.slice(&DateRange::from(start)),
        None => series.clone(),
    };

    let splitter = DateRangeSplitter::new(config.train_end_date, config.val_end_date)?;
    let split = splitter.split(&series);
    split.require_non_empty(&[Partition::Train, Partition::Validation])?;
    let [train_rows, val_rows, test_rows] = split.sizes();
    info!(train_rows, val_rows, test_rows, "split series");

    let mut scaler = Scaler::new();
    let params = scaler.fit(&series, &splitter.train_range())?;
    info!(min = params.min, max = params.max, rows = params.rows, "fit scaler");

    let builder = WindowBuilder::new(config.window_size)?;
    let train = builder.build_training_windows(&scaler.transform(&split.train)?)?;
    let validation = builder.build_training_windows(&scaler.transform(&split.validation)?)?;
    info!(
        train_windows = train.len(),
        val_windows = validation.len(),
        window_size = config.window_size,
        "built windows"
    );

    Ok(PreparedData {
        split,
        scaler,
        train,
        validation,
    })
}

/// Outcome of [`train`].
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub run_dir: PathBuf,
    pub history: LossHistory,
    pub stopped_early: bool,
}

/// Runs the full training pipeline and saves a new run under `model_dir`.
pub fn train(
    config: &PipelineConfig,
    data: &Path,
    model_dir: &Path,
    stop: StopHandle,
) -> Result<TrainReport> {
    let model = preflight(config).context("Invalid configuration")?;
    info!(model = %config.model.name, parameters = model.num_parameters(), "built model");
    println!("{}", model.summary());

    let series = CsvSeriesStore::new(data)
        .load(&config.target_column)
        .with_context(|| format!("Failed to load {}", data.display()))?;
    let prepared = prepare(config, &series).context("Failed to prepare training data")?;

    let mut runner = TrainingRunner::from_config(&config.training)
        .with_hook(LoggingHook::new(1))
        .with_stop_handle(stop);
    let outcome = runner
        .run(model, &prepared.train, &prepared.validation)
        .context("Training failed")?;

    let params = *prepared
        .scaler
        .params()
        .context("Scaler was not fitted")?;
    let created_at = chrono::Local::now().naive_local();
    let artifact = TrainingArtifact::new(
        config.clone(),
        params,
        outcome.history.clone(),
        &outcome.model,
        created_at,
    );
    let run_dir = ArtifactWriter::new(model_dir)
        .write(&artifact, &outcome.model)
        .context("Failed to save training artifact")?;

    Ok(TrainReport {
        run_dir,
        history: outcome.history,
        stopped_early: outcome.stopped_early,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use stockcast_core::{DataError, LayerSpec};

    fn series(days: i64) -> Series {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        Series::from_pairs((0..days).map(|i| (start + Duration::days(i), 50.0 + i as f64))).unwrap()
    }

    fn config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.train_start_date = Some(NaiveDate::from_ymd_opt(2020, 1, 11).unwrap());
        config.train_end_date = NaiveDate::from_ymd_opt(2020, 3, 10).unwrap();
        config.val_end_date = NaiveDate::from_ymd_opt(2020, 4, 9).unwrap();
        config.window_size = 5;
        config.model.layers = vec![LayerSpec::recurrent(2, false), LayerSpec::dense(1, None)];
        config
    }

    #[test]
    fn test_prepare_applies_start_filter_and_train_only_scaling() {
        let prepared = prepare(&config(), &series(120)).unwrap();
        // Jan 11 ..= Mar 10 (leap year) is 60 rows, then 30 validation rows.
        assert_eq!(prepared.split.sizes(), [60, 30, 20]);
        let params = prepared.scaler.params().unwrap();
        assert_eq!((params.min, params.max, params.rows), (60.0, 119.0, 60));
        assert_eq!(prepared.train.len(), 55);
        assert_eq!(prepared.validation.len(), 25);
        // Validation values lie above the train max.
        assert!(prepared.validation.targets().iter().all(|v| *v > 1.0));
    }

    #[test]
    fn test_prepare_rejects_empty_validation() {
        let err = prepare(&config(), &series(70)).unwrap_err();
        assert!(matches!(
            err,
            StockcastError::Data(DataError::EmptyPartition { .. })
        ));
    }

    #[test]
    fn test_prepare_rejects_short_validation() {
        let mut config = config();
        config.window_size = 40;
        let err = prepare(&config, &series(120)).unwrap_err();
        assert_eq!(
            err,
            StockcastError::Data(DataError::InsufficientData {
                required: 41,
                available: 30
            })
        );
    }

    #[test]
    fn test_preflight_reports_architecture_errors() {
        let mut config = config();
        config.model.layers = vec![LayerSpec::dense(1, None)];
        assert!(preflight(&config).is_err());
        assert!(preflight(&PipelineConfig::default()).is_ok());
    }

    #[test]
    fn test_load_config_defaults_and_missing_file() {
        assert_eq!(load_config(None).unwrap(), PipelineConfig::default());
        let err = load_config(Some(Path::new("/nonexistent/stockcast.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to load configuration"));
    }
}
