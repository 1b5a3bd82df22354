//! Pipeline configuration.
//!
//! [`PipelineConfig`] is the single value object handed to every stage of a
//! run. It is loaded from JSON, optionally overridden from the command line,
//! validated once, and then recorded verbatim in the trained artifact.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::layer_spec::ModelArchitecture;

/// Loss minimized by the training runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LossFunction {
    /// Mean squared error.
    #[default]
    Mse,
    /// Mean absolute error.
    Mae,
}

impl LossFunction {
    pub fn name(&self) -> &'static str {
        match self {
            LossFunction::Mse => "mse",
            LossFunction::Mae => "mae",
        }
    }
}

/// Early stopping on validation loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarlyStoppingConfig {
    /// Epochs without improvement before stopping
    pub patience: usize,
    /// Minimum decrease that counts as an improvement
    #[serde(default)]
    pub min_delta: f64,
}

/// Hyperparameters of the training loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    #[serde(default)]
    pub loss_function: LossFunction,
    /// Seed for weight initialization, dropout masks and batch shuffling
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_stopping: Option<EarlyStoppingConfig>,
}

fn default_seed() -> u64 {
    42
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            batch_size: 32,
            learning_rate: 0.001,
            loss_function: LossFunction::Mse,
            seed: default_seed(),
            early_stopping: None,
        }
    }
}

/// Inference settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// First date to forecast
    pub start_date: NaiveDate,
    /// Number of periods to roll the forecast forward
    pub days: usize,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            start_date: date(2023, 1, 1),
            days: 30,
        }
    }
}

/// Complete configuration of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Source file name, e.g. `MSFT.csv`
    pub ticker: String,
    /// Column holding the forecast value
    pub target_column: String,
    /// Rows before this date are ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_start_date: Option<NaiveDate>,
    /// Last date of the training partition (inclusive)
    pub train_end_date: NaiveDate,
    /// Last date of the validation partition (inclusive)
    pub val_end_date: NaiveDate,
    /// Number of past observations fed to the model
    pub window_size: usize,
    pub model: ModelArchitecture,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ticker: "MSFT.csv".to_string(),
            target_column: "Close".to_string(),
            train_start_date: Some(date(2016, 1, 1)),
            train_end_date: date(2021, 12, 31),
            val_end_date: date(2022, 12, 31),
            window_size: 60,
            model: ModelArchitecture::default(),
            training: TrainingConfig::default(),
            prediction: PredictionConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parses a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::InvalidValue {
            name: "config".to_string(),
            message: e.to_string(),
        })
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let json = std::fs::read_to_string(path).map_err(|e| ConfigurationError::InvalidValue {
            name: "config".to_string(),
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_json(&json)
    }

    /// Serializes the configuration as pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigurationError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigurationError::InvalidValue {
            name: "config".to_string(),
            message: e.to_string(),
        })
    }

    /// Checks hyperparameter positivity and date ordering.
    ///
    /// Architecture checks live with the builder in `stockcast-layers`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.window_size == 0 {
            return Err(non_positive("window_size"));
        }
        if self.training.batch_size == 0 {
            return Err(non_positive("batch_size"));
        }
        if self.training.epochs == 0 {
            return Err(non_positive("epochs"));
        }
        if !(self.training.learning_rate.is_finite() && self.training.learning_rate > 0.0) {
            return Err(non_positive("learning_rate"));
        }
        if self.prediction.days == 0 {
            return Err(non_positive("prediction.days"));
        }
        if self.train_end_date >= self.val_end_date {
            return Err(ConfigurationError::InvalidRange {
                start: self.train_end_date,
                end: self.val_end_date,
            });
        }
        if let Some(start) = self.train_start_date {
            if start > self.train_end_date {
                return Err(ConfigurationError::InvalidRange {
                    start,
                    end: self.train_end_date,
                });
            }
        }
        if self.model.name.trim().is_empty() {
            return Err(ConfigurationError::InvalidValue {
                name: "model.name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if let Some(early) = &self.training.early_stopping {
            if early.patience == 0 {
                return Err(non_positive("early_stopping.patience"));
            }
            if !(early.min_delta.is_finite() && early.min_delta >= 0.0) {
                return Err(ConfigurationError::InvalidValue {
                    name: "early_stopping.min_delta".to_string(),
                    message: "must be a finite, non-negative number".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn non_positive(name: &str) -> ConfigurationError {
    ConfigurationError::NonPositive {
        name: name.to_string(),
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
