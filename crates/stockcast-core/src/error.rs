//! Error types shared by every stockcast crate.
//!
//! Errors are grouped in four families. Each family is its own enum so a
//! component can declare exactly which failures it produces, and all of
//! them convert into [`StockcastError`] for callers that do not care.

use chrono::NaiveDate;
use thiserror::Error;

/// The shape of the input data does not support the requested operation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataError {
    /// A date range selected zero rows.
    #[error("Empty range: no observations between {start} and {end}")]
    EmptyRange {
        /// Human readable lower bound of the range
        start: String,
        /// Human readable upper bound of the range
        end: String,
    },

    /// Not enough rows to build a window.
    #[error("Insufficient data: need at least {required} observations, got {available}")]
    InsufficientData {
        /// Minimum number of rows the operation needs
        required: usize,
        /// Number of rows that were supplied
        available: usize,
    },

    /// Timestamps are not strictly increasing.
    #[error("Non-monotonic timestamps: {current} at row {index} does not follow {previous}")]
    NonMonotonicTimestamps {
        /// Row index of the offending observation
        index: usize,
        /// Timestamp of the preceding row
        previous: NaiveDate,
        /// Timestamp of the offending row
        current: NaiveDate,
    },

    /// A value is NaN or infinite.
    #[error("Non-finite value {value} at {date}")]
    NonFiniteValue {
        /// Timestamp of the offending row
        date: NaiveDate,
        /// The offending value
        value: f64,
    },

    /// The reference range has identical min and max, so scaling divides by zero.
    #[error("Degenerate range: min and max are both {value}")]
    DegenerateRange {
        /// The constant value of the range
        value: f64,
    },

    /// A partition that the pipeline needs is empty.
    #[error("Empty partition: the {partition} partition has no rows")]
    EmptyPartition {
        /// Name of the empty partition
        partition: String,
    },

    /// A required column is absent from the input table.
    #[error("Missing column: {column}")]
    MissingColumn {
        /// The column that was looked up
        column: String,
    },

    /// A cell could not be parsed.
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number in the source
        line: u64,
        /// Description of the failure
        message: String,
    },

    /// The series source could not be read.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the failure
        message: String,
    },
}

/// The caller supplied an invalid configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    /// A layer list cannot be built into a model.
    #[error("Invalid architecture at layer {index}: {reason}")]
    InvalidArchitecture {
        /// Position of the offending layer in the list
        index: usize,
        /// Why the layer was rejected
        reason: String,
    },

    /// Two dates are in the wrong order.
    #[error("Invalid range: {start} must be before {end}")]
    InvalidRange {
        /// The date that must come first
        start: NaiveDate,
        /// The date that must come last
        end: NaiveDate,
    },

    /// A hyperparameter that must be positive is not.
    #[error("Non-positive value for {name}")]
    NonPositive {
        /// Name of the hyperparameter
        name: String,
    },

    /// Any other rejected value.
    #[error("Invalid value for {name}: {message}")]
    InvalidValue {
        /// Name of the setting
        name: String,
        /// Description of the problem
        message: String,
    },
}

/// A stateful component was used out of order.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    /// The scaler was used before `fit`.
    #[error("Scaler not fitted: call fit before transform or inverse_transform")]
    NotFitted,

    /// The scaler was fit a second time and the new parameters disagree.
    #[error("Conflicting fit: scaler already fitted with min={fitted_min}, max={fitted_max}; refit produced min={min}, max={max}")]
    ConflictingFit {
        /// Previously fitted minimum
        fitted_min: f64,
        /// Previously fitted maximum
        fitted_max: f64,
        /// Minimum produced by the rejected refit
        min: f64,
        /// Maximum produced by the rejected refit
        max: f64,
    },
}

/// Training could not run or did not finish.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrainingError {
    /// The runner received an empty dataset.
    #[error("Empty dataset: the {partition} set has no windows")]
    EmptyDataset {
        /// Which set was empty (`train` or `validation`)
        partition: String,
    },

    /// The run was stopped from outside before it completed.
    #[error("Training interrupted after {completed_epochs} epochs")]
    Interrupted {
        /// Number of fully completed epochs
        completed_epochs: usize,
    },

    /// The loss became NaN or infinite.
    #[error("Training diverged at epoch {epoch}: loss is {loss}")]
    Diverged {
        /// 1-based epoch at which the loss stopped being finite
        epoch: usize,
        /// The offending loss value
        loss: f64,
    },

    /// The model failed during a forward or backward pass.
    #[error("Model error: {message}")]
    Model {
        /// Description of the failure
        message: String,
    },
}

/// Error family, used by callers that only need to classify a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`DataError`].
    Data,
    /// See [`ConfigurationError`].
    Configuration,
    /// See [`StateError`].
    State,
    /// See [`TrainingError`].
    Training,
}

/// Any error produced by the stockcast pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StockcastError {
    /// Data error.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Configuration error.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// State error.
    #[error(transparent)]
    State(#[from] StateError),

    /// Training error.
    #[error(transparent)]
    Training(#[from] TrainingError),
}

impl StockcastError {
    /// Returns the family of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StockcastError::Data(_) => ErrorKind::Data,
            StockcastError::Configuration(_) => ErrorKind::Configuration,
            StockcastError::State(_) => ErrorKind::State,
            StockcastError::Training(_) => ErrorKind::Training,
        }
    }
}

/// A specialized Result type for stockcast operations.
pub type Result<T> = std::result::Result<T, StockcastError>;
