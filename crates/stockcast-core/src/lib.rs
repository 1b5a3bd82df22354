//! Shared types for the stockcast forecasting pipeline.
//!
//! This crate sits below every other stockcast crate and provides:
//!
//! - **Errors**: the four error families (data, configuration, state,
//!   training) and the [`StockcastError`] umbrella.
//! - **Configuration**: [`PipelineConfig`], the value object threaded
//!   through one pipeline run.
//! - **Layer specs**: [`LayerSpec`], the declarative layer-description
//!   language consumed by the architecture builder.
//!
//! # Example
//!
//! ```
//! use stockcast_core::{LayerSpec, PipelineConfig};
//!
//! let mut config = PipelineConfig::default();
//! config.model.layers = vec![LayerSpec::recurrent(16, false), LayerSpec::dense(1, None)];
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod error;
pub mod layer_spec;

pub use config::{
    EarlyStoppingConfig, LossFunction, PipelineConfig, PredictionConfig, TrainingConfig,
};
pub use error::{
    ConfigurationError, DataError, ErrorKind, Result, StateError, StockcastError, TrainingError,
};
pub use layer_spec::{LayerSpec, ModelArchitecture};
