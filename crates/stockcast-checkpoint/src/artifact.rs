//! The serialized result of one training run.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use stockcast_core::PipelineConfig;
use stockcast_data::{Scaler, ScalerParams};
use stockcast_layers::{ArchitectureBuilder, Sequential, Tensor};
use stockcast_training::LossHistory;

use crate::{CheckpointError, Result};

/// Current `artifact.json` format version.
pub const FORMAT_VERSION: u32 = 1;

/// Everything needed to reproduce a trained model's predictions.
///
/// The model is stored as its configuration (layer list and window size)
/// plus named parameter tensors. The scaler parameters travel with it so
/// inference never refits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingArtifact {
    pub format_version: u32,
    pub created_at: NaiveDateTime,
    pub config: PipelineConfig,
    pub scaler: ScalerParams,
    pub history: LossHistory,
    /// Parameters keyed as `<layer>/<parameter>`.
    pub parameters: BTreeMap<String, Tensor>,
}

impl TrainingArtifact {
    /// Captures a trained model.
    ///
    /// `config.model.layers` and `config.window_size` must be the ones the
    /// model was built from.
    pub fn new(
        config: PipelineConfig,
        scaler: ScalerParams,
        history: LossHistory,
        model: &Sequential,
        created_at: NaiveDateTime,
    ) -> Self {
        let parameters = model
            .named_parameters()
            .into_iter()
            .map(|(name, tensor)| (name, tensor.clone()))
            .collect();
        Self {
            format_version: FORMAT_VERSION,
            created_at,
            config,
            scaler,
            history,
            parameters,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.config.model.name
    }

    /// Rebuilds the model from the stored layer list and restores its
    /// parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::Corrupted`] if the stored layer list is
    /// invalid or a parameter is missing or has the wrong shape.
    pub fn rebuild_model(&self) -> Result<Sequential> {
        let mut model = ArchitectureBuilder::new()
            .with_seed(self.config.training.seed)
            .build(&self.config.model.layers, self.config.window_size)
            .map_err(|e| CheckpointError::Corrupted(format!("stored architecture: {}", e)))?;
        model
            .load_parameters(&self.parameters)
            .map_err(|e| CheckpointError::Corrupted(format!("stored parameters: {}", e)))?;
        Ok(model)
    }

    /// The fitted scaler, restored without refitting.
    pub fn scaler(&self) -> Result<Scaler> {
        Scaler::from_params(self.scaler)
            .map_err(|e| CheckpointError::Corrupted(format!("stored scaler: {}", e)))
    }
}
