//! Writes run directories.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use stockcast_layers::Sequential;
use tracing::{debug, info};

use crate::artifact::TrainingArtifact;
use crate::card::render_model_card;
use crate::{CheckpointError, Result, ARTIFACT_FILE, HISTORY_FILE, MODEL_CARD_FILE};

/// Timestamp suffix format of run directories.
pub(crate) const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Directory name `<model name>_<YYYYmmdd-HHMMSS>` for a run.
///
/// Characters other than ASCII alphanumerics, `-`, `_` and `.` in the model
/// name are replaced with `-`.
pub fn run_dir_name(model_name: &str, created_at: &NaiveDateTime) -> String {
    let name: String = model_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let name = if name.is_empty() { "model".to_string() } else { name };
    format!("{}_{}", name, created_at.format(RUN_TIMESTAMP_FORMAT))
}

/// Saves artifacts under a model directory.
///
/// # Examples
///
/// ```no_run
/// # fn demo(artifact: stockcast_checkpoint::TrainingArtifact, model: stockcast_layers::Sequential) -> stockcast_checkpoint::Result<()> {
/// use stockcast_checkpoint::ArtifactWriter;
///
/// let run_dir = ArtifactWriter::new("models").write(&artifact, &model)?;
/// println!("saved to {}", run_dir.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    model_dir: PathBuf,
    /// Whether to pretty-print `artifact.json`.
    pretty: bool,
}

impl ArtifactWriter {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            pretty: true,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Writes a new run directory and returns its path.
    ///
    /// The loss table and model card are written first and `artifact.json`
    /// last, so a directory without `artifact.json` is an incomplete run.
    ///
    /// # Errors
    ///
    /// Fails with [`CheckpointError::Io`] if the run directory already
    /// exists or any file cannot be written.
    pub fn write(&self, artifact: &TrainingArtifact, model: &Sequential) -> Result<PathBuf> {
        let name = run_dir_name(artifact.model_name(), &artifact.created_at);
        let run_dir = self.model_dir.join(&name);
        info!(path = %run_dir.display(), "saving training artifact");

        fs::create_dir_all(&self.model_dir).map_err(CheckpointError::io(&self.model_dir))?;
        fs::create_dir(&run_dir).map_err(CheckpointError::io(&run_dir))?;

        write_history(&run_dir.join(HISTORY_FILE), artifact)?;

        let card = render_model_card(artifact, &name, &model.summary())?;
        let card_path = run_dir.join(MODEL_CARD_FILE);
        fs::write(&card_path, card).map_err(CheckpointError::io(&card_path))?;

        let json = if self.pretty {
            serde_json::to_string_pretty(artifact)
        } else {
            serde_json::to_string(artifact)
        }
        .map_err(CheckpointError::Serialization)?;
        let artifact_path = run_dir.join(ARTIFACT_FILE);
        fs::write(&artifact_path, json).map_err(CheckpointError::io(&artifact_path))?;

        debug!(
            path = %artifact_path.display(),
            size = fs::metadata(&artifact_path).map(|m| m.len()).unwrap_or(0),
            parameters = artifact.parameters.len(),
            "artifact written"
        );
        info!(path = %run_dir.display(), epochs = artifact.history.len(), "training artifact saved");
        Ok(run_dir)
    }
}

fn write_history(path: &Path, artifact: &TrainingArtifact) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["epoch", "train_loss", "val_loss"])?;
    for (epoch, train, val) in artifact.history.rows() {
        writer.write_record(&[epoch.to_string(), train.to_string(), val.to_string()])?;
    }
    writer.flush().map_err(CheckpointError::io(path))?;
    Ok(())
}
