//! Persistence of trained stockcast models.
//!
//! This crate provides functionality for:
//!
//! - **Save**: write a timestamped run directory with the model parameters,
//!   scaler parameters, configuration and loss history
//! - **Restore**: rebuild the exact model and scaler from a run directory
//! - **Lookup**: find the newest run under a model directory
//!
//! # Run Layout
//!
//! ```text
//! models/
//!   LSTM_v1_20240105-093012/
//!     artifact.json      parameters, scaler, config, history
//!     loss_history.csv   epoch,train_loss,val_loss
//!     model_card.md      human-readable summary
//! ```
//!
//! # Example
//!
//! ```no_run
//! use stockcast_checkpoint::ArtifactLoader;
//! use std::path::Path;
//!
//! fn main() -> stockcast_checkpoint::Result<()> {
//!     let run = ArtifactLoader::latest(Path::new("models"))?;
//!     let artifact = ArtifactLoader::load(&run)?;
//!     let model = artifact.rebuild_model()?;
//!     let scaler = artifact.scaler()?;
//!     println!("{}", model.summary());
//!     # let _ = scaler;
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod card;
pub mod loader;
pub mod writer;

pub use artifact::{TrainingArtifact, FORMAT_VERSION};
pub use card::render_model_card;
pub use loader::{parse_run_timestamp, ArtifactLoader};
pub use writer::{run_dir_name, ArtifactWriter};

use std::path::PathBuf;
use stockcast_core::ConfigurationError;
use thiserror::Error;

/// File holding the serialized [`TrainingArtifact`].
pub const ARTIFACT_FILE: &str = "artifact.json";
/// Per-epoch loss table.
pub const HISTORY_FILE: &str = "loss_history.csv";
/// Markdown model card.
pub const MODEL_CARD_FILE: &str = "model_card.md";

/// Errors that can occur during checkpoint operations.
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// I/O error during checkpoint operations.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Run directory or artifact file not found.
    #[error("Checkpoint not found: {0}")]
    NotFound(PathBuf),

    /// Error during serialization.
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Error during deserialization.
    #[error("Deserialization error: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Error writing the loss table.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Artifact format version mismatch.
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version.
        expected: u32,
        /// Found version.
        found: u32,
    },

    /// The stored configuration could not be rendered.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigurationError),

    /// The artifact does not describe a usable model.
    #[error("Corrupted checkpoint: {0}")]
    Corrupted(String),
}

/// Result type for checkpoint operations.
pub type Result<T> = std::result::Result<T, CheckpointError>;

impl CheckpointError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| CheckpointError::Io { path, source }
    }
}
