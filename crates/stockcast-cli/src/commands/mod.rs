//! CLI Command Implementations
//!
//! - [`train`]: fit a model and save a timestamped run
//! - [`predict`]: forecast with a saved run
//! - [`validate`]: configuration and architecture pre-flight

mod predict;
mod train;
mod validate;

pub use predict::PredictCommand;
pub use train::{interrupted_epochs, TrainCommand};
pub use validate::ValidateCommand;
