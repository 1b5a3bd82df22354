//! Error types for the stockcast-layers crate.
//!
//! Architecture problems are reported as
//! [`ConfigurationError::InvalidArchitecture`](stockcast_core::ConfigurationError);
//! this module covers failures of an already built model.

use stockcast_core::TrainingError;
use thiserror::Error;

/// Error type for layer operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayerError {
    /// Shape mismatch between expected and actual tensor shapes.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// The expected shape
        expected: Vec<usize>,
        /// The actual shape that was provided
        actual: Vec<usize>,
    },

    /// Invalid input dimension for the layer.
    #[error("Invalid input dimension: expected {expected}, got {actual}")]
    InvalidInputDimension {
        /// The expected input dimension
        expected: usize,
        /// The actual input dimension
        actual: usize,
    },

    /// Error during forward pass computation.
    #[error("Forward pass error: {message}")]
    ForwardError {
        /// Description of the forward pass error
        message: String,
    },

    /// Layer has not run a training forward pass yet.
    #[error("Layer not initialized: forward pass must be called before backward pass")]
    NotInitialized,

    /// A named parameter is missing or unexpected.
    #[error("Parameter error: {message}")]
    ParameterError {
        /// Description of the parameter problem
        message: String,
    },
}

/// Result type alias for layer operations.
pub type LayerResult<T> = Result<T, LayerError>;

impl From<LayerError> for TrainingError {
    fn from(err: LayerError) -> Self {
        TrainingError::Model {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LayerError::ShapeMismatch {
            expected: vec![32, 60, 1],
            actual: vec![32, 30, 1],
        };
        assert!(err.to_string().contains("Shape mismatch"));

        let err = LayerError::InvalidInputDimension {
            expected: 64,
            actual: 128,
        };
        assert!(err.to_string().contains("Invalid input dimension"));

        let err = LayerError::NotInitialized;
        assert!(err.to_string().contains("not initialized"));
    }

    #[test]
    fn test_into_training_error() {
        let err: TrainingError = LayerError::NotInitialized.into();
        assert!(matches!(err, TrainingError::Model { .. }));
    }
}
