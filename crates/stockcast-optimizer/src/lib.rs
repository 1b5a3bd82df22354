//! Parameter update rules for stockcast models.
//!
//! An optimizer implements the [`Optimizer`] trait and owns the state for
//! exactly one flat parameter buffer. A model with several weight tensors
//! uses one optimizer per tensor.
//!
//! [`Adam`] is the update rule used by the training runner.
//!
//! # Example
//!
//! ```
//! use stockcast_optimizer::{Adam, Optimizer, OptimizerConfig};
//!
//! let mut optimizer = Adam::new(OptimizerConfig::adam(0.01)).unwrap();
//!
//! let mut weights = vec![1.0, 2.0, 3.0];
//! let gradients = vec![0.1, 0.2, 0.3];
//!
//! optimizer.apply_gradients(&mut weights, &gradients);
//! assert!(weights[0] < 1.0);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod adam;

pub use adam::Adam;

/// Errors that can occur when working with optimizers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptimizerError {
    /// Invalid configuration parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Adam hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Learning rate for gradient updates.
    pub learning_rate: f32,
    /// Exponential decay rate for first moment estimates.
    pub beta1: f32,
    /// Exponential decay rate for second moment estimates.
    pub beta2: f32,
    /// Small constant for numerical stability.
    pub epsilon: f32,
}

impl OptimizerConfig {
    /// Adam with the usual moment decay rates and `epsilon = 1e-7`.
    pub fn adam(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
        }
    }

    /// Checks that every hyperparameter is in range.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::InvalidParameter`] naming the first bad value.
    pub fn validate(&self) -> Result<(), OptimizerError> {
        let lr = self.learning_rate;
        if !(lr.is_finite() && lr > 0.0) {
            return Err(OptimizerError::InvalidParameter(format!(
                "learning_rate must be positive and finite, got {}",
                lr
            )));
        }
        for (name, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(OptimizerError::InvalidParameter(format!(
                    "{} must be in [0, 1), got {}",
                    name, beta
                )));
            }
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(OptimizerError::InvalidParameter(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Trait for parameter optimizers.
///
/// Optimizers update one parameter buffer in place from its gradient.
pub trait Optimizer: Sized {
    /// Creates a new optimizer from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::InvalidParameter`] if a hyperparameter is
    /// out of range.
    fn new(config: OptimizerConfig) -> Result<Self, OptimizerError>;

    /// Applies gradients to update the parameters in place.
    ///
    /// `parameters` and `gradients` must have the same length.
    fn apply_gradients(&mut self, parameters: &mut [f32], gradients: &[f32]);

    /// Returns a reference to the optimizer's configuration.
    fn config(&self) -> &OptimizerConfig;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adam_defaults() {
        let config = OptimizerConfig::adam(0.005);
        assert!((config.learning_rate - 0.005).abs() < 1e-9);
        assert_eq!(config.epsilon, 1e-7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(OptimizerConfig::adam(0.0).validate().is_err());
        assert!(OptimizerConfig::adam(f32::NAN).validate().is_err());
        let bad_beta = OptimizerConfig {
            beta1: 1.0,
            ..OptimizerConfig::adam(0.001)
        };
        assert!(matches!(
            bad_beta.validate(),
            Err(OptimizerError::InvalidParameter(msg)) if msg.contains("beta1")
        ));
        let bad_epsilon = OptimizerConfig {
            epsilon: 0.0,
            ..OptimizerConfig::adam(0.001)
        };
        assert!(bad_epsilon.validate().is_err());
    }

    #[test]
    fn test_optimizer_config_serialization() {
        let config = OptimizerConfig::adam(0.001);
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: OptimizerConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }
}
