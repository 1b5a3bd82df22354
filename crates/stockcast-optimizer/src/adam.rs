//! Adam optimizer.
//!
//! Adam (Adaptive Moment Estimation) maintains exponential moving averages
//! of both the gradients (first moment) and squared gradients (second
//! moment), with bias correction for the early steps.
//!
//! # Example
//!
//! ```
//! use stockcast_optimizer::{Optimizer, Adam, OptimizerConfig};
//!
//! let mut adam = Adam::new(OptimizerConfig::adam(0.001)).unwrap();
//! let mut weights = vec![1.0, 2.0, 3.0];
//! adam.apply_gradients(&mut weights, &[0.1, 0.2, 0.3]);
//! ```

use crate::{Optimizer, OptimizerConfig, OptimizerError};
use serde::{Deserialize, Serialize};

/// Adam optimizer with adaptive learning rates and momentum.
///
/// ```text
/// m = beta1 * m + (1 - beta1) * gradient
/// v = beta2 * v + (1 - beta2) * gradient^2
/// m_hat = m / (1 - beta1^t)
/// v_hat = v / (1 - beta2^t)
/// parameter = parameter - learning_rate * m_hat / (sqrt(v_hat) + epsilon)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adam {
    /// First moment estimates (mean of gradients).
    m: Vec<f32>,
    /// Second moment estimates (mean of squared gradients).
    v: Vec<f32>,
    /// Current timestep for bias correction.
    t: u64,
    config: OptimizerConfig,
}

impl Optimizer for Adam {
    fn new(config: OptimizerConfig) -> Result<Self, OptimizerError> {
        config.validate()?;
        Ok(Self {
            m: Vec::new(),
            v: Vec::new(),
            t: 0,
            config,
        })
    }

    fn apply_gradients(&mut self, parameters: &mut [f32], gradients: &[f32]) {
        debug_assert_eq!(parameters.len(), gradients.len());
        if self.m.len() != parameters.len() {
            self.m = vec![0.0; parameters.len()];
            self.v = vec![0.0; parameters.len()];
        }

        let OptimizerConfig {
            learning_rate,
            beta1,
            beta2,
            epsilon,
        } = self.config;
        self.t += 1;
        let t = i32::try_from(self.t).unwrap_or(i32::MAX);
        let bias_correction1 = 1.0 - beta1.powi(t);
        let bias_correction2 = 1.0 - beta2.powi(t);

        for ((p, g), (m, v)) in parameters
            .iter_mut()
            .zip(gradients)
            .zip(self.m.iter_mut().zip(self.v.iter_mut()))
        {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;

            let m_hat = *m / bias_correction1;
            let v_hat = *v / bias_correction2;
            *p -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
        }
    }

    fn config(&self) -> &OptimizerConfig {
        &self.config
    }
}
