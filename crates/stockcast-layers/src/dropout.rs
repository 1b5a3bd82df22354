//! Inverted dropout.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::LayerError;
use crate::layer::Layer;
use crate::tensor::Tensor;

/// Zeroes each element with probability `rate` during training and scales
/// the survivors by `1 / (1 - rate)`. Inference is the identity.
#[derive(Debug, Clone)]
pub struct Dropout {
    rate: f32,
    rng: StdRng,
    /// Scaled keep mask of the last training pass
    cached_mask: Option<Tensor>,
}

impl Dropout {
    /// `rate` must lie in `(0, 1)`; the architecture builder enforces this.
    pub fn new(rate: f32, seed: u64) -> Self {
        Self {
            rate,
            rng: StdRng::seed_from_u64(seed),
            cached_mask: None,
        }
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }
}

impl Layer for Dropout {
    fn forward(&self, input: &Tensor) -> Result<Tensor, LayerError> {
        Ok(input.clone())
    }

    fn forward_train(&mut self, input: &Tensor) -> Result<Tensor, LayerError> {
        let keep = 1.0 - self.rate;
        let scale = 1.0 / keep;
        let mask_data: Vec<f32> = (0..input.numel())
            .map(|_| {
                if self.rng.gen::<f32>() < keep {
                    scale
                } else {
                    0.0
                }
            })
            .collect();
        let mask = Tensor::from_data(input.shape(), mask_data);
        let output = input.mul(&mask);
        self.cached_mask = Some(mask);
        Ok(output)
    }

    fn backward(&mut self, grad: &Tensor) -> Result<Tensor, LayerError> {
        let mask = self.cached_mask.as_ref().ok_or(LayerError::NotInitialized)?;
        if mask.shape() != grad.shape() {
            return Err(LayerError::ShapeMismatch {
                expected: mask.shape().to_vec(),
                actual: grad.shape().to_vec(),
            });
        }
        Ok(grad.mul(mask))
    }

    fn parameters(&self) -> Vec<&Tensor> {
        vec![]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        vec![]
    }

    fn name(&self) -> &str {
        "Dropout"
    }
}
