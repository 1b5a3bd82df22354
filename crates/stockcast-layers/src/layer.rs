//! Layer trait definition for neural network layers.
//!
//! This module defines the core [`Layer`] trait that every layer of a
//! [`Sequential`](crate::sequential::Sequential) model implements.

use crate::error::LayerError;
use crate::tensor::Tensor;

/// A neural network layer that supports forward and backward propagation.
///
/// Each layer must be able to:
/// - Perform a forward pass to compute outputs from inputs
/// - Perform a training forward pass that caches what backward needs
/// - Perform a backward pass to compute gradients
/// - Expose its learnable parameters and their gradients
///
/// # Example
///
/// ```
/// use stockcast_layers::activation::ActivationType;
/// use stockcast_layers::dense::Dense;
/// use stockcast_layers::layer::Layer;
/// use stockcast_layers::tensor::Tensor;
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let layer = Dense::new(16, 4, ActivationType::ReLU, &mut rng);
/// let input = Tensor::zeros(&[8, 16]); // batch of 8
/// let output = layer.forward(&input).unwrap();
/// assert_eq!(output.shape(), &[8, 4]);
/// ```
pub trait Layer: Send + Sync {
    /// Performs an inference forward pass.
    ///
    /// # Errors
    ///
    /// Returns a [`LayerError`] if the input shape is incompatible with the layer
    fn forward(&self, input: &Tensor) -> Result<Tensor, LayerError>;

    /// Performs a training forward pass, caching intermediate values for
    /// [`Layer::backward`].
    fn forward_train(&mut self, input: &Tensor) -> Result<Tensor, LayerError> {
        self.forward(input)
    }

    /// Takes the gradient of the loss with respect to the layer's output
    /// and returns the gradient with respect to its input. Parameter
    /// gradients are stored in the layer.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::NotInitialized`] if no training forward pass ran
    fn backward(&mut self, grad: &Tensor) -> Result<Tensor, LayerError>;

    /// Returns references to the layer's learnable parameters.
    fn parameters(&self) -> Vec<&Tensor>;

    /// Returns mutable references to the layer's learnable parameters.
    fn parameters_mut(&mut self) -> Vec<&mut Tensor>;

    /// Gradients from the last backward pass, aligned with [`Layer::parameters`].
    fn gradients(&self) -> Vec<Option<&Tensor>> {
        Vec::new()
    }

    /// Names of the parameters, aligned with [`Layer::parameters`].
    fn parameter_names(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Returns the name of the layer for summaries and logging.
    fn name(&self) -> &str {
        "Layer"
    }

    /// Total number of learnable scalars.
    fn num_parameters(&self) -> usize {
        self.parameters().iter().map(|p| p.numel()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockLayer {
        weight: Tensor,
        grad: Option<Tensor>,
    }

    impl Layer for MockLayer {
        fn forward(&self, input: &Tensor) -> Result<Tensor, LayerError> {
            Ok(input.clone())
        }

        fn backward(&mut self, grad: &Tensor) -> Result<Tensor, LayerError> {
            self.grad = Some(Tensor::ones(self.weight.shape()));
            Ok(grad.clone())
        }

        fn parameters(&self) -> Vec<&Tensor> {
            vec![&self.weight]
        }

        fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
            vec![&mut self.weight]
        }

        fn gradients(&self) -> Vec<Option<&Tensor>> {
            vec![self.grad.as_ref()]
        }

        fn name(&self) -> &str {
            "MockLayer"
        }
    }

    #[test]
    fn test_layer_trait() {
        let mut layer = MockLayer {
            weight: Tensor::zeros(&[10, 10]),
            grad: None,
        };
        let input = Tensor::zeros(&[2, 10]);

        let output = layer.forward_train(&input).unwrap();
        assert_eq!(output.shape(), input.shape());
        assert!(layer.gradients()[0].is_none());

        let input_grad = layer.backward(&Tensor::ones(&[2, 10])).unwrap();
        assert_eq!(input_grad.shape(), &[2, 10]);
        assert!(layer.gradients()[0].is_some());

        assert_eq!(layer.num_parameters(), 100);
        assert_eq!(layer.name(), "MockLayer");
    }
}
