//! Dense (fully connected) layer implementation.
//!
//! This module provides the [`Dense`] layer, which computes
//! `y = activation(xW + b)`.

use rand::Rng;

use crate::activation::ActivationType;
use crate::error::LayerError;
use crate::initializer::Initializer;
use crate::layer::Layer;
use crate::tensor::Tensor;

/// A dense (fully connected) neural network layer.
///
/// - `x` is the input tensor of shape `[batch_size, in_features]`
/// - `W` is the weight matrix of shape `[in_features, out_features]`
/// - `b` is the bias vector of shape `[out_features]`
/// - `y` is the output tensor of shape `[batch_size, out_features]`
#[derive(Debug, Clone)]
pub struct Dense {
    /// Weight matrix of shape [in_features, out_features]
    weights: Tensor,
    /// Bias vector of shape [out_features]
    bias: Tensor,
    activation: ActivationType,
    /// Gradient of weights
    weights_grad: Option<Tensor>,
    /// Gradient of bias
    bias_grad: Option<Tensor>,
    /// Cached input for backward pass
    cached_input: Option<Tensor>,
    /// Cached pre-activation for backward pass
    cached_pre_activation: Option<Tensor>,
    in_features: usize,
    out_features: usize,
}

impl Dense {
    /// Creates a dense layer with Glorot uniform weights and zero bias.
    pub fn new<R: Rng + ?Sized>(
        in_features: usize,
        out_features: usize,
        activation: ActivationType,
        rng: &mut R,
    ) -> Self {
        let weights = Initializer::GlorotUniform.initialize(&[in_features, out_features], rng);
        let bias = Initializer::Zeros.initialize(&[out_features], rng);
        Self {
            weights,
            bias,
            activation,
            weights_grad: None,
            bias_grad: None,
            cached_input: None,
            cached_pre_activation: None,
            in_features,
            out_features,
        }
    }

    /// Creates a dense layer with custom weights and bias.
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes are incompatible
    pub fn from_weights(
        weights: Tensor,
        bias: Tensor,
        activation: ActivationType,
    ) -> Result<Self, LayerError> {
        if weights.ndim() != 2 || bias.ndim() != 1 || weights.shape()[1] != bias.shape()[0] {
            return Err(LayerError::ShapeMismatch {
                expected: weights.shape().get(1).map(|n| vec![*n]).unwrap_or_default(),
                actual: bias.shape().to_vec(),
            });
        }
        let in_features = weights.shape()[0];
        let out_features = weights.shape()[1];
        Ok(Self {
            weights,
            bias,
            activation,
            weights_grad: None,
            bias_grad: None,
            cached_input: None,
            cached_pre_activation: None,
            in_features,
            out_features,
        })
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }

    pub fn activation(&self) -> ActivationType {
        self.activation
    }

    pub fn weights(&self) -> &Tensor {
        &self.weights
    }

    pub fn bias(&self) -> &Tensor {
        &self.bias
    }

    fn check_input(&self, input: &Tensor) -> Result<(), LayerError> {
        if input.ndim() != 2 {
            return Err(LayerError::ForwardError {
                message: format!("Dense expects 2D input, got {}D", input.ndim()),
            });
        }
        if input.shape()[1] != self.in_features {
            return Err(LayerError::InvalidInputDimension {
                expected: self.in_features,
                actual: input.shape()[1],
            });
        }
        Ok(())
    }

    fn pre_activation(&self, input: &Tensor) -> Tensor {
        input.matmul(&self.weights).add(&self.bias)
    }
}

impl Layer for Dense {
    fn forward(&self, input: &Tensor) -> Result<Tensor, LayerError> {
        self.check_input(input)?;
        Ok(self.activation.apply(&self.pre_activation(input)))
    }

    fn forward_train(&mut self, input: &Tensor) -> Result<Tensor, LayerError> {
        self.check_input(input)?;
        let z = self.pre_activation(input);
        let output = self.activation.apply(&z);
        self.cached_input = Some(input.clone());
        self.cached_pre_activation = Some(z);
        Ok(output)
    }

    fn backward(&mut self, grad: &Tensor) -> Result<Tensor, LayerError> {
        let input = self
            .cached_input
            .as_ref()
            .ok_or(LayerError::NotInitialized)?;
        let z = self
            .cached_pre_activation
            .as_ref()
            .ok_or(LayerError::NotInitialized)?;
        if grad.shape() != z.shape() {
            return Err(LayerError::ShapeMismatch {
                expected: z.shape().to_vec(),
                actual: grad.shape().to_vec(),
            });
        }

        let grad_z = self.activation.backward(z, grad);
        // dW = x^T * dz, db = sum(dz), dx = dz * W^T
        self.weights_grad = Some(input.transpose().matmul(&grad_z));
        self.bias_grad = Some(grad_z.sum_rows());
        Ok(grad_z.matmul(&self.weights.transpose()))
    }

    fn parameters(&self) -> Vec<&Tensor> {
        vec![&self.weights, &self.bias]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        vec![&mut self.weights, &mut self.bias]
    }

    fn gradients(&self) -> Vec<Option<&Tensor>> {
        vec![self.weights_grad.as_ref(), self.bias_grad.as_ref()]
    }

    fn parameter_names(&self) -> Vec<&'static str> {
        vec!["kernel", "bias"]
    }

    fn name(&self) -> &str {
        "Dense"
    }
}
