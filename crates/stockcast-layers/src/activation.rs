//! Activation functions used by dense layers and LSTM gates.

use serde::{Deserialize, Serialize};

use crate::tensor::Tensor;

/// Activation function types accepted by dense layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ActivationType {
    /// Rectified Linear Unit
    ReLU,
    /// Sigmoid function
    Sigmoid,
    /// Hyperbolic tangent
    Tanh,
    /// Gaussian Error Linear Unit
    GELU,
    /// No activation (identity)
    #[default]
    Linear,
}

impl ActivationType {
    /// Names accepted by [`ActivationType::from_name`].
    pub const ALLOWED: [&'static str; 5] = ["relu", "sigmoid", "tanh", "gelu", "linear"];

    /// Resolves an activation by name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "relu" => Some(Self::ReLU),
            "sigmoid" => Some(Self::Sigmoid),
            "tanh" => Some(Self::Tanh),
            "gelu" => Some(Self::GELU),
            "linear" => Some(Self::Linear),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ReLU => "relu",
            Self::Sigmoid => "sigmoid",
            Self::Tanh => "tanh",
            Self::GELU => "gelu",
            Self::Linear => "linear",
        }
    }

    /// Applies the activation element-wise.
    pub fn apply(&self, input: &Tensor) -> Tensor {
        match self {
            Self::Linear => input.clone(),
            _ => input.map(|x| self.apply_scalar(x)),
        }
    }

    pub fn apply_scalar(&self, x: f32) -> f32 {
        match self {
            Self::ReLU => x.max(0.0),
            Self::Sigmoid => sigmoid(x),
            Self::Tanh => x.tanh(),
            Self::GELU => {
                let inner = SQRT_2_OVER_PI * (x + GELU_COEF * x * x * x);
                0.5 * x * (1.0 + inner.tanh())
            }
            Self::Linear => x,
        }
    }

    /// Multiplies `grad` by the activation derivative at pre-activation `x`.
    pub fn backward(&self, pre_activation: &Tensor, grad: &Tensor) -> Tensor {
        match self {
            Self::Linear => grad.clone(),
            _ => grad.mul(&pre_activation.map(|x| self.derivative(x))),
        }
    }

    fn derivative(&self, x: f32) -> f32 {
        match self {
            Self::ReLU => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Sigmoid => {
                let y = sigmoid(x);
                y * (1.0 - y)
            }
            Self::Tanh => {
                let y = x.tanh();
                1.0 - y * y
            }
            Self::GELU => {
                let inner = SQRT_2_OVER_PI * (x + GELU_COEF * x * x * x);
                let tanh_inner = inner.tanh();
                let sech2 = 1.0 - tanh_inner * tanh_inner;
                let d_inner = SQRT_2_OVER_PI * (1.0 + 3.0 * GELU_COEF * x * x);
                0.5 * (1.0 + tanh_inner) + 0.5 * x * sech2 * d_inner
            }
            Self::Linear => 1.0,
        }
    }
}

/// sqrt(2/pi)
const SQRT_2_OVER_PI: f32 = 0.797_884_6;
const GELU_COEF: f32 = 0.044715;

pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
