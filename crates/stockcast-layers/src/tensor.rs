#![allow(clippy::needless_range_loop)]
//! Dense row-major tensor used by the layers.
//!
//! Only the handful of operations the recurrent and dense layers need are
//! provided; everything is `f32` and single threaded.

use serde::{Deserialize, Serialize};

use crate::error::LayerError;

/// A multi-dimensional array stored in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    /// The shape of the tensor (dimensions)
    shape: Vec<usize>,
    /// The underlying data in row-major order
    data: Vec<f32>,
}

impl Tensor {
    /// Creates a new tensor with the given shape, filled with zeros.
    ///
    /// # Example
    ///
    /// ```
    /// use stockcast_layers::tensor::Tensor;
    ///
    /// let t = Tensor::zeros(&[2, 3]);
    /// assert_eq!(t.shape(), &[2, 3]);
    /// assert_eq!(t.numel(), 6);
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        let numel: usize = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            data: vec![0.0; numel],
        }
    }

    /// Creates a new tensor with the given shape, filled with ones.
    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, 1.0)
    }

    /// Creates a new tensor with every element set to `value`.
    pub fn full(shape: &[usize], value: f32) -> Self {
        let numel: usize = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            data: vec![value; numel],
        }
    }

    /// Creates a new tensor with the given shape and data.
    ///
    /// # Panics
    ///
    /// Panics if the data length doesn't match the shape. Use
    /// [`Tensor::try_from_data`] for untrusted input.
    pub fn from_data(shape: &[usize], data: Vec<f32>) -> Self {
        let numel: usize = shape.iter().product();
        assert_eq!(
            data.len(),
            numel,
            "Data length {} doesn't match shape {:?} (expected {})",
            data.len(),
            shape,
            numel
        );
        Self {
            shape: shape.to_vec(),
            data,
        }
    }

    /// Creates a tensor, returning an error if the data length doesn't match the shape.
    pub fn try_from_data(shape: &[usize], data: Vec<f32>) -> Result<Self, LayerError> {
        let numel: usize = shape.iter().product();
        if data.len() != numel {
            return Err(LayerError::ShapeMismatch {
                expected: vec![numel],
                actual: vec![data.len()],
            });
        }
        Ok(Self {
            shape: shape.to_vec(),
            data,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Matrix multiplication of two 2D tensors.
    ///
    /// # Panics
    ///
    /// Panics if either tensor is not 2D or the inner dimensions differ.
    pub fn matmul(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.ndim(), 2, "matmul requires 2D tensors");
        assert_eq!(other.ndim(), 2, "matmul requires 2D tensors");
        let (m, k) = (self.shape[0], self.shape[1]);
        let (k2, n) = (other.shape[0], other.shape[1]);
        assert_eq!(k, k2, "Inner dimensions must match: {} vs {}", k, k2);

        let mut result = vec![0.0; m * n];
        for i in 0..m {
            let row = &self.data[i * k..(i + 1) * k];
            let out = &mut result[i * n..(i + 1) * n];
            for (p, &a) in row.iter().enumerate() {
                if a == 0.0 {
                    continue;
                }
                let other_row = &other.data[p * n..(p + 1) * n];
                for j in 0..n {
                    out[j] += a * other_row[j];
                }
            }
        }
        Tensor::from_data(&[m, n], result)
    }

    /// Transposes a 2D tensor.
    pub fn transpose(&self) -> Tensor {
        assert_eq!(self.ndim(), 2, "transpose requires a 2D tensor");
        let (m, n) = (self.shape[0], self.shape[1]);
        let mut result = vec![0.0; m * n];
        for i in 0..m {
            for j in 0..n {
                result[j * m + i] = self.data[i * n + j];
            }
        }
        Tensor::from_data(&[n, m], result)
    }

    /// Element-wise addition. A 1D `other` whose length equals the last
    /// dimension of `self` is broadcast across rows (bias addition).
    pub fn add(&self, other: &Tensor) -> Tensor {
        if self.shape == other.shape {
            let data = self
                .data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| a + b)
                .collect();
            return Tensor::from_data(&self.shape, data);
        }
        let cols = *self.shape.last().unwrap_or(&1);
        assert!(
            other.ndim() == 1 && other.shape[0] == cols,
            "Cannot broadcast {:?} onto {:?}",
            other.shape,
            self.shape
        );
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(i, a)| a + other.data[i % cols])
            .collect();
        Tensor::from_data(&self.shape, data)
    }

    /// In-place element-wise accumulation of a tensor with the same shape.
    pub fn add_assign(&mut self, other: &Tensor) {
        assert_eq!(self.shape, other.shape, "add_assign shape mismatch");
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
    }

    /// Element-wise subtraction of a tensor with the same shape.
    pub fn sub(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.shape, other.shape, "sub shape mismatch");
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a - b)
            .collect();
        Tensor::from_data(&self.shape, data)
    }

    /// Element-wise multiplication of a tensor with the same shape.
    pub fn mul(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.shape, other.shape, "mul shape mismatch");
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a * b)
            .collect();
        Tensor::from_data(&self.shape, data)
    }

    pub fn scale(&self, factor: f32) -> Tensor {
        self.map(|x| x * factor)
    }

    /// Applies `f` to every element.
    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> Tensor {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            0.0
        } else {
            self.sum() / self.data.len() as f32
        }
    }

    /// Sums a 2D tensor over its rows, producing a 1D tensor of column sums.
    pub fn sum_rows(&self) -> Tensor {
        assert_eq!(self.ndim(), 2, "sum_rows requires a 2D tensor");
        let (m, n) = (self.shape[0], self.shape[1]);
        let mut result = vec![0.0; n];
        for i in 0..m {
            for j in 0..n {
                result[j] += self.data[i * n + j];
            }
        }
        Tensor::from_data(&[n], result)
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }
}
