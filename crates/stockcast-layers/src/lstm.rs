//! Long short-term memory recurrent layer.
//!
//! Gate layout in the fused kernels is `[input, forget, cell, output]`:
//!
//! ```text
//! z_t = x_t K + h_{t-1} R + b
//! i = sigmoid(z_i)   f = sigmoid(z_f)   g = tanh(z_g)   o = sigmoid(z_o)
//! c_t = f * c_{t-1} + i * g
//! h_t = o * tanh(c_t)
//! ```
//!
//! Gradients are computed with full backpropagation through time over the
//! window.

use rand::Rng;

use crate::activation::sigmoid;
use crate::error::LayerError;
use crate::initializer::Initializer;
use crate::layer::Layer;
use crate::tensor::Tensor;

/// Values saved from one time step of a training forward pass.
#[derive(Debug, Clone)]
struct StepCache {
    /// `[batch, input_size]`
    x: Tensor,
    /// `[batch, units]`
    h_prev: Tensor,
    /// `[batch, units]`
    c_prev: Tensor,
    /// Activated gates, `[batch, 4 * units]`
    gates: Tensor,
    /// `[batch, units]`
    c: Tensor,
}

/// An LSTM layer over `[batch, time, features]` input.
///
/// With `return_sequences` the output is `[batch, time, units]`, otherwise
/// only the last hidden state `[batch, units]` is returned.
///
/// # Example
///
/// ```
/// use rand::SeedableRng;
/// use stockcast_layers::layer::Layer;
/// use stockcast_layers::lstm::Lstm;
/// use stockcast_layers::tensor::Tensor;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let lstm = Lstm::new(1, 8, false, &mut rng);
/// let out = lstm.forward(&Tensor::zeros(&[4, 10, 1])).unwrap();
/// assert_eq!(out.shape(), &[4, 8]);
/// ```
#[derive(Debug, Clone)]
pub struct Lstm {
    /// Input kernel, `[input_size, 4 * units]`
    kernel: Tensor,
    /// Recurrent kernel, `[units, 4 * units]`
    recurrent_kernel: Tensor,
    /// `[4 * units]`, forget slice starts at 1.0
    bias: Tensor,
    kernel_grad: Option<Tensor>,
    recurrent_kernel_grad: Option<Tensor>,
    bias_grad: Option<Tensor>,
    cache: Vec<StepCache>,
    input_size: usize,
    units: usize,
    return_sequences: bool,
}

impl Lstm {
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        units: usize,
        return_sequences: bool,
        rng: &mut R,
    ) -> Self {
        let kernel = Initializer::GlorotUniform.initialize(&[input_size, 4 * units], rng);
        let recurrent_kernel = Initializer::GlorotUniform.initialize(&[units, 4 * units], rng);
        let mut bias = Tensor::zeros(&[4 * units]);
        for b in &mut bias.data_mut()[units..2 * units] {
            *b = 1.0;
        }
        Self {
            kernel,
            recurrent_kernel,
            bias,
            kernel_grad: None,
            recurrent_kernel_grad: None,
            bias_grad: None,
            cache: Vec::new(),
            input_size,
            units,
            return_sequences,
        }
    }

    pub fn units(&self) -> usize {
        self.units
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn return_sequences(&self) -> bool {
        self.return_sequences
    }

    fn check_input(&self, input: &Tensor) -> Result<(usize, usize), LayerError> {
        if input.ndim() != 3 {
            return Err(LayerError::ForwardError {
                message: format!(
                    "LSTM expects [batch, time, features] input, got {}D",
                    input.ndim()
                ),
            });
        }
        let shape = input.shape();
        if shape[2] != self.input_size {
            return Err(LayerError::InvalidInputDimension {
                expected: self.input_size,
                actual: shape[2],
            });
        }
        if shape[1] == 0 {
            return Err(LayerError::ForwardError {
                message: "LSTM input has no time steps".to_string(),
            });
        }
        Ok((shape[0], shape[1]))
    }

    /// Runs the recurrence, returning the output and per-step caches when
    /// `keep_cache` is set.
    fn run(&self, input: &Tensor, keep_cache: bool) -> Result<(Tensor, Vec<StepCache>), LayerError> {
        let (batch, steps) = self.check_input(input)?;
        let units = self.units;

        let mut h = Tensor::zeros(&[batch, units]);
        let mut c = Tensor::zeros(&[batch, units]);
        let mut caches = Vec::with_capacity(if keep_cache { steps } else { 0 });
        let mut sequence = if self.return_sequences {
            vec![0.0; batch * steps * units]
        } else {
            Vec::new()
        };

        for t in 0..steps {
            let x = time_step(input, t);
            let z = x
                .matmul(&self.kernel)
                .add(&h.matmul(&self.recurrent_kernel))
                .add(&self.bias);

            let mut gates = Tensor::zeros(&[batch, 4 * units]);
            let mut c_next = Tensor::zeros(&[batch, units]);
            let mut h_next = Tensor::zeros(&[batch, units]);
            {
                let zd = z.data();
                let gd = gates.data_mut();
                let cd = c_next.data_mut();
                let c_prev = c.data();
                for r in 0..batch {
                    let row = r * 4 * units;
                    for j in 0..units {
                        let i_g = sigmoid(zd[row + j]);
                        let f_g = sigmoid(zd[row + units + j]);
                        let g_g = zd[row + 2 * units + j].tanh();
                        let o_g = sigmoid(zd[row + 3 * units + j]);
                        gd[row + j] = i_g;
                        gd[row + units + j] = f_g;
                        gd[row + 2 * units + j] = g_g;
                        gd[row + 3 * units + j] = o_g;
                        cd[r * units + j] = f_g * c_prev[r * units + j] + i_g * g_g;
                    }
                }
            }
            {
                let gd = gates.data();
                let cd = c_next.data();
                let hd = h_next.data_mut();
                for r in 0..batch {
                    for j in 0..units {
                        let o_g = gd[r * 4 * units + 3 * units + j];
                        hd[r * units + j] = o_g * cd[r * units + j].tanh();
                    }
                }
            }

            if self.return_sequences {
                let hd = h_next.data();
                for r in 0..batch {
                    let dst = (r * steps + t) * units;
                    sequence[dst..dst + units].copy_from_slice(&hd[r * units..(r + 1) * units]);
                }
            }
            if keep_cache {
                caches.push(StepCache {
                    x,
                    h_prev: h,
                    c_prev: c,
                    gates,
                    c: c_next.clone(),
                });
            }
            h = h_next;
            c = c_next;
        }

        let output = if self.return_sequences {
            Tensor::from_data(&[batch, steps, units], sequence)
        } else {
            h
        };
        Ok((output, caches))
    }
}

/// Extracts `[batch, features]` at time `t` from `[batch, time, features]`.
fn time_step(input: &Tensor, t: usize) -> Tensor {
    let (batch, steps, features) = (input.shape()[0], input.shape()[1], input.shape()[2]);
    let mut data = Vec::with_capacity(batch * features);
    for r in 0..batch {
        let start = (r * steps + t) * features;
        data.extend_from_slice(&input.data()[start..start + features]);
    }
    Tensor::from_data(&[batch, features], data)
}

impl Layer for Lstm {
    fn forward(&self, input: &Tensor) -> Result<Tensor, LayerError> {
        self.run(input, false).map(|(output, _)| output)
    }

    fn forward_train(&mut self, input: &Tensor) -> Result<Tensor, LayerError> {
        let (output, caches) = self.run(input, true)?;
        self.cache = caches;
        Ok(output)
    }

    fn backward(&mut self, grad: &Tensor) -> Result<Tensor, LayerError> {
        if self.cache.is_empty() {
            return Err(LayerError::NotInitialized);
        }
        let steps = self.cache.len();
        let batch = self.cache[0].x.shape()[0];
        let units = self.units;
        let features = self.input_size;

        let expected = if self.return_sequences {
            vec![batch, steps, units]
        } else {
            vec![batch, units]
        };
        if grad.shape() != expected.as_slice() {
            return Err(LayerError::ShapeMismatch {
                expected,
                actual: grad.shape().to_vec(),
            });
        }

        let mut kernel_grad = Tensor::zeros(self.kernel.shape());
        let mut recurrent_grad = Tensor::zeros(self.recurrent_kernel.shape());
        let mut bias_grad = Tensor::zeros(self.bias.shape());
        let mut input_grad = vec![0.0; batch * steps * features];

        let kernel_t = self.kernel.transpose();
        let recurrent_t = self.recurrent_kernel.transpose();
        let mut dh_next = vec![0.0f32; batch * units];
        let mut dc_next = vec![0.0f32; batch * units];

        for t in (0..steps).rev() {
            let step = &self.cache[t];
            let gd = step.gates.data();
            let cd = step.c.data();
            let c_prev = step.c_prev.data();

            let mut dz = Tensor::zeros(&[batch, 4 * units]);
            {
                let dzd = dz.data_mut();
                for r in 0..batch {
                    let row = r * 4 * units;
                    for j in 0..units {
                        let k = r * units + j;
                        let mut dh = dh_next[k];
                        if self.return_sequences {
                            dh += grad.data()[(r * steps + t) * units + j];
                        } else if t == steps - 1 {
                            dh += grad.data()[k];
                        }

                        let i_g = gd[row + j];
                        let f_g = gd[row + units + j];
                        let g_g = gd[row + 2 * units + j];
                        let o_g = gd[row + 3 * units + j];
                        let tc = cd[k].tanh();

                        let d_o = dh * tc;
                        let dc = dc_next[k] + dh * o_g * (1.0 - tc * tc);
                        dc_next[k] = dc * f_g;

                        dzd[row + j] = dc * g_g * i_g * (1.0 - i_g);
                        dzd[row + units + j] = dc * c_prev[k] * f_g * (1.0 - f_g);
                        dzd[row + 2 * units + j] = dc * i_g * (1.0 - g_g * g_g);
                        dzd[row + 3 * units + j] = d_o * o_g * (1.0 - o_g);
                    }
                }
            }

            kernel_grad.add_assign(&step.x.transpose().matmul(&dz));
            recurrent_grad.add_assign(&step.h_prev.transpose().matmul(&dz));
            bias_grad.add_assign(&dz.sum_rows());

            let dx = dz.matmul(&kernel_t);
            for r in 0..batch {
                let dst = (r * steps + t) * features;
                input_grad[dst..dst + features]
                    .copy_from_slice(&dx.data()[r * features..(r + 1) * features]);
            }
            dh_next = dz.matmul(&recurrent_t).into_data();
        }

        self.kernel_grad = Some(kernel_grad);
        self.recurrent_kernel_grad = Some(recurrent_grad);
        self.bias_grad = Some(bias_grad);
        Ok(Tensor::from_data(&[batch, steps, features], input_grad))
    }

    fn parameters(&self) -> Vec<&Tensor> {
        vec![&self.kernel, &self.recurrent_kernel, &self.bias]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        vec![&mut self.kernel, &mut self.recurrent_kernel, &mut self.bias]
    }

    fn gradients(&self) -> Vec<Option<&Tensor>> {
        vec![
            self.kernel_grad.as_ref(),
            self.recurrent_kernel_grad.as_ref(),
            self.bias_grad.as_ref(),
        ]
    }

    fn parameter_names(&self) -> Vec<&'static str> {
        vec!["kernel", "recurrent_kernel", "bias"]
    }

    fn name(&self) -> &str {
        "LSTM"
    }
}
