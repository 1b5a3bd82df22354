//! Sliding windows over a scaled series.
//!
//! Window `i` covers `scaled[i..i + W]` and its target is `scaled[i + W]`.
//! Windows overlap in their inputs, targets never repeat, and order is kept
//! because time order is the prediction direction.

use stockcast_core::{ConfigurationError, DataError};

/// `N` training windows stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSet {
    window_size: usize,
    /// `N * window_size` values, window after window
    inputs: Vec<f64>,
    targets: Vec<f64>,
}

impl WindowSet {
    /// An empty set with the given window size.
    pub fn empty(window_size: usize) -> Self {
        Self {
            window_size,
            inputs: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Number of windows.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Flat inputs, `len() * window_size()` values.
    pub fn inputs(&self) -> &[f64] {
        &self.inputs
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// Input values of window `index`.
    pub fn window(&self, index: usize) -> Option<&[f64]> {
        let start = index.checked_mul(self.window_size)?;
        self.inputs.get(start..start + self.window_size)
    }

    pub fn target(&self, index: usize) -> Option<f64> {
        self.targets.get(index).copied()
    }

    /// Iterates over `(window, target)` pairs in time order.
    pub fn iter(&self) -> impl Iterator<Item = (&[f64], f64)> + '_ {
        self.inputs
            .chunks_exact(self.window_size.max(1))
            .zip(self.targets.iter().copied())
    }
}

/// Builds training and inference windows of a fixed size.
///
/// # Example
///
/// ```
/// use stockcast_data::WindowBuilder;
///
/// let builder = WindowBuilder::new(3).unwrap();
/// let windows = builder
///     .build_training_windows(&[0.0, 0.1, 0.2, 0.3, 0.4])
///     .unwrap();
/// assert_eq!(windows.len(), 2);
/// assert_eq!(windows.window(1), Some(&[0.1, 0.2, 0.3][..]));
/// assert_eq!(windows.target(1), Some(0.4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBuilder {
    window_size: usize,
}

impl WindowBuilder {
    pub fn new(window_size: usize) -> Result<Self, ConfigurationError> {
        if window_size == 0 {
            return Err(ConfigurationError::NonPositive {
                name: "window_size".to_string(),
            });
        }
        Ok(Self { window_size })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Produces `len - W` overlapping windows with one-step-ahead targets.
    ///
    /// Fails with [`DataError::InsufficientData`] unless `len > W`.
    pub fn build_training_windows(&self, scaled: &[f64]) -> Result<WindowSet, DataError> {
        let w = self.window_size;
        if scaled.len() <= w {
            return Err(DataError::InsufficientData {
                required: w + 1,
                available: scaled.len(),
            });
        }
        let n = scaled.len() - w;
        let mut inputs = Vec::with_capacity(n * w);
        for window in scaled.windows(w).take(n) {
            inputs.extend_from_slice(window);
        }
        Ok(WindowSet {
            window_size: w,
            inputs,
            targets: scaled[w..].to_vec(),
        })
    }

    /// Returns the trailing `W` values, the model input for the next period.
    pub fn build_inference_window<'a>(&self, scaled: &'a [f64]) -> Result<&'a [f64], DataError> {
        let w = self.window_size;
        if scaled.len() < w {
            return Err(DataError::InsufficientData {
                required: w,
                available: scaled.len(),
            });
        }
        Ok(&scaled[scaled.len() - w..])
    }
}
