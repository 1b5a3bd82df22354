//! Per-epoch loss curves.

use serde::{Deserialize, Serialize};

/// Training and validation loss, one entry per completed epoch.
///
/// Both curves always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossHistory {
    pub train: Vec<f64>,
    pub validation: Vec<f64>,
}

impl LossHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, train_loss: f64, val_loss: f64) {
        self.train.push(train_loss);
        self.validation.push(val_loss);
    }

    /// Number of completed epochs.
    pub fn len(&self) -> usize {
        self.train.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty()
    }

    pub fn final_train(&self) -> Option<f64> {
        self.train.last().copied()
    }

    pub fn final_validation(&self) -> Option<f64> {
        self.validation.last().copied()
    }

    /// 1-based epoch with the lowest validation loss.
    pub fn best_validation_epoch(&self) -> Option<usize> {
        self.validation
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i + 1)
    }

    /// `(epoch, train_loss, val_loss)` rows with 1-based epochs.
    pub fn rows(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        self.train
            .iter()
            .zip(&self.validation)
            .enumerate()
            .map(|(i, (t, v))| (i + 1, *t, *v))
    }
}
