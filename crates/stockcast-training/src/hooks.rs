//! Epoch hooks for customizing the training loop.
//!
//! Hooks observe every completed epoch and may ask the runner to stop,
//! e.g. for logging or early stopping.

use tracing::{debug, info};

/// Losses of one completed epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochMetrics {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Planned number of epochs.
    pub epochs: usize,
    pub train_loss: f64,
    pub val_loss: f64,
}

/// Action to take after a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookAction {
    /// Continue training normally.
    Continue,
    /// Stop training early.
    Stop,
}

/// Trait for epoch hooks.
///
/// # Examples
///
/// ```
/// use stockcast_training::{EpochHook, EpochMetrics, HookAction};
///
/// struct StopBelow(f64);
///
/// impl EpochHook for StopBelow {
///     fn name(&self) -> &str {
///         "stop_below"
///     }
///
///     fn after_epoch(&mut self, metrics: &EpochMetrics) -> HookAction {
///         if metrics.val_loss < self.0 {
///             HookAction::Stop
///         } else {
///             HookAction::Continue
///         }
///     }
/// }
/// ```
pub trait EpochHook: Send {
    /// Returns the name of this hook for logging purposes.
    fn name(&self) -> &str;

    /// Called after each epoch with that epoch's losses.
    fn after_epoch(&mut self, metrics: &EpochMetrics) -> HookAction;

    /// Called once when the run completes, with the last epoch's metrics.
    fn end(&mut self, _last: Option<&EpochMetrics>) {}
}

/// Logs epoch losses through `tracing` at a fixed interval.
#[derive(Debug)]
pub struct LoggingHook {
    every_n_epochs: usize,
}

impl Default for LoggingHook {
    fn default() -> Self {
        Self::new(1)
    }
}

impl LoggingHook {
    pub fn new(every_n_epochs: usize) -> Self {
        Self {
            every_n_epochs: every_n_epochs.max(1),
        }
    }
}

impl EpochHook for LoggingHook {
    fn name(&self) -> &str {
        "logging_hook"
    }

    fn after_epoch(&mut self, metrics: &EpochMetrics) -> HookAction {
        let last = metrics.epoch == metrics.epochs;
        if metrics.epoch == 1 || last || metrics.epoch % self.every_n_epochs == 0 {
            info!(
                epoch = metrics.epoch,
                epochs = metrics.epochs,
                train_loss = metrics.train_loss,
                val_loss = metrics.val_loss,
                "epoch complete"
            );
        }
        HookAction::Continue
    }

    fn end(&mut self, last: Option<&EpochMetrics>) {
        match last {
            Some(m) => info!(
                epochs = m.epoch,
                train_loss = m.train_loss,
                val_loss = m.val_loss,
                "training finished"
            ),
            None => info!("training finished without completing an epoch"),
        }
    }
}

/// Stops training when validation loss has not improved by more than
/// `min_delta` for `patience` consecutive epochs.
#[derive(Debug)]
pub struct EarlyStopping {
    patience: usize,
    min_delta: f64,
    best: Option<f64>,
    best_epoch: usize,
    epochs_without_improvement: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize, min_delta: f64) -> Self {
        Self {
            patience: patience.max(1),
            min_delta,
            best: None,
            best_epoch: 0,
            epochs_without_improvement: 0,
        }
    }

    /// Epoch with the best validation loss so far.
    pub fn best_epoch(&self) -> usize {
        self.best_epoch
    }
}

impl EpochHook for EarlyStopping {
    fn name(&self) -> &str {
        "early_stopping"
    }

    fn after_epoch(&mut self, metrics: &EpochMetrics) -> HookAction {
        let improved = self
            .best
            .map_or(true, |best| metrics.val_loss < best - self.min_delta);
        if improved {
            debug!(
                epoch = metrics.epoch,
                previous = ?self.best,
                val_loss = metrics.val_loss,
                "validation loss improved"
            );
            self.best = Some(metrics.val_loss);
            self.best_epoch = metrics.epoch;
            self.epochs_without_improvement = 0;
            return HookAction::Continue;
        }

        self.epochs_without_improvement += 1;
        if self.epochs_without_improvement >= self.patience {
            info!(
                epoch = metrics.epoch,
                best_epoch = self.best_epoch,
                "stopping early: no improvement in validation loss"
            );
            return HookAction::Stop;
        }
        HookAction::Continue
    }
}

/// A collection of hooks that are run together.
#[derive(Default)]
pub struct HookList {
    hooks: Vec<Box<dyn EpochHook>>,
}

impl std::fmt::Debug for HookList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|h| h.name()))
            .finish()
    }
}

impl HookList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<H: EpochHook + 'static>(&mut self, hook: H) {
        self.hooks.push(Box::new(hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs every hook and returns `Stop` if any of them asked to stop.
    pub fn after_epoch(&mut self, metrics: &EpochMetrics) -> HookAction {
        let mut action = HookAction::Continue;
        for hook in &mut self.hooks {
            if hook.after_epoch(metrics) == HookAction::Stop {
                action = HookAction::Stop;
            }
        }
        action
    }

    pub fn end(&mut self, last: Option<&EpochMetrics>) {
        for hook in &mut self.hooks {
            hook.end(last);
        }
    }
}
