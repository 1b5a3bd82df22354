//! The mini-batch training loop.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use stockcast_core::{
    ConfigurationError, LossFunction, StockcastError, TrainingConfig, TrainingError,
};
use stockcast_data::WindowSet;
use stockcast_layers::{LayerError, Sequential, Tensor};
use stockcast_optimizer::{Adam, Optimizer, OptimizerConfig};
use tracing::{debug, info};

use crate::history::LossHistory;
use crate::hooks::{EarlyStopping, EpochHook, EpochMetrics, HookAction, HookList};
use crate::loss::Objective;
use crate::stop::StopHandle;

/// Hyperparameters of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingParams {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub loss: LossFunction,
    /// Seed of the per-epoch batch shuffle.
    pub seed: u64,
}

impl From<&TrainingConfig> for TrainingParams {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            epochs: config.epochs,
            batch_size: config.batch_size,
            learning_rate: config.learning_rate,
            loss: config.loss_function,
            seed: config.seed,
        }
    }
}

impl TrainingParams {
    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.epochs == 0 {
            return Err(ConfigurationError::NonPositive {
                name: "epochs".to_string(),
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigurationError::NonPositive {
                name: "batch_size".to_string(),
            });
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigurationError::NonPositive {
                name: "learning_rate".to_string(),
            });
        }
        Ok(())
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: Sequential,
    pub history: LossHistory,
    /// Whether a hook ended the run before `epochs` were completed.
    pub stopped_early: bool,
}

/// Trains a model on windowed data.
///
/// Each epoch shuffles the training windows with a seeded RNG, runs every
/// mini-batch through a training forward pass, backpropagates the loss and
/// applies one Adam step per parameter tensor. The validation set is then
/// evaluated in inference mode. Parameters are never updated from
/// validation data.
#[derive(Debug)]
pub struct TrainingRunner {
    params: TrainingParams,
    hooks: HookList,
    stop: StopHandle,
}

impl TrainingRunner {
    pub fn new(params: TrainingParams) -> Self {
        Self {
            params,
            hooks: HookList::new(),
            stop: StopHandle::new(),
        }
    }

    /// Builds a runner from configuration, adding early stopping when
    /// configured.
    pub fn from_config(config: &TrainingConfig) -> Self {
        let mut runner = Self::new(TrainingParams::from(config));
        if let Some(early) = config.early_stopping {
            runner.add_hook(EarlyStopping::new(early.patience, early.min_delta));
        }
        runner
    }

    pub fn with_hook<H: EpochHook + 'static>(mut self, hook: H) -> Self {
        self.add_hook(hook);
        self
    }

    pub fn add_hook<H: EpochHook + 'static>(&mut self, hook: H) {
        self.hooks.add(hook);
    }

    /// Uses `stop` as the cancellation flag for this runner.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Trains `model` and returns it with the loss history.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::NonPositive`] for zero epochs or batch size,
    ///   or a non-positive learning rate
    /// - [`TrainingError::EmptyDataset`] if either window set is empty
    /// - [`TrainingError::Interrupted`] if the stop handle was raised
    /// - [`TrainingError::Diverged`] if a loss stops being finite
    /// - [`TrainingError::Model`] if the windows do not fit the model
    pub fn run(
        &mut self,
        mut model: Sequential,
        train: &WindowSet,
        validation: &WindowSet,
    ) -> Result<TrainingOutcome, StockcastError> {
        self.params.validate()?;
        for (partition, set) in [("train", train), ("validation", validation)] {
            if set.is_empty() {
                return Err(TrainingError::EmptyDataset {
                    partition: partition.to_string(),
                }
                .into());
            }
        }

        let optimizer_config = OptimizerConfig::adam(self.params.learning_rate as f32);
        let mut optimizers = model
            .parameters_mut()
            .iter()
            .map(|_| Adam::new(optimizer_config))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigurationError::InvalidValue {
                name: "learning_rate".to_string(),
                message: e.to_string(),
            })?;

        info!(
            train_windows = train.len(),
            val_windows = validation.len(),
            epochs = self.params.epochs,
            batch_size = self.params.batch_size,
            learning_rate = self.params.learning_rate,
            loss = self.params.loss.name(),
            parameters = model.num_parameters(),
            "starting training"
        );

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut order: Vec<usize> = (0..train.len()).collect();
        let mut history = LossHistory::new();
        let mut last = None;
        let mut stopped_early = false;

        for epoch in 1..=self.params.epochs {
            self.check_stop(epoch - 1)?;
            order.shuffle(&mut rng);

            let mut total = 0.0;
            for batch in order.chunks(self.params.batch_size) {
                self.check_stop(epoch - 1)?;
                let (inputs, targets) = batch_tensors(train, batch).map_err(model_error)?;
                let output = model.forward_train(&inputs).map_err(model_error)?;
                let loss = self.params.loss.value(&output, &targets);
                if !loss.is_finite() {
                    return Err(TrainingError::Diverged { epoch, loss }.into());
                }
                total += loss * batch.len() as f64;

                model
                    .backward(&self.params.loss.gradient(&output, &targets))
                    .map_err(model_error)?;
                apply_updates(&mut model, &mut optimizers).map_err(model_error)?;
            }
            let train_loss = total / train.len() as f64;

            let val_loss = evaluate(&model, validation, self.params.loss, self.params.batch_size)
                .map_err(model_error)?;
            if !val_loss.is_finite() {
                return Err(TrainingError::Diverged {
                    epoch,
                    loss: val_loss,
                }
                .into());
            }
            history.push(train_loss, val_loss);
            debug!(epoch, train_loss, val_loss, "epoch evaluated");

            let metrics = EpochMetrics {
                epoch,
                epochs: self.params.epochs,
                train_loss,
                val_loss,
            };
            last = Some(metrics);
            if self.hooks.after_epoch(&metrics) == HookAction::Stop {
                stopped_early = epoch < self.params.epochs;
                break;
            }
        }

        self.hooks.end(last.as_ref());
        Ok(TrainingOutcome {
            model,
            history,
            stopped_early,
        })
    }

    fn check_stop(&self, completed_epochs: usize) -> Result<(), TrainingError> {
        if self.stop.is_stopped() {
            info!(completed_epochs, "training interrupted");
            return Err(TrainingError::Interrupted { completed_epochs });
        }
        Ok(())
    }
}

fn model_error(err: LayerError) -> StockcastError {
    TrainingError::from(err).into()
}

fn apply_updates(
    model: &mut Sequential,
    optimizers: &mut [Adam],
) -> Result<(), LayerError> {
    let gradients = model.gradients()?;
    for ((param, grad), optimizer) in model
        .parameters_mut()
        .into_iter()
        .zip(&gradients)
        .zip(optimizers.iter_mut())
    {
        optimizer.apply_gradients(param.data_mut(), grad.data());
    }
    Ok(())
}

/// Mean loss over `set` in inference mode.
pub(crate) fn evaluate(
    model: &Sequential,
    set: &WindowSet,
    loss: LossFunction,
    batch_size: usize,
) -> Result<f64, LayerError> {
    let indices: Vec<usize> = (0..set.len()).collect();
    let mut total = 0.0;
    for batch in indices.chunks(batch_size.max(1)) {
        let (inputs, targets) = batch_tensors(set, batch)?;
        let output = model.predict(&inputs)?;
        total += loss.value(&output, &targets) * batch.len() as f64;
    }
    Ok(total / set.len().max(1) as f64)
}

/// Gathers windows `rows` into `[batch, window, 1]` inputs and `[batch, 1]`
/// targets.
fn batch_tensors(set: &WindowSet, rows: &[usize]) -> Result<(Tensor, Tensor), LayerError> {
    let w = set.window_size();
    let mut inputs = Vec::with_capacity(rows.len() * w);
    let mut targets = Vec::with_capacity(rows.len());
    for &row in rows {
        let (window, target) = set
            .window(row)
            .zip(set.target(row))
            .ok_or_else(|| LayerError::ForwardError {
                message: format!("window {} out of range", row),
            })?;
        inputs.extend(window.iter().map(|v| *v as f32));
        targets.push(target as f32);
    }
    Ok((
        Tensor::try_from_data(&[rows.len(), w, 1], inputs)?,
        Tensor::try_from_data(&[rows.len(), 1], targets)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockcast_core::LayerSpec;
    use stockcast_data::WindowBuilder;
    use stockcast_layers::ArchitectureBuilder;

    fn windows(values: &[f64], w: usize) -> WindowSet {
        WindowBuilder::new(w)
            .unwrap()
            .build_training_windows(values)
            .unwrap()
    }

    fn model(w: usize) -> Sequential {
        let layers = vec![LayerSpec::recurrent(4, false), LayerSpec::dense(1, None)];
        ArchitectureBuilder::new().with_seed(1).build(&layers, w).unwrap()
    }

    fn params() -> TrainingParams {
        TrainingParams {
            epochs: 2,
            batch_size: 4,
            learning_rate: 0.01,
            loss: LossFunction::Mse,
            seed: 7,
        }
    }

    #[test]
    fn test_batch_tensors_layout() {
        let set = windows(&[0.0, 0.1, 0.2, 0.3, 0.4], 3);
        let (inputs, targets) = batch_tensors(&set, &[1, 0]).unwrap();
        assert_eq!(inputs.shape(), &[2, 3, 1]);
        assert_eq!(inputs.data(), &[0.1, 0.2, 0.3, 0.0, 0.1, 0.2]);
        assert_eq!(targets.data(), &[0.4, 0.3]);
        assert!(batch_tensors(&set, &[2]).is_err());
    }

    #[test]
    fn test_rejects_non_positive_params() {
        let set = windows(&[0.0, 0.1, 0.2, 0.3, 0.4], 3);
        for bad in [
            TrainingParams { epochs: 0, ..params() },
            TrainingParams { batch_size: 0, ..params() },
            TrainingParams { learning_rate: 0.0, ..params() },
            TrainingParams { learning_rate: f64::NAN, ..params() },
        ] {
            let err = TrainingRunner::new(bad).run(model(3), &set, &set).unwrap_err();
            assert!(matches!(
                err,
                StockcastError::Configuration(ConfigurationError::NonPositive { .. })
            ));
        }
    }

    #[test]
    fn test_rejects_window_size_mismatch() {
        let set = windows(&[0.0, 0.1, 0.2, 0.3, 0.4], 3);
        let err = TrainingRunner::new(params()).run(model(4), &set, &set).unwrap_err();
        assert!(matches!(
            err,
            StockcastError::Training(TrainingError::Model { .. })
        ));
    }

    #[test]
    fn test_from_config_adds_early_stopping() {
        let mut config = TrainingConfig::default();
        assert!(TrainingRunner::from_config(&config).hooks.is_empty());
        config.early_stopping = Some(stockcast_core::EarlyStoppingConfig {
            patience: 3,
            min_delta: 0.0,
        });
        let runner = TrainingRunner::from_config(&config);
        assert_eq!(runner.hooks.len(), 1);
        assert_eq!(runner.params().epochs, 50);
    }

    #[test]
    fn test_apply_updates_takes_one_adam_step_per_tensor() {
        let set = windows(&[0.0, 0.1, 0.2, 0.3, 0.4, 0.5], 3);
        let mut m = model(3);
        let mut optimizers: Vec<Adam> = m
            .parameters_mut()
            .iter()
            .map(|_| Adam::new(OptimizerConfig::adam(0.01)).unwrap())
            .collect();
        let before: Vec<Tensor> = m.named_parameters().into_iter().map(|(_, t)| t.clone()).collect();

        let (inputs, targets) = batch_tensors(&set, &[0, 1, 2]).unwrap();
        let output = m.forward_train(&inputs).unwrap();
        m.backward(&LossFunction::Mse.gradient(&output, &targets)).unwrap();
        apply_updates(&mut m, &mut optimizers).unwrap();

        // The first bias-corrected Adam step is at most the learning rate.
        for ((_, after), before) in m.named_parameters().into_iter().zip(&before) {
            let moved = after
                .data()
                .iter()
                .zip(before.data())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0f32, f32::max);
            assert!(moved > 0.0 && moved <= 0.0101, "moved {}", moved);
        }
    }

    #[test]
    fn test_evaluate_does_not_change_model() {
        let set = windows(&[0.0, 0.1, 0.2, 0.3, 0.4, 0.5], 3);
        let m = model(3);
        let before: Vec<Tensor> = m.named_parameters().into_iter().map(|(_, t)| t.clone()).collect();
        let a = evaluate(&m, &set, LossFunction::Mse, 2).unwrap();
        let b = evaluate(&m, &set, LossFunction::Mse, 32).unwrap();
        assert!((a - b).abs() < 1e-9);
        let after: Vec<Tensor> = m.named_parameters().into_iter().map(|(_, t)| t.clone()).collect();
        assert_eq!(before, after);
    }
}
