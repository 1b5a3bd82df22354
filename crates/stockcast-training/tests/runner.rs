//! Integration tests for the training loop on synthetic series.

use stockcast_core::{LayerSpec, LossFunction, StockcastError, TrainingError};
use stockcast_data::{WindowBuilder, WindowSet};
use stockcast_layers::{ArchitectureBuilder, Sequential};
use stockcast_training::{
    EarlyStopping, EpochHook, EpochMetrics, HookAction, StopHandle, TrainingParams,
    TrainingRunner,
};

const WINDOW: usize = 8;

/// A smooth periodic series already scaled into [0, 1].
fn wave(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 0.5 + 0.4 * (i as f64 * 0.3).sin())
        .collect()
}

fn split_windows() -> (WindowSet, WindowSet) {
    let values = wave(160);
    let builder = WindowBuilder::new(WINDOW).unwrap();
    (
        builder.build_training_windows(&values[..120]).unwrap(),
        builder.build_training_windows(&values[120..]).unwrap(),
    )
}

fn model() -> Sequential {
    let layers = vec![
        LayerSpec::recurrent(8, false),
        LayerSpec::dense(1, None),
    ];
    ArchitectureBuilder::new().with_seed(21).build(&layers, WINDOW).unwrap()
}

fn params(epochs: usize) -> TrainingParams {
    TrainingParams {
        epochs,
        batch_size: 16,
        learning_rate: 0.01,
        loss: LossFunction::Mse,
        seed: 3,
    }
}

#[test]
fn test_training_reduces_loss() {
    let (train, val) = split_windows();
    let outcome = TrainingRunner::new(params(15))
        .run(model(), &train, &val)
        .unwrap();

    let history = &outcome.history;
    assert_eq!(history.train.len(), 15);
    assert_eq!(history.validation.len(), 15);
    assert!(!outcome.stopped_early);
    assert!(history.train.iter().chain(&history.validation).all(|l| l.is_finite()));

    let first = history.train[0];
    let last = history.final_train().unwrap();
    assert!(last < first, "train loss {} -> {}", first, last);
}

#[test]
fn test_runs_are_reproducible() {
    let (train, val) = split_windows();
    let a = TrainingRunner::new(params(3)).run(model(), &train, &val).unwrap();
    let b = TrainingRunner::new(params(3)).run(model(), &train, &val).unwrap();
    assert_eq!(a.history, b.history);
}

#[test]
fn test_mae_loss_trains() {
    let (train, val) = split_windows();
    let outcome = TrainingRunner::new(TrainingParams {
        loss: LossFunction::Mae,
        ..params(4)
    })
    .run(model(), &train, &val)
    .unwrap();
    assert_eq!(outcome.history.len(), 4);
}

#[test]
fn test_empty_sets_are_rejected_before_training() {
    let (train, val) = split_windows();
    let empty = WindowSet::empty(WINDOW);

    let err = TrainingRunner::new(params(1)).run(model(), &empty, &val).unwrap_err();
    assert_eq!(
        err,
        StockcastError::Training(TrainingError::EmptyDataset {
            partition: "train".to_string()
        })
    );

    let err = TrainingRunner::new(params(1)).run(model(), &train, &empty).unwrap_err();
    assert_eq!(
        err,
        StockcastError::Training(TrainingError::EmptyDataset {
            partition: "validation".to_string()
        })
    );
}

#[test]
fn test_early_stopping_truncates_history() {
    let (train, val) = split_windows();
    // The first epoch always improves; nothing afterwards beats a huge delta.
    let outcome = TrainingRunner::new(params(10))
        .with_hook(EarlyStopping::new(1, 1e9))
        .run(model(), &train, &val)
        .unwrap();
    assert!(outcome.stopped_early);
    assert_eq!(outcome.history.train.len(), 2);
    assert_eq!(outcome.history.validation.len(), 2);
}

#[test]
fn test_raised_stop_handle_interrupts_before_first_epoch() {
    let (train, val) = split_windows();
    let stop = StopHandle::new();
    stop.stop();
    let err = TrainingRunner::new(params(5))
        .with_stop_handle(stop)
        .run(model(), &train, &val)
        .unwrap_err();
    assert_eq!(
        err,
        StockcastError::Training(TrainingError::Interrupted {
            completed_epochs: 0
        })
    );
}

/// Raises the stop handle once `after` epochs have completed.
struct StopAfter {
    after: usize,
    handle: StopHandle,
}

impl EpochHook for StopAfter {
    fn name(&self) -> &str {
        "stop_after"
    }

    fn after_epoch(&mut self, metrics: &EpochMetrics) -> HookAction {
        if metrics.epoch == self.after {
            self.handle.stop();
        }
        HookAction::Continue
    }
}

#[test]
fn test_stop_handle_interrupts_mid_run() {
    let (train, val) = split_windows();
    let runner = TrainingRunner::new(params(5));
    let handle = runner.stop_handle();
    let err = runner
        .with_hook(StopAfter { after: 2, handle })
        .run(model(), &train, &val)
        .unwrap_err();
    assert_eq!(
        err,
        StockcastError::Training(TrainingError::Interrupted {
            completed_epochs: 2
        })
    );
}
