//! Training for stockcast models.
//!
//! [`TrainingRunner`] fits a [`Sequential`](stockcast_layers::Sequential)
//! model on training windows with mini-batch Adam, evaluates it on
//! validation windows after every epoch and returns the trained model with
//! its [`LossHistory`]. Per-epoch behavior such as logging and early
//! stopping is plugged in through [`EpochHook`]s.
//!
//! # Example
//!
//! ```
//! use stockcast_core::{LayerSpec, TrainingConfig};
//! use stockcast_data::WindowBuilder;
//! use stockcast_layers::ArchitectureBuilder;
//! use stockcast_training::{TrainingParams, TrainingRunner};
//!
//! let scaled: Vec<f64> = (0..40).map(|i| i as f64 / 40.0).collect();
//! let builder = WindowBuilder::new(5).unwrap();
//! let train = builder.build_training_windows(&scaled[..30]).unwrap();
//! let val = builder.build_training_windows(&scaled[25..]).unwrap();
//!
//! let layers = vec![LayerSpec::recurrent(4, false), LayerSpec::dense(1, None)];
//! let model = ArchitectureBuilder::new().build(&layers, 5).unwrap();
//!
//! let config = TrainingConfig { epochs: 3, batch_size: 8, ..TrainingConfig::default() };
//! let mut runner = TrainingRunner::new(TrainingParams::from(&config));
//! let outcome = runner.run(model, &train, &val).unwrap();
//! assert_eq!(outcome.history.len(), 3);
//! ```

pub mod history;
pub mod hooks;
pub mod loss;
pub mod runner;
pub mod stop;

pub use history::LossHistory;
pub use hooks::{EarlyStopping, EpochHook, EpochMetrics, HookAction, HookList, LoggingHook};
pub use loss::Objective;
pub use runner::{TrainingOutcome, TrainingParams, TrainingRunner};
pub use stop::StopHandle;
