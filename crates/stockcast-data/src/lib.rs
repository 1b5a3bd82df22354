//! Data preparation for stockcast.
//!
//! The training path runs every stage in this crate in order:
//!
//! 1. [`CsvSeriesStore`] reads a date-ordered [`Series`].
//! 2. [`DateRangeSplitter`] cuts it into train, validation and test.
//! 3. [`Scaler`] is fit on the train range only.
//! 4. [`WindowBuilder`] turns the scaled partitions into [`WindowSet`]s.
//!
//! Inference reuses the persisted [`ScalerParams`] and asks the builder for
//! one trailing window.
//!
//! ```
//! use chrono::{Duration, NaiveDate};
//! use stockcast_data::{DateRangeSplitter, Scaler, Series, WindowBuilder};
//!
//! let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
//! let series = Series::from_pairs(
//!     (0..100).map(|i| (start + Duration::days(i), 100.0 + i as f64)),
//! )
//! .unwrap();
//!
//! let splitter = DateRangeSplitter::new(start + Duration::days(69), start + Duration::days(89)).unwrap();
//! let split = splitter.split(&series);
//!
//! let mut scaler = Scaler::new();
//! scaler.fit(&series, &splitter.train_range()).unwrap();
//!
//! let windows = WindowBuilder::new(10)
//!     .unwrap()
//!     .build_training_windows(&scaler.transform(&split.train).unwrap())
//!     .unwrap();
//! assert_eq!(windows.len(), 60);
//! ```

pub mod scaler;
pub mod series;
pub mod split;
pub mod store;
pub mod window;

pub use scaler::{Scaler, ScalerParams};
pub use series::{DateRange, Observation, Series};
pub use split::{DateRangeSplitter, Partition, Split};
pub use store::{CsvSeriesStore, SeriesStore};
pub use window::{WindowBuilder, WindowSet};
