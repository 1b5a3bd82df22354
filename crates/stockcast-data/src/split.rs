//! Date-boundary partitioning into train, validation and test.

use std::fmt;

use chrono::NaiveDate;
use stockcast_core::{ConfigurationError, DataError};

use crate::series::{DateRange, Series};

/// One of the three partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Train,
    Validation,
    Test,
}

impl Partition {
    pub const ALL: [Partition; 3] = [Partition::Train, Partition::Validation, Partition::Test];

    pub fn name(&self) -> &'static str {
        match self {
            Partition::Train => "train",
            Partition::Validation => "validation",
            Partition::Test => "test",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of [`DateRangeSplitter::split`].
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Series,
    pub validation: Series,
    pub test: Series,
}

impl Split {
    pub fn partition(&self, partition: Partition) -> &Series {
        match partition {
            Partition::Train => &self.train,
            Partition::Validation => &self.validation,
            Partition::Test => &self.test,
        }
    }

    /// Partitions with no rows, in train/validation/test order.
    pub fn empty_partitions(&self) -> Vec<Partition> {
        Partition::ALL
            .into_iter()
            .filter(|p| self.partition(*p).is_empty())
            .collect()
    }

    /// Fails on the first listed partition that is empty.
    pub fn require_non_empty(&self, partitions: &[Partition]) -> Result<(), DataError> {
        match partitions.iter().find(|p| self.partition(**p).is_empty()) {
            Some(p) => Err(DataError::EmptyPartition {
                partition: p.name().to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Row counts of train, validation and test.
    pub fn sizes(&self) -> [usize; 3] {
        [self.train.len(), self.validation.len(), self.test.len()]
    }
}

/// Splits a series at two date boundaries.
///
/// - train: `(-inf, train_end]`
/// - validation: `(train_end, val_end]`
/// - test: `(val_end, +inf)`
///
/// Each boundary date belongs to the earlier partition only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRangeSplitter {
    train_end: NaiveDate,
    val_end: NaiveDate,
}

impl DateRangeSplitter {
    pub fn new(train_end: NaiveDate, val_end: NaiveDate) -> Result<Self, ConfigurationError> {
        if train_end >= val_end {
            return Err(ConfigurationError::InvalidRange {
                start: train_end,
                end: val_end,
            });
        }
        Ok(Self { train_end, val_end })
    }

    pub fn train_range(&self) -> DateRange {
        DateRange::up_to(self.train_end)
    }

    pub fn validation_range(&self) -> DateRange {
        DateRange::open_closed(self.train_end, self.val_end)
    }

    pub fn test_range(&self) -> DateRange {
        DateRange::after(self.val_end)
    }

    pub fn split(&self, series: &Series) -> Split {
        Split {
            train: series.slice(&self.train_range()),
            validation: series.slice(&self.validation_range()),
            test: series.slice(&self.test_range()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(offset)
    }

    fn series(n: i64) -> Series {
        Series::from_pairs((0..n).map(|i| (day(i), i as f64))).unwrap()
    }

    #[test]
    fn test_partitions_cover_every_row_once() {
        let s = series(100);
        let split = DateRangeSplitter::new(day(59), day(79)).unwrap().split(&s);
        assert_eq!(split.sizes(), [60, 20, 20]);
        assert_eq!(split.sizes().iter().sum::<usize>(), s.len());

        let mut dates = split.train.dates();
        dates.extend(split.validation.dates());
        dates.extend(split.test.dates());
        assert_eq!(dates, s.dates());
    }

    #[test]
    fn test_boundary_rows_belong_to_earlier_partition() {
        let s = series(10);
        let split = DateRangeSplitter::new(day(4), day(6)).unwrap().split(&s);
        assert_eq!(split.train.last().unwrap().date, day(4));
        assert_eq!(split.validation.first().unwrap().date, day(5));
        assert_eq!(split.validation.last().unwrap().date, day(6));
        assert_eq!(split.test.first().unwrap().date, day(7));
    }

    #[test]
    fn test_invalid_range() {
        assert!(matches!(
            DateRangeSplitter::new(day(5), day(5)),
            Err(ConfigurationError::InvalidRange { .. })
        ));
        assert!(DateRangeSplitter::new(day(6), day(5)).is_err());
    }

    #[test]
    fn test_empty_partitions_are_flagged() {
        let s = series(10);
        let split = DateRangeSplitter::new(day(20), day(30)).unwrap().split(&s);
        assert_eq!(
            split.empty_partitions(),
            vec![Partition::Validation, Partition::Test]
        );
        assert!(split.require_non_empty(&[Partition::Train]).is_ok());
        assert_eq!(
            split
                .require_non_empty(&[Partition::Train, Partition::Validation])
                .unwrap_err(),
            DataError::EmptyPartition {
                partition: "validation".to_string()
            }
        );
    }
}
