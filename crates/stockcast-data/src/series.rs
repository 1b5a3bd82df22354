//! Date-indexed univariate series.

use std::fmt;
use std::ops::Bound;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stockcast_core::DataError;

/// A single `(date, value)` row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// A date range with independent lower and upper bounds.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use stockcast_data::DateRange;
///
/// let end = NaiveDate::from_ymd_opt(2021, 12, 31).unwrap();
/// let range = DateRange::up_to(end);
/// assert!(range.contains(end));
/// assert!(!range.contains(end.succ_opt().unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Bound<NaiveDate>,
    pub end: Bound<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Bound<NaiveDate>, end: Bound<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Every date.
    pub fn full() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }

    /// `[start, end]`
    pub fn closed(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Bound::Included(start), Bound::Included(end))
    }

    /// `(-inf, end]`
    pub fn up_to(end: NaiveDate) -> Self {
        Self::new(Bound::Unbounded, Bound::Included(end))
    }

    /// `(-inf, end)`
    pub fn before(end: NaiveDate) -> Self {
        Self::new(Bound::Unbounded, Bound::Excluded(end))
    }

    /// `[start, +inf)`
    pub fn from(start: NaiveDate) -> Self {
        Self::new(Bound::Included(start), Bound::Unbounded)
    }

    /// `(start, +inf)`
    pub fn after(start: NaiveDate) -> Self {
        Self::new(Bound::Excluded(start), Bound::Unbounded)
    }

    /// `(start, end]`
    pub fn open_closed(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Bound::Excluded(start), Bound::Included(end))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let above = match self.start {
            Bound::Included(s) => date >= s,
            Bound::Excluded(s) => date > s,
            Bound::Unbounded => true,
        };
        let below = match self.end {
            Bound::Included(e) => date <= e,
            Bound::Excluded(e) => date < e,
            Bound::Unbounded => true,
        };
        above && below
    }

    fn lower(&self) -> String {
        match self.start {
            Bound::Included(s) => format!("[{}", s),
            Bound::Excluded(s) => format!("({}", s),
            Bound::Unbounded => "(-inf".to_string(),
        }
    }

    fn upper(&self) -> String {
        match self.end {
            Bound::Included(e) => format!("{}]", e),
            Bound::Excluded(e) => format!("{})", e),
            Bound::Unbounded => "+inf)".to_string(),
        }
    }

    /// Builds the error reported when this range selects nothing.
    pub fn empty_error(&self) -> DataError {
        DataError::EmptyRange {
            start: self.lower(),
            end: self.upper(),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lower(), self.upper())
    }
}

/// An ordered series with strictly increasing dates.
///
/// Construction is the only place ordering is checked, so every `Series`
/// value can be sliced by date with binary search.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    observations: Vec<Observation>,
}

impl Series {
    /// Creates a series, rejecting unordered, duplicated or non-finite rows.
    pub fn new(observations: Vec<Observation>) -> Result<Self, DataError> {
        for (index, pair) in observations.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(DataError::NonMonotonicTimestamps {
                    index: index + 1,
                    previous: pair[0].date,
                    current: pair[1].date,
                });
            }
        }
        if let Some(bad) = observations.iter().find(|o| !o.value.is_finite()) {
            return Err(DataError::NonFiniteValue {
                date: bad.date,
                value: bad.value,
            });
        }
        Ok(Self { observations })
    }

    /// Creates a series from `(date, value)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(date, value)| Observation::new(date, value))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.date).collect()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Returns the contiguous sub-series whose dates fall in `range`.
    pub fn slice(&self, range: &DateRange) -> Series {
        let obs = &self.observations;
        let lo = match range.start {
            Bound::Included(s) => obs.partition_point(|o| o.date < s),
            Bound::Excluded(s) => obs.partition_point(|o| o.date <= s),
            Bound::Unbounded => 0,
        };
        let hi = match range.end {
            Bound::Included(e) => obs.partition_point(|o| o.date <= e),
            Bound::Excluded(e) => obs.partition_point(|o| o.date < e),
            Bound::Unbounded => obs.len(),
        };
        Series {
            observations: obs[lo..hi.max(lo)].to_vec(),
        }
    }

    /// First observation dated on or after `date`.
    pub fn first_on_or_after(&self, date: NaiveDate) -> Option<&Observation> {
        let idx = self.observations.partition_point(|o| o.date < date);
        self.observations.get(idx)
    }

    /// Value recorded exactly on `date`.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.observations
            .binary_search_by(|o| o.date.cmp(&date))
            .ok()
            .map(|idx| self.observations[idx].value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(offset)
    }

    fn series(n: i64) -> Series {
        Series::from_pairs((0..n).map(|i| (day(i), 100.0 + i as f64))).unwrap()
    }

    #[test]
    fn test_rejects_unordered_dates() {
        let err = Series::from_pairs(vec![(day(0), 1.0), (day(2), 2.0), (day(1), 3.0)]).unwrap_err();
        assert_eq!(
            err,
            DataError::NonMonotonicTimestamps {
                index: 2,
                previous: day(2),
                current: day(1),
            }
        );
    }

    #[test]
    fn test_rejects_duplicate_dates() {
        let err = Series::from_pairs(vec![(day(0), 1.0), (day(0), 2.0)]).unwrap_err();
        assert!(matches!(err, DataError::NonMonotonicTimestamps { index: 1, .. }));
    }

    #[test]
    fn test_rejects_non_finite_values() {
        let err = Series::from_pairs(vec![(day(0), 1.0), (day(1), f64::NAN)]).unwrap_err();
        assert!(matches!(err, DataError::NonFiniteValue { .. }));
    }

    #[test]
    fn test_slice_bounds() {
        let s = series(10);

        let closed = s.slice(&DateRange::closed(day(2), day(4)));
        assert_eq!(closed.values(), vec![102.0, 103.0, 104.0]);

        let open_closed = s.slice(&DateRange::open_closed(day(2), day(4)));
        assert_eq!(open_closed.values(), vec![103.0, 104.0]);

        let before = s.slice(&DateRange::before(day(3)));
        assert_eq!(before.len(), 3);

        let after = s.slice(&DateRange::after(day(7)));
        assert_eq!(after.values(), vec![108.0, 109.0]);

        assert_eq!(s.slice(&DateRange::full()), s);
    }

    #[test]
    fn test_slice_with_gaps_and_inverted_range() {
        let s = Series::from_pairs(vec![(day(0), 1.0), (day(5), 2.0), (day(10), 3.0)]).unwrap();
        assert_eq!(s.slice(&DateRange::closed(day(1), day(9))).values(), vec![2.0]);
        assert!(s.slice(&DateRange::closed(day(6), day(9))).is_empty());
        assert!(s.slice(&DateRange::closed(day(9), day(1))).is_empty());
    }

    #[test]
    fn test_lookups() {
        let s = Series::from_pairs(vec![(day(0), 1.0), (day(5), 2.0)]).unwrap();
        assert_eq!(s.first_on_or_after(day(1)).map(|o| o.date), Some(day(5)));
        assert_eq!(s.first_on_or_after(day(6)), None);
        assert_eq!(s.value_on(day(5)), Some(2.0));
        assert_eq!(s.value_on(day(4)), None);
    }

    #[test]
    fn test_empty_range_error_describes_bounds() {
        let err = DateRange::open_closed(day(0), day(1)).empty_error();
        assert_eq!(
            err.to_string(),
            "Empty range: no observations between (2020-01-01 and 2020-01-02]"
        );
    }
}
