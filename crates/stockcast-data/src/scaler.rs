//! Min-max normalization fit on a single reference range.
//!
//! The fitted `(min, max)` pair is the only state shared between training
//! and inference. It is persisted with the model and restored through
//! [`Scaler::from_params`], never refit from raw history.

use serde::{Deserialize, Serialize};
use stockcast_core::{ConfigurationError, DataError, Result, StateError};

use crate::series::{DateRange, Series};

/// Fitted scaling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub min: f64,
    pub max: f64,
    /// Number of rows the parameters were computed from
    pub rows: usize,
}

impl ScalerParams {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// A min-max scaler mapping the reference range onto `[0, 1]`.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use stockcast_data::{DateRange, Scaler, Series};
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
/// let series = Series::from_pairs(vec![(d(1), 10.0), (d(2), 20.0), (d(3), 30.0)]).unwrap();
///
/// let mut scaler = Scaler::new();
/// scaler.fit(&series, &DateRange::up_to(d(2))).unwrap();
/// assert_eq!(scaler.transform(&series).unwrap(), vec![0.0, 1.0, 2.0]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scaler {
    params: Option<ScalerParams>,
}

impl Scaler {
    /// Creates an unfitted scaler.
    pub fn new() -> Self {
        Self { params: None }
    }

    /// Restores a fitted scaler from persisted parameters.
    pub fn from_params(params: ScalerParams) -> Result<Self> {
        if !(params.min.is_finite() && params.max.is_finite()) || params.min > params.max {
            return Err(ConfigurationError::InvalidValue {
                name: "scaler".to_string(),
                message: format!(
                    "min={} and max={} are not a finite ordered pair",
                    params.min, params.max
                ),
            }
            .into());
        }
        if params.span() == 0.0 {
            return Err(DataError::DegenerateRange { value: params.min }.into());
        }
        Ok(Self {
            params: Some(params),
        })
    }

    /// Computes min and max over the rows of `series` inside `range`.
    ///
    /// Refitting with a range that yields the same parameters is a no-op;
    /// refitting with different parameters fails with
    /// [`StateError::ConflictingFit`] and leaves the scaler unchanged.
    pub fn fit(&mut self, series: &Series, range: &DateRange) -> Result<ScalerParams> {
        let reference = series.slice(range);
        if reference.is_empty() {
            return Err(range.empty_error().into());
        }
        let (min, max) = reference
            .observations()
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), o| {
                (lo.min(o.value), hi.max(o.value))
            });
        if min == max {
            return Err(DataError::DegenerateRange { value: min }.into());
        }
        let fitted = ScalerParams {
            min,
            max,
            rows: reference.len(),
        };
        if let Some(existing) = self.params {
            if existing.min.to_bits() != min.to_bits() || existing.max.to_bits() != max.to_bits() {
                return Err(StateError::ConflictingFit {
                    fitted_min: existing.min,
                    fitted_max: existing.max,
                    min,
                    max,
                }
                .into());
            }
            return Ok(existing);
        }
        self.params = Some(fitted);
        Ok(fitted)
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    pub fn params(&self) -> Option<&ScalerParams> {
        self.params.as_ref()
    }

    fn fitted(&self) -> Result<ScalerParams> {
        let params = self.params.ok_or(StateError::NotFitted)?;
        if params.span() == 0.0 {
            return Err(DataError::DegenerateRange { value: params.min }.into());
        }
        Ok(params)
    }

    /// Scales every value of `series`.
    pub fn transform(&self, series: &Series) -> Result<Vec<f64>> {
        self.transform_values(&series.values())
    }

    pub fn transform_values(&self, values: &[f64]) -> Result<Vec<f64>> {
        let p = self.fitted()?;
        let span = p.span();
        Ok(values.iter().map(|v| (v - p.min) / span).collect())
    }

    pub fn transform_value(&self, value: f64) -> Result<f64> {
        let p = self.fitted()?;
        Ok((value - p.min) / p.span())
    }

    /// Maps scaled values back to the original units.
    pub fn inverse_transform(&self, scaled: &[f64]) -> Result<Vec<f64>> {
        let p = self.fitted()?;
        let span = p.span();
        Ok(scaled.iter().map(|v| v * span + p.min).collect())
    }

    pub fn inverse_value(&self, scaled: f64) -> Result<f64> {
        let p = self.fitted()?;
        Ok(scaled * p.span() + p.min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stockcast_core::StockcastError;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(offset)
    }

    fn series(values: &[f64]) -> Series {
        Series::from_pairs(values.iter().enumerate().map(|(i, v)| (day(i as i64), *v))).unwrap()
    }

    #[test]
    fn test_fit_uses_only_reference_range() {
        let s = series(&[10.0, 20.0, 15.0, 100.0, -50.0]);
        let mut scaler = Scaler::new();
        let params = scaler.fit(&s, &DateRange::up_to(day(2))).unwrap();
        assert_eq!(params.min, 10.0);
        assert_eq!(params.max, 20.0);
        assert_eq!(params.rows, 3);

        // Values outside the reference range map outside [0, 1].
        let scaled = scaler.transform(&s).unwrap();
        assert_eq!(scaled[3], 9.0);
        assert_eq!(scaled[4], -6.0);
    }

    #[test]
    fn test_round_trip() {
        let s = series(&[3.5, 7.25, 1.0, 9.75, 4.0]);
        let mut scaler = Scaler::new();
        scaler.fit(&s, &DateRange::full()).unwrap();
        let restored = scaler
            .inverse_transform(&scaler.transform(&s).unwrap())
            .unwrap();
        for (a, b) in restored.iter().zip(s.values()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_range() {
        let s = series(&[1.0, 2.0]);
        let mut scaler = Scaler::new();
        let err = scaler.fit(&s, &DateRange::after(day(5))).unwrap_err();
        assert!(matches!(err, StockcastError::Data(DataError::EmptyRange { .. })));
        assert!(!scaler.is_fitted());
    }

    #[test]
    fn test_constant_range_is_degenerate() {
        let s = series(&[5.0; 20]);
        let mut scaler = Scaler::new();
        let err = scaler.fit(&s, &DateRange::full()).unwrap_err();
        assert_eq!(
            err,
            StockcastError::Data(DataError::DegenerateRange { value: 5.0 })
        );
    }

    #[test]
    fn test_not_fitted() {
        let scaler = Scaler::new();
        assert_eq!(
            scaler.transform_values(&[1.0]).unwrap_err(),
            StockcastError::State(StateError::NotFitted)
        );
        assert_eq!(
            scaler.inverse_transform(&[0.5]).unwrap_err(),
            StockcastError::State(StateError::NotFitted)
        );
    }

    #[test]
    fn test_refit_is_idempotent_but_conflicts_are_rejected() {
        let s = series(&[1.0, 2.0, 3.0, 10.0]);
        let mut scaler = Scaler::new();
        let first = scaler.fit(&s, &DateRange::up_to(day(2))).unwrap();
        let again = scaler.fit(&s, &DateRange::up_to(day(2))).unwrap();
        assert_eq!(first, again);

        let err = scaler.fit(&s, &DateRange::full()).unwrap_err();
        assert!(matches!(
            err,
            StockcastError::State(StateError::ConflictingFit { .. })
        ));
        assert_eq!(scaler.params(), Some(&first));
    }

    #[test]
    fn test_repeated_fits_are_bit_identical() {
        let s = series(&[0.1, 0.7, 0.3, 0.9, 0.2]);
        let mut a = Scaler::new();
        let mut b = Scaler::new();
        let pa = a.fit(&s, &DateRange::full()).unwrap();
        let pb = b.fit(&s, &DateRange::full()).unwrap();
        assert_eq!(pa.min.to_bits(), pb.min.to_bits());
        assert_eq!(pa.max.to_bits(), pb.max.to_bits());
    }

    #[test]
    fn test_from_params() {
        let params = ScalerParams {
            min: 10.0,
            max: 20.0,
            rows: 5,
        };
        let scaler = Scaler::from_params(params).unwrap();
        assert_eq!(scaler.transform_value(15.0).unwrap(), 0.5);
        assert_eq!(scaler.inverse_value(0.5).unwrap(), 15.0);

        let degenerate = ScalerParams {
            min: 3.0,
            max: 3.0,
            rows: 1,
        };
        assert!(matches!(
            Scaler::from_params(degenerate),
            Err(StockcastError::Data(DataError::DegenerateRange { .. }))
        ));

        let inverted = ScalerParams {
            min: 3.0,
            max: 1.0,
            rows: 2,
        };
        assert!(matches!(
            Scaler::from_params(inverted),
            Err(StockcastError::Configuration(_))
        ));
    }
}
