//! Forecasting from a trained model and its persisted scaler.

use chrono::NaiveDate;
use stockcast_core::{ConfigurationError, StockcastError, TrainingError};
use stockcast_data::{DateRange, Scaler, Series, WindowBuilder};
use stockcast_layers::Sequential;
use tracing::debug;

/// One forecast period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    /// 1-based step of the roll-forward
    pub step: usize,
    /// Date of the period, when the series has a row for it
    pub date: Option<NaiveDate>,
    pub predicted: f64,
    pub actual: Option<f64>,
}

impl ForecastPoint {
    /// Absolute error against the actual value, if known.
    pub fn error(&self) -> Option<f64> {
        self.actual.map(|actual| (self.predicted - actual).abs())
    }
}

/// Forecasts `days` periods starting at the first row on or after `start`.
///
/// The input window is the `W` observations strictly before `start`, scaled
/// with the fitted scaler. Each scaled prediction is appended to the window
/// for the next step. Periods past the end of the series have no date and
/// no actual value.
///
/// # Errors
///
/// - [`ConfigurationError::NonPositive`] if `days` is zero
/// - [`DataError::InsufficientData`](stockcast_core::DataError) if fewer
///   than `W` observations precede `start`
/// - [`StateError::NotFitted`](stockcast_core::StateError) for an unfitted scaler
pub fn forecast(
    model: &Sequential,
    scaler: &Scaler,
    series: &Series,
    start: NaiveDate,
    days: usize,
) -> Result<Vec<ForecastPoint>, StockcastError> {
    if days == 0 {
        return Err(ConfigurationError::NonPositive {
            name: "days".to_string(),
        }
        .into());
    }

    let history = scaler.transform(&series.slice(&DateRange::before(start)))?;
    let mut window = WindowBuilder::new(model.window_size())?
        .build_inference_window(&history)?
        .to_vec();
    let targets = series.slice(&DateRange::from(start));

    let mut points = Vec::with_capacity(days);
    for step in 0..days {
        let scaled = model.predict_window(&window).map_err(TrainingError::from)?;
        let observation = targets.observations().get(step);
        points.push(ForecastPoint {
            step: step + 1,
            date: observation.map(|o| o.date),
            predicted: scaler.inverse_value(scaled)?,
            actual: observation.map(|o| o.value),
        });
        debug!(step = step + 1, scaled, "forecast step");

        window.remove(0);
        window.push(scaled);
    }
    Ok(points)
}

/// Mean absolute error over the points that have an actual value.
pub fn mean_absolute_error(points: &[ForecastPoint]) -> Option<f64> {
    let errors: Vec<f64> = points.iter().filter_map(ForecastPoint::error).collect();
    if errors.is_empty() {
        return None;
    }
    Some(errors.iter().sum::<f64>() / errors.len() as f64)
}
