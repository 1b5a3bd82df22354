//! Loading a series from delimited text.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use stockcast_core::DataError;
use tracing::debug;

use crate::series::{Observation, Series};

/// Source of a date-ordered series.
pub trait SeriesStore {
    /// Reads the `target_column` series.
    fn load(&self, target_column: &str) -> Result<Series, DataError>;
}

/// A CSV file with a header row, a date column and numeric value columns.
///
/// Rows whose target cell is empty or `null` are skipped, as price exports
/// use them for non-trading days.
#[derive(Debug, Clone)]
pub struct CsvSeriesStore {
    path: PathBuf,
    date_column: String,
}

impl CsvSeriesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            date_column: "Date".to_string(),
        }
    }

    pub fn with_date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = column.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses CSV content from any reader.
    pub fn read_from<R: Read>(
        reader: R,
        date_column: &str,
        target_column: &str,
    ) -> Result<Series, DataError> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers().map_err(csv_error)?.clone();
        let date_idx = column_index(&headers, date_column)?;
        let value_idx = column_index(&headers, target_column)?;

        let mut observations = Vec::new();
        let mut skipped = 0usize;
        for result in reader.records() {
            let record = result.map_err(csv_error)?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let raw_value = record.get(value_idx).unwrap_or("").trim();
            if raw_value.is_empty() || raw_value.eq_ignore_ascii_case("null") {
                skipped += 1;
                continue;
            }
            let date = parse_date(record.get(date_idx).unwrap_or(""), line)?;
            let value = raw_value.parse::<f64>().map_err(|e| DataError::Parse {
                line,
                message: format!("{}: '{}' ({})", target_column, raw_value, e),
            })?;
            observations.push(Observation::new(date, value));
        }
        if skipped > 0 {
            debug!(skipped, column = target_column, "skipped rows with missing values");
        }
        Series::new(observations)
    }
}

impl SeriesStore for CsvSeriesStore {
    fn load(&self, target_column: &str) -> Result<Series, DataError> {
        let file = File::open(&self.path).map_err(|e| DataError::Io {
            message: format!("{}: {}", self.path.display(), e),
        })?;
        let series = Self::read_from(BufReader::new(file), &self.date_column, target_column)?;
        debug!(
            path = %self.path.display(),
            rows = series.len(),
            "loaded series"
        );
        Ok(series)
    }
}

fn column_index(headers: &csv::StringRecord, column: &str) -> Result<usize, DataError> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| DataError::MissingColumn {
            column: column.to_string(),
        })
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(raw: &str, line: u64) -> Result<NaiveDate, DataError> {
    let raw = raw.trim();
    let day_part = raw.split(|c: char| c == ' ' || c == 'T').next().unwrap_or(raw);
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d").map_err(|e| DataError::Parse {
        line,
        message: format!("date '{}' ({})", raw, e),
    })
}

fn csv_error(err: csv::Error) -> DataError {
    match err.position() {
        Some(pos) => DataError::Parse {
            line: pos.line(),
            message: err.to_string(),
        },
        None => DataError::Io {
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PRICES: &str = "Date,Open,High,Low,Close,Adj Close,Volume\n\
        2023-01-03,243.08,245.75,237.40,239.58,237.04,25740000\n\
        2023-01-04,232.28,232.87,225.96,229.10,226.67,50623400\n\
        2023-01-05,227.20,227.55,221.76,222.31,219.95,39585600\n";

    #[test]
    fn test_read_close_column() {
        let series = CsvSeriesStore::read_from(PRICES.as_bytes(), "Date", "Close").unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(
            series.first().unwrap().date,
            NaiveDate::from_ymd_opt(2023, 1, 3).unwrap()
        );
        assert!((series.values()[2] - 222.31).abs() < 1e-9);
    }

    #[test]
    fn test_missing_column() {
        let err = CsvSeriesStore::read_from(PRICES.as_bytes(), "Date", "Price").unwrap_err();
        assert_eq!(
            err,
            DataError::MissingColumn {
                column: "Price".to_string()
            }
        );
    }

    #[test]
    fn test_skips_null_rows_and_accepts_timestamps() {
        let csv = "Date,Close\n2023-01-03 00:00:00,1.5\n2023-01-04,null\n2023-01-05T00:00:00,2.5\n";
        let series = CsvSeriesStore::read_from(csv.as_bytes(), "Date", "Close").unwrap();
        assert_eq!(series.values(), vec![1.5, 2.5]);
    }

    #[test]
    fn test_bad_value_reports_line() {
        let csv = "Date,Close\n2023-01-03,1.5\n2023-01-04,abc\n";
        let err = CsvSeriesStore::read_from(csv.as_bytes(), "Date", "Close").unwrap_err();
        assert!(matches!(err, DataError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_unsorted_file_is_rejected() {
        let csv = "Date,Close\n2023-01-04,1.5\n2023-01-03,2.5\n";
        let err = CsvSeriesStore::read_from(csv.as_bytes(), "Date", "Close").unwrap_err();
        assert!(matches!(err, DataError::NonMonotonicTimestamps { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", PRICES).unwrap();
        let store = CsvSeriesStore::new(file.path());
        assert_eq!(store.load("Close").unwrap().len(), 3);

        let missing = CsvSeriesStore::new("/nonexistent/prices.csv");
        assert!(matches!(missing.load("Close"), Err(DataError::Io { .. })));
    }
}
