//! CSV file data adapter.
//!
//! Columns are located by header name, so exports with extra columns or a
//! different column order load unchanged. Exchange exports that list the
//! newest candle first can be replayed with `reverse`.

use crate::domain::error::MeanrevError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const TIME_HEADERS: [&str; 4] = ["time", "timestamp", "date", "datetime"];

pub struct CsvAdapter {
    path: PathBuf,
    reverse: bool,
}

struct Columns {
    time: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl CsvAdapter {
    pub fn new(path: PathBuf, reverse: bool) -> Self {
        Self { path, reverse }
    }

    fn locate_columns(headers: &csv::StringRecord) -> Result<Columns, MeanrevError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_ascii_lowercase().as_str()))
        };
        let require = |name: &str| {
            find(&[name]).ok_or_else(|| MeanrevError::Data {
                reason: format!("missing {} column", name),
            })
        };

        Ok(Columns {
            time: find(&TIME_HEADERS).ok_or_else(|| MeanrevError::Data {
                reason: format!("missing time column (one of {})", TIME_HEADERS.join(", ")),
            })?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find(&["volume"]),
        })
    }
}

/// Accepts unix seconds or an ISO-like date/time.
fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, MeanrevError> {
    let raw = raw.trim();
    if let Ok(seconds) = raw.parse::<i64>() {
        return DateTime::from_timestamp(seconds, 0)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| MeanrevError::Data {
                reason: format!("timestamp out of range: {}", raw),
            });
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| MeanrevError::Data {
            reason: format!("invalid timestamp: {}", raw),
        })
}

fn parse_field(record: &csv::StringRecord, column: usize, name: &str) -> Result<f64, MeanrevError> {
    let raw = record.get(column).ok_or_else(|| MeanrevError::Data {
        reason: format!("missing {} value", name),
    })?;
    let value = raw.trim().parse::<f64>().map_err(|e| MeanrevError::Data {
        reason: format!("invalid {} value '{}': {}", name, raw, e),
    })?;
    if !value.is_finite() {
        return Err(MeanrevError::Data {
            reason: format!("{} value '{}' is not finite", name, raw),
        });
    }
    Ok(value)
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(&self) -> Result<Vec<OhlcvBar>, MeanrevError> {
        let content = fs::read_to_string(&self.path).map_err(|source| MeanrevError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| MeanrevError::Data {
            reason: format!("CSV header error: {}", e),
        })?;
        let columns = Self::locate_columns(headers)?;

        let mut bars = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| MeanrevError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            let with_row = |e: MeanrevError| match e {
                MeanrevError::Data { reason } => MeanrevError::Data {
                    reason: format!("row {}: {}", row + 1, reason),
                },
                other => other,
            };

            let time = record.get(columns.time).ok_or_else(|| MeanrevError::Data {
                reason: format!("row {}: missing time value", row + 1),
            })?;
            let volume = match columns.volume {
                Some(column) => parse_field(&record, column, "volume").map_err(with_row)?,
                None => 0.0,
            };

            bars.push(OhlcvBar {
                timestamp: parse_timestamp(time).map_err(with_row)?,
                open: parse_field(&record, columns.open, "open").map_err(with_row)?,
                high: parse_field(&record, columns.high, "high").map_err(with_row)?,
                low: parse_field(&record, columns.low, "low").map_err(with_row)?,
                close: parse_field(&record, columns.close, "close").map_err(with_row)?,
                volume,
            });
        }

        if self.reverse {
            bars.reverse();
        }
        debug!(
            path = %self.path.display(),
            bars = bars.len(),
            reverse = self.reverse,
            "loaded CSV feed"
        );
        Ok(bars)
    }
}
