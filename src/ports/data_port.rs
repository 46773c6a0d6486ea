//! Data access port trait.

use crate::domain::error::MeanrevError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDateTime;

pub trait DataPort {
    /// Bars in feed order. Ordering is not checked here.
    fn fetch_ohlcv(&self) -> Result<Vec<OhlcvBar>, MeanrevError>;

    fn get_data_range(&self) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, MeanrevError> {
        let bars = self.fetch_ohlcv()?;
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.timestamp, last.timestamp, bars.len()))),
            _ => Ok(None),
        }
    }
}
