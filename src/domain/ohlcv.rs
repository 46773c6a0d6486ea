//! OHLCV bar representation.

use chrono::NaiveDateTime;

use super::error::MeanrevError;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Checks that timestamps are strictly increasing.
///
/// A violation invalidates every rolling window built on top of the stream,
/// so the caller must abort the run.
pub fn validate_chronology(bars: &[OhlcvBar]) -> Result<(), MeanrevError> {
    for (index, pair) in bars.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(MeanrevError::OutOfOrderBar {
                index: index + 1,
                previous: pair[0].timestamp,
                current: pair[1].timestamp,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar_at(minute: u32, close: f64) -> OhlcvBar {
        OhlcvBar {
            timestamp: NaiveDate::from_ymd_opt(2018, 3, 1)
                .unwrap()
                .and_hms_opt(12, minute, 0)
                .unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 3.5,
        }
    }

    #[test]
    fn chronology_accepts_increasing() {
        let bars = vec![bar_at(0, 1.0), bar_at(1, 2.0), bar_at(2, 3.0)];
        assert!(validate_chronology(&bars).is_ok());
    }

    #[test]
    fn chronology_accepts_empty_and_single() {
        assert!(validate_chronology(&[]).is_ok());
        assert!(validate_chronology(&[bar_at(0, 1.0)]).is_ok());
    }

    #[test]
    fn chronology_rejects_duplicate_timestamp() {
        let bars = vec![bar_at(0, 1.0), bar_at(1, 2.0), bar_at(1, 3.0)];
        match validate_chronology(&bars) {
            Err(MeanrevError::OutOfOrderBar { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected OutOfOrderBar, got {:?}", other),
        }
    }

    #[test]
    fn chronology_rejects_reversed_stream() {
        let bars = vec![bar_at(5, 1.0), bar_at(4, 2.0)];
        assert!(matches!(
            validate_chronology(&bars),
            Err(MeanrevError::OutOfOrderBar { index: 1, .. })
        ));
    }
}
