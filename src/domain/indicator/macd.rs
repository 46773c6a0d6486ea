//! MACD (Moving Average Convergence Divergence) oscillator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! The line is defined once max(fast, slow) closes exist; the signal line
//! needs a further (signal - 1) bars.

use crate::domain::indicator::ema::Ema;
use crate::domain::indicator::{IndicatorType, Line};

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal_period: usize,
    ema_fast: Ema,
    ema_slow: Ema,
    ema_signal: Ema,
    line: Line,
    histogram: Line,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal_period: usize) -> Self {
        Self {
            fast,
            slow,
            signal_period,
            ema_fast: Ema::new(fast),
            ema_slow: Ema::new(slow),
            ema_signal: Ema::new(signal_period),
            line: Line::new(),
            histogram: Line::new(),
        }
    }

    /// Feeds one close and returns the MACD line value, if defined.
    pub fn next(&mut self, close: f64) -> Option<f64> {
        let fast = self.ema_fast.next(close);
        let slow = self.ema_slow.next(close);

        let macd = match (fast, slow) {
            (Some(f), Some(s)) => f - s,
            _ => f64::NAN,
        };
        self.line.push(macd);

        match self.ema_signal.next(macd) {
            Some(signal) => self.histogram.push(macd - signal),
            None => self.histogram.push_undefined(),
        }

        self.line.current()
    }

    pub fn line(&self) -> &Line {
        &self.line
    }

    pub fn signal(&self) -> &Line {
        self.ema_signal.line()
    }

    pub fn histogram(&self) -> &Line {
        &self.histogram
    }

    pub fn indicator_type(&self) -> IndicatorType {
        IndicatorType::Macd {
            fast: self.fast,
            slow: self.slow,
            signal: self.signal_period,
        }
    }
}
