//! Technical indicator implementations.
//!
//! Every indicator owns its output as one or more [`Line`]s: append-only
//! per-bar series indexed from the oldest bar (0) to the newest. Bars where a
//! value is not yet defined hold `NaN`, which reads back as `None`.
//!
//! - [`ema`]: exponential moving average
//! - [`bollinger`]: SMA ± k standard deviations
//! - [`macd`]: fast EMA − slow EMA oscillator with signal line
//! - [`adf`]: augmented Dickey-Fuller stationarity test
//! - [`moving_adf`]: stride-cached windowed statistic
//! - [`bundle`]: the three series the strategy reads per bar

pub mod adf;
pub mod bollinger;
pub mod bundle;
pub mod ema;
pub mod macd;
pub mod moving_adf;

use std::fmt;

#[derive(Debug, Clone, Default)]
pub struct Line {
    values: Vec<f64>,
}

impl Line {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    pub fn push_undefined(&mut self) {
        self.values.push(f64::NAN);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at absolute bar `index`; `None` when out of range or undefined.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().filter(|v| !v.is_nan())
    }

    /// Value `n` bars before the newest one.
    pub fn ago(&self, n: usize) -> Option<f64> {
        let index = self.values.len().checked_sub(n + 1)?;
        self.get(index)
    }

    pub fn current(&self) -> Option<f64> {
        self.ago(0)
    }

    pub(crate) fn set(&mut self, index: usize, value: f64) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
    }

    /// Grows the line to `len` bars, filling new slots with the sentinel.
    pub(crate) fn extend_undefined(&mut self, len: usize) {
        if len > self.values.len() {
            self.values.resize(len, f64::NAN);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    MovingAdf {
        period: usize,
        dupe_period: usize,
    },
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::MovingAdf {
                period,
                dupe_period,
            } => write!(f, "MOVADF({},{})", period, dupe_period),
        }
    }
}
