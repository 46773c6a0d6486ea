//! The three per-bar series read by the mean-reversion strategy.
//!
//! Bands and oscillator advance in O(1) per close; the moving ADF cache is
//! refreshed in bulk whenever a new block completes. The bundle holds no
//! trading state.

use crate::domain::indicator::bollinger::{Bands, Bollinger};
use crate::domain::indicator::macd::Macd;
use crate::domain::indicator::moving_adf::MovingAdf;
use crate::domain::indicator::IndicatorType;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorParams {
    pub period: usize,
    pub devfactor: f64,
    pub dupe_period: usize,
    pub fast_period: usize,
    pub signal_period: usize,
}

impl IndicatorParams {
    /// Fast EMA at half the period, signal at a third, reuse stride equal to
    /// the lookback. Derived periods never drop below one.
    pub fn from_period(period: usize, devfactor: f64) -> Self {
        Self {
            period,
            devfactor,
            dupe_period: period,
            fast_period: (period / 2).max(1),
            signal_period: (period / 3).max(1),
        }
    }
}

/// Indicator readings for one bar; `None` while the series is warming up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub index: usize,
    pub close: f64,
    pub bands: Option<Bands>,
    pub oscillator: Option<f64>,
    pub statistic: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct IndicatorBundle {
    closes: Vec<f64>,
    bands: Bollinger,
    oscillator: Macd,
    statistic: MovingAdf,
}

impl IndicatorBundle {
    pub fn new(params: &IndicatorParams) -> Self {
        Self {
            closes: Vec::new(),
            bands: Bollinger::new(params.period, params.devfactor),
            oscillator: Macd::new(params.fast_period, params.period, params.signal_period),
            statistic: MovingAdf::adf(params.period, params.dupe_period),
        }
    }

    pub fn push(&mut self, close: f64) {
        self.closes.push(close);
        self.bands.next(close);
        self.oscillator.next(close);
        self.statistic.update(&self.closes);
    }

    pub fn extend<I: IntoIterator<Item = f64>>(&mut self, closes: I) {
        for close in closes {
            self.push(close);
        }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn snapshot(&self, index: usize) -> Option<IndicatorSnapshot> {
        let close = *self.closes.get(index)?;
        Some(IndicatorSnapshot {
            index,
            close,
            bands: self.bands.bands_at(index),
            oscillator: self.oscillator.line().get(index),
            statistic: self.statistic.value(index),
        })
    }

    pub fn statistic_failures(&self) -> usize {
        self.statistic.failures()
    }

    pub fn indicator_types(&self) -> Vec<IndicatorType> {
        vec![
            self.bands.indicator_type(),
            self.oscillator.indicator_type(),
            self.statistic.indicator_type(),
        ]
    }
}
