//! Moving stationarity statistic, recomputed once per stride.
//!
//! Instead of running the test on every bar, one value is computed per block
//! of `dupe_period` bars and reused across the whole block. For each edge
//! `i = period, period + dupe_period, ...` with `i < len`, the statistic of
//! closes `[i - period, i)` is written to bars `[max(i - dupe_period, period), i)`.
//!
//! The value of a block is only known at its right edge and is written back
//! over bars that precede it. This is a look-ahead bias traded for run time;
//! consumers must preload the full history before reading it.
//!
//! Bars below `period` and bars after the last edge keep the `NaN` sentinel,
//! as do blocks whose window failed to evaluate.

use tracing::warn;

use crate::domain::error::StatisticError;
use crate::domain::indicator::adf::adfuller;
use crate::domain::indicator::{IndicatorType, Line};

/// A scalar computed over one window of closes.
pub trait WindowStatistic {
    fn compute(&self, window: &[f64]) -> Result<f64, StatisticError>;
}

/// ADF p-value of the window.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdfPValue;

impl WindowStatistic for AdfPValue {
    fn compute(&self, window: &[f64]) -> Result<f64, StatisticError> {
        adfuller(window).map(|r| r.p_value)
    }
}

#[derive(Debug, Clone)]
pub struct MovingStatistic<S> {
    period: usize,
    dupe_period: usize,
    statistic: S,
    values: Line,
    next_edge: usize,
    failures: usize,
}

pub type MovingAdf = MovingStatistic<AdfPValue>;

impl MovingAdf {
    pub fn adf(period: usize, dupe_period: usize) -> Self {
        MovingStatistic::new(period, dupe_period, AdfPValue)
    }
}

impl<S: WindowStatistic> MovingStatistic<S> {
    /// `period` and `dupe_period` must be positive; the strategy config is
    /// validated before construction.
    pub fn new(period: usize, dupe_period: usize, statistic: S) -> Self {
        Self {
            period: period.max(1),
            dupe_period: dupe_period.max(1),
            statistic,
            values: Line::new(),
            next_edge: period.max(1),
            failures: 0,
        }
    }

    /// Brings the cache up to date with `closes`, evaluating only the blocks
    /// completed since the last call.
    pub fn update(&mut self, closes: &[f64]) {
        self.values.extend_undefined(closes.len());
        while self.next_edge < closes.len() {
            self.fill_block(closes, self.next_edge);
            self.next_edge += self.dupe_period;
        }
    }

    /// Discards every cached block and evaluates the whole history again.
    pub fn recompute(&mut self, closes: &[f64]) {
        self.values.clear();
        self.next_edge = self.period;
        self.failures = 0;
        self.update(closes);
    }

    fn fill_block(&mut self, closes: &[f64], edge: usize) {
        let start = edge.saturating_sub(self.dupe_period).max(self.period);
        if start >= edge {
            return;
        }
        let window = &closes[edge - self.period..edge];
        match self.statistic.compute(window) {
            Ok(value) => {
                for index in start..edge {
                    self.values.set(index, value);
                }
            }
            Err(err) => {
                self.failures += 1;
                warn!(edge, error = %err, "windowed statistic failed, block left undefined");
            }
        }
    }

    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index)
    }

    pub fn line(&self) -> &Line {
        &self.values
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn dupe_period(&self) -> usize {
        self.dupe_period
    }

    /// Index of the first bar of the block containing `index`.
    pub fn block_start(&self, index: usize) -> Option<usize> {
        let offset = index.checked_sub(self.period)? % self.dupe_period;
        Some(index - offset)
    }
}

impl<S> MovingStatistic<S> {
    pub fn indicator_type(&self) -> IndicatorType {
        IndicatorType::MovingAdf {
            period: self.period,
            dupe_period: self.dupe_period,
        }
    }
}
