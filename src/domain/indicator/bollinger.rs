//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Mean and sum of squared deviations slide in O(1) per bar (Welford's
//! update) and are recomputed with two passes over the window every
//! `period` bars, which keeps rounding error from carrying across regimes.
//! Non-finite closes are recorded as undefined and leave the window untouched.
//!
//! Warmup: first (period-1) bars are undefined.

use std::collections::VecDeque;

use crate::domain::indicator::{IndicatorType, Line};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub lower: f64,
    pub middle: f64,
    pub upper: f64,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    stddev_mult_x100: u32,
    mult: f64,
    window: VecDeque<f64>,
    mean: f64,
    m2: f64,
    since_resync: usize,
    lower: Line,
    middle: Line,
    upper: Line,
}

impl Bollinger {
    pub fn new(period: usize, devfactor: f64) -> Self {
        let stddev_mult_x100 = (devfactor * 100.0).round().max(0.0) as u32;
        Self {
            period,
            stddev_mult_x100,
            mult: devfactor,
            window: VecDeque::with_capacity(period + 1),
            mean: 0.0,
            m2: 0.0,
            since_resync: 0,
            lower: Line::new(),
            middle: Line::new(),
            upper: Line::new(),
        }
    }

    pub fn next(&mut self, close: f64) -> Option<Bands> {
        if self.period == 0 || !close.is_finite() {
            self.push_undefined();
            return None;
        }

        if self.window.len() < self.period {
            self.window.push_back(close);
            let count = self.window.len() as f64;
            let delta = close - self.mean;
            self.mean += delta / count;
            self.m2 += delta * (close - self.mean);
        } else if let Some(old) = self.window.pop_front() {
            self.window.push_back(close);
            let old_mean = self.mean;
            self.mean += (close - old) / self.period as f64;
            self.m2 += (close - old) * (close - self.mean + old - old_mean);
        }

        self.since_resync += 1;
        if self.since_resync >= self.period {
            self.resync();
        }

        if self.window.len() < self.period {
            self.push_undefined();
            return None;
        }

        let variance = (self.m2 / self.period as f64).max(0.0);
        let stddev = variance.sqrt();
        let bands = Bands {
            lower: self.mean - self.mult * stddev,
            middle: self.mean,
            upper: self.mean + self.mult * stddev,
        };
        self.lower.push(bands.lower);
        self.middle.push(bands.middle);
        self.upper.push(bands.upper);
        Some(bands)
    }

    /// Two-pass mean and squared deviations over the current window.
    fn resync(&mut self) {
        let n = self.window.len() as f64;
        self.mean = self.window.iter().sum::<f64>() / n;
        self.m2 = self
            .window
            .iter()
            .map(|c| {
                let diff = c - self.mean;
                diff * diff
            })
            .sum();
        self.since_resync = 0;
    }

    fn push_undefined(&mut self) {
        self.lower.push_undefined();
        self.middle.push_undefined();
        self.upper.push_undefined();
    }

    pub fn bands_at(&self, index: usize) -> Option<Bands> {
        Some(Bands {
            lower: self.lower.get(index)?,
            middle: self.middle.get(index)?,
            upper: self.upper.get(index)?,
        })
    }

    pub fn len(&self) -> usize {
        self.middle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middle.is_empty()
    }

    pub fn indicator_type(&self) -> IndicatorType {
        IndicatorType::Bollinger {
            period: self.period,
            stddev_mult_x100: self.stddev_mult_x100,
        }
    }
}
