//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) inputs are undefined.

use crate::domain::indicator::{IndicatorType, Line};

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    k: f64,
    seed_sum: f64,
    seen: usize,
    ema: f64,
    line: Line,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            k: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seen: 0,
            ema: 0.0,
            line: Line::new(),
        }
    }

    /// Feeds one input and returns the new value, if defined.
    ///
    /// Non-finite inputs are recorded as undefined and leave the average
    /// untouched, so a chained EMA starts once its source is defined and a
    /// bad close does not poison later values.
    pub fn next(&mut self, value: f64) -> Option<f64> {
        if self.period == 0 || !value.is_finite() {
            self.line.push_undefined();
            return None;
        }

        self.seen += 1;
        if self.seen < self.period {
            self.seed_sum += value;
            self.line.push_undefined();
            return None;
        }

        if self.seen == self.period {
            self.seed_sum += value;
            self.ema = self.seed_sum / self.period as f64;
        } else {
            self.ema = value * self.k + self.ema * (1.0 - self.k);
        }
        self.line.push(self.ema);
        Some(self.ema)
    }

    pub fn line(&self) -> &Line {
        &self.line
    }

    pub fn indicator_type(&self) -> IndicatorType {
        IndicatorType::Ema(self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(period: usize, prices: &[f64]) -> Ema {
        let mut ema = Ema::new(period);
        for &p in prices {
            ema.next(p);
        }
        ema
    }

    #[test]
    fn ema_warmup() {
        let ema = run(3, &[10.0, 20.0, 30.0, 40.0, 50.0]);
        let line = ema.line();

        assert!(line.get(0).is_none());
        assert!(line.get(1).is_none());
        assert!(line.get(2).is_some());
        assert!(line.get(3).is_some());
        assert!(line.get(4).is_some());
    }

    #[test]
    fn ema_period_1() {
        let ema = run(1, &[10.0, 20.0, 30.0]);
        let line = ema.line();

        assert!((line.get(0).unwrap() - 10.0).abs() < f64::EPSILON);
        assert!((line.get(1).unwrap() - 20.0).abs() < f64::EPSILON);
        assert!((line.get(2).unwrap() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_seed_is_sma() {
        let ema = run(3, &[10.0, 20.0, 30.0]);
        let expected_sma = (10.0 + 20.0 + 30.0) / 3.0;
        assert!((ema.line().get(2).unwrap() - expected_sma).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_calculation() {
        let ema = run(3, &[10.0, 20.0, 30.0, 40.0, 50.0]);
        let line = ema.line();

        let k = 2.0 / 4.0;
        let sma = (10.0 + 20.0 + 30.0) / 3.0;
        let ema_3 = 40.0 * k + sma * (1.0 - k);
        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);

        assert!((line.get(3).unwrap() - ema_3).abs() < f64::EPSILON);
        assert!((line.get(4).unwrap() - ema_4).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_equal_prices() {
        let ema = run(3, &[100.0, 100.0, 100.0, 100.0, 100.0]);
        for i in 2..5 {
            assert!((ema.line().get(i).unwrap() - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_skips_undefined_inputs_before_seeding() {
        let ema = run(2, &[f64::NAN, f64::NAN, 4.0, 6.0, 8.0]);
        let line = ema.line();

        assert_eq!(line.len(), 5);
        assert!(line.get(2).is_none());
        assert!((line.get(3).unwrap() - 5.0).abs() < f64::EPSILON);
        let k = 2.0 / 3.0;
        assert!((line.get(4).unwrap() - (8.0 * k + 5.0 * (1.0 - k))).abs() < 1e-12);
    }

    #[test]
    fn ema_period_0() {
        let ema = run(0, &[10.0, 20.0]);
        assert_eq!(ema.line().len(), 2);
        assert!(ema.line().current().is_none());
    }

    #[test]
    fn ema_indicator_type() {
        assert_eq!(Ema::new(5).indicator_type(), IndicatorType::Ema(5));
    }

    #[test]
    fn ema_ignores_non_finite_after_seeding() {
        let ema = run(2, &[4.0, 6.0, f64::INFINITY, f64::NAN, 8.0]);
        let line = ema.line();

        assert!(line.get(2).is_none());
        assert!(line.get(3).is_none());
        let k = 2.0 / 3.0;
        assert!((line.get(4).unwrap() - (8.0 * k + 5.0 * (1.0 - k))).abs() < 1e-12);
    }
}
