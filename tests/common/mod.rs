#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use meanrev::domain::error::{BrokerError, MeanrevError};
pub use meanrev::domain::ohlcv::OhlcvBar;
use meanrev::domain::order::{Order, OrderId, OrderStatus, Side};
use meanrev::domain::strategy::StrategyParams;
use meanrev::ports::broker_port::BrokerPort;
use meanrev::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub bars: Vec<OhlcvBar>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            bars: Vec::new(),
            error: None,
        }
    }

    pub fn with_bars(mut self, bars: Vec<OhlcvBar>) -> Self {
        self.bars = bars;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(&self) -> Result<Vec<OhlcvBar>, MeanrevError> {
        if let Some(reason) = &self.error {
            return Err(MeanrevError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.bars.clone())
    }
}

/// Records every placement and cancellation; never fills anything.
#[derive(Default)]
pub struct MockBroker {
    next_id: u64,
    pub placed: Vec<Order>,
    pub canceled: Vec<OrderId>,
    pub statuses: HashMap<OrderId, OrderStatus>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn place(&mut self, side: Side, price: f64) -> Result<Order, BrokerError> {
        self.next_id += 1;
        let order = Order {
            id: OrderId(self.next_id),
            side,
            limit_price: price,
        };
        self.placed.push(order);
        self.statuses.insert(order.id, OrderStatus::Accepted);
        Ok(order)
    }

    pub fn live(&self, side: Side) -> Vec<OrderId> {
        self.placed
            .iter()
            .filter(|o| o.side == side && self.statuses.get(&o.id) == Some(&OrderStatus::Accepted))
            .map(|o| o.id)
            .collect()
    }
}

impl BrokerPort for MockBroker {
    fn place_limit_buy(&mut self, price: f64) -> Result<Order, BrokerError> {
        self.place(Side::Buy, price)
    }

    fn place_limit_sell(&mut self, price: f64) -> Result<Order, BrokerError> {
        self.place(Side::Sell, price)
    }

    fn cancel(&mut self, id: OrderId) -> Result<OrderStatus, BrokerError> {
        let status = self
            .statuses
            .get_mut(&id)
            .ok_or(BrokerError::UnknownOrder(id))?;
        if !status.is_terminal() {
            *status = OrderStatus::Canceled;
            self.canceled.push(id);
        }
        Ok(*status)
    }
}

pub fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2018, 2, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// One-minute bar with a one-point range around `close`.
pub fn make_bar(minute: i64, close: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp: start_time() + Duration::minutes(minute),
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume: 1.0,
    }
}

pub fn make_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i as i64, c))
        .collect()
}

/// Deterministic noise in [99, 101).
pub fn noisy(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            100.0 + 2.0 * ((state >> 11) as f64 / (1u64 << 53) as f64 - 0.5)
        })
        .collect()
}

/// Flat noise, a slide to 90 at bar 49 and a spike to 110 at bar 55.
///
/// With [`small_params`] the closes at 46..=49 sit under the lower band
/// while the statistic is below threshold, and 110 clears the upper band.
pub fn dip_and_spike() -> Vec<f64> {
    let mut closes = noisy(45, 3);
    closes.extend([99.0, 98.5, 98.0, 97.5, 90.0]);
    closes.extend(noisy(5, 9));
    closes.push(110.0);
    closes.extend(noisy(10, 13));
    closes
}

pub fn small_params() -> StrategyParams {
    StrategyParams {
        period: 20,
        devfactor: 2.0,
        adf_threshold: 0.5,
        percent_stake: 90.0,
        dupe_period: 20,
        fast_period: 10,
        signal_period: 6,
    }
}
