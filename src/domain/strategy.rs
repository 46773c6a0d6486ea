//! Mean-reversion strategy: indicators, signal evaluation and order tracking
//! wired into a per-bar loop.
//!
//! Contract violations reported by the tracker are logged and the action is
//! dropped; the run continues.

use tracing::{debug, info, warn};

use crate::domain::error::TrackerError;
use crate::domain::indicator::bundle::{IndicatorBundle, IndicatorParams};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::order::{Fill, OrderStatus, OrderUpdate};
use crate::domain::signal::{self, Signal, SignalParams};
use crate::domain::tracker::{OrderTracker, TrackerEvent, TrackerState};
use crate::ports::broker_port::BrokerPort;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub period: usize,
    pub devfactor: f64,
    pub adf_threshold: f64,
    pub percent_stake: f64,
    pub dupe_period: usize,
    pub fast_period: usize,
    pub signal_period: usize,
}

impl Default for StrategyParams {
    fn default() -> Self {
        let indicators = IndicatorParams::from_period(60, 2.0);
        StrategyParams {
            period: indicators.period,
            devfactor: indicators.devfactor,
            adf_threshold: 0.5,
            percent_stake: 90.0,
            dupe_period: indicators.dupe_period,
            fast_period: indicators.fast_period,
            signal_period: indicators.signal_period,
        }
    }
}

impl StrategyParams {
    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            period: self.period,
            devfactor: self.devfactor,
            dupe_period: self.dupe_period,
            fast_period: self.fast_period,
            signal_period: self.signal_period,
        }
    }

    pub fn signal_params(&self) -> SignalParams {
        SignalParams {
            adf_threshold: self.adf_threshold,
        }
    }
}

/// Counters kept over one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrategyStats {
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub dropped_actions: usize,
    pub rejected_orders: usize,
    pub stale_notifications: usize,
}

#[derive(Debug, Clone)]
pub struct MeanReversion {
    params: StrategyParams,
    indicators: IndicatorBundle,
    tracker: OrderTracker,
    stats: StrategyStats,
}

impl MeanReversion {
    pub fn new(params: StrategyParams) -> Self {
        Self {
            indicators: IndicatorBundle::new(&params.indicator_params()),
            tracker: OrderTracker::new(),
            stats: StrategyStats::default(),
            params,
        }
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    pub fn indicators(&self) -> &IndicatorBundle {
        &self.indicators
    }

    pub fn state(&self) -> TrackerState {
        self.tracker.state()
    }

    pub fn tracker(&self) -> &OrderTracker {
        &self.tracker
    }

    pub fn stats(&self) -> StrategyStats {
        self.stats
    }

    pub fn fills(&self) -> &[Fill] {
        self.tracker.fills()
    }

    /// Feeds the whole close history to the indicators ahead of replay.
    ///
    /// The windowed statistic back-fills each block from its right edge, so
    /// it needs the full history before any bar is evaluated.
    pub fn preload(&mut self, bars: &[OhlcvBar]) {
        self.indicators.extend(bars.iter().map(|b| b.close));
        debug!(
            bars = bars.len(),
            statistic_failures = self.indicators.statistic_failures(),
            "indicators preloaded"
        );
    }

    /// Evaluates bar `index` and acts on the resulting signal.
    pub fn next<B: BrokerPort + ?Sized>(&mut self, index: usize, bar: &OhlcvBar, broker: &mut B) {
        if index >= self.indicators.len() {
            self.indicators.push(bar.close);
        }
        let Some(snapshot) = self.indicators.snapshot(index) else {
            return;
        };

        let result = match signal::evaluate(&snapshot, self.tracker.state(), &self.params.signal_params()) {
            Signal::Hold => return,
            Signal::Buy { limit_price } => {
                self.stats.buy_signals += 1;
                debug!(index, timestamp = %bar.timestamp, limit_price, state = %self.tracker.state(), "BUY CREATE");
                self.tracker.submit_buy(limit_price, broker)
            }
            Signal::Sell { limit_price } => {
                self.stats.sell_signals += 1;
                debug!(index, timestamp = %bar.timestamp, limit_price, state = %self.tracker.state(), "SELL CREATE");
                self.tracker.submit_sell(limit_price, broker)
            }
        };

        if let Err(err) = result {
            self.stats.dropped_actions += 1;
            warn!(index, error = %err, "action dropped");
        }
    }

    /// Applies one broker notification to the tracker.
    pub fn notify_order(&mut self, update: &OrderUpdate) {
        match self.tracker.on_order_notification(update) {
            Ok(None) => debug!(order = %update.id, status = %update.status, "order acknowledged"),
            Ok(Some(event)) => self.log_event(event),
            Err(TrackerError::UntrackedOrder { id, status }) => {
                self.stats.stale_notifications += 1;
                if status == OrderStatus::Canceled {
                    debug!(order = %id, "cancel confirmed for replaced order");
                } else {
                    warn!(order = %id, %status, "notification for untracked order ignored");
                }
            }
            Err(err) => {
                self.stats.dropped_actions += 1;
                warn!(order = %update.id, error = %err, "notification dropped");
            }
        }
    }

    fn log_event(&mut self, event: TrackerEvent) {
        match event {
            TrackerEvent::BuyExecuted(fill) => {
                info!(order = %fill.order_id, price = fill.price, size = fill.size, "BUY EXECUTED");
            }
            TrackerEvent::SellExecuted { entry, exit } => {
                info!(
                    order = %exit.order_id,
                    price = exit.price,
                    size = exit.size,
                    gross = (exit.price - entry.price) * exit.size,
                    "SELL EXECUTED"
                );
            }
            TrackerEvent::BuyAbandoned { id, status } | TrackerEvent::SellAbandoned { id, status } => {
                if status == OrderStatus::Canceled {
                    debug!(order = %id, "order canceled");
                } else {
                    self.stats.rejected_orders += 1;
                    warn!(order = %id, %status, "order rejected");
                }
            }
        }
    }
}
