//! Backtest engine and event loop.
//!
//! Per bar: deliver the broker's pending notifications, match live orders
//! against the bar, let the strategy act on its close, then mark equity.

use tracing::{info, warn};

use super::broker::SimBroker;
use super::error::MeanrevError;
use super::execution::{ExecutionConfig, PercentSizer};
use super::ohlcv::{validate_chronology, OhlcvBar};
use super::order::Fill;
use super::portfolio::Portfolio;
use super::strategy::{MeanReversion, StrategyParams, StrategyStats};
use super::timeframe::Timeframe;
use super::tracker::TrackerState;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub commission_pct: f64,
    pub risk_free_rate: f64,
    pub timeframe: Timeframe,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            commission_pct: 0.0,
            risk_free_rate: 0.04,
            timeframe: Timeframe::Minutes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub portfolio: Portfolio,
    pub fills: Vec<Fill>,
    pub stats: StrategyStats,
    pub final_state: TrackerState,
    pub orders_placed: usize,
    pub orders_canceled: usize,
    pub statistic_failures: usize,
    pub bars: usize,
}

pub fn run_backtest(
    bars: &[OhlcvBar],
    params: &StrategyParams,
    config: &BacktestConfig,
) -> Result<BacktestResult, MeanrevError> {
    if bars.is_empty() {
        return Err(MeanrevError::InsufficientData {
            bars: 0,
            minimum: 1,
        });
    }
    validate_chronology(bars)?;
    if bars.len() <= params.period {
        warn!(
            bars = bars.len(),
            period = params.period,
            "history not longer than the indicator period, no signals possible"
        );
    }

    let mut strategy = MeanReversion::new(params.clone());
    strategy.preload(bars);

    let mut broker = SimBroker::new(
        config.initial_capital,
        ExecutionConfig {
            commission_pct: config.commission_pct,
        },
        PercentSizer {
            percent: params.percent_stake,
        },
    );

    for (index, bar) in bars.iter().enumerate() {
        for update in broker.process_bar(bar) {
            strategy.notify_order(&update);
        }
        strategy.next(index, bar, &mut broker);
        broker.mark_to_market(bar);
    }

    let tracker = strategy.tracker();
    let result = BacktestResult {
        fills: tracker.fills().to_vec(),
        stats: strategy.stats(),
        final_state: tracker.state(),
        orders_placed: tracker.orders_placed(),
        orders_canceled: tracker.orders_canceled(),
        statistic_failures: strategy.indicators().statistic_failures(),
        bars: bars.len(),
        portfolio: broker.into_portfolio(),
    };

    info!(
        bars = result.bars,
        fills = result.fills.len(),
        round_trips = result.portfolio.closed_trades.len(),
        final_equity = result.portfolio.final_equity(),
        "backtest complete"
    );
    Ok(result)
}
