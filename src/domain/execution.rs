//! Limit-order fill simulation, sizing and commissions.
//!
//! Fill rules against the bar following placement:
//! - Buy limit: at the open if `open <= limit`, else at the limit if `low <= limit`
//! - Sell limit: at the open if `open >= limit`, else at the limit if `high >= limit`

use chrono::NaiveDateTime;

use super::ohlcv::OhlcvBar;
use super::order::Side;
use super::portfolio::Portfolio;
use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub commission_pct: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_pct: 0.0,
        }
    }
}

/// Sizes buys as a percentage of available cash at the limit price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentSizer {
    pub percent: f64,
}

impl PercentSizer {
    pub fn buy_size(&self, cash: f64, limit_price: f64) -> f64 {
        cash * self.percent / 100.0 / limit_price
    }
}

/// Calculate commission: trade_value * pct / 100.
pub fn calculate_commission(trade_value: f64, config: &ExecutionConfig) -> f64 {
    trade_value * config.commission_pct / 100.0
}

/// Execution price of a limit order on `bar`, or `None` if the bar never
/// reaches the limit.
pub fn limit_fill_price(side: Side, limit_price: f64, bar: &OhlcvBar) -> Option<f64> {
    match side {
        Side::Buy if bar.open <= limit_price => Some(bar.open),
        Side::Buy if bar.low <= limit_price => Some(limit_price),
        Side::Sell if bar.open >= limit_price => Some(bar.open),
        Side::Sell if bar.high >= limit_price => Some(limit_price),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        size: f64,
        execution_price: f64,
        cost: f64,
        commission: f64,
    },
    InsufficientCapital,
}

/// Open a long position of `size` units at `execution_price`.
///
/// Cash must cover cost plus commission; otherwise nothing changes.
pub fn enter_long(
    portfolio: &mut Portfolio,
    size: f64,
    execution_price: f64,
    time: NaiveDateTime,
    config: &ExecutionConfig,
) -> EntryResult {
    let cost = size * execution_price;
    let commission = calculate_commission(cost, config);
    let total_cost = cost + commission;

    if size <= 0.0 || total_cost > portfolio.cash {
        return EntryResult::InsufficientCapital;
    }

    portfolio.cash -= total_cost;
    portfolio.open_position(Position {
        size,
        entry_price: execution_price,
        entry_time: time,
        entry_commission: commission,
    });

    EntryResult::Entered {
        size,
        execution_price,
        cost,
        commission,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitResult {
    pub size: f64,
    pub exit_price: f64,
    pub exit_value: f64,
    pub exit_commission: f64,
    pub pnl: f64,
}

/// Close the whole position at `exit_price` and record the round trip.
///
/// PnL is net of both the entry and the exit commission.
pub fn exit_position(
    portfolio: &mut Portfolio,
    exit_price: f64,
    exit_time: NaiveDateTime,
    config: &ExecutionConfig,
) -> Option<ExitResult> {
    let position = portfolio.take_position()?;

    let exit_value = position.size * exit_price;
    let exit_commission = calculate_commission(exit_value, config);
    let pnl = position.unrealized_pnl(exit_price) - position.entry_commission - exit_commission;

    portfolio.cash += exit_value - exit_commission;
    portfolio.record_trade(ClosedTrade {
        size: position.size,
        entry_price: position.entry_price,
        exit_price,
        entry_time: position.entry_time,
        exit_time,
        pnl,
    });

    Some(ExitResult {
        size: position.size,
        exit_price,
        exit_value,
        exit_commission,
        pnl,
    })
}
