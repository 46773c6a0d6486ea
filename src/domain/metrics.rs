//! Performance metrics computed after a run.
//!
//! - Returns: `rtot = ln(end / start)`, `ravg = rtot / bars`,
//!   `rnorm = expm1(ravg * periods_per_year)`
//! - Sharpe: per-bar simple returns against the per-period risk-free rate
//!   `(1 + r)^(1 / periods_per_year) - 1`, population stddev, scaled by
//!   `sqrt(periods_per_year)`; undefined when the stddev is zero
//! - Drawdown: measured from the running equity peak, starting at the
//!   initial capital

use super::portfolio::{EquityPoint, Portfolio};
use super::timeframe::Timeframe;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub average_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown_pct: f64,
    pub max_drawdown_money: f64,
    pub max_drawdown_len: usize,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
}

impl Metrics {
    pub fn compute(portfolio: &Portfolio, risk_free_rate: f64, timeframe: Timeframe) -> Self {
        let equity_curve = &portfolio.equity_curve;
        let trades = &portfolio.closed_trades;
        let start = portfolio.initial_capital;
        let factor = timeframe.periods_per_year();

        let (total_return, average_return, annualized_return) =
            compute_returns(start, equity_curve, factor);
        let sharpe_ratio = compute_sharpe(start, equity_curve, risk_free_rate, factor);
        let drawdown = compute_drawdown(start, equity_curve);

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for trade in trades {
            let pnl = trade.pnl;
            if trade.is_win() {
                trades_won += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                trades_breakeven += 1;
            }
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        Metrics {
            total_return,
            average_return,
            annualized_return,
            sharpe_ratio,
            max_drawdown_pct: drawdown.max_pct,
            max_drawdown_money: drawdown.max_money,
            max_drawdown_len: drawdown.max_len,
            total_trades,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
        }
    }
}

fn compute_returns(start: f64, equity_curve: &[EquityPoint], factor: f64) -> (f64, f64, f64) {
    let Some(last) = equity_curve.last() else {
        return (0.0, 0.0, 0.0);
    };
    let end = last.equity;
    let rtot = if start > 0.0 && end > 0.0 {
        (end / start).ln()
    } else {
        f64::NEG_INFINITY
    };
    let ravg = rtot / equity_curve.len() as f64;
    (rtot, ravg, (ravg * factor).exp_m1())
}

fn compute_sharpe(
    start: f64,
    equity_curve: &[EquityPoint],
    risk_free_rate: f64,
    factor: f64,
) -> Option<f64> {
    let mut prev = start;
    let mut returns = Vec::with_capacity(equity_curve.len());
    for point in equity_curve {
        if prev > 0.0 {
            returns.push(point.equity / prev - 1.0);
        }
        prev = point.equity;
    }
    if returns.is_empty() {
        return None;
    }

    let period_rf = (1.0 + risk_free_rate).powf(1.0 / factor) - 1.0;
    let n = returns.len() as f64;
    let mean = returns.iter().map(|r| r - period_rf).sum::<f64>() / n;
    let variance = returns
        .iter()
        .map(|r| (r - period_rf - mean).powi(2))
        .sum::<f64>()
        / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 && stddev.is_finite() {
        Some(mean / stddev * factor.sqrt())
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Drawdown {
    max_pct: f64,
    max_money: f64,
    max_len: usize,
}

fn compute_drawdown(start: f64, equity_curve: &[EquityPoint]) -> Drawdown {
    let mut peak = start;
    let mut current_len = 0usize;
    let mut dd = Drawdown::default();

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_len = 0;
            continue;
        }
        current_len += 1;
        let money = peak - point.equity;
        dd.max_money = dd.max_money.max(money);
        if peak > 0.0 {
            dd.max_pct = dd.max_pct.max(100.0 * money / peak);
        }
        dd.max_len = dd.max_len.max(current_len);
    }

    dd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::ClosedTrade;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn make_equity_curve(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| EquityPoint {
                timestamp: t0() + Duration::minutes(i as i64),
                equity: v,
            })
            .collect()
    }

    fn make_portfolio(initial: f64, equity: &[f64], trades: Vec<ClosedTrade>) -> Portfolio {
        let mut portfolio = Portfolio::new(initial);
        for trade in trades {
            portfolio.record_trade(trade);
        }
        for point in make_equity_curve(equity) {
            portfolio.record_equity(point.timestamp, point.equity);
        }
        portfolio
    }

    fn make_trade(pnl: f64) -> ClosedTrade {
        ClosedTrade {
            size: 1.0,
            entry_price: 100.0,
            exit_price: 100.0 + pnl,
            entry_time: t0(),
            exit_time: t0() + Duration::minutes(30),
            pnl,
        }
    }

    #[test]
    fn metrics_empty_portfolio() {
        let portfolio = Portfolio::new(10_000.0);
        let metrics = Metrics::compute(&portfolio, 0.04, Timeframe::Minutes);
        assert!((metrics.total_return - 0.0).abs() < f64::EPSILON);
        assert!(metrics.sharpe_ratio.is_none());
        assert_eq!(metrics.total_trades, 0);
        assert_eq!(metrics.max_drawdown_len, 0);
    }

    #[test]
    fn log_returns_and_annualization() {
        let portfolio = make_portfolio(100.0, &[100.0, 105.0, 110.0, 121.0], vec![]);
        let metrics = Metrics::compute(&portfolio, 0.0, Timeframe::Days);

        let rtot = (1.21f64).ln();
        assert_relative_eq!(metrics.total_return, rtot, epsilon = 1e-12);
        assert_relative_eq!(metrics.average_return, rtot / 4.0, epsilon = 1e-12);
        assert_relative_eq!(
            metrics.annualized_return,
            (rtot / 4.0 * 365.0).exp_m1(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn yearly_bars_annualize_to_geometric_mean() {
        let portfolio = make_portfolio(100.0, &[110.0, 121.0], vec![]);
        let metrics = Metrics::compute(&portfolio, 0.0, Timeframe::Years);
        assert_relative_eq!(metrics.annualized_return, 0.10, epsilon = 1e-12);
    }

    #[test]
    fn sharpe_undefined_for_flat_equity() {
        let portfolio = make_portfolio(100.0, &[100.0; 10], vec![]);
        let metrics = Metrics::compute(&portfolio, 0.04, Timeframe::Minutes);
        assert!(metrics.sharpe_ratio.is_none());
    }

    #[test]
    fn sharpe_matches_hand_computation() {
        let equity = [101.0, 100.0, 102.0, 103.0];
        let portfolio = make_portfolio(100.0, &equity, vec![]);
        let metrics = Metrics::compute(&portfolio, 0.0, Timeframe::Years);

        let returns = [0.01, 100.0 / 101.0 - 1.0, 0.02, 103.0 / 102.0 - 1.0];
        let mean = returns.iter().sum::<f64>() / 4.0;
        let sd = (returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 4.0).sqrt();
        assert_relative_eq!(metrics.sharpe_ratio.unwrap(), mean / sd, epsilon = 1e-9);
    }

    #[test]
    fn risk_free_rate_lowers_sharpe() {
        let equity = [101.0, 100.5, 102.0, 103.0, 102.5, 104.0];
        let portfolio = make_portfolio(100.0, &equity, vec![]);
        let without = Metrics::compute(&portfolio, 0.0, Timeframe::Days).sharpe_ratio;
        let with = Metrics::compute(&portfolio, 0.04, Timeframe::Days).sharpe_ratio;
        assert!(with.unwrap() < without.unwrap());
    }

    #[test]
    fn max_drawdown_pct_money_and_len() {
        let equity = [100.0, 110.0, 90.0, 95.0, 80.0, 100.0, 120.0];
        let curve = make_equity_curve(&equity);
        let dd = compute_drawdown(100.0, &curve);

        assert_relative_eq!(dd.max_pct, 100.0 * 30.0 / 110.0, epsilon = 1e-9);
        assert_relative_eq!(dd.max_money, 30.0, epsilon = 1e-9);
        assert_eq!(dd.max_len, 4);
    }

    #[test]
    fn drawdown_measured_from_initial_capital() {
        let curve = make_equity_curve(&[95.0, 96.0]);
        let dd = compute_drawdown(100.0, &curve);
        assert_relative_eq!(dd.max_pct, 5.0, epsilon = 1e-9);
        assert_eq!(dd.max_len, 2);
    }

    #[test]
    fn trade_stats() {
        let trades = vec![
            make_trade(100.0),
            make_trade(-50.0),
            make_trade(200.0),
            make_trade(0.0),
        ];
        let portfolio = make_portfolio(10_000.0, &[10_250.0], trades);
        let metrics = Metrics::compute(&portfolio, 0.04, Timeframe::Minutes);

        assert_eq!(metrics.total_trades, 4);
        assert_eq!(metrics.trades_won, 2);
        assert_eq!(metrics.trades_lost, 1);
        assert_eq!(metrics.trades_breakeven, 1);
        assert!((metrics.win_rate - 0.5).abs() < f64::EPSILON);
        assert!((metrics.profit_factor - 6.0).abs() < 1e-9);
        assert!((metrics.avg_win - 150.0).abs() < 1e-9);
        assert!((metrics.avg_loss - 50.0).abs() < 1e-9);
        assert!((metrics.largest_win - 200.0).abs() < 1e-9);
        assert!((metrics.largest_loss - 50.0).abs() < 1e-9);
    }

    #[test]
    fn profit_factor_without_losses() {
        let portfolio = make_portfolio(10_000.0, &[10_100.0], vec![make_trade(100.0)]);
        let metrics = Metrics::compute(&portfolio, 0.04, Timeframe::Minutes);
        assert!(metrics.profit_factor.is_infinite());
    }
}
