//! Integration tests.
//!
//! Tests cover:
//! - Full backtest pipeline with mock data port: one round trip, analytics
//! - Fatal stream conditions (out-of-order bars, data errors)
//! - Strategy scenarios against a recording broker: warm-up, reissue,
//!   sell on spike, rejected sell
//! - Stride-cached windowed statistic block layout

mod common;

use approx::assert_relative_eq;
use common::*;
use meanrev::cli::run_backtest_pipeline;
use meanrev::domain::backtest::{run_backtest, BacktestConfig};
use meanrev::domain::error::{MeanrevError, StatisticError};
use meanrev::domain::indicator::moving_adf::{MovingStatistic, WindowStatistic};
use meanrev::domain::order::{Execution, OrderId, OrderStatus, OrderUpdate, Side};
use meanrev::domain::strategy::MeanReversion;
use meanrev::domain::tracker::TrackerState;

mod full_backtest_pipeline {
    use super::*;

    /// Dip-and-spike series where bar 56 trades up through the sell limit.
    fn round_trip_bars() -> Vec<OhlcvBar> {
        let mut bars = make_bars(&dip_and_spike());
        bars[56].high = 112.0;
        bars
    }

    #[test]
    fn full_pipeline_with_mock_data_port() {
        let port = MockDataPort::new().with_bars(round_trip_bars());
        let config = BacktestConfig::default();

        let (result, metrics) = run_backtest_pipeline(&port, &small_params(), &config).unwrap();

        assert_eq!(result.bars, 66);
        assert_eq!(result.fills.len(), 2);
        let entry = result.fills[0];
        let exit = result.fills[1];
        assert_eq!(entry.side, Side::Buy);
        assert_relative_eq!(entry.price, 98.0);
        assert_eq!(exit.side, Side::Sell);
        assert_relative_eq!(exit.price, 110.0);

        let size = 9_000.0 / 98.5;
        let trades = &result.portfolio.closed_trades;
        assert_eq!(trades.len(), 1);
        assert_relative_eq!(trades[0].pnl, size * 12.0, epsilon = 1e-9);
        assert_eq!(result.final_state, TrackerState::Flat);
        assert!(result.portfolio.position.is_none());

        let final_equity = 10_000.0 + size * 12.0;
        assert_relative_eq!(result.portfolio.final_equity(), final_equity, epsilon = 1e-9);
        assert_relative_eq!(
            metrics.total_return,
            (final_equity / 10_000.0).ln(),
            epsilon = 1e-12
        );
        assert_eq!(metrics.total_trades, 1);
        assert_eq!(metrics.trades_won, 1);
        assert_relative_eq!(metrics.win_rate, 1.0);
        assert!(metrics.max_drawdown_pct > 0.0);
    }

    #[test]
    fn one_equity_point_per_bar() {
        let bars = round_trip_bars();
        let result = run_backtest(&bars, &small_params(), &BacktestConfig::default()).unwrap();

        assert_eq!(result.portfolio.equity_curve.len(), bars.len());
        for (point, bar) in result.portfolio.equity_curve.iter().zip(&bars) {
            assert_eq!(point.timestamp, bar.timestamp);
        }
    }

    #[test]
    fn commission_reduces_round_trip_pnl() {
        let bars = round_trip_bars();
        let free = run_backtest(&bars, &small_params(), &BacktestConfig::default()).unwrap();
        let config = BacktestConfig {
            commission_pct: 0.1,
            ..BacktestConfig::default()
        };
        let charged = run_backtest(&bars, &small_params(), &config).unwrap();

        let free_pnl = free.portfolio.closed_trades[0].pnl;
        let charged_pnl = charged.portfolio.closed_trades[0].pnl;
        assert!(charged_pnl < free_pnl);
    }

    #[test]
    fn unreachable_sell_limit_leaves_position_open() {
        let bars = make_bars(&dip_and_spike());
        let result = run_backtest(&bars, &small_params(), &BacktestConfig::default()).unwrap();

        assert_eq!(result.fills.len(), 1);
        assert_eq!(result.final_state, TrackerState::SellPending);
        assert!(result.portfolio.position.is_some());
        assert!(result.portfolio.closed_trades.is_empty());
    }

    #[test]
    fn data_error_propagates() {
        let port = MockDataPort::new().with_error("disk on fire");
        let err = run_backtest_pipeline(&port, &small_params(), &BacktestConfig::default())
            .unwrap_err();
        assert!(matches!(err, MeanrevError::Data { .. }));
    }

    #[test]
    fn out_of_order_stream_aborts() {
        let mut bars = round_trip_bars();
        bars[30].timestamp = bars[29].timestamp;
        let port = MockDataPort::new().with_bars(bars);

        let err = run_backtest_pipeline(&port, &small_params(), &BacktestConfig::default())
            .unwrap_err();
        assert!(matches!(err, MeanrevError::OutOfOrderBar { index: 30, .. }));
    }
}

mod strategy_scenarios {
    use super::*;

    fn completed(id: OrderId, side: Side, bar: &OhlcvBar, price: f64) -> OrderUpdate {
        OrderUpdate {
            id,
            side,
            status: OrderStatus::Completed,
            execution: Some(Execution {
                timestamp: bar.timestamp,
                price,
                size: 10.0,
                commission: 0.0,
            }),
        }
    }

    #[test]
    fn history_shorter_than_period_never_orders() {
        let bars = make_bars(&[100.0, 70.0, 130.0, 60.0, 150.0, 50.0, 160.0, 40.0]);
        let mut strategy = MeanReversion::new(small_params());
        strategy.preload(&bars);
        let mut broker = MockBroker::new();

        for (i, bar) in bars.iter().enumerate() {
            strategy.next(i, bar, &mut broker);
        }

        assert!(broker.placed.is_empty());
        assert_eq!(strategy.state(), TrackerState::Flat);
    }

    #[test]
    fn second_buy_signal_reissues() {
        let bars = make_bars(&dip_and_spike());
        let mut strategy = MeanReversion::new(small_params());
        strategy.preload(&bars);
        let mut broker = MockBroker::new();

        for (i, bar) in bars.iter().enumerate().take(48) {
            strategy.next(i, bar, &mut broker);
        }

        // signals at 46 and 47
        assert_eq!(broker.placed.len(), 2);
        assert_eq!(broker.canceled, vec![broker.placed[0].id]);
        assert_eq!(broker.live(Side::Buy), vec![broker.placed[1].id]);
        assert_relative_eq!(broker.placed[0].limit_price, 98.5);
        assert_relative_eq!(broker.placed[1].limit_price, 98.0);
        assert_eq!(strategy.state(), TrackerState::BuyPending);
    }

    #[test]
    fn spike_while_long_issues_single_sell() {
        let bars = make_bars(&dip_and_spike());
        let mut strategy = MeanReversion::new(small_params());
        strategy.preload(&bars);
        let mut broker = MockBroker::new();

        for (i, bar) in bars.iter().enumerate().take(47) {
            strategy.next(i, bar, &mut broker);
        }
        let buy = broker.placed[0];
        strategy.notify_order(&completed(buy.id, Side::Buy, &bars[47], 98.0));
        assert_eq!(strategy.state(), TrackerState::Long);

        for (i, bar) in bars.iter().enumerate().take(56).skip(47) {
            strategy.next(i, bar, &mut broker);
        }

        let sells: Vec<_> = broker.placed.iter().filter(|o| o.side == Side::Sell).collect();
        assert_eq!(sells.len(), 1);
        assert_relative_eq!(sells[0].limit_price, 110.0);
        assert_eq!(strategy.state(), TrackerState::SellPending);
    }

    #[test]
    fn rejected_sell_returns_to_long() {
        let bars = make_bars(&dip_and_spike());
        let mut strategy = MeanReversion::new(small_params());
        strategy.preload(&bars);
        let mut broker = MockBroker::new();

        for (i, bar) in bars.iter().enumerate().take(47) {
            strategy.next(i, bar, &mut broker);
        }
        let buy = broker.placed[0];
        strategy.notify_order(&completed(buy.id, Side::Buy, &bars[47], 98.0));
        for (i, bar) in bars.iter().enumerate().take(56).skip(47) {
            strategy.next(i, bar, &mut broker);
        }
        let sell = *broker.placed.last().unwrap();

        strategy.notify_order(&OrderUpdate {
            id: sell.id,
            side: Side::Sell,
            status: OrderStatus::Rejected,
            execution: None,
        });

        assert_eq!(strategy.state(), TrackerState::Long);
        assert_eq!(strategy.tracker().entry().map(|f| f.price), Some(98.0));
        assert_eq!(strategy.stats().rejected_orders, 1);
    }
}

mod windowed_statistic {
    use super::*;

    struct WindowMean;

    impl WindowStatistic for WindowMean {
        fn compute(&self, window: &[f64]) -> Result<f64, StatisticError> {
            Ok(window.iter().sum::<f64>() / window.len() as f64)
        }
    }

    #[test]
    fn twenty_five_closes_period_five() {
        let closes: Vec<f64> = (0..25).map(|i| i as f64).collect();
        let mut cache = MovingStatistic::new(5, 5, WindowMean);
        cache.update(&closes);

        for i in 0..5 {
            assert_eq!(cache.value(i), None, "index {}", i);
        }
        // block [5,10) holds the window [5,10) evaluated at edge 10
        for i in 5..10 {
            assert_eq!(cache.value(i), Some(7.0));
        }
        for i in 10..15 {
            assert_eq!(cache.value(i), Some(12.0));
        }
        for i in 15..20 {
            assert_eq!(cache.value(i), Some(17.0));
        }
        // edge 25 is past the end of the history
        for i in 20..25 {
            assert_eq!(cache.value(i), None, "index {}", i);
        }
    }

    #[test]
    fn recompute_is_idempotent() {
        let closes = noisy(120, 5);
        let mut cache = MovingStatistic::new(30, 10, WindowMean);
        cache.update(&closes);
        let first: Vec<Option<f64>> = (0..closes.len()).map(|i| cache.value(i)).collect();

        cache.recompute(&closes);
        let second: Vec<Option<f64>> = (0..closes.len()).map(|i| cache.value(i)).collect();

        assert_eq!(first, second);
    }
}
