//! Simulated broker for bar replay.
//!
//! Orders placed while bar *t* is processed are matched from bar *t+1*
//! onwards. Status changes are queued and handed out by [`SimBroker::process_bar`]
//! at the start of the next bar, acknowledgements and cancellations first,
//! then executions in placement order.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use tracing::debug;

use super::error::BrokerError;
use super::execution::{
    enter_long, exit_position, limit_fill_price, EntryResult, ExecutionConfig, PercentSizer,
};
use super::ohlcv::OhlcvBar;
use super::order::{Execution, Order, OrderId, OrderStatus, OrderUpdate, Side};
use super::portfolio::Portfolio;
use crate::ports::broker_port::BrokerPort;

#[derive(Debug, Clone, Copy)]
struct LiveOrder {
    order: Order,
    /// Fixed at placement for buys; sells close whatever is held at execution.
    size: f64,
}

#[derive(Debug, Clone)]
pub struct SimBroker {
    config: ExecutionConfig,
    sizer: PercentSizer,
    portfolio: Portfolio,
    next_id: u64,
    live: Vec<LiveOrder>,
    statuses: HashMap<OrderId, OrderStatus>,
    queued: Vec<OrderUpdate>,
}

impl SimBroker {
    pub fn new(initial_capital: f64, config: ExecutionConfig, sizer: PercentSizer) -> Self {
        Self {
            config,
            sizer,
            portfolio: Portfolio::new(initial_capital),
            next_id: 0,
            live: Vec::new(),
            statuses: HashMap::new(),
            queued: Vec::new(),
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn into_portfolio(self) -> Portfolio {
        self.portfolio
    }

    pub fn live_orders(&self) -> Vec<Order> {
        self.live.iter().map(|l| l.order).collect()
    }

    pub fn status(&self, id: OrderId) -> Option<OrderStatus> {
        self.statuses.get(&id).copied()
    }

    /// Delivers queued notifications and matches live orders against `bar`.
    pub fn process_bar(&mut self, bar: &OhlcvBar) -> Vec<OrderUpdate> {
        let mut updates = std::mem::take(&mut self.queued);
        for live in std::mem::take(&mut self.live) {
            match limit_fill_price(live.order.side, live.order.limit_price, bar) {
                Some(price) => updates.push(self.execute(live, price, bar.timestamp)),
                None => self.live.push(live),
            }
        }
        updates
    }

    /// Records and returns the equity at the close of `bar`.
    pub fn mark_to_market(&mut self, bar: &OhlcvBar) -> f64 {
        let equity = self.portfolio.total_equity(bar.close);
        self.portfolio.record_equity(bar.timestamp, equity);
        equity
    }

    fn execute(&mut self, live: LiveOrder, price: f64, timestamp: NaiveDateTime) -> OrderUpdate {
        let order = live.order;
        let executed = match order.side {
            Side::Buy if self.portfolio.has_position() => Err(OrderStatus::Rejected),
            Side::Buy => {
                match enter_long(&mut self.portfolio, live.size, price, timestamp, &self.config) {
                    EntryResult::Entered {
                        size, commission, ..
                    } => Ok((size, commission)),
                    EntryResult::InsufficientCapital => Err(OrderStatus::Margin),
                }
            }
            Side::Sell => exit_position(&mut self.portfolio, price, timestamp, &self.config)
                .map(|exit| (exit.size, exit.exit_commission))
                .ok_or(OrderStatus::Rejected),
        };

        let (status, execution) = match executed {
            Ok((size, commission)) => (
                OrderStatus::Completed,
                Some(Execution {
                    timestamp,
                    price,
                    size,
                    commission,
                }),
            ),
            Err(status) => (status, None),
        };
        self.statuses.insert(order.id, status);
        debug!(order = %order.id, side = %order.side, %status, price, "order matched");

        OrderUpdate {
            id: order.id,
            side: order.side,
            status,
            execution,
        }
    }

    fn place(&mut self, side: Side, limit_price: f64, size: f64) -> Order {
        self.next_id += 1;
        let order = Order {
            id: OrderId(self.next_id),
            side,
            limit_price,
        };
        self.live.push(LiveOrder { order, size });
        self.statuses.insert(order.id, OrderStatus::Accepted);
        for status in [OrderStatus::Submitted, OrderStatus::Accepted] {
            self.queued.push(OrderUpdate {
                id: order.id,
                side,
                status,
                execution: None,
            });
        }
        debug!(order = %order.id, %side, limit_price, size, "order placed");
        order
    }
}

fn check_price(limit_price: f64) -> Result<(), BrokerError> {
    if limit_price.is_finite() && limit_price > 0.0 {
        Ok(())
    } else {
        Err(BrokerError::InvalidPrice(limit_price))
    }
}

impl BrokerPort for SimBroker {
    fn place_limit_buy(&mut self, limit_price: f64) -> Result<Order, BrokerError> {
        check_price(limit_price)?;
        let size = self.sizer.buy_size(self.portfolio.cash, limit_price);
        if !(size.is_finite() && size > 0.0) {
            return Err(BrokerError::InvalidSize(size));
        }
        Ok(self.place(Side::Buy, limit_price, size))
    }

    fn place_limit_sell(&mut self, limit_price: f64) -> Result<Order, BrokerError> {
        check_price(limit_price)?;
        Ok(self.place(Side::Sell, limit_price, 0.0))
    }

    fn cancel(&mut self, id: OrderId) -> Result<OrderStatus, BrokerError> {
        if let Some(pos) = self.live.iter().position(|l| l.order.id == id) {
            let live = self.live.remove(pos);
            self.statuses.insert(id, OrderStatus::Canceled);
            self.queued.push(OrderUpdate {
                id,
                side: live.order.side,
                status: OrderStatus::Canceled,
                execution: None,
            });
            debug!(order = %id, "order canceled");
            return Ok(OrderStatus::Canceled);
        }
        self.statuses
            .get(&id)
            .copied()
            .ok_or(BrokerError::UnknownOrder(id))
    }
}
