//! Position/order tracker.
//!
//! Holds at most one logical long position and at most one live order per
//! side. All placements and cancellations go through a [`BrokerPort`]; the
//! tracked references change only once the broker has acknowledged.
//!
//! - Flat → BuyPending on buy; BuyPending → Long on fill, → Flat on
//!   cancel/reject.
//! - Long → SellPending on sell; SellPending → Flat on fill, → Long on
//!   cancel/reject.
//! - A second submit on a pending side cancels the live order first.

use std::fmt;

use crate::domain::error::TrackerError;
use crate::domain::order::{Fill, Order, OrderId, OrderStatus, OrderUpdate};
use crate::ports::broker_port::BrokerPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackerState {
    Flat,
    BuyPending,
    Long,
    SellPending,
}

impl TrackerState {
    pub fn has_position(self) -> bool {
        matches!(self, TrackerState::Long | TrackerState::SellPending)
    }

    pub fn name(self) -> &'static str {
        match self {
            TrackerState::Flat => "flat",
            TrackerState::BuyPending => "buy pending",
            TrackerState::Long => "long",
            TrackerState::SellPending => "sell pending",
        }
    }
}

impl fmt::Display for TrackerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    Flat,
    BuyPending { buy: Order },
    Long { entry: Fill },
    SellPending { entry: Fill, sell: Order },
}

/// Outcome of a terminal notification for a tracked order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerEvent {
    BuyExecuted(Fill),
    SellExecuted { entry: Fill, exit: Fill },
    BuyAbandoned { id: OrderId, status: OrderStatus },
    SellAbandoned { id: OrderId, status: OrderStatus },
}

#[derive(Debug, Clone)]
pub struct OrderTracker {
    slot: Slot,
    fills: Vec<Fill>,
    orders_placed: usize,
    orders_canceled: usize,
}

impl Default for OrderTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderTracker {
    pub fn new() -> Self {
        Self {
            slot: Slot::Flat,
            fills: Vec::new(),
            orders_placed: 0,
            orders_canceled: 0,
        }
    }

    pub fn state(&self) -> TrackerState {
        match self.slot {
            Slot::Flat => TrackerState::Flat,
            Slot::BuyPending { .. } => TrackerState::BuyPending,
            Slot::Long { .. } => TrackerState::Long,
            Slot::SellPending { .. } => TrackerState::SellPending,
        }
    }

    pub fn live_buy(&self) -> Option<Order> {
        match self.slot {
            Slot::BuyPending { buy } => Some(buy),
            _ => None,
        }
    }

    pub fn live_sell(&self) -> Option<Order> {
        match self.slot {
            Slot::SellPending { sell, .. } => Some(sell),
            _ => None,
        }
    }

    /// Fill that opened the current position.
    pub fn entry(&self) -> Option<Fill> {
        match self.slot {
            Slot::Long { entry } | Slot::SellPending { entry, .. } => Some(entry),
            _ => None,
        }
    }

    /// Every executed buy and sell, in execution order.
    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn orders_placed(&self) -> usize {
        self.orders_placed
    }

    pub fn orders_canceled(&self) -> usize {
        self.orders_canceled
    }

    /// Places a buy limit order, replacing the live buy if there is one.
    pub fn submit_buy<B: BrokerPort + ?Sized>(
        &mut self,
        limit_price: f64,
        broker: &mut B,
    ) -> Result<Order, TrackerError> {
        match self.slot {
            Slot::Flat => {}
            Slot::BuyPending { buy } => {
                self.cancel_live(buy.id, broker)?;
                self.slot = Slot::Flat;
            }
            Slot::Long { .. } | Slot::SellPending { .. } => {
                return Err(TrackerError::InvalidTransition {
                    action: "buy",
                    state: self.state().name(),
                });
            }
        }

        let buy = broker.place_limit_buy(limit_price)?;
        self.orders_placed += 1;
        self.slot = Slot::BuyPending { buy };
        Ok(buy)
    }

    /// Places a sell limit order closing the position, replacing the live sell
    /// if there is one.
    pub fn submit_sell<B: BrokerPort + ?Sized>(
        &mut self,
        limit_price: f64,
        broker: &mut B,
    ) -> Result<Order, TrackerError> {
        let entry = match self.slot {
            Slot::Long { entry } => entry,
            Slot::SellPending { entry, sell } => {
                self.cancel_live(sell.id, broker)?;
                self.slot = Slot::Long { entry };
                entry
            }
            Slot::Flat | Slot::BuyPending { .. } => {
                return Err(TrackerError::InvalidTransition {
                    action: "sell",
                    state: self.state().name(),
                });
            }
        };

        let sell = broker.place_limit_sell(limit_price)?;
        self.orders_placed += 1;
        self.slot = Slot::SellPending { entry, sell };
        Ok(sell)
    }

    fn cancel_live<B: BrokerPort + ?Sized>(
        &mut self,
        id: OrderId,
        broker: &mut B,
    ) -> Result<(), TrackerError> {
        match broker.cancel(id)? {
            OrderStatus::Completed => Err(TrackerError::CancelRaced { id }),
            _ => {
                self.orders_canceled += 1;
                Ok(())
            }
        }
    }

    /// Applies a broker status change.
    ///
    /// Non-terminal statuses are no-ops. Terminal statuses for an order that
    /// is not the live one on its side are reported as `UntrackedOrder` and
    /// change nothing.
    pub fn on_order_notification(
        &mut self,
        update: &OrderUpdate,
    ) -> Result<Option<TrackerEvent>, TrackerError> {
        if !update.status.is_terminal() {
            return Ok(None);
        }

        match self.slot {
            Slot::BuyPending { buy } if buy.id == update.id => {
                if update.status == OrderStatus::Completed {
                    let fill = self.record_fill(&buy, update)?;
                    self.slot = Slot::Long { entry: fill };
                    Ok(Some(TrackerEvent::BuyExecuted(fill)))
                } else {
                    self.slot = Slot::Flat;
                    Ok(Some(TrackerEvent::BuyAbandoned {
                        id: update.id,
                        status: update.status,
                    }))
                }
            }
            Slot::SellPending { entry, sell } if sell.id == update.id => {
                if update.status == OrderStatus::Completed {
                    let exit = self.record_fill(&sell, update)?;
                    self.slot = Slot::Flat;
                    Ok(Some(TrackerEvent::SellExecuted { entry, exit }))
                } else {
                    self.slot = Slot::Long { entry };
                    Ok(Some(TrackerEvent::SellAbandoned {
                        id: update.id,
                        status: update.status,
                    }))
                }
            }
            _ => Err(TrackerError::UntrackedOrder {
                id: update.id,
                status: update.status,
            }),
        }
    }

    fn record_fill(&mut self, order: &Order, update: &OrderUpdate) -> Result<Fill, TrackerError> {
        let execution = update
            .execution
            .ok_or(TrackerError::MissingExecution { id: update.id })?;
        let fill = Fill {
            order_id: order.id,
            side: order.side,
            timestamp: execution.timestamp,
            price: execution.price,
            size: execution.size,
        };
        self.fills.push(fill);
        Ok(fill)
    }
}
