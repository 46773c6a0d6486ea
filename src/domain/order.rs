//! Orders, order-status notifications and executed fills.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Submitted,
    Accepted,
    Completed,
    Canceled,
    Margin,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Submitted | OrderStatus::Accepted)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::Submitted => "Submitted",
            OrderStatus::Accepted => "Accepted",
            OrderStatus::Completed => "Completed",
            OrderStatus::Canceled => "Canceled",
            OrderStatus::Margin => "Margin",
            OrderStatus::Rejected => "Rejected",
        };
        write!(f, "{}", name)
    }
}

/// Handle returned by the broker once it has acknowledged a placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub limit_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Execution {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub size: f64,
    pub commission: f64,
}

/// Status change pushed by the broker for a previously placed order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderUpdate {
    pub id: OrderId,
    pub side: Side,
    pub status: OrderStatus,
    /// Present only for `Completed`.
    pub execution: Option<Execution>,
}

/// One executed buy or sell, the trace consumed by analytics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub order_id: OrderId,
    pub side: Side,
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub size: f64,
}
