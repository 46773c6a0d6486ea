//! Order placement port.
//!
//! The broker owns sizing and execution. A successful return is the broker's
//! acknowledgement; later status changes arrive as
//! [`OrderUpdate`](crate::domain::order::OrderUpdate)s.

use crate::domain::error::BrokerError;
use crate::domain::order::{Order, OrderId, OrderStatus};

pub trait BrokerPort {
    fn place_limit_buy(&mut self, price: f64) -> Result<Order, BrokerError>;

    fn place_limit_sell(&mut self, price: f64) -> Result<Order, BrokerError>;

    /// Cancels synchronously and returns the order's final status, which is
    /// `Canceled` unless the order had already reached another terminal state.
    fn cancel(&mut self, id: OrderId) -> Result<OrderStatus, BrokerError>;
}
