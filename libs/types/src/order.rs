//! Order record and its tagged attribute enums
//!
//! All behavioral branching on order kind and time-in-force is exhaustive
//! over these enums; there is no string dispatch anywhere in the engine.

use crate::ids::{ClientId, ClientOrderId, OrderId, Symbol};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (bid or ask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order kind. MARKET orders carry no price and always imply IOC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Limit,
    Market,
}

/// Time-in-force policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    /// Good-till-cancelled: unfilled remainder rests on the book.
    Gtc,
    /// Immediate-or-cancel: fill what crosses, cancel the remainder.
    Ioc,
    /// Fill-or-kill: fill completely or reject with no state change.
    Fok,
}

/// Terminal disposition of a processed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "FULLY_FILLED")]
    Filled,
    #[serde(rename = "PARTIALLY_FILLED_AND_RESTING")]
    PartiallyFilledResting,
    #[serde(rename = "PARTIALLY_FILLED_AND_CANCELLED")]
    PartiallyFilledCanceled,
    #[serde(rename = "RESTING")]
    Resting,
    #[serde(rename = "CANCELLED_IOC")]
    CanceledIoc,
    #[serde(rename = "REJECTED_FOK")]
    RejectedFok,
}

/// A single order.
///
/// Immutable after creation except for `remaining_quantity`, which only
/// ever decreases. The ingest timestamp is assigned by the engine when the
/// submission is dequeued, never by the client; FIFO position within a
/// price level is equivalent to ingest-timestamp order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub client_order_id: ClientOrderId,
    pub client_id: ClientId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    /// Limit price; `None` exactly for MARKET orders.
    pub price: Option<Price>,
    pub original_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub ingest_timestamp_ns: u64,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderId,
        client_order_id: ClientOrderId,
        client_id: ClientId,
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        time_in_force: TimeInForce,
        price: Option<Price>,
        quantity: Quantity,
        ingest_timestamp_ns: u64,
    ) -> Self {
        debug_assert!(
            order_type != OrderType::Market || price.is_none(),
            "MARKET orders carry no price"
        );
        Self {
            id,
            client_order_id,
            client_id,
            symbol,
            side,
            order_type,
            time_in_force,
            price,
            original_quantity: quantity,
            remaining_quantity: quantity,
            ingest_timestamp_ns,
        }
    }

    pub fn is_market(&self) -> bool {
        self.order_type == OrderType::Market
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity.is_zero()
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.original_quantity.saturating_sub(self.remaining_quantity)
    }

    /// Consume quantity from the remainder.
    ///
    /// # Panics
    /// Panics if the fill exceeds the remaining quantity.
    pub fn fill(&mut self, quantity: Quantity) {
        assert!(
            quantity.as_decimal() <= self.remaining_quantity.as_decimal(),
            "Fill would exceed remaining quantity"
        );
        self.remaining_quantity = self.remaining_quantity - quantity;
    }
}
