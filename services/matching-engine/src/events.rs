//! Egress event envelopes
//!
//! The wire shapes published by the engine loop: per-fill trade reports,
//! post-trade depth updates, and per-submission outcome events. All are
//! self-describing JSON frames; decimals serialize as strings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::RejectReason;
use types::ids::{ClientOrderId, OrderId, Symbol, TradeId};
use types::numeric::{Price, Quantity};
use types::order::{OrderStatus, Side};
use types::trade::Trade;

use crate::orderbook::DepthView;

/// One price level in a depth update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelView {
    pub price: Price,
    pub quantity: Quantity,
}

impl From<(Price, Quantity)> for LevelView {
    fn from((price, quantity): (Price, Quantity)) -> Self {
        Self { price, quantity }
    }
}

/// Published on the trade feed, one per fill, in fill order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReport {
    pub trade_id: TradeId,
    pub instrument: Symbol,
    pub price: Price,
    pub quantity: Quantity,
    pub taker_order_id: OrderId,
    pub maker_order_id: OrderId,
    pub taker_side: Side,
    pub taker_fee: Decimal,
    pub maker_fee: Decimal,
    pub event_timestamp_ns: u64,
    pub core_latency_ns: u64,
}

impl TradeReport {
    pub fn from_trade(trade: &Trade, event_timestamp_ns: u64, core_latency_ns: u64) -> Self {
        Self {
            trade_id: trade.trade_id,
            instrument: trade.symbol.clone(),
            price: trade.price,
            quantity: trade.quantity,
            taker_order_id: trade.taker_order_id,
            maker_order_id: trade.maker_order_id,
            taker_side: trade.taker_side,
            taker_fee: trade.taker_fee,
            maker_fee: trade.maker_fee,
            event_timestamp_ns,
            core_latency_ns,
        }
    }
}

/// Published on the market-data feed after every book mutation:
/// BBO plus top-ten depth per side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct L2Update {
    pub instrument: Symbol,
    pub best_bid: Option<LevelView>,
    pub best_ask: Option<LevelView>,
    /// Up to ten levels, descending price.
    pub bids: Vec<LevelView>,
    /// Up to ten levels, ascending price.
    pub asks: Vec<LevelView>,
    pub event_timestamp_ns: u64,
    pub core_latency_ns: u64,
}

impl L2Update {
    pub fn from_depth(
        instrument: Symbol,
        depth: &DepthView,
        event_timestamp_ns: u64,
        core_latency_ns: u64,
    ) -> Self {
        Self {
            instrument,
            best_bid: depth.best_bid.map(LevelView::from),
            best_ask: depth.best_ask.map(LevelView::from),
            bids: depth.bids.iter().copied().map(LevelView::from).collect(),
            asks: depth.asks.iter().copied().map(LevelView::from).collect(),
            event_timestamp_ns,
            core_latency_ns,
        }
    }
}

/// Per-submission outcome, returned through the submitting connection.
///
/// Validation failures, FOK rejections, and cancel misses all surface
/// here; none of them are engine-level failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum OrderEvent {
    /// The submission reached the book; `status` is its disposition
    /// (including REJECTED_FOK, which leaves no trace on the book).
    #[serde(rename = "ORDER_OUTCOME")]
    Outcome {
        order_id: OrderId,
        client_order_id: ClientOrderId,
        status: OrderStatus,
        filled_quantity: Quantity,
        remaining_quantity: Quantity,
        event_timestamp_ns: u64,
    },

    /// The submission failed validation and never reached the book.
    #[serde(rename = "ORDER_REJECTED")]
    Rejected {
        client_order_id: ClientOrderId,
        reason: RejectReason,
        event_timestamp_ns: u64,
    },

    /// A resting order was cancelled; `residual_quantity` is what was
    /// still open.
    #[serde(rename = "ORDER_CANCELLED")]
    Canceled {
        order_id: OrderId,
        residual_quantity: Quantity,
        event_timestamp_ns: u64,
    },

    /// Cancel targeted an unknown or already-terminal order.
    #[serde(rename = "CANCEL_REJECTED")]
    CancelRejected {
        order_id: OrderId,
        event_timestamp_ns: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::*;

    #[test]
    fn test_trade_report_from_trade() {
        let trade = Trade {
            trade_id: TradeId::new(5),
            symbol: Symbol::new("BTC-USD"),
            price: Price::from_u64(100),
            quantity: Quantity::from_str("1.0").unwrap(),
            taker_order_id: OrderId::new(2),
            maker_order_id: OrderId::new(1),
            taker_side: Side::Buy,
            taker_fee: Decimal::from_str("0.20").unwrap(),
            maker_fee: Decimal::from_str("0.10").unwrap(),
            executed_at_ns: 100,
        };
        let report = TradeReport::from_trade(&trade, 150, 50);
        assert_eq!(report.trade_id, TradeId::new(5));
        assert_eq!(report.event_timestamp_ns, 150);
        assert_eq!(report.core_latency_ns, 50);
    }

    #[test]
    fn test_l2_update_wire_shape() {
        let update = L2Update {
            instrument: Symbol::new("BTC-USD"),
            best_bid: None,
            best_ask: Some(LevelView {
                price: Price::from_str("49.00").unwrap(),
                quantity: Quantity::from_str("1.0").unwrap(),
            }),
            bids: vec![],
            asks: vec![LevelView {
                price: Price::from_str("49.00").unwrap(),
                quantity: Quantity::from_str("1.0").unwrap(),
            }],
            event_timestamp_ns: 1,
            core_latency_ns: 1,
        };
        let json = serde_json::to_value(&update).unwrap();
        assert!(json["best_bid"].is_null());
        assert_eq!(json["best_ask"]["price"], "49.00");
        assert_eq!(json["asks"][0]["quantity"], "1.0");
    }

    #[test]
    fn test_order_event_tagging() {
        let event = OrderEvent::Rejected {
            client_order_id: ClientOrderId::new("c-1"),
            reason: RejectReason::MissingPrice,
            event_timestamp_ns: 9,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "ORDER_REJECTED");
        assert_eq!(json["reason"], "MISSING_PRICE");

        let cancelled = OrderEvent::Canceled {
            order_id: OrderId::new(3),
            residual_quantity: Quantity::from_str("0.5").unwrap(),
            event_timestamp_ns: 10,
        };
        let json = serde_json::to_value(&cancelled).unwrap();
        assert_eq!(json["event_type"], "ORDER_CANCELLED");
    }
}
