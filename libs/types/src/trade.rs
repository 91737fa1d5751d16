//! Trade fill record
//!
//! One `Trade` per maker/taker fill. Fees are computed per fill and carried
//! on the record; they are never netted across fills and never feed back
//! into matching.

use crate::ids::{OrderId, Symbol, TradeId};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An atomic exchange between a resting maker and an incoming taker.
///
/// Execution price is always the maker's resting price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub symbol: Symbol,
    pub price: Price,
    pub quantity: Quantity,
    pub taker_order_id: OrderId,
    pub maker_order_id: OrderId,
    /// Side of the aggressing (taker) order.
    pub taker_side: Side,
    /// Taker fee in the quote currency, rounded at quote precision.
    pub taker_fee: Decimal,
    /// Maker fee in the quote currency, rounded at quote precision.
    pub maker_fee: Decimal,
    pub executed_at_ns: u64,
}

impl Trade {
    /// Notional value of the fill (price × quantity), unrounded.
    pub fn trade_value(&self) -> Decimal {
        self.quantity.as_decimal() * self.price.as_decimal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::*;

    fn sample_trade() -> Trade {
        Trade {
            trade_id: TradeId::new(7),
            symbol: Symbol::new("BTC-USD"),
            price: Price::from_u64(100),
            quantity: Quantity::from_str("0.5").unwrap(),
            taker_order_id: OrderId::new(2),
            maker_order_id: OrderId::new(1),
            taker_side: Side::Buy,
            taker_fee: Decimal::from_str("0.10").unwrap(),
            maker_fee: Decimal::from_str("0.05").unwrap(),
            executed_at_ns: 42,
        }
    }

    #[test]
    fn test_trade_value() {
        assert_eq!(sample_trade().trade_value(), Decimal::from(50));
    }

    #[test]
    fn test_trade_serialization_round_trip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, back);
    }
}
