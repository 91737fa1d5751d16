//! Fill execution
//!
//! Builds one `Trade` per maker/taker fill: assigns the monotonic trade
//! id, executes at the maker's resting price, and attaches both fees
//! rounded at the instrument's quote precision.

use types::fee::FeeSchedule;
use types::ids::{OrderId, Symbol, TradeId};
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::trade::Trade;

/// Stateful trade factory owned by the book.
#[derive(Debug, Clone)]
pub struct FillExecutor {
    next_trade_id: u64,
    fees: FeeSchedule,
    quote_precision: u32,
}

impl FillExecutor {
    pub fn new(next_trade_id: u64, fees: FeeSchedule, quote_precision: u32) -> Self {
        Self {
            next_trade_id,
            fees,
            quote_precision,
        }
    }

    /// The id the next trade will receive (persisted in snapshots).
    pub fn next_trade_id(&self) -> u64 {
        self.next_trade_id
    }

    /// Record one fill between a resting maker and an incoming taker.
    ///
    /// `price` must be the maker's resting price.
    pub fn execute(
        &mut self,
        symbol: Symbol,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        taker_side: Side,
        price: Price,
        quantity: Quantity,
        executed_at_ns: u64,
    ) -> Trade {
        let trade_id = TradeId::new(self.next_trade_id);
        self.next_trade_id += 1;

        Trade {
            trade_id,
            symbol,
            price,
            quantity,
            taker_order_id,
            maker_order_id,
            taker_side,
            taker_fee: self.fees.taker_fee(price, quantity, self.quote_precision),
            maker_fee: self.fees.maker_fee(price, quantity, self.quote_precision),
            executed_at_ns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::*;
    use rust_decimal::Decimal;

    fn executor() -> FillExecutor {
        FillExecutor::new(1, FeeSchedule::standard(), 2)
    }

    #[test]
    fn test_trade_ids_are_monotonic() {
        let mut exec = executor();
        let t1 = exec.execute(
            Symbol::new("BTC-USD"),
            OrderId::new(1),
            OrderId::new(2),
            Side::Buy,
            Price::from_u64(100),
            Quantity::from_str("1.0").unwrap(),
            10,
        );
        let t2 = exec.execute(
            Symbol::new("BTC-USD"),
            OrderId::new(1),
            OrderId::new(3),
            Side::Buy,
            Price::from_u64(100),
            Quantity::from_str("0.5").unwrap(),
            11,
        );
        assert_eq!(t1.trade_id, TradeId::new(1));
        assert_eq!(t2.trade_id, TradeId::new(2));
        assert_eq!(exec.next_trade_id(), 3);
    }

    #[test]
    fn test_fees_attached_per_fill() {
        let mut exec = executor();
        let trade = exec.execute(
            Symbol::new("BTC-USD"),
            OrderId::new(1),
            OrderId::new(2),
            Side::Buy,
            Price::from_u64(100),
            Quantity::from_str("1.0").unwrap(),
            10,
        );
        assert_eq!(trade.taker_fee, Decimal::from_str("0.20").unwrap());
        assert_eq!(trade.maker_fee, Decimal::from_str("0.10").unwrap());
    }

    #[test]
    fn test_fee_rounding_on_odd_fill() {
        let mut exec = executor();
        let trade = exec.execute(
            Symbol::new("BTC-USD"),
            OrderId::new(1),
            OrderId::new(2),
            Side::Buy,
            Price::from_u64(101),
            Quantity::from_str("0.5").unwrap(),
            10,
        );
        // 50.5 notional: taker 0.101 → 0.10, maker 0.0505 → 0.05
        assert_eq!(trade.taker_fee, Decimal::from_str("0.10").unwrap());
        assert_eq!(trade.maker_fee, Decimal::from_str("0.05").unwrap());
    }
}
