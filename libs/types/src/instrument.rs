//! Instrument metadata
//!
//! Tick, lot, and quote-precision parameters for a traded instrument.
//! The book validates submissions against these before matching.

use crate::ids::Symbol;
use crate::numeric::{Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Static per-instrument parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: Symbol,
    /// Minimum price increment; all prices must be multiples of it.
    pub tick_size: Decimal,
    /// Minimum quantity increment; all quantities must be multiples of it.
    pub lot_size: Decimal,
    /// Fractional digits of the quote currency, used for fee rounding.
    pub quote_precision: u32,
}

impl Instrument {
    pub fn new(
        symbol: Symbol,
        tick_size: Decimal,
        lot_size: Decimal,
        quote_precision: u32,
    ) -> Self {
        assert!(tick_size > Decimal::ZERO, "tick size must be positive");
        assert!(lot_size > Decimal::ZERO, "lot size must be positive");
        Self {
            symbol,
            tick_size,
            lot_size,
            quote_precision,
        }
    }

    /// BTC-USD with 0.01 tick, 8-digit base lots, 2-digit quote.
    pub fn btc_usd() -> Self {
        Self::new(
            Symbol::new("BTC-USD"),
            Decimal::new(1, 2),
            Decimal::new(1, 8),
            2,
        )
    }

    /// Whether a price lands on the tick grid.
    pub fn price_on_tick(&self, price: Price) -> bool {
        (price.as_decimal() % self.tick_size).is_zero()
    }

    /// Whether a quantity lands on the lot grid.
    pub fn quantity_on_lot(&self, quantity: Quantity) -> bool {
        (quantity.as_decimal() % self.lot_size).is_zero()
    }
}
