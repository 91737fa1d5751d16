//! Maker/taker fee schedule
//!
//! Flat rates applied to the executed trade value (price × quantity),
//! denominated in the quote currency and rounded half-away-from-zero at
//! the instrument's quote precision.

use crate::numeric::{round_quote, Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flat fee schedule.
///
/// Makers provide liquidity and pay the lower rate; takers remove it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub maker_rate: Decimal,
    pub taker_rate: Decimal,
}

impl FeeSchedule {
    /// Maker 10 bps, taker 20 bps.
    pub fn standard() -> Self {
        Self {
            maker_rate: Decimal::new(10, 4),
            taker_rate: Decimal::new(20, 4),
        }
    }

    /// Fee owed by the maker for one fill, rounded at quote precision.
    pub fn maker_fee(&self, price: Price, quantity: Quantity, quote_precision: u32) -> Decimal {
        round_quote(
            quantity.as_decimal() * price.as_decimal() * self.maker_rate,
            quote_precision,
        )
    }

    /// Fee owed by the taker for one fill, rounded at quote precision.
    pub fn taker_fee(&self, price: Price, quantity: Quantity, quote_precision: u32) -> Decimal {
        round_quote(
            quantity.as_decimal() * price.as_decimal() * self.taker_rate,
            quote_precision,
        )
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::standard()
    }
}
