//! Crossing detection
//!
//! Whether an incoming order may execute against a resting price. This is
//! the trade-through gate: iteration over opposing levels stops at the
//! first price that fails it, because no worse price can pass.

use types::numeric::Price;
use types::order::Side;

/// Whether the incoming (taker) order may execute at `resting_price`.
///
/// A MARKET taker (`taker_limit` = None) crosses every level. A LIMIT
/// buyer crosses while its limit is at or above the resting ask; a LIMIT
/// seller while its limit is at or below the resting bid.
pub fn taker_crosses(taker_limit: Option<Price>, taker_side: Side, resting_price: Price) -> bool {
    match taker_limit {
        None => true,
        Some(limit) => match taker_side {
            Side::Buy => limit >= resting_price,
            Side::Sell => limit <= resting_price,
        },
    }
}

/// Whether a resting bid and a resting ask would cross. Used for the
/// book-uncrossed invariant: this must never hold at rest.
pub fn crossed(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_always_crosses() {
        assert!(taker_crosses(None, Side::Buy, Price::from_u64(1_000_000)));
        assert!(taker_crosses(None, Side::Sell, Price::from_u64(1)));
    }

    #[test]
    fn test_limit_buy_crosses_at_or_below_limit() {
        let limit = Some(Price::from_u64(100));
        assert!(taker_crosses(limit, Side::Buy, Price::from_u64(99)));
        assert!(taker_crosses(limit, Side::Buy, Price::from_u64(100)));
        assert!(!taker_crosses(limit, Side::Buy, Price::from_u64(101)));
    }

    #[test]
    fn test_limit_sell_crosses_at_or_above_limit() {
        let limit = Some(Price::from_u64(100));
        assert!(taker_crosses(limit, Side::Sell, Price::from_u64(101)));
        assert!(taker_crosses(limit, Side::Sell, Price::from_u64(100)));
        assert!(!taker_crosses(limit, Side::Sell, Price::from_u64(99)));
    }

    #[test]
    fn test_crossed_book_detection() {
        assert!(crossed(Price::from_u64(100), Price::from_u64(100)));
        assert!(crossed(Price::from_u64(101), Price::from_u64(100)));
        assert!(!crossed(Price::from_u64(99), Price::from_u64(100)));
    }
}
