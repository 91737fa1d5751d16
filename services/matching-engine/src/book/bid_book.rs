//! Bid (buy-side) half-book
//!
//! Buy orders keyed by price in a BTreeMap; best-first iteration is
//! descending, so the highest bid comes first. At each price, orders keep
//! FIFO order.

use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::Order;

use super::price_level::PriceLevel;

/// Buy side of the book. Every present price key maps to a non-empty level.
#[derive(Debug, Clone, Default)]
pub struct BidBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Insert a resting order at its limit price, creating the level on
    /// first use.
    pub fn insert(&mut self, order: Order) {
        let price = order.price.expect("resting orders carry a price");
        self.levels
            .entry(price)
            .or_insert_with(PriceLevel::new)
            .push_back(order);
    }

    /// Remove an order by id from the level at `price`, dropping the level
    /// if it becomes empty. Returns the removed order.
    pub fn remove(&mut self, order_id: &OrderId, price: Price) -> Option<Order> {
        let level = self.levels.get_mut(&price)?;
        let removed = level.remove(order_id)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some(removed)
    }

    /// Highest bid price.
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next_back().copied()
    }

    /// Highest bid price with its aggregate quantity.
    pub fn best(&self) -> Option<(Price, Quantity)> {
        self.levels
            .iter()
            .next_back()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    pub fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Drop the level at `price` entirely.
    pub fn remove_level(&mut self, price: Price) {
        self.levels.remove(&price);
    }

    /// Levels in best-first order (descending price).
    pub fn levels(&self) -> impl Iterator<Item = (Price, &PriceLevel)> {
        self.levels.iter().rev().map(|(price, level)| (*price, level))
    }

    /// Top `depth` levels as (price, aggregate quantity), best-first.
    pub fn depth(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels
            .iter()
            .rev()
            .take(depth)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{ClientId, ClientOrderId, Symbol};
    use types::order::{OrderType, Side, TimeInForce};

    fn bid(id: u64, price: u64, qty: &str) -> Order {
        Order::new(
            OrderId::new(id),
            ClientOrderId::new(format!("c-{id}")),
            ClientId::new("test"),
            Symbol::new("BTC-USD"),
            Side::Buy,
            OrderType::Limit,
            TimeInForce::Gtc,
            Some(Price::from_u64(price)),
            Quantity::from_str(qty).unwrap(),
            id,
        )
    }

    #[test]
    fn test_best_is_highest_price() {
        let mut book = BidBook::new();
        book.insert(bid(1, 50_000, "1.0"));
        book.insert(bid(2, 51_000, "2.0"));
        book.insert(bid(3, 49_000, "1.5"));

        let (price, qty) = book.best().unwrap();
        assert_eq!(price, Price::from_u64(51_000));
        assert_eq!(qty, Quantity::from_str("2.0").unwrap());
    }

    #[test]
    fn test_depth_descends() {
        let mut book = BidBook::new();
        book.insert(bid(1, 50_000, "1.0"));
        book.insert(bid(2, 51_000, "2.0"));
        book.insert(bid(3, 49_000, "1.5"));
        book.insert(bid(4, 52_000, "0.5"));

        let depth = book.depth(2);
        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0].0, Price::from_u64(52_000));
        assert_eq!(depth[1].0, Price::from_u64(51_000));
    }

    #[test]
    fn test_same_price_aggregates() {
        let mut book = BidBook::new();
        book.insert(bid(1, 50_000, "1.0"));
        book.insert(bid(2, 50_000, "2.0"));

        assert_eq!(book.level_count(), 1);
        let (_, qty) = book.best().unwrap();
        assert_eq!(qty, Quantity::from_str("3.0").unwrap());
    }

    #[test]
    fn test_remove_drops_empty_level() {
        let mut book = BidBook::new();
        book.insert(bid(1, 50_000, "1.0"));

        let removed = book.remove(&OrderId::new(1), Price::from_u64(50_000));
        assert!(removed.is_some());
        assert!(book.is_empty());
        assert_eq!(book.best_price(), None);
    }

    #[test]
    fn test_remove_unknown_order() {
        let mut book = BidBook::new();
        book.insert(bid(1, 50_000, "1.0"));
        assert!(book.remove(&OrderId::new(9), Price::from_u64(50_000)).is_none());
        assert!(book.remove(&OrderId::new(1), Price::from_u64(40_000)).is_none());
        assert_eq!(book.level_count(), 1);
    }

    #[test]
    fn test_levels_iterate_best_first() {
        let mut book = BidBook::new();
        book.insert(bid(1, 50_000, "1.0"));
        book.insert(bid(2, 52_000, "1.0"));
        book.insert(bid(3, 51_000, "1.0"));

        let prices: Vec<Price> = book.levels().map(|(price, _)| price).collect();
        assert_eq!(
            prices,
            vec![
                Price::from_u64(52_000),
                Price::from_u64(51_000),
                Price::from_u64(50_000)
            ]
        );
    }
}
