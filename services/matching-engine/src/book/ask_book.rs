//! Ask (sell-side) half-book
//!
//! Sell orders keyed by price in a BTreeMap; natural ascending iteration
//! is already best-first (lowest ask first). At each price, orders keep
//! FIFO order.

use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::Order;

use super::price_level::PriceLevel;

/// Sell side of the book. Every present price key maps to a non-empty level.
#[derive(Debug, Clone, Default)]
pub struct AskBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
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

    /// Lowest ask price.
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next().copied()
    }

    /// Lowest ask price with its aggregate quantity.
    pub fn best(&self) -> Option<(Price, Quantity)> {
        self.levels
            .iter()
            .next()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    pub fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Drop the level at `price` entirely.
    pub fn remove_level(&mut self, price: Price) {
        self.levels.remove(&price);
    }

    /// Levels in best-first order (ascending price).
    pub fn levels(&self) -> impl Iterator<Item = (Price, &PriceLevel)> {
        self.levels.iter().map(|(price, level)| (*price, level))
    }

    /// Top `depth` levels as (price, aggregate quantity), best-first.
    pub fn depth(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels
            .iter()
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
