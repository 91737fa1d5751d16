//! Price level with FIFO queue
//!
//! A price level holds every resting order at one (side, price), in
//! arrival order. Time priority is the queue order; the engine only ever
//! consumes from the front.
//!
//! Invariant: every contained order has remaining quantity > 0. A level
//! that would become empty is removed by its half-book, never kept.

use std::collections::VecDeque;
use types::ids::OrderId;
use types::numeric::Quantity;
use types::order::Order;

/// FIFO container of resting orders sharing one price.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    orders: VecDeque<Order>,
    /// Sum of remaining quantities, maintained incrementally.
    total_quantity: Quantity,
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceLevel {
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total_quantity: Quantity::zero(),
        }
    }

    /// Append an order at the back of the queue (time priority).
    pub fn push_back(&mut self, order: Order) {
        debug_assert!(!order.remaining_quantity.is_zero());
        self.total_quantity = self.total_quantity + order.remaining_quantity;
        self.orders.push_back(order);
    }

    /// The oldest resting order, if any.
    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Remove and return the oldest resting order.
    pub fn pop_front(&mut self) -> Option<Order> {
        let order = self.orders.pop_front()?;
        self.total_quantity = self.total_quantity.saturating_sub(order.remaining_quantity);
        Some(order)
    }

    /// Consume `quantity` from the front order.
    ///
    /// Returns the front order if it is now fully consumed (popped from
    /// the queue), `None` if it still has remaining quantity.
    ///
    /// # Panics
    /// Panics if the level is empty or `quantity` exceeds the front
    /// order's remainder.
    pub fn fill_front(&mut self, quantity: Quantity) -> Option<Order> {
        let front = self.orders.front_mut().expect("fill_front on empty level");
        front.fill(quantity);
        self.total_quantity = self.total_quantity.saturating_sub(quantity);
        if front.is_filled() {
            self.orders.pop_front()
        } else {
            None
        }
    }

    /// Remove a specific order by id (cancel path).
    ///
    /// Returns the removed order, or `None` if the id is not at this
    /// level. O(n) within the level.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let position = self.orders.iter().position(|o| &o.id == order_id)?;
        let order = self.orders.remove(position)?;
        self.total_quantity = self.total_quantity.saturating_sub(order.remaining_quantity);
        Some(order)
    }

    /// Resting orders in FIFO order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{ClientId, ClientOrderId, Symbol};
    use types::numeric::Price;
    use types::order::{OrderType, Side, TimeInForce};

    fn resting(id: u64, qty: &str) -> Order {
        Order::new(
            OrderId::new(id),
            ClientOrderId::new(format!("c-{id}")),
            ClientId::new("test"),
            Symbol::new("BTC-USD"),
            Side::Buy,
            OrderType::Limit,
            TimeInForce::Gtc,
            Some(Price::from_u64(100)),
            Quantity::from_str(qty).unwrap(),
            id,
        )
    }

    #[test]
    fn test_push_back_tracks_total() {
        let mut level = PriceLevel::new();
        level.push_back(resting(1, "1.5"));
        level.push_back(resting(2, "2.5"));

        assert_eq!(level.order_count(), 2);
        assert_eq!(level.total_quantity(), Quantity::from_str("4.0").unwrap());
        assert!(!level.is_empty());
    }

    #[test]
    fn test_fifo_order() {
        let mut level = PriceLevel::new();
        level.push_back(resting(1, "1.0"));
        level.push_back(resting(2, "2.0"));
        level.push_back(resting(3, "3.0"));

        assert_eq!(level.front().unwrap().id, OrderId::new(1));
        assert_eq!(level.pop_front().unwrap().id, OrderId::new(1));
        assert_eq!(level.front().unwrap().id, OrderId::new(2));
    }

    #[test]
    fn test_fill_front_partial_keeps_order() {
        let mut level = PriceLevel::new();
        level.push_back(resting(1, "2.0"));

        let done = level.fill_front(Quantity::from_str("0.5").unwrap());
        assert!(done.is_none());
        assert_eq!(level.order_count(), 1);
        assert_eq!(level.total_quantity(), Quantity::from_str("1.5").unwrap());
        assert_eq!(
            level.front().unwrap().remaining_quantity,
            Quantity::from_str("1.5").unwrap()
        );
    }

    #[test]
    fn test_fill_front_full_pops_order() {
        let mut level = PriceLevel::new();
        level.push_back(resting(1, "1.0"));
        level.push_back(resting(2, "2.0"));

        let done = level.fill_front(Quantity::from_str("1.0").unwrap());
        assert_eq!(done.unwrap().id, OrderId::new(1));
        assert_eq!(level.order_count(), 1);
        assert_eq!(level.total_quantity(), Quantity::from_str("2.0").unwrap());
    }

    #[test]
    fn test_remove_by_id_preserves_others() {
        let mut level = PriceLevel::new();
        level.push_back(resting(1, "1.0"));
        level.push_back(resting(2, "2.0"));
        level.push_back(resting(3, "3.0"));

        let removed = level.remove(&OrderId::new(2)).unwrap();
        assert_eq!(removed.remaining_quantity, Quantity::from_str("2.0").unwrap());

        let ids: Vec<OrderId> = level.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![OrderId::new(1), OrderId::new(3)]);
        assert_eq!(level.total_quantity(), Quantity::from_str("4.0").unwrap());
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut level = PriceLevel::new();
        level.push_back(resting(1, "1.0"));
        assert!(level.remove(&OrderId::new(99)).is_none());
        assert_eq!(level.order_count(), 1);
    }
}
