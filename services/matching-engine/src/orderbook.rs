//! Matched order book for a single instrument
//!
//! Owns the two half-books, the order-id index used by cancels, and the
//! matching waterfall. All methods run on the engine loop task; nothing
//! here is shared or locked.

use std::collections::HashMap;
use tracing::debug;

use persistence::{BookSnapshot, LevelSnapshot};
use types::errors::BookError;
use types::fee::FeeSchedule;
use types::ids::{ClientOrderId, OrderId};
use types::instrument::Instrument;
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, OrderType, Side, TimeInForce};
use types::trade::Trade;

use crate::book::{AskBook, BidBook};
use crate::matching::{crossing, FillExecutor};

/// Levels per side in published depth updates.
pub const DEPTH_LEVELS: usize = 10;

/// Post-trade L2 view: best bid/ask and top levels per side, best-first.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthView {
    pub best_bid: Option<(Price, Quantity)>,
    pub best_ask: Option<(Price, Quantity)>,
    pub bids: Vec<(Price, Quantity)>,
    pub asks: Vec<(Price, Quantity)>,
}

/// Everything `process_order` produced for one submission.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub order_id: OrderId,
    pub client_order_id: ClientOrderId,
    pub status: OrderStatus,
    /// Fills in execution order; possibly empty.
    pub fills: Vec<Trade>,
    /// Taker quantity left after matching (rested or discarded,
    /// depending on `status`).
    pub remaining: Quantity,
    pub depth: DepthView,
}

/// The per-instrument matched book.
pub struct OrderBook {
    instrument: Instrument,
    bids: BidBook,
    asks: AskBook,
    /// Order id → (side, resting price), for O(log N) cancel.
    order_index: HashMap<OrderId, (Side, Price)>,
    executor: FillExecutor,
}

impl OrderBook {
    pub fn new(instrument: Instrument, fees: FeeSchedule) -> Self {
        Self::with_next_trade_id(instrument, fees, 1)
    }

    fn with_next_trade_id(instrument: Instrument, fees: FeeSchedule, next_trade_id: u64) -> Self {
        let quote_precision = instrument.quote_precision;
        Self {
            instrument,
            bids: BidBook::new(),
            asks: AskBook::new(),
            order_index: HashMap::new(),
            executor: FillExecutor::new(next_trade_id, fees, quote_precision),
        }
    }

    /// Rebuild a book from a snapshot. Appending in file order preserves
    /// FIFO, so the restored book matches the snapshotted one for all
    /// subsequent matching.
    pub fn restore(instrument: Instrument, fees: FeeSchedule, snapshot: &BookSnapshot) -> Self {
        debug_assert_eq!(snapshot.symbol, instrument.symbol);
        let mut book = Self::with_next_trade_id(instrument, fees, snapshot.next_trade_id);
        for level in &snapshot.bids {
            for order in &level.orders {
                book.rest(order.clone());
            }
        }
        for level in &snapshot.asks {
            for order in &level.orders {
                book.rest(order.clone());
            }
        }
        book
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        self.bids.best()
    }

    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.asks.best()
    }

    /// Number of resting orders across both sides.
    pub fn open_orders(&self) -> usize {
        self.order_index.len()
    }

    /// The id the next trade will receive.
    pub fn next_trade_id(&self) -> u64 {
        self.executor.next_trade_id()
    }

    /// Run the matching waterfall for one incoming order.
    pub fn process_order(&mut self, mut order: Order) -> MatchOutcome {
        debug_assert!(!self.order_index.contains_key(&order.id));

        // FOK is all-or-nothing: pre-check availability without mutating.
        if order.time_in_force == TimeInForce::Fok {
            let fillable = self.fok_fillable(&order);
            if fillable < order.remaining_quantity {
                debug!(
                    order_id = %order.id,
                    required = %order.remaining_quantity,
                    %fillable,
                    "FOK order rejected"
                );
                return MatchOutcome {
                    order_id: order.id,
                    client_order_id: order.client_order_id.clone(),
                    status: OrderStatus::RejectedFok,
                    fills: Vec::new(),
                    remaining: order.remaining_quantity,
                    depth: self.depth_view(),
                };
            }
        }

        let mut fills = Vec::new();
        match order.side {
            Side::Buy => Self::match_against_asks(
                &mut self.asks,
                &mut self.order_index,
                &mut self.executor,
                &mut order,
                &mut fills,
            ),
            Side::Sell => Self::match_against_bids(
                &mut self.bids,
                &mut self.order_index,
                &mut self.executor,
                &mut order,
                &mut fills,
            ),
        }

        let order_id = order.id;
        let client_order_id = order.client_order_id.clone();
        let remaining = order.remaining_quantity;

        let status = if order.is_filled() {
            OrderStatus::Filled
        } else if order.order_type == OrderType::Limit && order.time_in_force == TimeInForce::Gtc {
            let had_fills = !fills.is_empty();
            self.rest(order);
            if had_fills {
                OrderStatus::PartiallyFilledResting
            } else {
                OrderStatus::Resting
            }
        } else if fills.is_empty() {
            // MARKET and IOC discard the residual.
            OrderStatus::CanceledIoc
        } else {
            OrderStatus::PartiallyFilledCanceled
        };

        MatchOutcome {
            order_id,
            client_order_id,
            status,
            fills,
            remaining,
            depth: self.depth_view(),
        }
    }

    /// Cancel a resting order by id, dropping its level if now empty.
    /// Returns the removed order; its remaining quantity is the residual.
    pub fn cancel(&mut self, order_id: OrderId) -> Result<Order, BookError> {
        let (side, price) = self
            .order_index
            .remove(&order_id)
            .ok_or(BookError::NotFound { order_id })?;

        let removed = match side {
            Side::Buy => self.bids.remove(&order_id, price),
            Side::Sell => self.asks.remove(&order_id, price),
        };

        match removed {
            Some(order) => {
                debug!(
                    %order_id,
                    residual = %order.remaining_quantity,
                    "Order cancelled"
                );
                Ok(order)
            }
            None => Err(BookError::NotFound { order_id }),
        }
    }

    /// Quantity fillable for `order` under its price constraint, without
    /// touching the book. Short-circuits once the required quantity is
    /// reachable.
    pub fn fok_fillable(&self, order: &Order) -> Quantity {
        let required = order.remaining_quantity;
        let mut available = Quantity::zero();

        match order.side {
            Side::Buy => {
                for (price, level) in self.asks.levels() {
                    if !crossing::taker_crosses(order.price, order.side, price) {
                        break;
                    }
                    available = available + level.total_quantity();
                    if available >= required {
                        break;
                    }
                }
            }
            Side::Sell => {
                for (price, level) in self.bids.levels() {
                    if !crossing::taker_crosses(order.price, order.side, price) {
                        break;
                    }
                    available = available + level.total_quantity();
                    if available >= required {
                        break;
                    }
                }
            }
        }
        available.min(required)
    }

    /// The book must never be crossed at rest; a violation is fatal.
    pub fn check_uncrossed(&self) -> Result<(), (Price, Price)> {
        if let (Some(bid), Some(ask)) = (self.bids.best_price(), self.asks.best_price()) {
            if crossing::crossed(bid, ask) {
                return Err((bid, ask));
            }
        }
        Ok(())
    }

    pub fn depth_view(&self) -> DepthView {
        DepthView {
            best_bid: self.bids.best(),
            best_ask: self.asks.best(),
            bids: self.bids.depth(DEPTH_LEVELS),
            asks: self.asks.depth(DEPTH_LEVELS),
        }
    }

    /// Serialize the live book for persistence. Levels best-first, orders
    /// FIFO; `next_timestamp_ns` is the engine clock's high-water mark.
    pub fn export(&self, next_timestamp_ns: u64) -> BookSnapshot {
        BookSnapshot {
            symbol: self.instrument.symbol.clone(),
            next_trade_id: self.executor.next_trade_id(),
            next_timestamp_ns,
            bids: self
                .bids
                .levels()
                .map(|(price, level)| LevelSnapshot {
                    price,
                    orders: level.iter().cloned().collect(),
                })
                .collect(),
            asks: self
                .asks
                .levels()
                .map(|(price, level)| LevelSnapshot {
                    price,
                    orders: level.iter().cloned().collect(),
                })
                .collect(),
        }
    }

    fn rest(&mut self, order: Order) {
        let price = order.price.expect("only limit orders rest");
        debug!(
            order_id = %order.id,
            side = ?order.side,
            %price,
            quantity = %order.remaining_quantity,
            "Order resting"
        );
        self.order_index.insert(order.id, (order.side, price));
        match order.side {
            Side::Buy => self.bids.insert(order),
            Side::Sell => self.asks.insert(order),
        }
    }

    fn match_against_asks(
        asks: &mut AskBook,
        index: &mut HashMap<OrderId, (Side, Price)>,
        executor: &mut FillExecutor,
        taker: &mut Order,
        fills: &mut Vec<Trade>,
    ) {
        while !taker.is_filled() {
            let Some(resting_price) = asks.best_price() else {
                break;
            };
            if !crossing::taker_crosses(taker.price, taker.side, resting_price) {
                break;
            }

            let level = asks.level_mut(resting_price).expect("best price has a level");
            while !taker.is_filled() {
                let Some(maker) = level.front() else {
                    break;
                };
                let maker_id = maker.id;
                let fill_quantity = taker.remaining_quantity.min(maker.remaining_quantity);

                // Execution at the resting maker's price.
                fills.push(executor.execute(
                    taker.symbol.clone(),
                    maker_id,
                    taker.id,
                    taker.side,
                    resting_price,
                    fill_quantity,
                    taker.ingest_timestamp_ns,
                ));

                taker.fill(fill_quantity);
                if let Some(consumed) = level.fill_front(fill_quantity) {
                    index.remove(&consumed.id);
                }
            }
            if level.is_empty() {
                asks.remove_level(resting_price);
            }
        }
    }

    fn match_against_bids(
        bids: &mut BidBook,
        index: &mut HashMap<OrderId, (Side, Price)>,
        executor: &mut FillExecutor,
        taker: &mut Order,
        fills: &mut Vec<Trade>,
    ) {
        while !taker.is_filled() {
            let Some(resting_price) = bids.best_price() else {
                break;
            };
            if !crossing::taker_crosses(taker.price, taker.side, resting_price) {
                break;
            }

            let level = bids.level_mut(resting_price).expect("best price has a level");
            while !taker.is_filled() {
                let Some(maker) = level.front() else {
                    break;
                };
                let maker_id = maker.id;
                let fill_quantity = taker.remaining_quantity.min(maker.remaining_quantity);

                // Execution at the resting maker's price.
                fills.push(executor.execute(
                    taker.symbol.clone(),
                    maker_id,
                    taker.id,
                    taker.side,
                    resting_price,
                    fill_quantity,
                    taker.ingest_timestamp_ns,
                ));

                taker.fill(fill_quantity);
                if let Some(consumed) = level.fill_front(fill_quantity) {
                    index.remove(&consumed.id);
                }
            }
            if level.is_empty() {
                bids.remove_level(resting_price);
            }
        }
    }
}
