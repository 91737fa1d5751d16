//! End-to-end matching scenarios
//!
//! Drives the book through full submission sequences and checks fills,
//! fees, resting state, and snapshot/restore behavior against expected
//! literals.

use matching_engine::orderbook::OrderBook;
use persistence::{decode, encode};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use types::fee::FeeSchedule;
use types::ids::{ClientId, ClientOrderId, OrderId, Symbol};
use types::instrument::Instrument;
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderStatus, OrderType, Side, TimeInForce};

fn btc_usd_book() -> OrderBook {
    OrderBook::new(Instrument::btc_usd(), FeeSchedule::standard())
}

fn order(
    id: u64,
    side: Side,
    order_type: OrderType,
    tif: TimeInForce,
    price: Option<&str>,
    qty: &str,
) -> Order {
    Order::new(
        OrderId::new(id),
        ClientOrderId::new(format!("c-{id}")),
        ClientId::new("test"),
        Symbol::new("BTC-USD"),
        side,
        order_type,
        tif,
        price.map(|p| Price::from_str(p).unwrap()),
        Quantity::from_str(qty).unwrap(),
        id,
    )
}

fn gtc(id: u64, side: Side, price: &str, qty: &str) -> Order {
    order(id, side, OrderType::Limit, TimeInForce::Gtc, Some(price), qty)
}

fn market(id: u64, side: Side, qty: &str) -> Order {
    order(id, side, OrderType::Market, TimeInForce::Ioc, None, qty)
}

fn fok(id: u64, side: Side, price: &str, qty: &str) -> Order {
    order(id, side, OrderType::Limit, TimeInForce::Fok, Some(price), qty)
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn qty(s: &str) -> Quantity {
    Quantity::from_str(s).unwrap()
}

fn price(s: &str) -> Price {
    Price::from_str(s).unwrap()
}

/// Market buy sweeps two ask levels; fees per fill at maker prices.
#[test]
fn market_buy_sweeps_two_levels_with_fees() {
    let mut book = btc_usd_book();
    book.process_order(gtc(1, Side::Sell, "100.00", "1.0")); // M1
    book.process_order(gtc(2, Side::Sell, "101.00", "1.0")); // M2

    let outcome = book.process_order(market(3, Side::Buy, "1.5"));

    assert_eq!(outcome.fills.len(), 2);

    let first = &outcome.fills[0];
    assert_eq!(first.price, price("100.00"));
    assert_eq!(first.quantity, qty("1.0"));
    assert_eq!(first.maker_order_id, OrderId::new(1));
    assert_eq!(first.taker_order_id, OrderId::new(3));
    assert_eq!(first.taker_fee, dec("0.20"));
    assert_eq!(first.maker_fee, dec("0.10"));

    let second = &outcome.fills[1];
    assert_eq!(second.price, price("101.00"));
    assert_eq!(second.quantity, qty("0.5"));
    assert_eq!(second.maker_order_id, OrderId::new(2));
    // 50.5 notional: 0.101 and 0.0505 round to 0.10 and 0.05
    assert_eq!(second.taker_fee, dec("0.10"));
    assert_eq!(second.maker_fee, dec("0.05"));

    // Both fills consumed the taker completely.
    assert_eq!(outcome.status, OrderStatus::Filled);
    assert!(outcome.remaining.is_zero());

    // Book top ask: 101.00 × 0.5
    assert_eq!(book.best_ask(), Some((price("101.00"), qty("0.5"))));
    assert!(book.best_bid().is_none());
}

/// Crossing limit executes at the resting maker's price, remainder rests.
#[test]
fn crossing_limit_executes_at_maker_price() {
    let mut book = btc_usd_book();

    let rest = book.process_order(gtc(1, Side::Buy, "50.00", "2.0")); // B1
    assert_eq!(rest.status, OrderStatus::Resting);

    let outcome = book.process_order(gtc(2, Side::Sell, "49.00", "3.0")); // S1

    assert_eq!(outcome.fills.len(), 1);
    assert_eq!(outcome.fills[0].price, price("50.00"));
    assert_eq!(outcome.fills[0].quantity, qty("2.0"));
    assert_eq!(outcome.fills[0].maker_order_id, OrderId::new(1));
    assert_eq!(outcome.status, OrderStatus::PartiallyFilledResting);

    assert!(book.best_bid().is_none());
    assert_eq!(book.best_ask(), Some((price("49.00"), qty("1.0"))));
}

/// FOK one unit short of full fill: rejected, book untouched.
#[test]
fn fok_short_of_liquidity_rejected_without_state_change() {
    let mut book = btc_usd_book();
    book.process_order(gtc(1, Side::Sell, "10.00", "1.0"));
    book.process_order(gtc(2, Side::Sell, "11.00", "1.0"));

    let depth_before = book.depth_view();
    let trade_id_before = book.next_trade_id();

    // Only 1.0 is fillable at or below 10.50.
    let outcome = book.process_order(fok(3, Side::Buy, "10.50", "1.5"));

    assert_eq!(outcome.status, OrderStatus::RejectedFok);
    assert!(outcome.fills.is_empty());
    assert_eq!(outcome.remaining, qty("1.5"));
    assert_eq!(book.depth_view(), depth_before);
    assert_eq!(book.next_trade_id(), trade_id_before);
    assert_eq!(book.open_orders(), 2);
}

/// FOK with exactly enough liquidity fills through both levels.
#[test]
fn fok_with_full_liquidity_fills_both_levels() {
    let mut book = btc_usd_book();
    book.process_order(gtc(1, Side::Sell, "10.00", "1.0"));
    book.process_order(gtc(2, Side::Sell, "11.00", "1.0"));

    let outcome = book.process_order(fok(3, Side::Buy, "11.00", "2.0"));

    assert_eq!(outcome.status, OrderStatus::Filled);
    assert_eq!(outcome.fills.len(), 2);
    assert_eq!(outcome.fills[0].price, price("10.00"));
    assert_eq!(outcome.fills[0].quantity, qty("1.0"));
    assert_eq!(outcome.fills[1].price, price("11.00"));
    assert_eq!(outcome.fills[1].quantity, qty("1.0"));
    assert!(book.best_ask().is_none());
}

/// FIFO within a level: a market sell consumes the two oldest bids.
#[test]
fn market_sell_respects_time_priority() {
    let mut book = btc_usd_book();
    book.process_order(gtc(1, Side::Buy, "100.00", "1.0")); // A
    book.process_order(gtc(2, Side::Buy, "100.00", "1.0")); // B
    book.process_order(gtc(3, Side::Buy, "100.00", "1.0")); // C

    let outcome = book.process_order(market(4, Side::Sell, "2.0"));

    assert_eq!(outcome.fills.len(), 2);
    assert_eq!(outcome.fills[0].maker_order_id, OrderId::new(1));
    assert_eq!(outcome.fills[0].quantity, qty("1.0"));
    assert_eq!(outcome.fills[1].maker_order_id, OrderId::new(2));
    assert_eq!(outcome.fills[1].quantity, qty("1.0"));
    assert_eq!(outcome.status, OrderStatus::Filled);

    // C remains alone at the head of 100.00.
    assert_eq!(book.best_bid(), Some((price("100.00"), qty("1.0"))));
}

/// Snapshot → restore → continue matching: C is still at the head.
#[test]
fn restore_preserves_head_of_queue() {
    let mut book = btc_usd_book();
    book.process_order(gtc(1, Side::Buy, "100.00", "1.0")); // A
    book.process_order(gtc(2, Side::Buy, "100.00", "1.0")); // B
    book.process_order(gtc(3, Side::Buy, "100.00", "1.0")); // C
    book.process_order(market(4, Side::Sell, "2.0"));

    // Round-trip through the binary codec, as a restart would.
    let snapshot = decode(&encode(&book.export(1_000))).unwrap();
    let mut restored = OrderBook::restore(
        Instrument::btc_usd(),
        FeeSchedule::standard(),
        &snapshot,
    );

    let outcome = restored.process_order(gtc(5, Side::Sell, "100.00", "0.5"));

    assert_eq!(outcome.fills.len(), 1);
    assert_eq!(outcome.fills[0].maker_order_id, OrderId::new(3)); // C
    assert_eq!(outcome.fills[0].price, price("100.00"));
    assert_eq!(outcome.fills[0].quantity, qty("0.5"));
    assert_eq!(outcome.status, OrderStatus::Filled);

    // C keeps the head with its residual.
    assert_eq!(restored.best_bid(), Some((price("100.00"), qty("0.5"))));
}

/// Snapshot-then-restore is an identity: the restored book produces the
/// same outputs as the original for a subsequent submission sequence.
#[test]
fn restored_book_matches_original_for_subsequent_flow() {
    let mut original = btc_usd_book();
    original.process_order(gtc(1, Side::Buy, "99.00", "2.0"));
    original.process_order(gtc(2, Side::Buy, "99.50", "1.0"));
    original.process_order(gtc(3, Side::Sell, "100.50", "1.5"));
    original.process_order(market(4, Side::Buy, "0.5"));

    let snapshot = decode(&encode(&original.export(500))).unwrap();
    let mut restored = OrderBook::restore(
        Instrument::btc_usd(),
        FeeSchedule::standard(),
        &snapshot,
    );

    let followups = [
        gtc(10, Side::Sell, "99.50", "1.2"),
        market(11, Side::Sell, "0.8"),
        gtc(12, Side::Buy, "100.00", "3.0"),
    ];

    for submission in followups {
        let a = original.process_order(submission.clone());
        let b = restored.process_order(submission);

        assert_eq!(a.status, b.status);
        assert_eq!(a.remaining, b.remaining);
        assert_eq!(a.fills.len(), b.fills.len());
        for (fa, fb) in a.fills.iter().zip(b.fills.iter()) {
            assert_eq!(fa.price, fb.price);
            assert_eq!(fa.quantity, fb.quantity);
            assert_eq!(fa.maker_order_id, fb.maker_order_id);
            assert_eq!(fa.taker_fee, fb.taker_fee);
            assert_eq!(fa.maker_fee, fb.maker_fee);
        }
        assert_eq!(a.depth, b.depth);
    }
}

/// The book is never crossed after any of a mixed sequence of operations.
#[test]
fn book_stays_uncrossed_through_mixed_flow() {
    let mut book = btc_usd_book();
    let submissions = [
        gtc(1, Side::Buy, "99.00", "1.0"),
        gtc(2, Side::Sell, "101.00", "2.0"),
        gtc(3, Side::Buy, "101.00", "0.5"),
        gtc(4, Side::Sell, "98.00", "0.4"),
        market(5, Side::Buy, "0.3"),
        gtc(6, Side::Buy, "100.00", "1.0"),
        gtc(7, Side::Sell, "100.00", "2.5"),
    ];

    for submission in submissions {
        book.process_order(submission);
        assert!(book.check_uncrossed().is_ok());
        if let (Some((bid, _)), Some((ask, _))) = (book.best_bid(), book.best_ask()) {
            assert!(bid < ask, "crossed book: {bid} >= {ask}");
        }
    }
}

/// For LIMIT takers every execution price respects the taker's limit.
#[test]
fn limit_taker_never_trades_through() {
    let mut book = btc_usd_book();
    book.process_order(gtc(1, Side::Sell, "100.00", "0.5"));
    book.process_order(gtc(2, Side::Sell, "100.50", "0.5"));
    book.process_order(gtc(3, Side::Sell, "101.00", "0.5"));

    let limit = price("100.50");
    let outcome = book.process_order(gtc(4, Side::Buy, "100.50", "2.0"));

    assert_eq!(outcome.fills.len(), 2);
    for fill in &outcome.fills {
        assert!(fill.price <= limit);
    }
    // The 101.00 level was price-gated, and the rest of the taker rested.
    assert_eq!(outcome.status, OrderStatus::PartiallyFilledResting);
    assert_eq!(book.best_bid(), Some((price("100.50"), qty("1.0"))));
    assert_eq!(book.best_ask(), Some((price("101.00"), qty("0.5"))));
}

/// IOC limit with partial availability fills what it can, cancels the rest.
#[test]
fn ioc_partial_fill_cancels_remainder() {
    let mut book = btc_usd_book();
    book.process_order(gtc(1, Side::Sell, "100.00", "0.75"));

    let outcome = book.process_order(order(
        2,
        Side::Buy,
        OrderType::Limit,
        TimeInForce::Ioc,
        Some("100.00"),
        "2.0",
    ));

    assert_eq!(outcome.status, OrderStatus::PartiallyFilledCanceled);
    assert_eq!(outcome.fills.len(), 1);
    assert_eq!(outcome.fills[0].quantity, qty("0.75"));
    assert_eq!(outcome.remaining, qty("1.25"));
    assert_eq!(book.open_orders(), 0);
}

/// Trade ids keep increasing across a snapshot/restore boundary.
#[test]
fn trade_ids_monotonic_across_restore() {
    let mut book = btc_usd_book();
    book.process_order(gtc(1, Side::Sell, "100.00", "1.0"));
    book.process_order(market(2, Side::Buy, "0.4"));

    let snapshot = decode(&encode(&book.export(100))).unwrap();
    assert_eq!(snapshot.next_trade_id, 2);

    let mut restored = OrderBook::restore(
        Instrument::btc_usd(),
        FeeSchedule::standard(),
        &snapshot,
    );
    let outcome = restored.process_order(market(3, Side::Buy, "0.2"));
    assert_eq!(outcome.fills[0].trade_id.value(), 2);
}
