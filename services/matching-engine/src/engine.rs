//! Engine loop
//!
//! The single writer. One task owns the book and drains a bounded intake
//! queue; all mutation happens here, so the book needs no lock. Egress is
//! two broadcast channels (trades, depth updates) that lagging
//! subscribers can fall behind on without stalling the loop, plus a
//! watch channel carrying snapshot health.
//!
//! The loop never starts item k+1 before item k's events are fully
//! emitted: dispatch and publication are synchronous, and the only
//! suspension points are between items and inside snapshot I/O.

use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{error, info, warn};

use persistence::SnapshotWriter;
use types::ids::{ClientId, ClientOrderId, OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderType, Side, TimeInForce};

use crate::clock::EngineClock;
use crate::events::{L2Update, OrderEvent, TradeReport};
use crate::orderbook::OrderBook;
use crate::validation;

/// Egress broadcast capacity per channel. Subscribers that fall further
/// behind than this see a lag error and skip ahead; the engine never waits.
const EGRESS_CAPACITY: usize = 1024;

/// A submission as received from the transport, before ingest.
///
/// The engine assigns the order id and the ingest timestamp; the client
/// never supplies either.
#[derive(Debug, Clone)]
pub struct Submission {
    pub client_order_id: ClientOrderId,
    pub client_id: ClientId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub price: Option<Price>,
    pub quantity: Quantity,
}

impl Submission {
    fn into_order(self, id: OrderId, ingest_timestamp_ns: u64) -> Order {
        // MARKET carries no price regardless of what the wire said.
        let price = match self.order_type {
            OrderType::Market => None,
            OrderType::Limit => self.price,
        };
        Order::new(
            id,
            self.client_order_id,
            self.client_id,
            self.symbol,
            self.side,
            self.order_type,
            self.time_in_force,
            price,
            self.quantity,
            ingest_timestamp_ns,
        )
    }
}

/// Commands the engine loop consumes, in strict queue order.
#[derive(Debug)]
pub enum EngineCommand {
    Submit {
        submission: Submission,
        /// Outcome of this submission, delivered once processed.
        reply: Option<oneshot::Sender<OrderEvent>>,
    },
    Cancel {
        order_id: OrderId,
        reply: Option<oneshot::Sender<OrderEvent>>,
    },
    /// Persist the book now (interval tick or administrative request).
    Snapshot,
    /// Persist the book, then stop the loop.
    Shutdown,
}

/// Snapshot health, published on the watch channel.
#[derive(Debug, Clone)]
pub struct EngineHealth {
    pub last_snapshot_ok: bool,
    pub consecutive_snapshot_failures: u32,
}

impl Default for EngineHealth {
    fn default() -> Self {
        Self {
            last_snapshot_ok: true,
            consecutive_snapshot_failures: 0,
        }
    }
}

/// Fatal engine failures. Everything else is a per-submission outcome.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("book crossed after matching: best bid {best_bid} >= best ask {best_ask}")]
    Crossed { best_bid: Price, best_ask: Price },
}

/// Handles the transport uses to talk to a running engine.
#[derive(Debug, Clone)]
pub struct EngineChannels {
    pub intake: mpsc::Sender<EngineCommand>,
    pub trades: broadcast::Sender<TradeReport>,
    pub book_updates: broadcast::Sender<L2Update>,
    pub health: watch::Receiver<EngineHealth>,
}

/// The single-writer matching engine.
pub struct Engine {
    book: OrderBook,
    intake: mpsc::Receiver<EngineCommand>,
    trades_tx: broadcast::Sender<TradeReport>,
    books_tx: broadcast::Sender<L2Update>,
    health_tx: watch::Sender<EngineHealth>,
    clock: EngineClock,
    next_order_id: u64,
    snapshot_writer: SnapshotWriter,
}

impl Engine {
    /// Engine over a fresh book.
    pub fn new(
        book: OrderBook,
        snapshot_path: impl Into<PathBuf>,
        intake_capacity: usize,
    ) -> (Self, EngineChannels) {
        Self::build(book, snapshot_path, intake_capacity, 1, 0)
    }

    /// Engine over a restored book. `next_order_id` must exceed every
    /// restored order id; `clock_floor_ns` is the snapshot's timestamp
    /// high-water mark.
    pub fn resume(
        book: OrderBook,
        snapshot_path: impl Into<PathBuf>,
        intake_capacity: usize,
        next_order_id: u64,
        clock_floor_ns: u64,
    ) -> (Self, EngineChannels) {
        Self::build(book, snapshot_path, intake_capacity, next_order_id, clock_floor_ns)
    }

    fn build(
        book: OrderBook,
        snapshot_path: impl Into<PathBuf>,
        intake_capacity: usize,
        next_order_id: u64,
        clock_floor_ns: u64,
    ) -> (Self, EngineChannels) {
        let (intake_tx, intake_rx) = mpsc::channel(intake_capacity);
        let (trades_tx, _) = broadcast::channel(EGRESS_CAPACITY);
        let (books_tx, _) = broadcast::channel(EGRESS_CAPACITY);
        let (health_tx, health_rx) = watch::channel(EngineHealth::default());

        let mut clock = EngineClock::new();
        clock.floor(clock_floor_ns);

        let channels = EngineChannels {
            intake: intake_tx,
            trades: trades_tx.clone(),
            book_updates: books_tx.clone(),
            health: health_rx,
        };
        let engine = Self {
            book,
            intake: intake_rx,
            trades_tx,
            books_tx,
            health_tx,
            clock,
            next_order_id,
            snapshot_writer: SnapshotWriter::new(snapshot_path),
        };
        (engine, channels)
    }

    /// Drain the intake queue until shutdown or a fatal error.
    pub async fn run(mut self) -> Result<(), EngineError> {
        info!(
            instrument = %self.book.instrument().symbol,
            open_orders = self.book.open_orders(),
            "Matching engine started"
        );

        while let Some(command) = self.intake.recv().await {
            match command {
                EngineCommand::Submit { submission, reply } => {
                    let ingest_ns = self.clock.now();
                    let event = self.handle_submit(submission, ingest_ns)?;
                    if let Some(reply) = reply {
                        let _ = reply.send(event);
                    }
                }
                EngineCommand::Cancel { order_id, reply } => {
                    let ingest_ns = self.clock.now();
                    let event = self.handle_cancel(order_id, ingest_ns);
                    if let Some(reply) = reply {
                        let _ = reply.send(event);
                    }
                }
                EngineCommand::Snapshot => {
                    self.write_snapshot();
                }
                EngineCommand::Shutdown => {
                    info!("Shutdown requested; snapshotting book");
                    self.write_snapshot();
                    break;
                }
            }
        }

        info!("Matching engine stopped");
        Ok(())
    }

    fn handle_submit(
        &mut self,
        submission: Submission,
        ingest_ns: u64,
    ) -> Result<OrderEvent, EngineError> {
        if let Err(reason) = validation::validate(&submission, self.book.instrument()) {
            warn!(
                client_order_id = %submission.client_order_id,
                %reason,
                "Submission rejected"
            );
            return Ok(OrderEvent::Rejected {
                client_order_id: submission.client_order_id,
                reason,
                event_timestamp_ns: ingest_ns,
            });
        }

        let order_id = OrderId::new(self.next_order_id);
        self.next_order_id += 1;
        let order = submission.into_order(order_id, ingest_ns);
        let original = order.original_quantity;

        let outcome = self.book.process_order(order);

        if let Err((best_bid, best_ask)) = self.book.check_uncrossed() {
            error!(%best_bid, %best_ask, "Crossed book detected; snapshotting and aborting");
            self.write_snapshot();
            return Err(EngineError::Crossed { best_bid, best_ask });
        }

        let publish_ns = self.clock.now();
        let latency_ns = publish_ns - ingest_ns;

        for fill in &outcome.fills {
            let _ = self
                .trades_tx
                .send(TradeReport::from_trade(fill, publish_ns, latency_ns));
        }
        let _ = self.books_tx.send(L2Update::from_depth(
            self.book.instrument().symbol.clone(),
            &outcome.depth,
            publish_ns,
            latency_ns,
        ));

        Ok(OrderEvent::Outcome {
            order_id: outcome.order_id,
            client_order_id: outcome.client_order_id,
            status: outcome.status,
            filled_quantity: original.saturating_sub(outcome.remaining),
            remaining_quantity: outcome.remaining,
            event_timestamp_ns: publish_ns,
        })
    }

    fn handle_cancel(&mut self, order_id: OrderId, ingest_ns: u64) -> OrderEvent {
        match self.book.cancel(order_id) {
            Ok(removed) => {
                let publish_ns = self.clock.now();
                let _ = self.books_tx.send(L2Update::from_depth(
                    self.book.instrument().symbol.clone(),
                    &self.book.depth_view(),
                    publish_ns,
                    publish_ns - ingest_ns,
                ));
                OrderEvent::Canceled {
                    order_id,
                    residual_quantity: removed.remaining_quantity,
                    event_timestamp_ns: publish_ns,
                }
            }
            Err(_) => {
                warn!(%order_id, "Cancel target not found");
                OrderEvent::CancelRejected {
                    order_id,
                    event_timestamp_ns: ingest_ns,
                }
            }
        }
    }

    /// Persist the book. Failure is non-fatal at runtime: flag it on the
    /// health channel and retry on the next snapshot tick.
    fn write_snapshot(&mut self) {
        let snapshot = self.book.export(self.clock.high_water());
        match self.snapshot_writer.write(&snapshot) {
            Ok(()) => {
                self.health_tx.send_modify(|health| {
                    health.last_snapshot_ok = true;
                    health.consecutive_snapshot_failures = 0;
                });
            }
            Err(e) => {
                error!(error = %e, "Snapshot write failed; will retry on next tick");
                self.health_tx.send_modify(|health| {
                    health.last_snapshot_ok = false;
                    health.consecutive_snapshot_failures += 1;
                });
            }
        }
    }
}
