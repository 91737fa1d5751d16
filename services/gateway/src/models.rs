//! Wire models
//!
//! Inbound frames on the order-submission feed (exactly one SUBMIT or
//! CANCEL per frame) and the self-describing egress frames. Decimals
//! travel as strings end to end.

use matching_engine::events::{L2Update, TradeReport};
use matching_engine::Submission;
use serde::{Deserialize, Serialize};
use types::ids::{ClientId, ClientOrderId, OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{OrderType, Side, TimeInForce};

/// Inbound frame on the order submission feed: a type field plus the
/// payload. The payload carries its own `type` (LIMIT|MARKET), so the
/// envelope tag and the order type cannot collide.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum InboundFrame {
    #[serde(rename = "SUBMIT")]
    Submit(SubmitRequest),
    #[serde(rename = "CANCEL")]
    Cancel(CancelRequest),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub client_order_id: String,
    pub instrument: String,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    /// Defaults to GTC for LIMIT; MARKET always becomes IOC.
    pub tif: Option<TimeInForce>,
    /// Omitted for MARKET.
    pub price: Option<Price>,
    pub quantity: Quantity,
}

impl SubmitRequest {
    /// Build the engine submission, or the instrument string if it is not
    /// even parseable as a symbol.
    pub fn into_submission(self, client_id: ClientId) -> Result<Submission, String> {
        let symbol = Symbol::try_new(self.instrument.clone()).ok_or(self.instrument)?;
        let time_in_force = match self.order_type {
            OrderType::Market => TimeInForce::Ioc,
            OrderType::Limit => self.tif.unwrap_or(TimeInForce::Gtc),
        };
        Ok(Submission {
            client_order_id: ClientOrderId::new(self.client_order_id),
            client_id,
            symbol,
            side: self.side,
            order_type: self.order_type,
            time_in_force,
            price: self.price,
            quantity: self.quantity,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelRequest {
    pub order_id: OrderId,
}

/// Immediate transport-level replies on the submission feed. Engine
/// outcomes arrive as [`matching_engine::events::OrderEvent`] frames.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status")]
pub enum Ack {
    /// Intake queue saturated; backpressure, not an engine failure.
    #[serde(rename = "QUEUE_FULL")]
    QueueFull { client_order_id: Option<String> },
    /// The frame never reached the engine (parse failure, bad symbol).
    #[serde(rename = "ERROR")]
    Error { reason: String },
}

/// Self-describing egress frames for the subscriber feeds.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum EgressFrame {
    #[serde(rename = "TRADE_REPORT")]
    TradeReport(TradeReport),
    #[serde(rename = "L2_UPDATE")]
    L2Update(L2Update),
}
