//! Order submission feed
//!
//! Receives SUBMIT/CANCEL frames, forwards them to the engine's intake
//! queue, and replies with the engine's per-submission outcome event.
//! Replies are read in submission order per connection, so a producer's
//! effects are visible in the order it sent them.
//!
//! A full intake queue surfaces as a QUEUE_FULL reply; the gateway never
//! drops a frame silently and never blocks the engine.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use types::ids::ClientId;

use matching_engine::events::OrderEvent;
use matching_engine::EngineCommand;

use crate::models::{Ack, InboundFrame};
use crate::state::AppState;

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(1);

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let client_id = ClientId::new(format!(
        "conn-{}",
        NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed)
    ));
    info!(client = %client_id, "Order submission client connected");

    while let Some(Ok(message)) = socket.next().await {
        match message {
            Message::Text(text) => {
                let reply = handle_frame(&state, &client_id, text.as_str()).await;
                if socket.send(Message::Text(reply.into())).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    info!(client = %client_id, "Order submission client disconnected");
}

/// Process one inbound frame and produce the reply frame.
async fn handle_frame(state: &AppState, client_id: &ClientId, raw: &str) -> String {
    let frame: InboundFrame = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(e) => {
            debug!(client = %client_id, error = %e, "Unparseable frame");
            return ack(Ack::Error {
                reason: format!("malformed frame: {e}"),
            });
        }
    };

    match frame {
        InboundFrame::Submit(request) => {
            let client_order_id = request.client_order_id.clone();
            let submission = match request.into_submission(client_id.clone()) {
                Ok(submission) => submission,
                Err(instrument) => {
                    return ack(Ack::Error {
                        reason: format!("unknown instrument: {instrument}"),
                    });
                }
            };

            let (reply_tx, reply_rx) = oneshot::channel();
            let command = EngineCommand::Submit {
                submission,
                reply: Some(reply_tx),
            };
            match state.channels.intake.try_send(command) {
                Ok(()) => outcome_frame(reply_rx).await,
                Err(mpsc::error::TrySendError::Full(_)) => ack(Ack::QueueFull {
                    client_order_id: Some(client_order_id),
                }),
                Err(mpsc::error::TrySendError::Closed(_)) => ack(Ack::Error {
                    reason: "engine unavailable".to_string(),
                }),
            }
        }
        InboundFrame::Cancel(request) => {
            let (reply_tx, reply_rx) = oneshot::channel();
            let command = EngineCommand::Cancel {
                order_id: request.order_id,
                reply: Some(reply_tx),
            };
            match state.channels.intake.try_send(command) {
                Ok(()) => outcome_frame(reply_rx).await,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    ack(Ack::QueueFull { client_order_id: None })
                }
                Err(mpsc::error::TrySendError::Closed(_)) => ack(Ack::Error {
                    reason: "engine unavailable".to_string(),
                }),
            }
        }
    }
}

async fn outcome_frame(reply_rx: oneshot::Receiver<OrderEvent>) -> String {
    match reply_rx.await {
        Ok(event) => serde_json::to_string(&event).expect("events serialize"),
        // Engine dropped the reply (shutting down mid-flight).
        Err(_) => ack(Ack::Error {
            reason: "engine unavailable".to_string(),
        }),
    }
}

fn ack(ack: Ack) -> String {
    serde_json::to_string(&ack).expect("acks serialize")
}
