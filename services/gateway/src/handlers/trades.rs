//! Trade feed
//!
//! Pushes TRADE_REPORT frames to subscribers, in fill order. Same lag
//! policy as the market data feed: a slow subscriber skips, the engine
//! never waits.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::StreamExt;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::models::EgressFrame;
use crate::state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut trades = state.channels.trades.subscribe();
    info!("Trade feed subscriber connected");

    loop {
        tokio::select! {
            report = trades.recv() => match report {
                Ok(report) => {
                    let frame = serde_json::to_string(&EgressFrame::TradeReport(report))
                        .expect("frames serialize");
                    if socket.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Trade feed subscriber lagging; reports dropped");
                }
                Err(RecvError::Closed) => break,
            },
            inbound = socket.next() => match inbound {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                _ => {}
            },
        }
    }

    info!("Trade feed subscriber disconnected");
}
