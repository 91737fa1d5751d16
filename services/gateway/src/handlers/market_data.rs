//! Market data feed
//!
//! Pushes L2_UPDATE frames to subscribers. Each subscriber owns its own
//! broadcast receiver; one that falls behind loses its oldest updates and
//! skips ahead. The engine is never stalled by a slow subscriber.

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
    let mut updates = state.channels.book_updates.subscribe();
    info!("Market data subscriber connected");

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => {
                    let frame = serde_json::to_string(&EgressFrame::L2Update(update))
                        .expect("frames serialize");
                    if socket.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Market data subscriber lagging; updates dropped");
                }
                Err(RecvError::Closed) => break,
            },
            inbound = socket.next() => match inbound {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                _ => {}
            },
        }
    }

    info!("Market data subscriber disconnected");
}
