//! WebSocket feed handlers
//!
//! One module per feed: order submission (bidirectional), market data
//! (subscriber), trades (subscriber).

pub mod market_data;
pub mod orders;
pub mod trades;
