//! Runtime configuration
//!
//! Environment variables with defaults; nothing else. Addresses follow
//! the three-feed layout: order submission, market data, trade feed.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Order submission feed (inbound SUBMIT/CANCEL frames).
    pub orders_addr: SocketAddr,
    /// Market data feed (L2_UPDATE frames).
    pub market_data_addr: SocketAddr,
    /// Trade feed (TRADE_REPORT frames).
    pub trades_addr: SocketAddr,
    /// Book snapshot path; absence at startup means a fresh book.
    pub snapshot_path: PathBuf,
    /// Interval between periodic snapshot commands.
    pub snapshot_interval: Duration,
    /// Intake queue capacity; when full, submissions get QUEUE_FULL.
    pub intake_capacity: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            orders_addr: env_or("ENGINE_ORDERS_ADDR", SocketAddr::from(([0, 0, 0, 0], 8000))),
            market_data_addr: env_or(
                "ENGINE_MARKET_DATA_ADDR",
                SocketAddr::from(([0, 0, 0, 0], 8001)),
            ),
            trades_addr: env_or("ENGINE_TRADES_ADDR", SocketAddr::from(([0, 0, 0, 0], 8002))),
            snapshot_path: env_or("ENGINE_SNAPSHOT_PATH", PathBuf::from("orderbook.snap")),
            snapshot_interval: Duration::from_secs(env_or("ENGINE_SNAPSHOT_INTERVAL_SECS", 30)),
            intake_capacity: env_or("ENGINE_INTAKE_CAPACITY", 1024),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_env();
        assert_eq!(config.orders_addr.port(), 8000);
        assert_eq!(config.market_data_addr.port(), 8001);
        assert_eq!(config.trades_addr.port(), 8002);
        assert_eq!(config.intake_capacity, 1024);
    }
}
