//! Engine clock
//!
//! Issues strictly increasing nanosecond timestamps. Ingest order decides
//! ties: if the wall clock has not advanced between two reads, the next
//! timestamp is still one greater than the last. After a restore the
//! clock is floored above every persisted timestamp, so monotonicity
//! holds across restarts.

use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct EngineClock {
    last_ns: u64,
}

impl EngineClock {
    pub fn new() -> Self {
        Self { last_ns: 0 }
    }

    /// Next timestamp: strictly greater than every previous one, and at
    /// least the wall clock.
    pub fn now(&mut self) -> u64 {
        self.last_ns = (self.last_ns + 1).max(wall_nanos());
        self.last_ns
    }

    /// Ensure all future timestamps are strictly greater than `ns`.
    pub fn floor(&mut self, ns: u64) {
        self.last_ns = self.last_ns.max(ns);
    }

    /// The last issued timestamp (0 if none yet).
    pub fn high_water(&self) -> u64 {
        self.last_ns
    }
}

impl Default for EngineClock {
    fn default() -> Self {
        Self::new()
    }
}

fn wall_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
