//! Shared handler state

use matching_engine::EngineChannels;

/// Handles into the running engine, cloned into every connection task.
/// Subscribers pull their own broadcast receivers from here; the engine
/// keeps the only senders that matter.
#[derive(Clone)]
pub struct AppState {
    pub channels: EngineChannels,
}

impl AppState {
    pub fn new(channels: EngineChannels) -> Self {
        Self { channels }
    }
}
