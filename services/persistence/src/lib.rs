//! Book persistence
//!
//! Serializes the live order book to a versioned, checksummed binary file
//! and restores it on startup. Only the resting book is persisted; trade
//! history is not.

pub mod snapshot;

pub use snapshot::{
    decode, encode, BookSnapshot, LevelSnapshot, SnapshotError, SnapshotLoader,
    SnapshotWriter, SNAPSHOT_MAGIC, SNAPSHOT_VERSION,
};
