//! Shared value types for the matching engine workspace
//!
//! Identifiers, fixed-point numerics, order and trade records, the fee
//! schedule, and the error taxonomy used across all services.

pub mod errors;
pub mod fee;
pub mod ids;
pub mod instrument;
pub mod numeric;
pub mod order;
pub mod trade;
