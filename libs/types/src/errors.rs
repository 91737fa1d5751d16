//! Error taxonomy for the matching core
//!
//! Per-submission outcomes (rejections, not-found) are values returned
//! through the submission's own event; only invariant violations and
//! unrecoverable persistence failures escalate to engine level.

use crate::ids::OrderId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a submission was rejected before or during matching.
///
/// `FokUnfillable` is the REJECTED_FOK outcome; the rest are
/// REJECTED_VALIDATION cases.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    #[error("fill-or-kill order cannot be completely filled")]
    FokUnfillable,

    #[error("limit order is missing a price")]
    MissingPrice,

    #[error("quantity must be positive")]
    NonPositiveQuantity,

    #[error("price is not a multiple of the tick size")]
    BadTick,

    #[error("quantity is not a multiple of the lot size")]
    BadLot,

    #[error("unknown instrument: {symbol}")]
    UnknownInstrument { symbol: String },

    #[error("market orders must be immediate-or-cancel")]
    MarketRequiresIoc,
}

/// Book-level operation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("order not found: {order_id}")]
    NotFound { order_id: OrderId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_reason_display() {
        let err = RejectReason::UnknownInstrument {
            symbol: "DOGE-USD".to_string(),
        };
        assert_eq!(err.to_string(), "unknown instrument: DOGE-USD");
    }

    #[test]
    fn test_book_error_display() {
        let err = BookError::NotFound {
            order_id: OrderId::new(99),
        };
        assert_eq!(err.to_string(), "order not found: 99");
    }

    #[test]
    fn test_reject_reason_wire_tag() {
        let json = serde_json::to_string(&RejectReason::FokUnfillable).unwrap();
        assert_eq!(json, "\"FOK_UNFILLABLE\"");
    }
}
