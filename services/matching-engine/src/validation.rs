//! Pre-book submission validation
//!
//! Checks run before a submission becomes an order. Returns the first
//! failing check; failures are per-submission outcomes, never engine
//! failures.

use types::errors::RejectReason;
use types::instrument::Instrument;
use types::order::{OrderType, TimeInForce};

use crate::engine::Submission;

/// Validate a submission against the engine's instrument.
///
/// Checks performed (in order):
/// 1. Instrument matches the book
/// 2. Quantity positive and lot-aligned
/// 3. LIMIT carries a tick-aligned price; MARKET carries IOC
pub fn validate(submission: &Submission, instrument: &Instrument) -> Result<(), RejectReason> {
    if submission.symbol != instrument.symbol {
        return Err(RejectReason::UnknownInstrument {
            symbol: submission.symbol.to_string(),
        });
    }

    if submission.quantity.is_zero() {
        return Err(RejectReason::NonPositiveQuantity);
    }
    if !instrument.quantity_on_lot(submission.quantity) {
        return Err(RejectReason::BadLot);
    }

    match submission.order_type {
        OrderType::Market => {
            if submission.time_in_force != TimeInForce::Ioc {
                return Err(RejectReason::MarketRequiresIoc);
            }
        }
        OrderType::Limit => {
            let price = submission.price.ok_or(RejectReason::MissingPrice)?;
            if !instrument.price_on_tick(price) {
                return Err(RejectReason::BadTick);
            }
        }
    }

    Ok(())
}
