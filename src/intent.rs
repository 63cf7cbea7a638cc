//! Buy/skip decision for a single run

use crate::types::Decision;
use rust_decimal::Decimal;
use tracing::debug;

/// Proceed when the observed price is at or below the ceiling.
pub fn decide(observed: Decimal, threshold: Decimal) -> Decision {
    let decision = if observed <= threshold {
        Decision::Proceed
    } else {
        Decision::Skip
    };
    debug!("decide: observed={} threshold={} -> {:?}", observed, threshold, decision);
    decision
}
