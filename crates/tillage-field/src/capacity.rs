//! Capacity curve
//!
//! Capacity is the amount of debt the protocol will accept at the current
//! rate. While the protocol is above equilibrium it shrinks as the rate
//! rises so that `capacity * (100 + rate)`, the debt that can be issued,
//! stays constant through the auction window. Every result is floored to
//! six places.
//!
//! Inputs are caller snapshots, so products that leave the fixed-point
//! range are reported as [`TillageError::InvalidAmount`] rather than
//! panicking.

use rust_decimal::RoundingStrategy;
use tillage_core::{Amount, Result, TillageError, CAPACITY_DECIMALS, ONE_HUNDRED};

/// `value * (100 + numerator_rate) / (100 + denominator_rate)`, floored
fn scale_floor(value: Amount, numerator_rate: Amount, denominator_rate: Amount) -> Result<Amount> {
    ONE_HUNDRED
        .checked_add(numerator_rate)
        .and_then(|num| value.checked_mul(num))
        .zip(ONE_HUNDRED.checked_add(denominator_rate))
        .and_then(|(product, den)| product.checked_div(den))
        .map(|v| v.round_dp_with_strategy(CAPACITY_DECIMALS, RoundingStrategy::ToNegativeInfinity))
        .ok_or(TillageError::InvalidAmount(value))
}

/// Capacity one block later, given the rate now and the rate then.
///
/// Below equilibrium capacity does not follow the rate and is returned
/// unchanged.
pub fn next_capacity(
    capacity: Amount,
    current_rate: Amount,
    next_rate: Amount,
    above_equilibrium: bool,
) -> Result<Amount> {
    if !above_equilibrium {
        return Ok(capacity);
    }
    scale_floor(capacity, current_rate, next_rate)
}

/// Capacity at `rate` for an epoch whose capacity at `max_rate` is `base_capacity`.
///
/// Early in the window the rate is below `max_rate`, so more capacity is
/// available than the epoch's base figure.
pub fn capacity_at_rate(base_capacity: Amount, max_rate: Amount, rate: Amount) -> Result<Amount> {
    if rate >= max_rate || base_capacity.is_zero() {
        return Ok(base_capacity);
    }
    scale_floor(base_capacity, max_rate, rate)
}

/// Debt issued for sowing `amount` at `rate`, floored to six places
pub fn debt_for(amount: Amount, rate: Amount) -> Result<Amount> {
    scale_floor(amount, rate, Amount::ZERO)
}
