//! Peg case evaluator
//!
//! Buckets the epoch-end signals into bands and looks up the max-rate
//! change for the resulting case. The output is advisory: out-of-range
//! inputs are clamped into the nearest band and logged, never rejected.

use crate::cases::CaseId;
use crate::signals::{DebtBand, DemandBand, PegBounds, PriceSign};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tillage_core::{Amount, MIN_RATE};
use tracing::{debug, warn};

/// Bands the signals fell into
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseState {
    pub debt: DebtBand,
    pub price: PriceSign,
    pub demand: DemandBand,
}

impl CaseState {
    pub fn case_id(&self) -> CaseId {
        CaseId::from_offsets(self.debt.offset(), self.price.offset(), self.demand.offset())
    }
}

/// Result of evaluating one epoch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseOutcome {
    pub case_id: CaseId,
    /// Max-rate change in whole rate units
    pub magnitude: i8,
    pub state: CaseState,
}

impl CaseOutcome {
    /// Max rate for the next epoch
    pub fn next_max_rate(&self, max_rate: Amount) -> Amount {
        apply_rate_change(max_rate, self.magnitude)
    }
}

fn clamp_non_negative(name: &'static str, value: Amount) -> Amount {
    if value.is_sign_negative() && !value.is_zero() {
        warn!(signal = name, value = %value, "Clamped negative signal to zero");
        return Decimal::ZERO;
    }
    value
}

/// Map the epoch-end signals to a case and its magnitude.
///
/// `debt_ratio` and `demand_delta` are ratios and clamp to zero when
/// negative. `price_deviation` is signed and used as given.
pub fn evaluate(
    debt_ratio: Amount,
    price_deviation: Amount,
    demand_delta: Amount,
    bounds: &PegBounds,
) -> CaseOutcome {
    let debt_ratio = clamp_non_negative("debt_ratio", debt_ratio);
    let demand_delta = clamp_non_negative("demand_delta", demand_delta);

    let state = CaseState {
        debt: DebtBand::classify(debt_ratio, bounds),
        price: PriceSign::classify(price_deviation, debt_ratio, bounds),
        demand: DemandBand::classify(demand_delta, bounds),
    };
    let case_id = state.case_id();
    let magnitude = case_id.magnitude();

    debug!(
        case = case_id.get(),
        magnitude,
        debt = ?state.debt,
        price = ?state.price,
        demand = ?state.demand,
        "Evaluated peg case"
    );

    CaseOutcome {
        case_id,
        magnitude,
        state,
    }
}

/// Apply a case magnitude to the max rate.
///
/// A decrease never takes the rate below one whole unit, and never raises
/// a rate that was already below it.
pub fn apply_rate_change(max_rate: Amount, magnitude: i8) -> Amount {
    let next = max_rate.saturating_add(Decimal::from(magnitude));
    if magnitude < 0 && next < MIN_RATE {
        return MIN_RATE.min(max_rate);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_low_debt_below_peg_decreasing() {
        let outcome = evaluate(dec!(0.01), dec!(-0.05), dec!(0.5), &PegBounds::default());
        assert_eq!(outcome.case_id.get(), 0);
        assert_eq!(outcome.magnitude, 3);
    }

    #[test]
    fn test_moderate_debt_above_peg_steady() {
        let outcome = evaluate(dec!(0.1), dec!(0.02), dec!(1), &PegBounds::default());
        assert_eq!(outcome.case_id.get(), 8 + 4 + 1);
        assert_eq!(outcome.magnitude, -3);
    }

    #[test]
    fn test_on_peg_above_optimal_counts_below() {
        let outcome = evaluate(dec!(0.2), dec!(0), dec!(1.2), &PegBounds::default());
        assert_eq!(outcome.state.price, PriceSign::Below);
        assert_eq!(outcome.case_id.get(), 8 + 2);
    }

    #[test]
    fn test_negative_inputs_clamp() {
        let outcome = evaluate(dec!(-0.3), dec!(0.1), dec!(-2), &PegBounds::default());
        assert_eq!(outcome.state.debt, DebtBand::Low);
        assert_eq!(outcome.state.demand, DemandBand::Decreasing);
        assert_eq!(outcome.case_id.get(), 4);
    }

    #[test]
    fn test_apply_rate_change() {
        assert_eq!(apply_rate_change(dec!(100), 3), dec!(103));
        assert_eq!(apply_rate_change(dec!(100), -3), dec!(97));
        assert_eq!(apply_rate_change(dec!(2), -3), dec!(1));
        assert_eq!(apply_rate_change(dec!(3), -3), dec!(1));
        assert_eq!(apply_rate_change(dec!(0.5), -1), dec!(0.5));
        assert_eq!(apply_rate_change(dec!(0), 1), dec!(1));
        assert_eq!(apply_rate_change(Decimal::MAX, 3), Decimal::MAX);
    }

    #[test]
    fn test_next_max_rate() {
        let outcome = evaluate(dec!(0.3), dec!(-0.1), dec!(0.5), &PegBounds::default());
        assert_eq!(outcome.case_id.get(), 16);
        assert_eq!(outcome.next_max_rate(dec!(10)), dec!(13));
    }
}
