//! Sow preview: debt issued for lending into the current capacity

use crate::capacity::debt_for;
use crate::state::RateState;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tillage_core::{Amount, Result, TillageError};
use tracing::debug;

/// Outcome of sowing into a snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SowPreview {
    /// Amount lent
    pub amount: Amount,
    /// Rate the debt was issued at
    pub rate: Amount,
    /// Debt issued, `amount * (100 + rate) / 100` floored to six places
    pub debt: Amount,
    /// Capacity left in the block after the sow
    pub capacity_after: Amount,
}

/// Preview sowing `amount` at the snapshot's current rate
pub fn preview_sow(state: &RateState, amount: Amount) -> Result<SowPreview> {
    if amount <= Decimal::ZERO {
        return Err(TillageError::InvalidAmount(amount));
    }
    if amount > state.capacity {
        return Err(TillageError::InsufficientCapacity {
            requested: amount,
            available: state.capacity,
        });
    }

    Ok(SowPreview {
        amount,
        rate: state.current_rate,
        debt: debt_for(amount, state.current_rate)?,
        capacity_after: state.capacity - amount,
    })
}

/// Sow `amount`, consuming capacity from the snapshot
pub fn sow(state: &mut RateState, amount: Amount) -> Result<SowPreview> {
    let preview = preview_sow(state, amount)?;
    state.consume(amount);
    debug!(
        amount = %amount,
        rate = %preview.rate,
        debt = %preview.debt,
        "Sowed into capacity"
    );
    Ok(preview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EpochParams;
    use rust_decimal_macros::dec;
    use tillage_core::BlockNumber;

    fn steady_state() -> RateState {
        let params = EpochParams {
            epoch_start_block: BlockNumber::new(0),
            max_rate: dec!(50),
            base_capacity: dec!(100),
            above_equilibrium: true,
        };
        RateState::capture(&params, BlockNumber::new(100)).unwrap()
    }

    #[test]
    fn test_preview_sow() {
        let preview = preview_sow(&steady_state(), dec!(10)).unwrap();
        assert_eq!(preview.rate, dec!(50));
        assert_eq!(preview.debt, dec!(15));
        assert_eq!(preview.capacity_after, dec!(90));
    }

    #[test]
    fn test_preview_does_not_consume() {
        let state = steady_state();
        preview_sow(&state, dec!(10)).unwrap();
        assert_eq!(state.capacity, dec!(100));
    }

    #[test]
    fn test_sow_consumes() {
        let mut state = steady_state();
        sow(&mut state, dec!(60)).unwrap();
        sow(&mut state, dec!(40)).unwrap();
        assert_eq!(state.capacity, dec!(0));
        assert!(matches!(
            sow(&mut state, dec!(0.000001)),
            Err(TillageError::InsufficientCapacity { .. })
        ));
    }

    #[test]
    fn test_invalid_amount() {
        assert_eq!(
            preview_sow(&steady_state(), dec!(0)).unwrap_err(),
            TillageError::InvalidAmount(dec!(0))
        );
        assert!(preview_sow(&steady_state(), dec!(-1)).is_err());
    }

    #[test]
    fn test_over_capacity() {
        assert_eq!(
            preview_sow(&steady_state(), dec!(100.5)).unwrap_err(),
            TillageError::InsufficientCapacity {
                requested: dec!(100.5),
                available: dec!(100),
            }
        );
    }
}
