//! # Base-Value Calculator
//!
//! Converts a raw deposit amount into base value and derives the
//! stake-weight and yield-rate grant of the new lot:
//!
//! ```text
//! base_value   = raw_amount                          (direct tokens)
//!              = oracle.amount_to_base_value(raw)    (pooled tokens)
//! stake_weight = C_stake(token) * base_value
//! yield_rate   = C_yield(token) * base_value
//! ```

use crate::lot::Lot;
use rust_decimal::Decimal;
use tillage_core::{Amount, Epoch, Pricing, Result, TillageError, TokenConstants, TokenId, TokenTable};
use tracing::debug;

/// Prices a pooled token amount in base value.
///
/// Implementations must be pure: the same inputs always give the same
/// output, with no I/O at call time. Fetch prices beforehand and capture
/// them in the oracle value.
pub trait BaseValueOracle {
    fn amount_to_base_value(&self, token: &TokenConstants, amount: Amount) -> Result<Amount>;
}

impl<F> BaseValueOracle for F
where
    F: Fn(&TokenConstants, Amount) -> Amount,
{
    fn amount_to_base_value(&self, token: &TokenConstants, amount: Amount) -> Result<Amount> {
        Ok(self(token, amount))
    }
}

/// Oracle for callers that only deposit directly-priced tokens.
/// Any pooled token is rejected.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOracle;

impl BaseValueOracle for NoOracle {
    fn amount_to_base_value(&self, token: &TokenConstants, _amount: Amount) -> Result<Amount> {
        Err(TillageError::InvalidConfig(format!(
            "no pricing oracle configured for pooled token {}",
            token.symbol
        )))
    }
}

/// Builds new lots from raw deposits
pub struct BaseValueCalculator<'a, O = NoOracle> {
    table: &'a TokenTable,
    oracle: O,
}

impl<'a> BaseValueCalculator<'a, NoOracle> {
    pub fn new(table: &'a TokenTable) -> Self {
        Self {
            table,
            oracle: NoOracle,
        }
    }
}

impl<'a, O: BaseValueOracle> BaseValueCalculator<'a, O> {
    pub fn with_oracle(table: &'a TokenTable, oracle: O) -> Self {
        Self { table, oracle }
    }

    /// Base value of `raw_amount` of `token`
    pub fn base_value(&self, token: &TokenId, raw_amount: Amount) -> Result<Amount> {
        if raw_amount <= Decimal::ZERO {
            return Err(TillageError::InvalidAmount(raw_amount));
        }
        let constants = self.table.get(token)?;
        self.price(constants, raw_amount)
    }

    /// Compute the lot a deposit of `raw_amount` creates at `current_epoch`
    pub fn compute_new_lot(
        &self,
        token: &TokenId,
        raw_amount: Amount,
        current_epoch: Epoch,
    ) -> Result<Lot> {
        if raw_amount <= Decimal::ZERO {
            return Err(TillageError::InvalidAmount(raw_amount));
        }
        let constants = self.table.get(token)?;
        let base_value = self.price(constants, raw_amount)?;

        let lot = Lot {
            epoch: current_epoch,
            raw_amount,
            base_value,
            stake_weight: constants.stake_weight_for(base_value),
            yield_rate: constants.yield_rate_for(base_value),
        };
        debug!(
            token = %constants.symbol,
            epoch = current_epoch.get(),
            amount = %raw_amount,
            base_value = %base_value,
            "Computed new lot"
        );
        Ok(lot)
    }

    fn price(&self, constants: &TokenConstants, raw_amount: Amount) -> Result<Amount> {
        let base_value = match constants.pricing {
            Pricing::Direct => raw_amount,
            Pricing::Pooled => self.oracle.amount_to_base_value(constants, raw_amount)?,
        };
        if base_value <= Decimal::ZERO {
            return Err(TillageError::InvalidAmount(base_value));
        }
        Ok(base_value)
    }
}

/// Free-function form of [`BaseValueCalculator::compute_new_lot`]
pub fn compute_new_lot<O: BaseValueOracle>(
    table: &TokenTable,
    oracle: O,
    token: &TokenId,
    raw_amount: Amount,
    current_epoch: Epoch,
) -> Result<Lot> {
    BaseValueCalculator::with_oracle(table, oracle).compute_new_lot(token, raw_amount, current_epoch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tillage_core::token::well_known;

    fn bean() -> TokenId {
        TokenId::new(well_known::BEAN)
    }

    fn lp() -> TokenId {
        TokenId::new(well_known::BEAN_3CRV)
    }

    #[test]
    fn test_direct_token_lot() {
        let table = TokenTable::builtin();
        let calc = BaseValueCalculator::new(&table);

        let lot = calc.compute_new_lot(&bean(), dec!(10), Epoch::new(24)).unwrap();
        assert_eq!(lot.epoch, Epoch::new(24));
        assert_eq!(lot.raw_amount, dec!(10));
        assert_eq!(lot.base_value, dec!(10));
        assert_eq!(lot.stake_weight, dec!(10));
        assert_eq!(lot.yield_rate, dec!(20));
    }

    #[test]
    fn test_pooled_token_uses_oracle() {
        let table = TokenTable::builtin();
        let oracle = |_: &TokenConstants, amount: Amount| amount * dec!(1.5);
        let calc = BaseValueCalculator::with_oracle(&table, oracle);

        let lot = calc.compute_new_lot(&lp(), dec!(4), Epoch::new(7)).unwrap();
        assert_eq!(lot.base_value, dec!(6));
        assert_eq!(lot.stake_weight, dec!(6));
        assert_eq!(lot.yield_rate, dec!(24));
    }

    #[test]
    fn test_direct_token_ignores_oracle() {
        let table = TokenTable::builtin();
        let oracle = |_: &TokenConstants, _: Amount| dec!(999);
        let lot = compute_new_lot(&table, oracle, &bean(), dec!(3), Epoch::new(1)).unwrap();
        assert_eq!(lot.base_value, dec!(3));
    }

    #[test]
    fn test_pooled_without_oracle_rejected() {
        let table = TokenTable::builtin();
        let calc = BaseValueCalculator::new(&table);
        let result = calc.compute_new_lot(&lp(), dec!(4), Epoch::new(7));
        assert!(matches!(result, Err(TillageError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_amount() {
        let table = TokenTable::builtin();
        let calc = BaseValueCalculator::new(&table);
        assert_eq!(
            calc.compute_new_lot(&bean(), dec!(0), Epoch::new(1)).unwrap_err(),
            TillageError::InvalidAmount(dec!(0))
        );
        assert!(matches!(
            calc.compute_new_lot(&bean(), dec!(-5), Epoch::new(1)),
            Err(TillageError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_unknown_token() {
        let table = TokenTable::builtin();
        let calc = BaseValueCalculator::new(&table);
        let token = TokenId::new("0xfeed");
        assert_eq!(
            calc.compute_new_lot(&token, dec!(1), Epoch::new(1)).unwrap_err(),
            TillageError::UnknownToken(token)
        );
    }

    #[test]
    fn test_zero_oracle_price_rejected() {
        let table = TokenTable::builtin();
        let oracle = |_: &TokenConstants, _: Amount| Decimal::ZERO;
        let calc = BaseValueCalculator::with_oracle(&table, oracle);
        assert!(matches!(
            calc.base_value(&lp(), dec!(4)),
            Err(TillageError::InvalidAmount(_))
        ));
    }
}
