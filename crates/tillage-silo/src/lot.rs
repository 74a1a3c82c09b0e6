//! Deposit lots ("crates") and the signed deltas that shrink them

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tillage_core::{Amount, Epoch, Result, TillageError};

/// A single epoch-stamped deposit record.
///
/// `stake_weight` and `yield_rate` are fixed at creation from the token
/// multipliers and afterwards only scaled down in proportion to removals.
/// They are never recomputed from `raw_amount`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    /// Epoch the deposit was created in
    pub epoch: Epoch,

    /// Deposited token amount
    #[serde(alias = "amount")]
    pub raw_amount: Amount,

    /// Normalized economic size of the deposit
    #[serde(alias = "bdv")]
    pub base_value: Amount,

    /// Stake-weight granted at deposit time (excludes accrual)
    #[serde(alias = "stalk")]
    pub stake_weight: Amount,

    /// Yield-rate tokens granted at deposit time
    #[serde(alias = "seeds")]
    pub yield_rate: Amount,
}

impl Lot {
    pub fn new(
        epoch: Epoch,
        raw_amount: Amount,
        base_value: Amount,
        stake_weight: Amount,
        yield_rate: Amount,
    ) -> Self {
        Self {
            epoch,
            raw_amount,
            base_value,
            stake_weight,
            yield_rate,
        }
    }

    /// Reject lots with a zero amount or any negative component
    pub fn validate(&self) -> Result<()> {
        if self.raw_amount <= Decimal::ZERO {
            return Err(TillageError::malformed(
                self.epoch,
                format!("amount {} is not positive", self.raw_amount),
            ));
        }
        let fields = [
            ("base value", self.base_value),
            ("stake-weight", self.stake_weight),
            ("yield rate", self.yield_rate),
        ];
        for (name, value) in fields {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(TillageError::malformed(
                    self.epoch,
                    format!("{} {} is negative", name, value),
                ));
            }
        }
        Ok(())
    }

    /// Stake-weight accrued since deposit at `current_epoch`
    pub fn accrued_stake_weight(&self, current_epoch: Epoch, accrual_rate: Amount) -> Amount {
        let elapsed = current_epoch.elapsed_since(self.epoch).unwrap_or(0);
        self.yield_rate * Decimal::from(elapsed) * accrual_rate
    }

    /// Component-wise additive merge of a same-epoch deposit
    pub(crate) fn merge(&mut self, other: &Lot) {
        self.raw_amount += other.raw_amount;
        self.base_value += other.base_value;
        self.stake_weight += other.stake_weight;
        self.yield_rate += other.yield_rate;
    }
}

/// Signed change to one lot. Removals carry negative components.
///
/// `stake_weight` is the sum of `base_stake_weight` (the share fixed at
/// deposit time, which is what the ledger stores) and
/// `accrued_stake_weight` (earned passively since deposit).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotDelta {
    pub epoch: Epoch,
    pub amount: Amount,
    pub base_value: Amount,
    pub yield_rate: Amount,
    pub base_stake_weight: Amount,
    pub accrued_stake_weight: Amount,
    pub stake_weight: Amount,
}

impl LotDelta {
    /// Whether every component is zero or negative
    pub fn is_removal(&self) -> bool {
        [
            self.amount,
            self.base_value,
            self.yield_rate,
            self.base_stake_weight,
            self.accrued_stake_weight,
        ]
        .iter()
        .all(|v| !v.is_sign_positive() || v.is_zero())
    }

    /// The lot a recipient receives when this removal is transferred.
    ///
    /// Accrued stake-weight is not carried: it is re-derived from the
    /// yield rate and the preserved epoch.
    pub fn as_credit(&self) -> Lot {
        Lot {
            epoch: self.epoch,
            raw_amount: -self.amount,
            base_value: -self.base_value,
            stake_weight: -self.base_stake_weight,
            yield_rate: -self.yield_rate,
        }
    }
}
