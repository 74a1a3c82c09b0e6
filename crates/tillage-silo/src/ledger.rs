//! # Deposit Ledger
//!
//! Ordered lots for a single (account, token) pair, unique by epoch.
//!
//! - `append` merges a same-epoch deposit additively or inserts a new lot
//! - `remove` subtracts a removal delta and drops the lot when its amount
//!   reaches exactly zero
//! - `apply_deltas` applies a whole selection or nothing

use crate::lot::{Lot, LotDelta};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tillage_core::{Amount, Epoch, Result, TillageError, TokenId};
use tracing::debug;

/// Summed view of a ledger at a given epoch
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub raw_amount: Amount,
    pub base_value: Amount,
    pub yield_rate: Amount,
    /// Stake-weight fixed at deposit time
    pub base_stake_weight: Amount,
    /// Stake-weight accrued since each deposit
    pub accrued_stake_weight: Amount,
}

impl LedgerTotals {
    /// Deposit plus accrued stake-weight
    pub fn stake_weight(&self) -> Amount {
        self.base_stake_weight + self.accrued_stake_weight
    }
}

/// Per (account, token) collection of deposit lots
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositLedger {
    token: TokenId,
    lots: BTreeMap<Epoch, Lot>,
}

impl DepositLedger {
    /// Create an empty ledger for `token`
    pub fn new(token: TokenId) -> Self {
        Self {
            token,
            lots: BTreeMap::new(),
        }
    }

    /// Build a ledger from a snapshot, merging same-epoch lots
    pub fn from_lots(token: TokenId, lots: impl IntoIterator<Item = Lot>) -> Result<Self> {
        let mut ledger = Self::new(token);
        for lot in lots {
            ledger.append(lot)?;
        }
        Ok(ledger)
    }

    pub fn token(&self) -> &TokenId {
        &self.token
    }

    /// Lots in ascending epoch order
    pub fn lots(&self) -> impl DoubleEndedIterator<Item = &Lot> {
        self.lots.values()
    }

    /// Owned copy of the lots, ascending by epoch
    pub fn to_vec(&self) -> Vec<Lot> {
        self.lots.values().cloned().collect()
    }

    pub fn get(&self, epoch: Epoch) -> Option<&Lot> {
        self.lots.get(&epoch)
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// Sum of raw amounts across all lots
    pub fn total_amount(&self) -> Amount {
        self.lots.values().map(|l| l.raw_amount).sum()
    }

    /// Summed totals including stake-weight accrued up to `current_epoch`
    pub fn totals(&self, current_epoch: Epoch, accrual_rate: Amount) -> LedgerTotals {
        self.lots
            .values()
            .fold(LedgerTotals::default(), |mut acc, lot| {
                acc.raw_amount += lot.raw_amount;
                acc.base_value += lot.base_value;
                acc.yield_rate += lot.yield_rate;
                acc.base_stake_weight += lot.stake_weight;
                acc.accrued_stake_weight += lot.accrued_stake_weight(current_epoch, accrual_rate);
                acc
            })
    }

    /// Add a lot, merging into an existing same-epoch lot.
    ///
    /// Same-epoch deposits merge component-wise. This matches observed
    /// behaviour but has not been confirmed against the authoritative
    /// contract.
    pub fn append(&mut self, lot: Lot) -> Result<()> {
        lot.validate()?;
        match self.lots.get_mut(&lot.epoch) {
            Some(existing) => {
                existing.merge(&lot);
                debug!(token = %self.token, epoch = lot.epoch.get(), amount = %lot.raw_amount, "Merged deposit into existing lot");
            }
            None => {
                debug!(token = %self.token, epoch = lot.epoch.get(), amount = %lot.raw_amount, "Inserted new lot");
                self.lots.insert(lot.epoch, lot);
            }
        }
        Ok(())
    }

    /// Subtract a removal delta from the lot at `epoch`.
    ///
    /// The lot's stored stake-weight is reduced by the delta's
    /// `base_stake_weight`; accrued stake-weight is never stored on a lot.
    pub fn remove(&mut self, epoch: Epoch, delta: &LotDelta) -> Result<()> {
        if !delta.is_removal() {
            return Err(TillageError::malformed(
                epoch,
                "delta has a positive component",
            ));
        }
        let lot = self
            .lots
            .get(&epoch)
            .ok_or_else(|| TillageError::malformed(epoch, "no lot at this epoch"))?;

        let next = Lot {
            epoch,
            raw_amount: lot.raw_amount + delta.amount,
            base_value: lot.base_value + delta.base_value,
            stake_weight: lot.stake_weight + delta.base_stake_weight,
            yield_rate: lot.yield_rate + delta.yield_rate,
        };
        if next.raw_amount < Decimal::ZERO {
            return Err(TillageError::malformed(
                epoch,
                format!("amount would go negative ({})", next.raw_amount),
            ));
        }
        // An emptied lot is dropped whatever residue the weights carry
        if next.raw_amount.is_zero() {
            debug!(token = %self.token, epoch = epoch.get(), "Lot fully removed");
            self.lots.remove(&epoch);
            return Ok(());
        }

        let components = [
            ("stake-weight", next.stake_weight),
            ("yield rate", next.yield_rate),
        ];
        for (name, value) in components {
            if value < Decimal::ZERO {
                return Err(TillageError::malformed(
                    epoch,
                    format!("{} would go negative ({})", name, value),
                ));
            }
        }

        debug!(token = %self.token, epoch = epoch.get(), remaining = %next.raw_amount, "Lot partially removed");
        self.lots.insert(epoch, next);
        Ok(())
    }

    /// Apply every delta, or none of them if any fails
    pub fn apply_deltas(&mut self, deltas: &[LotDelta]) -> Result<()> {
        let mut staged = self.clone();
        for delta in deltas {
            staged.remove(delta.epoch, delta)?;
        }
        *self = staged;
        Ok(())
    }
}
