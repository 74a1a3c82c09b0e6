//! # Lot Selector
//!
//! Chooses which lots a withdrawal, transfer or convert draws from and how
//! much each gives up. Pure: the input lots are never mutated; callers
//! apply the returned deltas through [`DepositLedger::apply_deltas`].
//!
//! For each visited lot:
//!
//! ```text
//! consumed          = min(lot.raw_amount, still_needed)
//! pct               = consumed / lot.raw_amount
//! base_value_delta  = pct * lot.base_value
//! yield_rate_delta  = pct * lot.yield_rate
//! base_stake_delta  = C_stake * base_value_delta
//! accrued_delta     = yield_rate_delta * (current_epoch - lot.epoch) * accrual_rate
//! stake_delta       = base_stake_delta + accrued_delta
//! ```
//!
//! All deltas are emitted negated, in visiting order.
//!
//! [`DepositLedger::apply_deltas`]: crate::ledger::DepositLedger::apply_deltas

use crate::lot::{Lot, LotDelta};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use tillage_core::{Amount, Epoch, Result, TillageError, TokenId, TokenTable, ACCRUAL_RATE};
use tracing::debug;

/// Order in which lots are drawn down
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionOrder {
    /// Most recently created first (last-in-first-out).
    /// Used for withdrawals and transfers.
    #[default]
    NewestFirst,
    /// Highest `base_value / raw_amount` first, newer epoch breaking ties.
    /// Used when converting between tokens.
    HighestBaseValueRatio,
}

/// Summed change across all deltas of a selection
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaTotals {
    pub amount: Amount,
    pub base_value: Amount,
    pub yield_rate: Amount,
    pub stake_weight: Amount,
}

impl DeltaTotals {
    fn add(&mut self, delta: &LotDelta) {
        self.amount += delta.amount;
        self.base_value += delta.base_value;
        self.yield_rate += delta.yield_rate;
        self.stake_weight += delta.stake_weight;
    }
}

/// Result of a selection: the total change and one delta per affected lot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub token: TokenId,
    pub requested: Amount,
    pub total: DeltaTotals,
    pub deltas: Vec<LotDelta>,
}

impl Selection {
    /// Epochs in visiting order
    pub fn epochs(&self) -> Vec<Epoch> {
        self.deltas.iter().map(|d| d.epoch).collect()
    }
}

/// Lot selector bound to a token table and accrual rate
#[derive(Clone, Copy, Debug)]
pub struct LotSelector<'a> {
    table: &'a TokenTable,
    accrual_rate: Amount,
}

impl<'a> LotSelector<'a> {
    /// Selector using the protocol accrual rate
    pub fn new(table: &'a TokenTable) -> Self {
        Self {
            table,
            accrual_rate: ACCRUAL_RATE,
        }
    }

    pub fn with_accrual_rate(table: &'a TokenTable, accrual_rate: Amount) -> Self {
        Self {
            table,
            accrual_rate,
        }
    }

    pub fn accrual_rate(&self) -> Amount {
        self.accrual_rate
    }

    /// Select lots for a withdrawal, newest epoch first
    pub fn select_for_withdrawal(
        &self,
        token: &TokenId,
        requested: Amount,
        lots: &[Lot],
        current_epoch: Epoch,
    ) -> Result<Selection> {
        self.select(SelectionOrder::NewestFirst, token, requested, lots, current_epoch)
    }

    /// Select lots for a transfer. Same policy as a withdrawal.
    pub fn select_for_transfer(
        &self,
        token: &TokenId,
        requested: Amount,
        lots: &[Lot],
        current_epoch: Epoch,
    ) -> Result<Selection> {
        self.select(SelectionOrder::NewestFirst, token, requested, lots, current_epoch)
    }

    /// Select lots for a convert, highest base-value ratio first
    pub fn select_for_convert(
        &self,
        token: &TokenId,
        requested: Amount,
        lots: &[Lot],
        current_epoch: Epoch,
    ) -> Result<Selection> {
        self.select(
            SelectionOrder::HighestBaseValueRatio,
            token,
            requested,
            lots,
            current_epoch,
        )
    }

    /// Select lots under an explicit ordering policy.
    ///
    /// Fails without producing any delta if the request is not positive,
    /// the token is unknown, a lot is malformed, or the lots do not cover
    /// `requested`.
    pub fn select(
        &self,
        order: SelectionOrder,
        token: &TokenId,
        requested: Amount,
        lots: &[Lot],
        current_epoch: Epoch,
    ) -> Result<Selection> {
        if requested <= Decimal::ZERO {
            return Err(TillageError::InvalidAmount(requested));
        }
        let constants = self.table.get(token)?;
        validate_snapshot(lots, current_epoch)?;

        let available = lots.iter().try_fold(Decimal::ZERO, |acc, lot| {
            acc.checked_add(lot.raw_amount)
                .ok_or_else(|| TillageError::malformed(lot.epoch, "amount total out of range"))
        })?;
        if available < requested {
            return Err(TillageError::InsufficientBalance {
                requested,
                available,
            });
        }

        let ordered = order_lots(order, lots)?;

        let mut remaining = requested;
        let mut total = DeltaTotals::default();
        let mut deltas = Vec::new();

        for lot in ordered {
            let consumed = lot.raw_amount.min(remaining);
            let delta = self.split(lot, consumed, constants.stake_per_base, current_epoch)?;
            debug!(
                token = %constants.symbol,
                epoch = lot.epoch.get(),
                consumed = %consumed,
                lot_amount = %lot.raw_amount,
                stake_weight = %delta.stake_weight,
                "Selected lot"
            );
            total.add(&delta);
            deltas.push(delta);

            remaining -= consumed;
            if remaining.is_zero() {
                break;
            }
        }

        Ok(Selection {
            token: token.clone(),
            requested,
            total,
            deltas,
        })
    }

    /// Delta for removing `consumed` from `lot`
    fn split(
        &self,
        lot: &Lot,
        consumed: Amount,
        stake_per_base: Amount,
        current_epoch: Epoch,
    ) -> Result<LotDelta> {
        let out_of_range = || TillageError::malformed(lot.epoch, "split out of range");

        // A fully consumed lot gives up exactly what it stores, so repeated
        // partial splits never leave sub-unit residue behind
        let (base_value, yield_rate, base_stake_weight) = if consumed == lot.raw_amount {
            (lot.base_value, lot.yield_rate, lot.stake_weight)
        } else {
            let pct = consumed.checked_div(lot.raw_amount).ok_or_else(out_of_range)?;
            let base_value = pct.checked_mul(lot.base_value).ok_or_else(out_of_range)?;
            let yield_rate = pct.checked_mul(lot.yield_rate).ok_or_else(out_of_range)?;
            let base_stake_weight = stake_per_base
                .checked_mul(base_value)
                .ok_or_else(out_of_range)?;
            (base_value, yield_rate, base_stake_weight)
        };
        // validate_snapshot rejects future-dated lots
        let elapsed = current_epoch.elapsed_since(lot.epoch).unwrap_or(0);
        let accrued_stake_weight = yield_rate
            .checked_mul(Decimal::from(elapsed))
            .and_then(|v| v.checked_mul(self.accrual_rate))
            .ok_or_else(out_of_range)?;
        let stake_weight = base_stake_weight
            .checked_add(accrued_stake_weight)
            .ok_or_else(out_of_range)?;

        Ok(LotDelta {
            epoch: lot.epoch,
            amount: -consumed,
            base_value: -base_value,
            yield_rate: -yield_rate,
            base_stake_weight: -base_stake_weight,
            accrued_stake_weight: -accrued_stake_weight,
            stake_weight: -stake_weight,
        })
    }
}

fn validate_snapshot(lots: &[Lot], current_epoch: Epoch) -> Result<()> {
    let mut seen = HashSet::with_capacity(lots.len());
    for lot in lots {
        lot.validate()?;
        if lot.epoch > current_epoch {
            return Err(TillageError::malformed(
                lot.epoch,
                format!("created after current {}", current_epoch),
            ));
        }
        if !seen.insert(lot.epoch) {
            return Err(TillageError::malformed(lot.epoch, "duplicate epoch in snapshot"));
        }
    }
    Ok(())
}

/// Lots in visiting order for `order`
fn order_lots(order: SelectionOrder, lots: &[Lot]) -> Result<Vec<&Lot>> {
    match order {
        SelectionOrder::NewestFirst => {
            let mut ordered: Vec<&Lot> = lots.iter().collect();
            ordered.sort_by(|a, b| b.epoch.cmp(&a.epoch));
            Ok(ordered)
        }
        SelectionOrder::HighestBaseValueRatio => {
            let mut keyed = lots
                .iter()
                .map(|lot| {
                    lot.base_value
                        .checked_div(lot.raw_amount)
                        .map(|ratio| (ratio, lot))
                        .ok_or_else(|| TillageError::malformed(lot.epoch, "base value ratio out of range"))
                })
                .collect::<Result<Vec<_>>>()?;
            keyed.sort_by(|(ratio_a, a), (ratio_b, b)| compare_ratio(*ratio_b, b, *ratio_a, a));
            Ok(keyed.into_iter().map(|(_, lot)| lot).collect())
        }
    }
}

fn compare_ratio(ratio_a: Amount, a: &Lot, ratio_b: Amount, b: &Lot) -> Ordering {
    ratio_a.cmp(&ratio_b).then(a.epoch.cmp(&b.epoch))
}
