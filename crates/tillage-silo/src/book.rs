//! Account book: deposit ledgers keyed by (account, token)
//!
//! The book is a plain value owned by the caller. It composes the
//! calculator, selector and ledger for the deposit, withdrawal and transfer
//! paths, and every mutating call is all-or-nothing.

use crate::base_value::{BaseValueCalculator, BaseValueOracle};
use crate::ledger::DepositLedger;
use crate::lot::Lot;
use crate::selector::{LotSelector, Selection};
use hashbrown::HashMap;
use rust_decimal::Decimal;
use tillage_core::{AccountId, Amount, Epoch, Result, TokenId};
use tracing::debug;

/// Mapping `(account, token) -> DepositLedger`
#[derive(Clone, Debug, Default)]
pub struct AccountBook {
    ledgers: HashMap<(AccountId, TokenId), DepositLedger>,
}

impl AccountBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a ledger from a snapshot, replacing any existing one
    pub fn load(&mut self, account: AccountId, token: TokenId, lots: Vec<Lot>) -> Result<()> {
        let ledger = DepositLedger::from_lots(token.clone(), lots)?;
        self.ledgers.insert((account, token), ledger);
        Ok(())
    }

    pub fn ledger(&self, account: &AccountId, token: &TokenId) -> Option<&DepositLedger> {
        self.ledgers.get(&(*account, token.clone()))
    }

    /// Total raw amount an account holds of a token
    pub fn balance(&self, account: &AccountId, token: &TokenId) -> Amount {
        self.ledger(account, token)
            .map(|l| l.total_amount())
            .unwrap_or(Decimal::ZERO)
    }

    /// Tokens an account has deposits in
    pub fn tokens_of(&self, account: &AccountId) -> Vec<&TokenId> {
        self.ledgers
            .keys()
            .filter(|(a, _)| a == account)
            .map(|(_, t)| t)
            .collect()
    }

    /// Record a deposit, returning the lot it created
    pub fn deposit<O: BaseValueOracle>(
        &mut self,
        calculator: &BaseValueCalculator<'_, O>,
        account: AccountId,
        token: &TokenId,
        raw_amount: Amount,
        current_epoch: Epoch,
    ) -> Result<Lot> {
        let lot = calculator.compute_new_lot(token, raw_amount, current_epoch)?;
        self.ledgers
            .entry((account, token.clone()))
            .or_insert_with(|| DepositLedger::new(token.clone()))
            .append(lot.clone())?;
        debug!(account = %account, token = %token, amount = %raw_amount, "Recorded deposit");
        Ok(lot)
    }

    /// Compute the deltas of a withdrawal without applying them
    pub fn preview_withdrawal(
        &self,
        selector: &LotSelector<'_>,
        account: &AccountId,
        token: &TokenId,
        amount: Amount,
        current_epoch: Epoch,
    ) -> Result<Selection> {
        let lots = self
            .ledger(account, token)
            .map(|l| l.to_vec())
            .unwrap_or_default();
        selector.select_for_withdrawal(token, amount, &lots, current_epoch)
    }

    /// Withdraw `amount`, applying the selected deltas
    pub fn withdraw(
        &mut self,
        selector: &LotSelector<'_>,
        account: AccountId,
        token: &TokenId,
        amount: Amount,
        current_epoch: Epoch,
    ) -> Result<Selection> {
        let selection = self.preview_withdrawal(selector, &account, token, amount, current_epoch)?;
        let key = (account, token.clone());
        let mut ledger = self
            .ledgers
            .get(&key)
            .cloned()
            .unwrap_or_else(|| DepositLedger::new(token.clone()));
        ledger.apply_deltas(&selection.deltas)?;
        self.commit(key, ledger);
        Ok(selection)
    }

    /// Move `amount` of `token` from one account to another.
    ///
    /// Lots keep their epoch, so the recipient inherits the sender's
    /// accrual history.
    pub fn transfer(
        &mut self,
        selector: &LotSelector<'_>,
        from: AccountId,
        to: AccountId,
        token: &TokenId,
        amount: Amount,
        current_epoch: Epoch,
    ) -> Result<Selection> {
        let lots = self
            .ledger(&from, token)
            .map(|l| l.to_vec())
            .unwrap_or_default();
        let selection = selector.select_for_transfer(token, amount, &lots, current_epoch)?;

        let from_key = (from, token.clone());
        let to_key = (to, token.clone());

        let mut sender = DepositLedger::from_lots(token.clone(), lots)?;
        sender.apply_deltas(&selection.deltas)?;

        if from == to {
            // Credit back into the already-debited ledger
            for delta in &selection.deltas {
                sender.append(delta.as_credit())?;
            }
            self.commit(from_key, sender);
        } else {
            let mut recipient = self
                .ledgers
                .get(&to_key)
                .cloned()
                .unwrap_or_else(|| DepositLedger::new(token.clone()));
            for delta in &selection.deltas {
                recipient.append(delta.as_credit())?;
            }
            self.commit(from_key, sender);
            self.commit(to_key, recipient);
        }
        debug!(from = %from, to = %to, token = %token, amount = %amount, "Transferred deposits");
        Ok(selection)
    }

    fn commit(&mut self, key: (AccountId, TokenId), ledger: DepositLedger) {
        if ledger.is_empty() {
            self.ledgers.remove(&key);
        } else {
            self.ledgers.insert(key, ledger);
        }
    }
}
