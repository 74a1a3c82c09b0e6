//! # Tillage Silo - Deposit Ledger & Lot Selection
//!
//! Local, exact preview of what a deposit, withdrawal, transfer or convert
//! does to an account's deposit lots.
//!
//! ## Flows
//!
//! ```text
//! deposit:   TokenTable + raw amount ─► BaseValueCalculator ─► Lot ─► DepositLedger::append
//! withdraw:  DepositLedger + amount  ─► LotSelector ─► Selection (ordered deltas)
//!                                                    └─► DepositLedger::apply_deltas
//! ```
//!
//! ## Lot Selection (withdraw / transfer)
//!
//! | Step | Rule |
//! |------|------|
//! | Order | Newest epoch first (LIFO) |
//! | Split | Last visited lot is consumed partially |
//! | Weights | Scaled by the consumed fraction, never recomputed |
//! | Accrual | `yield_rate * elapsed_epochs * accrual_rate` removed as well |
//! | Failure | Whole request or nothing |

pub mod base_value;
pub mod book;
pub mod ledger;
pub mod lot;
pub mod selector;

// Re-exports
pub use base_value::{compute_new_lot, BaseValueCalculator, BaseValueOracle, NoOracle};
pub use book::AccountBook;
pub use ledger::{DepositLedger, LedgerTotals};
pub use lot::{Lot, LotDelta};
pub use selector::{DeltaTotals, LotSelector, Selection, SelectionOrder};
