//! # Tillage Weather - Peg Case Evaluator
//!
//! Previews how the epoch transition will move the max rate.
//!
//! ```text
//! outstanding debt, supply ─► debt_ratio ─────┐
//! price ──────────────────► price_deviation ──┼─► evaluate ─► CaseOutcome ─► apply_rate_change
//! demand this/last epoch ─► demand_delta ─────┘
//! ```
//!
//! | Signal | Bands | Contributes |
//! |--------|-------|-------------|
//! | Debt ratio | low / moderate / high | 0 / 8 / 16 |
//! | Price | below / at or above peg | 0 / 4 |
//! | Demand | decreasing / steady / increasing | 0 / 1 / 2 |

pub mod cases;
pub mod evaluator;
pub mod signals;

// Re-exports
pub use cases::{CaseId, CASE_COUNT, MAGNITUDES};
pub use evaluator::{apply_rate_change, evaluate, CaseOutcome, CaseState};
pub use signals::{
    debt_ratio, demand_delta, price_deviation, DebtBand, DemandBand, PegBounds, PriceSign,
};
