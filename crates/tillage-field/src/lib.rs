//! # Tillage Field - Dynamic Rate Engine
//!
//! Per-block simulation of the lending rate and capacity during the
//! auction window at the start of each epoch.
//!
//! ## Rounding
//!
//! | Quantity | Direction | Places |
//! |----------|-----------|--------|
//! | Rate | Up | `rate_decimals` (6) |
//! | Capacity | Down | 6 |
//! | Debt issued | Down | 6 |
//!
//! Rates are never reported lower than the authoritative value and capacity
//! is never reported higher, so slippage bounds derived from either hold.
//!
//! ## Example
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use tillage_core::BlockNumber;
//! use tillage_field::{EpochParams, RateState};
//!
//! let params = EpochParams {
//!     epoch_start_block: BlockNumber::new(100),
//!     max_rate: Decimal::from(100),
//!     base_capacity: Decimal::from(1000),
//!     above_equilibrium: true,
//! };
//! let state = RateState::capture(&params, BlockNumber::new(124))?;
//! assert_eq!(state.current_rate.to_string(), "98.982526");
//! # Ok::<(), tillage_core::TillageError>(())
//! ```

pub mod capacity;
pub mod curve;
pub mod sow;
pub mod state;

// Re-exports
pub use capacity::{capacity_at_rate, next_capacity};
pub use curve::{rate_at, RateCurve, RATE_CURVE};
pub use sow::{preview_sow, sow, SowPreview};
pub use state::{AuctionPhase, EpochParams, RateState};
