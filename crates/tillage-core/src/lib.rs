//! # Tillage Core
//!
//! Shared building blocks for the Tillage accounting simulator, the
//! off-chain deterministic mirror of a staking protocol's deposit ledger and
//! per-block rate curve.
//!
//! This crate provides:
//! - `Amount`, `Epoch`, `BlockNumber`, `AccountId`, `TokenId` - core types
//! - `TokenTable` - the validated per-token constants table
//! - `TillageConfig` - TOML configuration for every subsystem
//! - `TillageError` - the shared error type
//!
//! ## Architecture
//!
//! ```text
//!   TokenTable ──► tillage-silo   (base value, ledger, lot selector)
//!                  tillage-field  (auction-window rate & capacity curve)
//!                  tillage-weather (peg case evaluator)
//! ```
//!
//! Every operation in the workspace is a pure function over a snapshot the
//! caller supplies. Nothing here holds shared state, so all of it can run
//! concurrently for independent accounts without coordination.

pub mod config;
pub mod error;
pub mod token;
pub mod types;

pub use config::{FieldConfig, SiloConfig, TillageConfig, WeatherConfig};
pub use error::{Result, TillageError};
pub use token::{Pricing, TokenConstants, TokenTable};
pub use types::*;

/// Protocol constants
pub mod constants {
    use crate::types::Amount;
    use rust_decimal_macros::dec;

    /// Stake-weight accrued per epoch per unit of yield rate (1 / 10,000)
    pub const ACCRUAL_RATE: Amount = dec!(0.0001);

    /// Blocks at the start of an epoch during which the rate curve ramps up
    pub const AUCTION_WINDOW_BLOCKS: u64 = 25;

    /// Decimal places kept on scaled rates
    pub const RATE_DECIMALS: u32 = 6;

    /// Decimal places kept on capacity
    pub const CAPACITY_DECIMALS: u32 = 6;

    /// Lowest non-zero rate the engine reports (one percent)
    pub const MIN_RATE: Amount = dec!(1);

    /// Rates are percentages
    pub const ONE_HUNDRED: Amount = dec!(100);

    /// Maximum scale supported by the fixed-point representation
    pub const MAX_DECIMALS: u32 = 28;
}

pub use constants::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::TillageConfig;
    pub use crate::error::{Result, TillageError};
    pub use crate::token::{Pricing, TokenConstants, TokenTable};
    pub use crate::types::*;
}
