//! # Token Constants Table
//!
//! Per-token multipliers used when a deposit is created:
//!
//! | Token | C_stake | C_yield | Decimals | Pricing |
//! |-------|---------|---------|----------|---------|
//! | BEAN | 1 | 2 | 6 | direct |
//! | BEAN3CRV | 1 | 4 | 18 | pooled |
//! | UNRIPE_BEAN | 1 | 2 | 6 | pooled |
//! | UNRIPE_LP | 1 | 4 | 6 | pooled |
//!
//! The table is built once (from defaults or configuration), validated, and
//! then only read. A missing token is an `UnknownToken` error, never a
//! silent zero.

use crate::error::{Result, TillageError};
use crate::types::{Amount, TokenId};
use crate::MAX_DECIMALS;
use hashbrown::HashMap;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Addresses of the tokens in the built-in table
pub mod well_known {
    pub const BEAN: &str = "0xbea0000029ad1c77d3d5d23ba2d8893db9d1efab";
    pub const BEAN_3CRV: &str = "0xc9c32cd16bf7efb85ff14e0c8603cc90f6f2ee49";
    pub const UNRIPE_BEAN: &str = "0x1bea0050e63e05fbb5d8ba2f10cf5800b6224449";
    pub const UNRIPE_LP: &str = "0x1bea3ccd22f4ebd3d37d731ba31eeca95713716d";
}

/// How a token's raw amount maps to base value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pricing {
    /// Base value equals the raw amount
    #[default]
    Direct,
    /// Base value comes from an external pricing oracle
    Pooled,
}

/// Constants for a single depositable token
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConstants {
    /// Table key
    pub id: TokenId,

    /// Display symbol
    pub symbol: String,

    /// Stake-weight granted per unit of base value (C_stake)
    pub stake_per_base: Amount,

    /// Yield-rate tokens granted per unit of base value (C_yield)
    pub yield_per_base: Amount,

    /// Decimal precision of the raw token amount
    pub decimals: u32,

    /// Pricing policy
    #[serde(default)]
    pub pricing: Pricing,
}

impl TokenConstants {
    pub fn new(
        id: impl Into<TokenId>,
        symbol: impl Into<String>,
        stake_per_base: Amount,
        yield_per_base: Amount,
        decimals: u32,
        pricing: Pricing,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            stake_per_base,
            yield_per_base,
            decimals,
            pricing,
        }
    }

    /// Stake-weight granted at deposit time for `base_value`
    pub fn stake_weight_for(&self, base_value: Amount) -> Amount {
        self.stake_per_base * base_value
    }

    /// Yield rate granted at deposit time for `base_value`
    pub fn yield_rate_for(&self, base_value: Amount) -> Amount {
        self.yield_per_base * base_value
    }

    /// Smallest representable raw amount (10^-decimals)
    pub fn smallest_unit(&self) -> Amount {
        Decimal::new(1, self.decimals)
    }

    fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(TillageError::InvalidConfig(format!(
                "token {} has an empty symbol",
                self.id
            )));
        }
        if self.stake_per_base.is_sign_negative() || self.yield_per_base.is_sign_negative() {
            return Err(TillageError::InvalidConfig(format!(
                "token {} has a negative multiplier",
                self.symbol
            )));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(TillageError::InvalidConfig(format!(
                "token {} declares {} decimals (max {})",
                self.symbol, self.decimals, MAX_DECIMALS
            )));
        }
        Ok(())
    }
}

/// Closed, validated token constants table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenTable {
    tokens: HashMap<TokenId, TokenConstants>,
}

impl TokenTable {
    /// Build a table, rejecting duplicates and invalid entries
    pub fn new(entries: impl IntoIterator<Item = TokenConstants>) -> Result<Self> {
        let mut tokens = HashMap::new();
        for entry in entries {
            entry.validate()?;
            if tokens.contains_key(&entry.id) {
                return Err(TillageError::InvalidConfig(format!(
                    "duplicate token entry {}",
                    entry.id
                )));
            }
            tokens.insert(entry.id.clone(), entry);
        }
        if tokens.is_empty() {
            return Err(TillageError::InvalidConfig(
                "token table has no entries".to_string(),
            ));
        }
        Ok(Self { tokens })
    }

    /// Built-in table for the protocol's whitelisted deposit tokens
    pub fn builtin() -> Self {
        let tokens = builtin_entries()
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();
        Self { tokens }
    }

    /// Look up a token, failing with `UnknownToken`
    pub fn get(&self, token: &TokenId) -> Result<&TokenConstants> {
        self.tokens
            .get(token)
            .ok_or_else(|| TillageError::UnknownToken(token.clone()))
    }

    /// Find a token by display symbol (case-insensitive)
    pub fn by_symbol(&self, symbol: &str) -> Option<&TokenConstants> {
        self.tokens
            .values()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn contains(&self, token: &TokenId) -> bool {
        self.tokens.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenConstants> {
        self.tokens.values()
    }
}

impl Default for TokenTable {
    fn default() -> Self {
        Self::builtin()
    }
}

pub(crate) fn builtin_entries() -> Vec<TokenConstants> {
    vec![
        TokenConstants::new(well_known::BEAN, "BEAN", dec!(1), dec!(2), 6, Pricing::Direct),
        TokenConstants::new(well_known::BEAN_3CRV, "BEAN3CRV", dec!(1), dec!(4), 18, Pricing::Pooled),
        TokenConstants::new(well_known::UNRIPE_BEAN, "UNRIPE_BEAN", dec!(1), dec!(2), 6, Pricing::Pooled),
        TokenConstants::new(well_known::UNRIPE_LP, "UNRIPE_LP", dec!(1), dec!(4), 6, Pricing::Pooled),
    ]
}
