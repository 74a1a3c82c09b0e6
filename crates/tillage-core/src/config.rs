//! Simulator configuration
//!
//! Loaded from TOML. Every section is optional and falls back to protocol
//! defaults. Decimal values should be written as strings
//! (`accrual_rate = "0.0001"`) so they parse exactly.
//!
//! ```toml
//! [silo]
//! accrual_rate = "0.0001"
//!
//! [[tokens]]
//! id = "0xbea0000029ad1c77d3d5d23ba2d8893db9d1efab"
//! symbol = "BEAN"
//! stake_per_base = "1"
//! yield_per_base = "2"
//! decimals = 6
//! pricing = "direct"
//!
//! [field]
//! rate_decimals = 6
//! min_rate = "1"
//!
//! [weather]
//! debt_ratio_lower = "0.05"
//! debt_ratio_optimal = "0.15"
//! debt_ratio_upper = "0.25"
//! demand_lower = "0.95"
//! demand_upper = "1.05"
//! ```

use crate::error::{Result, TillageError};
use crate::token::{builtin_entries, TokenConstants, TokenTable};
use crate::types::Amount;
use crate::{ACCRUAL_RATE, MAX_DECIMALS, MIN_RATE, RATE_DECIMALS};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Complete simulator configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TillageConfig {
    /// Deposit ledger parameters
    #[serde(default)]
    pub silo: SiloConfig,

    /// Token constants table entries
    #[serde(default = "builtin_entries")]
    pub tokens: Vec<TokenConstants>,

    /// Dynamic rate engine parameters
    #[serde(default)]
    pub field: FieldConfig,

    /// Peg case evaluator bounds
    #[serde(default)]
    pub weather: WeatherConfig,
}

impl Default for TillageConfig {
    fn default() -> Self {
        Self {
            silo: SiloConfig::default(),
            tokens: builtin_entries(),
            field: FieldConfig::default(),
            weather: WeatherConfig::default(),
        }
    }
}

impl TillageConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!(
            path = %path.display(),
            tokens = config.tokens.len(),
            "Loaded simulator configuration"
        );
        Ok(config)
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        self.silo.validate()?;
        self.field.validate()?;
        self.weather.validate()?;
        TokenTable::new(self.tokens.iter().cloned())?;
        Ok(())
    }

    /// Build the token constants table once
    pub fn token_table(&self) -> Result<TokenTable> {
        TokenTable::new(self.tokens.iter().cloned())
    }
}

/// Deposit ledger parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiloConfig {
    /// Stake-weight accrued per epoch per unit of yield rate
    #[serde(default = "default_accrual_rate")]
    pub accrual_rate: Amount,
}

fn default_accrual_rate() -> Amount {
    ACCRUAL_RATE
}

impl Default for SiloConfig {
    fn default() -> Self {
        Self {
            accrual_rate: default_accrual_rate(),
        }
    }
}

impl SiloConfig {
    fn validate(&self) -> Result<()> {
        if self.accrual_rate.is_sign_negative() {
            return Err(TillageError::InvalidConfig(
                "silo.accrual_rate must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Dynamic rate engine parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Decimal places kept when a scaled rate is rounded up
    #[serde(default = "default_rate_decimals")]
    pub rate_decimals: u32,

    /// Floor applied to any non-zero scaled rate (1 = one percent)
    #[serde(default = "default_min_rate")]
    pub min_rate: Amount,
}

fn default_rate_decimals() -> u32 {
    RATE_DECIMALS
}

fn default_min_rate() -> Amount {
    MIN_RATE
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            rate_decimals: default_rate_decimals(),
            min_rate: default_min_rate(),
        }
    }
}

impl FieldConfig {
    fn validate(&self) -> Result<()> {
        if self.rate_decimals > MAX_DECIMALS {
            return Err(TillageError::InvalidConfig(format!(
                "field.rate_decimals must be at most {}",
                MAX_DECIMALS
            )));
        }
        if self.min_rate.is_sign_negative() {
            return Err(TillageError::InvalidConfig(
                "field.min_rate must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Peg case evaluator band bounds
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Debt ratio below which debt is considered low
    #[serde(default = "default_debt_ratio_lower")]
    pub debt_ratio_lower: Amount,

    /// Debt ratio at or below which a flat price counts as non-negative
    #[serde(default = "default_debt_ratio_optimal")]
    pub debt_ratio_optimal: Amount,

    /// Debt ratio at or above which debt is considered high
    #[serde(default = "default_debt_ratio_upper")]
    pub debt_ratio_upper: Amount,

    /// Demand delta below which demand is decreasing
    #[serde(default = "default_demand_lower")]
    pub demand_lower: Amount,

    /// Demand delta at or above which demand is increasing
    #[serde(default = "default_demand_upper")]
    pub demand_upper: Amount,
}

fn default_debt_ratio_lower() -> Amount {
    dec!(0.05)
}

fn default_debt_ratio_optimal() -> Amount {
    dec!(0.15)
}

fn default_debt_ratio_upper() -> Amount {
    dec!(0.25)
}

fn default_demand_lower() -> Amount {
    dec!(0.95)
}

fn default_demand_upper() -> Amount {
    dec!(1.05)
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            debt_ratio_lower: default_debt_ratio_lower(),
            debt_ratio_optimal: default_debt_ratio_optimal(),
            debt_ratio_upper: default_debt_ratio_upper(),
            demand_lower: default_demand_lower(),
            demand_upper: default_demand_upper(),
        }
    }
}

impl WeatherConfig {
    fn validate(&self) -> Result<()> {
        if !(self.debt_ratio_lower <= self.debt_ratio_optimal
            && self.debt_ratio_optimal <= self.debt_ratio_upper)
        {
            return Err(TillageError::InvalidConfig(
                "weather debt ratio bounds must satisfy lower <= optimal <= upper".to_string(),
            ));
        }
        if self.demand_lower > self.demand_upper {
            return Err(TillageError::InvalidConfig(
                "weather demand bounds must satisfy lower <= upper".to_string(),
            ));
        }
        if self.debt_ratio_lower.is_sign_negative() || self.demand_lower.is_sign_negative() {
            return Err(TillageError::InvalidConfig(
                "weather bounds must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
