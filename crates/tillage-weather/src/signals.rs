//! Epoch-end signals and their bands

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tillage_core::{Amount, WeatherConfig};

/// Ratio reported when the denominator of a signal is zero
pub const SATURATED: Amount = Decimal::MAX;

/// Outstanding debt over circulating supply.
///
/// With no supply any outstanding debt is unbounded relative to it, so the
/// ratio saturates into the high band. No debt and no supply is zero.
pub fn debt_ratio(outstanding_debt: Amount, supply: Amount) -> Amount {
    if supply <= Decimal::ZERO {
        if outstanding_debt > Decimal::ZERO {
            return SATURATED;
        }
        return Decimal::ZERO;
    }
    outstanding_debt.checked_div(supply).unwrap_or(SATURATED)
}

/// Demand this epoch relative to last epoch.
///
/// Zero demand in both epochs is steady (`1`). Demand after an epoch
/// without any saturates into the increasing band.
pub fn demand_delta(this_epoch: Amount, last_epoch: Amount) -> Amount {
    if last_epoch <= Decimal::ZERO {
        if this_epoch > Decimal::ZERO {
            return SATURATED;
        }
        return Decimal::ONE;
    }
    this_epoch.checked_div(last_epoch).unwrap_or(SATURATED)
}

/// Signed deviation of `price` from the 1.0 peg
pub fn price_deviation(price: Amount) -> Amount {
    price.saturating_sub(Decimal::ONE)
}

/// Debt ratio band
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtBand {
    Low,
    Moderate,
    High,
}

impl DebtBand {
    pub fn classify(debt_ratio: Amount, bounds: &PegBounds) -> Self {
        if debt_ratio >= bounds.debt_ratio_upper {
            Self::High
        } else if debt_ratio >= bounds.debt_ratio_lower {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn offset(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Moderate => 8,
            Self::High => 16,
        }
    }
}

/// Price relative to peg
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSign {
    Below,
    /// Above peg, or exactly on it while debt is at or below optimal
    AtOrAbove,
}

impl PriceSign {
    pub fn classify(price_deviation: Amount, debt_ratio: Amount, bounds: &PegBounds) -> Self {
        let on_peg_and_optimal =
            price_deviation.is_zero() && debt_ratio <= bounds.debt_ratio_optimal;
        if price_deviation > Decimal::ZERO || on_peg_and_optimal {
            Self::AtOrAbove
        } else {
            Self::Below
        }
    }

    pub fn offset(self) -> u8 {
        match self {
            Self::Below => 0,
            Self::AtOrAbove => 4,
        }
    }
}

/// Demand trend band
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandBand {
    Decreasing,
    Steady,
    Increasing,
}

impl DemandBand {
    pub fn classify(demand_delta: Amount, bounds: &PegBounds) -> Self {
        if demand_delta >= bounds.demand_upper {
            Self::Increasing
        } else if demand_delta >= bounds.demand_lower {
            Self::Steady
        } else {
            Self::Decreasing
        }
    }

    pub fn offset(self) -> u8 {
        match self {
            Self::Decreasing => 0,
            Self::Steady => 1,
            Self::Increasing => 2,
        }
    }
}

/// Band bounds used to bucket the signals
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PegBounds {
    pub debt_ratio_lower: Amount,
    pub debt_ratio_optimal: Amount,
    pub debt_ratio_upper: Amount,
    pub demand_lower: Amount,
    pub demand_upper: Amount,
}

impl Default for PegBounds {
    fn default() -> Self {
        Self::from(&WeatherConfig::default())
    }
}

impl From<&WeatherConfig> for PegBounds {
    fn from(config: &WeatherConfig) -> Self {
        Self {
            debt_ratio_lower: config.debt_ratio_lower,
            debt_ratio_optimal: config.debt_ratio_optimal,
            debt_ratio_upper: config.debt_ratio_upper,
            demand_lower: config.demand_lower,
            demand_upper: config.demand_upper,
        }
    }
}
