//! # Auction-Window Rate Curve
//!
//! During the first 25 blocks of an epoch the rate ramps from the floor up
//! to the epoch's maximum along a discretized logarithm:
//!
//! ```text
//! pct(d)  = log_51(2d + 1)          d = blocks since epoch start
//! rate(d) = max(ceil(max_rate * pct(d), rate_decimals), min_rate)   d < 25
//! rate(d) = max_rate                                                d >= 25
//! ```
//!
//! `pct` is stored as 12-digit integer constants, `floor(pct(d) * 10^12)`,
//! so no logarithm is evaluated at runtime. Rounding up keeps the reported
//! rate at or above the authoritative one.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tillage_core::{Amount, FieldConfig, AUCTION_WINDOW_BLOCKS, MIN_RATE, RATE_DECIMALS};
use tracing::trace;

/// Scale of the curve constants
pub const CURVE_SCALE: u32 = 12;

/// `floor(log_51(2d + 1) * 10^12)` for `d` in `0..25`
pub const RATE_CURVE: [u64; AUCTION_WINDOW_BLOCKS as usize] = [
    0,
    279_415_312_704,
    409_336_034_395,
    494_912_626_048,
    558_830_625_409,
    609_868_162_219,
    652_355_825_780,
    688_751_347_100,
    720_584_687_295,
    748_873_234_524,
    774_327_938_752,
    797_465_225_780,
    818_672_068_791,
    838_245_938_114,
    856_420_437_864,
    873_382_373_802,
    889_283_474_924,
    904_248_660_443,
    918_382_006_208,
    931_771_138_485,
    944_490_527_707,
    956_603_996_980,
    968_166_659_804,
    979_226_436_102,
    989_825_252_096,
];

/// Curve fraction for `delta_blocks`, or `None` outside the window
pub fn curve_fraction(delta_blocks: u64) -> Option<Decimal> {
    RATE_CURVE
        .get(usize::try_from(delta_blocks).ok()?)
        .map(|&pct| Decimal::new(pct as i64, CURVE_SCALE))
}

/// Rate curve with its rounding parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateCurve {
    rate_decimals: u32,
    min_rate: Amount,
}

impl Default for RateCurve {
    fn default() -> Self {
        Self {
            rate_decimals: RATE_DECIMALS,
            min_rate: MIN_RATE,
        }
    }
}

impl From<&FieldConfig> for RateCurve {
    fn from(config: &FieldConfig) -> Self {
        Self {
            rate_decimals: config.rate_decimals,
            min_rate: config.min_rate,
        }
    }
}

impl RateCurve {
    pub fn new(rate_decimals: u32, min_rate: Amount) -> Self {
        Self {
            rate_decimals,
            min_rate,
        }
    }

    pub fn rate_decimals(&self) -> u32 {
        self.rate_decimals
    }

    pub fn min_rate(&self) -> Amount {
        self.min_rate
    }

    /// Rate `delta_blocks` into the epoch for a given maximum.
    ///
    /// A zero maximum is a valid steady state and yields zero. Inside the
    /// window the result never exceeds `max_rate`, and the floor never
    /// lifts it above `max_rate` either.
    pub fn rate_at(&self, delta_blocks: u64, max_rate: Amount) -> Amount {
        if max_rate <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let Some(pct) = curve_fraction(delta_blocks) else {
            return max_rate;
        };

        let scaled = (max_rate * pct)
            .round_dp_with_strategy(self.rate_decimals, RoundingStrategy::ToPositiveInfinity);
        let rate = scaled.max(self.min_rate.min(max_rate)).min(max_rate);
        trace!(delta_blocks, max_rate = %max_rate, rate = %rate, "Scaled auction rate");
        rate
    }
}

/// [`RateCurve::rate_at`] with default rounding
pub fn rate_at(delta_blocks: u64, max_rate: Amount) -> Amount {
    RateCurve::default().rate_at(delta_blocks, max_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_table_strictly_increasing() {
        assert!(RATE_CURVE.windows(2).all(|w| w[0] < w[1]));
        assert!(RATE_CURVE[24] < 10u64.pow(CURVE_SCALE));
    }

    #[test]
    fn test_table_matches_logarithm() {
        for (d, &pct) in RATE_CURVE.iter().enumerate() {
            let exact = ((2 * d + 1) as f64).ln() / 51f64.ln();
            let stored = pct as f64 / 1e12;
            assert!((exact - stored).abs() < 1e-9, "block {}: {} vs {}", d, exact, stored);
        }
    }

    #[test]
    fn test_curve_fraction_bounds() {
        assert_eq!(curve_fraction(0), Some(dec!(0)));
        assert_eq!(curve_fraction(1), Some(dec!(0.279415312704)));
        assert_eq!(curve_fraction(25), None);
        assert_eq!(curve_fraction(u64::MAX), None);
    }

    #[test]
    fn test_rate_at_rounds_up() {
        // 100 * 0.279415312704 = 27.9415312704 -> 27.941532
        assert_eq!(rate_at(1, dec!(100)), dec!(27.941532));
        // 100 * 0.989825252096 = 98.9825252096 -> 98.982526
        assert_eq!(rate_at(24, dec!(100)), dec!(98.982526));
    }

    #[test]
    fn test_rate_at_floor() {
        assert_eq!(rate_at(0, dec!(100)), dec!(1));
        // 2 * 0.279... = 0.558... is lifted to the floor
        assert_eq!(rate_at(1, dec!(2)), dec!(1));
    }

    #[test]
    fn test_floor_never_exceeds_max() {
        assert_eq!(rate_at(0, dec!(0.5)), dec!(0.5));
        assert_eq!(rate_at(25, dec!(0.5)), dec!(0.5));
    }

    #[test]
    fn test_rate_outside_window() {
        assert_eq!(rate_at(25, dec!(100)), dec!(100));
        assert_eq!(rate_at(10_000, dec!(123.45)), dec!(123.45));
    }

    #[test]
    fn test_zero_max_rate() {
        for d in [0, 1, 24, 25, 300] {
            assert_eq!(rate_at(d, dec!(0)), dec!(0));
        }
    }

    #[test]
    fn test_custom_precision() {
        let curve = RateCurve::new(2, dec!(0.01));
        assert_eq!(curve.rate_at(24, dec!(100)), dec!(98.99));
        assert_eq!(curve.rate_at(0, dec!(100)), dec!(0.01));
    }
}
