//! Integration tests for the auction-window rate and capacity curves

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tillage_core::{BlockNumber, TillageConfig, AUCTION_WINDOW_BLOCKS};
use tillage_field::{
    capacity_at_rate, next_capacity, preview_sow, rate_at, AuctionPhase, EpochParams, RateCurve,
    RateState,
};

mod reference_curve {
    use super::*;

    #[test]
    fn test_window_endpoints() {
        // Table entry 0 is log(1) = 0, so block zero sits on the floor
        assert_eq!(rate_at(0, dec!(100)), dec!(1));
        assert_eq!(rate_at(24, dec!(100)), dec!(98.982526));
        assert_eq!(rate_at(25, dec!(100)), dec!(100));
    }

    #[test]
    fn test_full_window_at_one_hundred() {
        let expected = [
            dec!(1),
            dec!(27.941532),
            dec!(40.933604),
            dec!(49.491263),
            dec!(55.883063),
            dec!(60.986817),
            dec!(65.235583),
            dec!(68.875135),
            dec!(72.058469),
            dec!(74.887324),
            dec!(77.432794),
            dec!(79.746523),
            dec!(81.867207),
            dec!(83.824594),
            dec!(85.642044),
            dec!(87.338238),
            dec!(88.928348),
            dec!(90.424867),
            dec!(91.838201),
            dec!(93.177114),
            dec!(94.449053),
            dec!(95.660400),
            dec!(96.816666),
            dec!(97.922644),
            dec!(98.982526),
        ];
        for (d, rate) in expected.iter().enumerate() {
            assert_eq!(rate_at(d as u64, dec!(100)), *rate, "block {}", d);
        }
    }

    #[test]
    fn test_zero_max_rate_is_steady() {
        let params = EpochParams {
            epoch_start_block: BlockNumber::new(0),
            max_rate: dec!(0),
            base_capacity: dec!(500),
            above_equilibrium: true,
        };
        let state = RateState::capture(&params, BlockNumber::new(3)).unwrap();
        assert_eq!(state.current_rate, dec!(0));
        assert_eq!(state.capacity, dec!(500));
        assert_eq!(state.next_capacity().unwrap(), dec!(500));
    }

    #[test]
    fn test_configured_precision() {
        let config = TillageConfig::from_toml_str(
            r#"
            [field]
            rate_decimals = 0
            min_rate = "1"
            "#,
        )
        .unwrap();
        let curve = RateCurve::from(&config.field);
        assert_eq!(curve.rate_at(1, dec!(100)), dec!(28));
        assert_eq!(curve.rate_at(24, dec!(100)), dec!(99));
    }
}

mod lifecycle {
    use super::*;

    #[test]
    fn test_sow_early_costs_less_debt() {
        let params = EpochParams {
            epoch_start_block: BlockNumber::new(10_000),
            max_rate: dec!(200),
            base_capacity: dec!(1_000),
            above_equilibrium: true,
        };
        let early = RateState::capture(&params, BlockNumber::new(10_001)).unwrap();
        let late = RateState::capture(&params, BlockNumber::new(10_030)).unwrap();
        assert_eq!(late.phase(), AuctionPhase::Steady);

        let early_sow = preview_sow(&early, dec!(100)).unwrap();
        let late_sow = preview_sow(&late, dec!(100)).unwrap();
        assert!(early_sow.debt < late_sow.debt);
        assert_eq!(late_sow.debt, dec!(300));
        assert!(early.capacity > late.capacity);
    }

    #[test]
    fn test_issuable_debt_bounded_through_window() {
        let params = EpochParams {
            epoch_start_block: BlockNumber::new(0),
            max_rate: dec!(100),
            base_capacity: dec!(1_000),
            above_equilibrium: true,
        };
        let ceiling = dec!(1_000) * dec!(200) / dec!(100);
        let start = RateState::capture(&params, BlockNumber::new(0)).unwrap();
        for state in start.blocks() {
            let state = state.unwrap();
            let issuable = state.capacity * (dec!(100) + state.current_rate) / dec!(100);
            assert!(issuable <= ceiling, "offset {}", state.block_offset);
        }
    }
}

fn arb_max_rate() -> impl Strategy<Value = Decimal> {
    (0i64..5_000_000_000).prop_map(|v| Decimal::new(v, 6))
}

fn arb_capacity() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000_000).prop_map(|v| Decimal::new(v, 6))
}

proptest! {
    #[test]
    fn prop_rate_monotone(max_rate in arb_max_rate(), d in 0u64..AUCTION_WINDOW_BLOCKS) {
        prop_assert!(rate_at(d, max_rate) <= rate_at(d + 1, max_rate));
    }

    #[test]
    fn prop_rate_bounded(max_rate in arb_max_rate(), d in 0u64..100) {
        let rate = rate_at(d, max_rate);
        prop_assert!(rate >= Decimal::ZERO);
        prop_assert!(rate <= max_rate);
        if max_rate > Decimal::ZERO {
            prop_assert!(rate > Decimal::ZERO);
        }
    }

    #[test]
    fn prop_rate_never_below_exact(max_rate in arb_max_rate(), d in 0u64..AUCTION_WINDOW_BLOCKS) {
        let exact = max_rate * Decimal::from(tillage_field::RATE_CURVE[d as usize])
            / Decimal::from(1_000_000_000_000u64);
        prop_assert!(rate_at(d, max_rate) >= exact.min(max_rate));
    }

    #[test]
    fn prop_capacity_non_increasing(
        max_rate in arb_max_rate(),
        base in arb_capacity(),
        start in 0u64..AUCTION_WINDOW_BLOCKS,
    ) {
        let params = EpochParams {
            epoch_start_block: BlockNumber::new(0),
            max_rate,
            base_capacity: base,
            above_equilibrium: true,
        };
        let mut state = RateState::capture(&params, BlockNumber::new(start)).unwrap();
        while state.phase() == AuctionPhase::Auction {
            let before = state.capacity;
            state.advance().unwrap();
            prop_assert!(state.capacity <= before);
        }
    }

    #[test]
    fn prop_capacity_constant_below_equilibrium(
        capacity in arb_capacity(),
        curr in arb_max_rate(),
        next in arb_max_rate(),
    ) {
        prop_assert_eq!(next_capacity(capacity, curr, next, false).unwrap(), capacity);
    }

    #[test]
    fn prop_capacity_at_rate_covers_base(
        base in arb_capacity(),
        max_rate in arb_max_rate(),
        d in 0u64..=AUCTION_WINDOW_BLOCKS,
    ) {
        let rate = rate_at(d, max_rate);
        prop_assert!(capacity_at_rate(base, max_rate, rate).unwrap() >= base);
    }
}
