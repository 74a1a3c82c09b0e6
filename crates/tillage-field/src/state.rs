//! Rate state machine
//!
//! ```text
//!   capture(params, block)
//!          │
//!          ▼
//!   ┌─────────────┐  advance() x 25  ┌─────────────┐
//!   │   Auction   │ ───────────────► │   Steady    │ ◄─┐ advance()
//!   │ offset 0-24 │                  │ rate = max  │ ──┘
//!   └─────────────┘                  └─────────────┘
//! ```
//!
//! A `RateState` is a snapshot for one block. It is not re-validated when
//! fed back in, so a state held across a block boundary describes the
//! block it was captured at.

use crate::capacity::{capacity_at_rate, next_capacity};
use crate::curve::RateCurve;
use serde::{Deserialize, Serialize};
use tillage_core::{Amount, BlockNumber, Result, AUCTION_WINDOW_BLOCKS};
use tracing::trace;

/// Phase of an epoch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionPhase {
    /// Rate ramps up along the curve
    Auction,
    /// Rate pinned to the epoch maximum
    Steady,
}

impl AuctionPhase {
    pub fn for_offset(block_offset: u64) -> Self {
        if block_offset < AUCTION_WINDOW_BLOCKS {
            Self::Auction
        } else {
            Self::Steady
        }
    }
}

/// Per-epoch inputs read from chain state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochParams {
    pub epoch_start_block: BlockNumber,
    pub max_rate: Amount,
    /// Capacity at `max_rate`
    pub base_capacity: Amount,
    pub above_equilibrium: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateState {
    pub epoch_start_block: BlockNumber,
    /// Blocks since the epoch started, held at the window size once steady
    pub block_offset: u64,
    pub max_rate: Amount,
    pub current_rate: Amount,
    pub capacity: Amount,
    pub above_equilibrium: bool,
    /// Rounding the snapshot was captured with; older snapshots without it
    /// use the default curve
    #[serde(default)]
    curve: RateCurve,
}

impl RateState {
    /// Snapshot the engine at `block` with the default curve
    pub fn capture(params: &EpochParams, block: BlockNumber) -> Result<Self> {
        Self::capture_with(RateCurve::default(), params, block)
    }

    /// Snapshot the engine at `block`.
    ///
    /// Blocks before the epoch start are treated as offset zero. Fails with
    /// `InvalidAmount` if the scaled capacity leaves the fixed-point range.
    pub fn capture_with(
        curve: RateCurve,
        params: &EpochParams,
        block: BlockNumber,
    ) -> Result<Self> {
        let block_offset = (block - params.epoch_start_block).min(AUCTION_WINDOW_BLOCKS);
        let current_rate = curve.rate_at(block_offset, params.max_rate);
        let capacity = if params.above_equilibrium {
            capacity_at_rate(params.base_capacity, params.max_rate, current_rate)?
        } else {
            params.base_capacity
        };

        Ok(Self {
            epoch_start_block: params.epoch_start_block,
            block_offset,
            max_rate: params.max_rate,
            current_rate,
            capacity,
            above_equilibrium: params.above_equilibrium,
            curve,
        })
    }

    pub fn phase(&self) -> AuctionPhase {
        AuctionPhase::for_offset(self.block_offset)
    }

    /// Block this snapshot describes
    pub fn block(&self) -> BlockNumber {
        BlockNumber::new(self.epoch_start_block.get() + self.block_offset)
    }

    pub fn curve(&self) -> &RateCurve {
        &self.curve
    }

    /// Rate one block later
    pub fn next_rate(&self) -> Amount {
        self.curve.rate_at(self.block_offset + 1, self.max_rate)
    }

    /// Capacity one block later
    pub fn next_capacity(&self) -> Result<Amount> {
        next_capacity(
            self.capacity,
            self.current_rate,
            self.next_rate(),
            self.above_equilibrium,
        )
    }

    /// Most that can be sown in the next block, assuming nothing is sown now
    pub fn max_sowable_next_block(&self) -> Result<Amount> {
        self.next_capacity()
    }

    /// Step the snapshot forward one block. The snapshot is unchanged on error.
    pub fn advance(&mut self) -> Result<()> {
        if self.phase() == AuctionPhase::Steady {
            return Ok(());
        }
        let next_rate = self.next_rate();
        let capacity = self.next_capacity()?;
        self.block_offset += 1;
        trace!(
            offset = self.block_offset,
            rate = %next_rate,
            capacity = %capacity,
            "Advanced rate state"
        );
        self.current_rate = next_rate;
        self.capacity = capacity;
        Ok(())
    }

    /// Walk the window block by block up to and including the first steady block
    pub fn blocks(&self) -> Blocks {
        Blocks {
            state: Some(Ok(self.clone())),
        }
    }

    /// Consume `amount` of capacity
    pub(crate) fn consume(&mut self, amount: Amount) {
        self.capacity -= amount;
    }
}

/// Iterator returned by [`RateState::blocks`]
///
/// A failed step is yielded once and ends the walk.
pub struct Blocks {
    state: Option<Result<RateState>>,
}

impl Iterator for Blocks {
    type Item = Result<RateState>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = match self.state.take()? {
            Ok(state) => state,
            Err(err) => return Some(Err(err)),
        };
        if current.phase() == AuctionPhase::Auction {
            let mut next = current.clone();
            self.state = Some(next.advance().map(|()| next));
        }
        Some(Ok(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tillage_core::TillageError;

    fn params(above_equilibrium: bool) -> EpochParams {
        EpochParams {
            epoch_start_block: BlockNumber::new(1_000),
            max_rate: dec!(100),
            base_capacity: dec!(1000),
            above_equilibrium,
        }
    }

    #[test]
    fn test_capture_at_epoch_start() {
        let state = RateState::capture(&params(true), BlockNumber::new(1_000)).unwrap();
        assert_eq!(state.block_offset, 0);
        assert_eq!(state.phase(), AuctionPhase::Auction);
        assert_eq!(state.current_rate, dec!(1));
        // 1000 * 200 / 101
        assert_eq!(state.capacity, dec!(1980.198019));
    }

    #[test]
    fn test_capture_below_equilibrium_keeps_base_capacity() {
        let state = RateState::capture(&params(false), BlockNumber::new(1_003)).unwrap();
        assert_eq!(state.capacity, dec!(1000));
        assert_eq!(state.current_rate, dec!(49.491263));
    }

    #[test]
    fn test_capture_steady() {
        let state = RateState::capture(&params(true), BlockNumber::new(5_000)).unwrap();
        assert_eq!(state.phase(), AuctionPhase::Steady);
        assert_eq!(state.block_offset, AUCTION_WINDOW_BLOCKS);
        assert_eq!(state.current_rate, dec!(100));
        assert_eq!(state.capacity, dec!(1000));
    }

    #[test]
    fn test_capture_before_start() {
        let state = RateState::capture(&params(true), BlockNumber::new(10)).unwrap();
        assert_eq!(state.block_offset, 0);
    }

    #[test]
    fn test_advance_through_window() {
        let mut state = RateState::capture(&params(true), BlockNumber::new(1_000)).unwrap();
        for _ in 0..AUCTION_WINDOW_BLOCKS {
            let before = state.clone();
            state.advance().unwrap();
            assert!(state.current_rate >= before.current_rate);
            assert!(state.capacity <= before.capacity);
        }
        assert_eq!(state.phase(), AuctionPhase::Steady);
        assert_eq!(state.current_rate, dec!(100));
        assert_eq!(state.block(), BlockNumber::new(1_025));

        let steady = state.clone();
        state.advance().unwrap();
        assert_eq!(state, steady);
    }

    #[test]
    fn test_max_sowable_next_block() {
        let state = RateState::capture(&params(true), BlockNumber::new(1_000)).unwrap();
        let mut next = state.clone();
        next.advance().unwrap();
        assert_eq!(state.max_sowable_next_block().unwrap(), next.capacity);
    }

    #[test]
    fn test_blocks_iterator() {
        let state = RateState::capture(&params(false), BlockNumber::new(1_020)).unwrap();
        let walked: Vec<_> = state.blocks().map(|s| s.unwrap().block_offset).collect();
        assert_eq!(walked, vec![20, 21, 22, 23, 24, 25]);
    }

    #[test]
    fn test_serde_roundtrip_keeps_curve() {
        let curve = RateCurve::new(2, dec!(0.01));
        let state =
            RateState::capture_with(curve.clone(), &params(true), BlockNumber::new(1_023)).unwrap();
        assert_eq!(state.next_rate(), dec!(98.99));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["block_offset"], 23);
        assert_eq!(json["curve"]["rate_decimals"], 2);

        let back: RateState = serde_json::from_value(json).unwrap();
        assert_eq!(back.curve(), &curve);
        assert_eq!(back.next_rate(), dec!(98.99));
        assert_eq!(back.next_capacity().unwrap(), state.next_capacity().unwrap());
        assert_eq!(back, state);
    }

    #[test]
    fn test_snapshot_without_curve_uses_default() {
        let state = RateState::capture(&params(true), BlockNumber::new(1_001)).unwrap();
        let mut json = serde_json::to_value(&state).unwrap();
        json.as_object_mut().unwrap().remove("curve");
        let back: RateState = serde_json::from_value(json).unwrap();
        assert_eq!(back.curve(), &RateCurve::default());
        assert_eq!(back, state);
    }

    #[test]
    fn test_capture_out_of_range_capacity() {
        let mut params = params(true);
        params.base_capacity = Decimal::MAX / dec!(10);
        let err = RateState::capture(&params, BlockNumber::new(1_000)).unwrap_err();
        assert!(matches!(err, TillageError::InvalidAmount(_)));
    }

    #[test]
    fn test_failed_advance_leaves_snapshot() {
        let mut params = params(false);
        params.base_capacity = Decimal::MAX / dec!(10);
        let mut state = RateState::capture(&params, BlockNumber::new(1_004)).unwrap();
        state.above_equilibrium = true;
        let before = state.clone();

        assert!(state.advance().is_err());
        assert_eq!(state, before);

        let walked: Vec<_> = state.blocks().collect();
        assert_eq!(walked.len(), 2);
        assert!(walked[1].is_err());
    }
}
