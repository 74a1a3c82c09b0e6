//! Case table
//!
//! Case ids pack the three bands into five bits:
//!
//! ```text
//!   bit 4..3  debt band     0 low, 8 moderate, 16 high
//!   bit 2     price sign    4 at or above peg
//!   bit 1..0  demand band   0 decreasing, 1 steady, 2 increasing
//! ```
//!
//! Demand never contributes 3, so ids ending in `0b11` are unreachable and
//! carry a zero magnitude. Debt bands only reach 16, so ids 24..32 are
//! unreachable from [`crate::evaluate`] but kept so the table stays
//! addressable by any five-bit id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of entries in the case table
pub const CASE_COUNT: usize = 32;

/// Max-rate change per case, in whole rate units
#[rustfmt::skip]
pub const MAGNITUDES: [i8; CASE_COUNT] = [
    // low debt, below peg
    3, 1, 0, 0,
    // low debt, at or above peg
    -1, -3, -3, 0,
    // moderate debt, below peg
    3, 1, 0, 0,
    // moderate debt, at or above peg
    -1, -3, -3, 0,
    // high debt, below peg
    3, 3, 1, 0,
    // high debt, at or above peg
    0, -1, -3, 0,
    // excessive debt, below peg
    3, 3, 1, 0,
    // excessive debt, at or above peg
    0, -1, -3, 0,
];

/// Index into the case table
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CaseId(u8);

impl CaseId {
    /// `None` unless `id < 32`
    pub fn new(id: u8) -> Option<Self> {
        ((id as usize) < CASE_COUNT).then_some(Self(id))
    }

    pub(crate) fn from_offsets(debt: u8, price: u8, demand: u8) -> Self {
        Self((debt + price + demand) & 0x1f)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn magnitude(self) -> i8 {
        MAGNITUDES[self.0 as usize]
    }
}

impl TryFrom<u8> for CaseId {
    type Error = String;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::new(id).ok_or_else(|| format!("case id {} out of range", id))
    }
}

impl From<CaseId> for u8 {
    fn from(id: CaseId) -> Self {
        id.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "case {}", self.0)
    }
}
