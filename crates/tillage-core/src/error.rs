//! Error types for Tillage accounting operations

use crate::types::{Amount, Epoch, TokenId};
use thiserror::Error;

/// Result type alias for Tillage operations
pub type Result<T> = std::result::Result<T, TillageError>;

/// Errors raised by the ledger, selector, rate engine and configuration layer.
///
/// Every error is raised before anything is applied: a failed operation
/// leaves the caller's snapshot exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TillageError {
    // === Input validation ===
    /// Amount must be strictly positive
    #[error("Invalid amount: {0} (must be greater than zero)")]
    InvalidAmount(Amount),

    /// Token has no entry in the constants table
    #[error("Unknown token: {0}")]
    UnknownToken(TokenId),

    // === Ledger invariants ===
    /// A lot's invariants are violated
    #[error("Malformed crate at {epoch}: {reason}")]
    MalformedCrate { epoch: Epoch, reason: String },

    /// Requested removal exceeds the ledger total
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Amount, available: Amount },

    // === Field ===
    /// Requested sow exceeds the remaining capacity this block
    #[error("Insufficient capacity: requested {requested}, available {available}")]
    InsufficientCapacity { requested: Amount, available: Amount },

    // === Configuration ===
    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(String),
}

impl TillageError {
    /// Shorthand for a `MalformedCrate` error
    pub fn malformed(epoch: Epoch, reason: impl Into<String>) -> Self {
        Self::MalformedCrate {
            epoch,
            reason: reason.into(),
        }
    }

    /// Stable numeric code for transaction-builder error reporting
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidAmount(_) => 2001,
            Self::UnknownToken(_) => 2002,
            Self::MalformedCrate { .. } => 2003,
            Self::InsufficientBalance { .. } => 2004,
            Self::InsufficientCapacity { .. } => 2005,
            Self::InvalidConfig(_) | Self::ConfigParse(_) | Self::Io(_) => 2100,
        }
    }

    /// Whether re-fetching a fresh snapshot may make the call succeed.
    ///
    /// Balance and capacity shortfalls depend on chain state that moves;
    /// malformed lots and bad inputs do not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientBalance { .. } | Self::InsufficientCapacity { .. } | Self::Io(_)
        )
    }
}

impl From<std::io::Error> for TillageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for TillageError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigParse(err.to_string())
    }
}
