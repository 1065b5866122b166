// Error types and error handling module
// This file defines the error taxonomy surfaced by the routing engine
// to callers of get_expected_return and swap
//
// Numan Thabit 2025 Nov

use thiserror::Error;

use crate::venues::Asset;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("parts must be within 1..={max}, got {parts}")]
    InvalidParts { parts: u32, max: u32 },
    #[error("source and destination asset are identical: {0}")]
    SameAsset(Asset),
    #[error("unknown flag bits set: {0:#x}")]
    UnknownFlags(u128),
    #[error("invalid distribution: {0}")]
    InvalidDistribution(String),
    #[error("return amount {actual} is below minimum {min_return}")]
    InsufficientReturn { min_return: u128, actual: u128 },
    #[error("execution error: {0}")]
    Execution(String),
}

impl RouteError {
    /// Configuration errors are rejected before any quote work begins.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RouteError::InvalidParts { .. }
                | RouteError::SameAsset(_)
                | RouteError::UnknownFlags(_)
                | RouteError::InvalidDistribution(_)
        )
    }
}

/// Failure of a single source quote. Never leaves the quote table builder.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("pair {from}->{to} not supported")]
    UnsupportedPair { from: Asset, to: Asset },
    #[error("insufficient liquidity")]
    InsufficientLiquidity,
    #[error("provider error: {0}")]
    Provider(String),
    #[error("quote timed out")]
    Timeout,
}
