// Venue adapter module
// This file defines the uniform quoting capability every liquidity source
// implements, together with the asset and source identity types
//
// Numan Thabit 2025 Nov

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::SourceError;
use crate::flags::Toggle;

/// Opaque fungible asset identifier, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Asset(String);

impl Asset {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Asset {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&str> for Asset {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<Asset> for String {
    fn from(asset: Asset) -> Self {
        asset.0
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetPair {
    pub from: Asset,
    pub to: Asset,
}

impl AssetPair {
    pub fn new(from: impl Into<Asset>, to: impl Into<Asset>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl fmt::Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// Stable source index; also the source's position in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub u16);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Static description of a registered source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDescriptor {
    pub id: SourceId,
    pub name: String,
    /// Mask toggles that disable this source (own bit, variant bit, family bit).
    pub toggles: Vec<Toggle>,
    /// Source internally routes through an intermediate asset.
    pub wrap: bool,
}

/// Uniform quoting capability of a liquidity source.
///
/// Implementations must be monotonically non-decreasing in `amount_in`; the
/// split optimizer is only optimal when marginal output is also non-increasing.
#[async_trait]
pub trait LiquiditySource: Send + Sync {
    fn descriptor(&self) -> &SourceDescriptor;

    /// Output amount for swapping `amount_in` of `pair.from` into `pair.to`.
    async fn quote(&self, pair: &AssetPair, amount_in: u128) -> Result<u128, SourceError>;
}
