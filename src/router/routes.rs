// Route result types
// This file defines the distribution, per-hop results and the composed
// routing result returned by get_expected_return, with wire encoding
//
// Numan Thabit 2025 Nov

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::flags::Behaviors;
use crate::quant::{pack_lanes, serde_amount, unpack_lane};
use crate::venues::{Asset, AssetPair, SourceId};

/// Step counts per enabled source, in stable source-id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distribution(pub Vec<u32>);

impl Distribution {
    pub fn zeros(sources: usize) -> Self {
        Self(vec![0; sources])
    }

    /// Total steps allocated, saturating at `u32::MAX`.
    pub fn total(&self) -> u32 {
        self.0.iter().fold(0u32, |acc, d| acc.saturating_add(*d))
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|d| *d == 0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

/// Outcome of routing one leg of a trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HopResult {
    pub from_asset: Asset,
    pub to_asset: Asset,
    #[serde(with = "serde_amount")]
    pub amount_in: u128,
    #[serde(with = "serde_amount")]
    pub return_amount: u128,
    pub distribution: Distribution,
}

impl HopResult {
    pub fn pair(&self) -> AssetPair {
        AssetPair::new(self.from_asset.clone(), self.to_asset.clone())
    }
}

/// Route kind label used in logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Direct,
    Bridged,
    None,
}

impl RouteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RouteKind::Direct => "direct",
            RouteKind::Bridged => "bridged",
            RouteKind::None => "none",
        }
    }
}

/// Total expected return plus the allocation that produces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingResult {
    #[serde(with = "serde_amount")]
    pub return_amount: u128,
    pub parts: u32,
    /// Sources enabled for this request; each distribution entry maps to one.
    pub sources: Vec<SourceId>,
    pub hops: Vec<HopResult>,
    pub behaviors: Behaviors,
}

impl RoutingResult {
    /// The "no route" result: zero return, one zero entry per enabled source.
    pub fn no_route(pair: &AssetPair, amount_in: u128, parts: u32, sources: Vec<SourceId>) -> Self {
        let distribution = Distribution::zeros(sources.len());
        Self {
            return_amount: 0,
            parts,
            hops: vec![HopResult {
                from_asset: pair.from.clone(),
                to_asset: pair.to.clone(),
                amount_in,
                return_amount: 0,
                distribution,
            }],
            sources,
            behaviors: Behaviors::default(),
        }
    }

    pub fn is_no_route(&self) -> bool {
        self.return_amount == 0 && self.hops.iter().all(|h| h.distribution.is_zero())
    }

    pub fn kind(&self) -> RouteKind {
        if self.is_no_route() {
            RouteKind::None
        } else if self.hops.len() > 1 {
            RouteKind::Bridged
        } else {
            RouteKind::Direct
        }
    }

    /// Intermediate assets crossed by the route, in order.
    pub fn bridge(&self) -> Vec<Asset> {
        self.hops
            .iter()
            .skip(1)
            .map(|h| h.from_asset.clone())
            .collect()
    }

    /// Distribution of the first leg, the one that spends `amount_in`.
    pub fn distribution(&self) -> &Distribution {
        static EMPTY: Distribution = Distribution(Vec::new());
        self.hops.first().map(|h| &h.distribution).unwrap_or(&EMPTY)
    }

    /// One entry per enabled source. For a bridged route hop `h` occupies
    /// bits `[8h, 8h+8)` of every entry.
    pub fn wire_distribution(&self) -> Result<Vec<u64>> {
        if self.hops.len() <= 1 {
            return Ok(self
                .distribution()
                .as_slice()
                .iter()
                .map(|d| *d as u64)
                .collect());
        }
        (0..self.sources.len())
            .map(|s| {
                let lanes: Vec<u32> = self
                    .hops
                    .iter()
                    .map(|h| h.distribution.0.get(s).copied().unwrap_or(0))
                    .collect();
                pack_lanes(&lanes)
            })
            .collect()
    }
}

/// Split a wire distribution back into per-hop distributions.
pub fn unpack_wire_distribution(wire: &[u64], hops: usize) -> Vec<Distribution> {
    (0..hops)
        .map(|h| Distribution(wire.iter().map(|w| unpack_lane(*w, h)).collect()))
        .collect()
}
