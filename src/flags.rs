// Capability mask module
// This file translates the bit-packed disable-flags mask used at the call
// boundary into structured routing flags, and back
//
// Numan Thabit 2025 Nov

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::venues::SourceDescriptor;

/// Raw bit values of the wire mask.
pub mod bits {
    pub const DISABLE_ALL_SPLIT_SOURCES: u128 = 0x2000_0000;
    pub const DISABLE_ALL_WRAP_SOURCES: u128 = 0x4000_0000;
    pub const ENABLE_CHI_BURN: u128 = 0x100_0000_0000;
    pub const DISABLE_SPLIT_RECALCULATION: u128 = 0x8000_0000_0000;
    pub const ENABLE_REFERRAL_GAS_SPONSORSHIP: u128 = 0x80_0000_0000_0000;
    pub const ENABLE_CHI_BURN_BY_ORIGIN: u128 = 0x4000_0000_0000_0000;

    /// Disables every split-eligible and wrap source.
    pub const DISABLE_ALL: u128 = DISABLE_ALL_SPLIT_SOURCES | DISABLE_ALL_WRAP_SOURCES;
    /// Enables everything.
    pub const ANY: u128 = 0;
}

/// A mask bit that disables one source, one source variant or a source family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Toggle {
    Uniswap,
    Bancor,
    Oasis,
    Compound,
    Fulcrum,
    Chai,
    Aave,
    SmartToken,
    Bdai,
    Iearn,
    CurveCompound,
    CurveUsdt,
    CurveY,
    CurveBinance,
    CurveSynthetix,
    Weth,
    UniswapCompound,
    UniswapChai,
    UniswapAave,
    Idle,
    UniswapV2,
    UniswapV2Eth,
    UniswapV2Dai,
    UniswapV2Usdc,
    CurvePax,
    CurveRenbtc,
    CurveTbtc,
    Shell,
    MstableMusd,
    CurveSbtc,
    Dmm,
    UniswapAll,
    CurveAll,
    UniswapV2All,
    BalancerAll,
    Balancer1,
    Balancer2,
    Balancer3,
    KyberAll,
    MooniswapAll,
}

impl Toggle {
    pub const ALL: [Toggle; 40] = [
        Toggle::Uniswap,
        Toggle::Bancor,
        Toggle::Oasis,
        Toggle::Compound,
        Toggle::Fulcrum,
        Toggle::Chai,
        Toggle::Aave,
        Toggle::SmartToken,
        Toggle::Bdai,
        Toggle::Iearn,
        Toggle::CurveCompound,
        Toggle::CurveUsdt,
        Toggle::CurveY,
        Toggle::CurveBinance,
        Toggle::CurveSynthetix,
        Toggle::Weth,
        Toggle::UniswapCompound,
        Toggle::UniswapChai,
        Toggle::UniswapAave,
        Toggle::Idle,
        Toggle::UniswapV2,
        Toggle::UniswapV2Eth,
        Toggle::UniswapV2Dai,
        Toggle::UniswapV2Usdc,
        Toggle::CurvePax,
        Toggle::CurveRenbtc,
        Toggle::CurveTbtc,
        Toggle::Shell,
        Toggle::MstableMusd,
        Toggle::CurveSbtc,
        Toggle::Dmm,
        Toggle::UniswapAll,
        Toggle::CurveAll,
        Toggle::UniswapV2All,
        Toggle::BalancerAll,
        Toggle::Balancer1,
        Toggle::Balancer2,
        Toggle::Balancer3,
        Toggle::KyberAll,
        Toggle::MooniswapAll,
    ];

    pub const fn bit(self) -> u128 {
        match self {
            Toggle::Uniswap => 0x01,
            Toggle::Bancor => 0x04,
            Toggle::Oasis => 0x08,
            Toggle::Compound => 0x10,
            Toggle::Fulcrum => 0x20,
            Toggle::Chai => 0x40,
            Toggle::Aave => 0x80,
            Toggle::SmartToken => 0x100,
            Toggle::Bdai => 0x400,
            Toggle::Iearn => 0x800,
            Toggle::CurveCompound => 0x1000,
            Toggle::CurveUsdt => 0x2000,
            Toggle::CurveY => 0x4000,
            Toggle::CurveBinance => 0x8000,
            Toggle::CurveSynthetix => 0x4_0000,
            Toggle::Weth => 0x8_0000,
            Toggle::UniswapCompound => 0x10_0000,
            Toggle::UniswapChai => 0x20_0000,
            Toggle::UniswapAave => 0x40_0000,
            Toggle::Idle => 0x80_0000,
            Toggle::UniswapV2 => 0x200_0000,
            Toggle::UniswapV2Eth => 0x400_0000,
            Toggle::UniswapV2Dai => 0x800_0000,
            Toggle::UniswapV2Usdc => 0x1000_0000,
            Toggle::CurvePax => 0x8000_0000,
            Toggle::CurveRenbtc => 0x1_0000_0000,
            Toggle::CurveTbtc => 0x2_0000_0000,
            Toggle::Shell => 0x80_0000_0000,
            Toggle::MstableMusd => 0x200_0000_0000,
            Toggle::CurveSbtc => 0x400_0000_0000,
            Toggle::Dmm => 0x800_0000_0000,
            Toggle::UniswapAll => 0x1000_0000_0000,
            Toggle::CurveAll => 0x2000_0000_0000,
            Toggle::UniswapV2All => 0x4000_0000_0000,
            Toggle::BalancerAll => 0x1_0000_0000_0000,
            Toggle::Balancer1 => 0x2_0000_0000_0000,
            Toggle::Balancer2 => 0x4_0000_0000_0000,
            Toggle::Balancer3 => 0x8_0000_0000_0000,
            Toggle::KyberAll => 0x200_0000_0000_0000,
            Toggle::MooniswapAll => 0x8000_0000_0000_0000,
        }
    }
}

/// Union of every bit this engine assigns a meaning to.
pub fn known_bits() -> u128 {
    Toggle::ALL.iter().fold(
        bits::DISABLE_ALL
            | bits::ENABLE_CHI_BURN
            | bits::DISABLE_SPLIT_RECALCULATION
            | bits::ENABLE_REFERRAL_GAS_SPONSORSHIP
            | bits::ENABLE_CHI_BURN_BY_ORIGIN,
        |acc, t| acc | t.bit(),
    )
}

/// Orthogonal behaviours carried by the mask. They never exclude a source and
/// are handed through to the execution collaborator untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Behaviors {
    pub chi_burn: bool,
    pub chi_burn_by_origin: bool,
    pub referral_gas_sponsorship: bool,
    pub split_recalculation_disabled: bool,
}

/// Structured view of a disable-flags mask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteFlags {
    pub disabled: BTreeSet<Toggle>,
    pub disable_all_split_sources: bool,
    pub disable_all_wrap_sources: bool,
    pub behaviors: Behaviors,
    /// Bits with no assigned meaning; ignored for routing.
    pub unknown_bits: u128,
}

impl RouteFlags {
    pub fn from_bits(mask: u128) -> Self {
        let disabled = Toggle::ALL
            .iter()
            .copied()
            .filter(|t| mask & t.bit() != 0)
            .collect();
        Self {
            disabled,
            disable_all_split_sources: mask & bits::DISABLE_ALL_SPLIT_SOURCES != 0,
            disable_all_wrap_sources: mask & bits::DISABLE_ALL_WRAP_SOURCES != 0,
            behaviors: Behaviors {
                chi_burn: mask & bits::ENABLE_CHI_BURN != 0,
                chi_burn_by_origin: mask & bits::ENABLE_CHI_BURN_BY_ORIGIN != 0,
                referral_gas_sponsorship: mask & bits::ENABLE_REFERRAL_GAS_SPONSORSHIP != 0,
                split_recalculation_disabled: mask & bits::DISABLE_SPLIT_RECALCULATION != 0,
            },
            unknown_bits: mask & !known_bits(),
        }
    }

    pub fn to_bits(&self) -> u128 {
        let mut mask = self.disabled.iter().fold(0u128, |acc, t| acc | t.bit());
        if self.disable_all_split_sources {
            mask |= bits::DISABLE_ALL_SPLIT_SOURCES;
        }
        if self.disable_all_wrap_sources {
            mask |= bits::DISABLE_ALL_WRAP_SOURCES;
        }
        if self.behaviors.chi_burn {
            mask |= bits::ENABLE_CHI_BURN;
        }
        if self.behaviors.chi_burn_by_origin {
            mask |= bits::ENABLE_CHI_BURN_BY_ORIGIN;
        }
        if self.behaviors.referral_gas_sponsorship {
            mask |= bits::ENABLE_REFERRAL_GAS_SPONSORSHIP;
        }
        if self.behaviors.split_recalculation_disabled {
            mask |= bits::DISABLE_SPLIT_RECALCULATION;
        }
        mask | self.unknown_bits
    }

    /// Whether `source` participates under these flags.
    pub fn is_enabled(&self, source: &SourceDescriptor) -> bool {
        if self.disable_all_split_sources {
            return false;
        }
        if source.wrap && self.disable_all_wrap_sources {
            return false;
        }
        !source.toggles.iter().any(|t| self.disabled.contains(t))
    }

    /// Bridged (multi-hop) routing goes through the wrap layer, so the wrap
    /// kill switch turns it off as well.
    pub fn allows_bridging(&self) -> bool {
        !self.disable_all_wrap_sources
    }

    pub fn disable(mut self, toggle: Toggle) -> Self {
        self.disabled.insert(toggle);
        self
    }
}

/// Parse a mask written in decimal or as `0x`-prefixed hex.
pub fn parse_mask(text: &str) -> Result<u128, std::num::ParseIntError> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u128::from_str_radix(&hex.replace('_', ""), 16),
        None => text.replace('_', "").parse(),
    }
}

impl From<u128> for RouteFlags {
    fn from(mask: u128) -> Self {
        Self::from_bits(mask)
    }
}
