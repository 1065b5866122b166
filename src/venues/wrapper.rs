// Wrapper venue module
// Fixed-rate conversions such as native <-> wrapped-native, lending-protocol
// wrappers and bridge pools. Each wrapper has a capacity on the output side.
//
// Numan Thabit 2025 Nov

use async_trait::async_trait;

use super::adapter::{Asset, AssetPair, LiquiditySource, SourceDescriptor};
use crate::errors::SourceError;
use crate::quant::mul_div;

#[derive(Debug, Clone)]
pub struct RateWrapper {
    desc: SourceDescriptor,
    underlying: Asset,
    wrapped: Asset,
    /// Wrapped units per `rate_den` underlying units.
    rate_num: u128,
    rate_den: u128,
    /// Maximum output of a single conversion, in either direction's output asset.
    capacity: Option<u128>,
}

impl RateWrapper {
    pub fn new(
        desc: SourceDescriptor,
        underlying: impl Into<Asset>,
        wrapped: impl Into<Asset>,
        rate_num: u128,
        rate_den: u128,
    ) -> Self {
        Self {
            desc,
            underlying: underlying.into(),
            wrapped: wrapped.into(),
            rate_num,
            rate_den,
            capacity: None,
        }
    }

    /// One-to-one wrapper, e.g. ETH <-> WETH.
    pub fn one_to_one(
        desc: SourceDescriptor,
        underlying: impl Into<Asset>,
        wrapped: impl Into<Asset>,
    ) -> Self {
        Self::new(desc, underlying, wrapped, 1, 1)
    }

    pub fn with_capacity(mut self, capacity: u128) -> Self {
        self.capacity = Some(capacity);
        self
    }

    fn convert(&self, pair: &AssetPair, amount_in: u128) -> Result<u128, SourceError> {
        let out = if pair.from == self.underlying && pair.to == self.wrapped {
            mul_div(amount_in, self.rate_num, self.rate_den)
        } else if pair.from == self.wrapped && pair.to == self.underlying {
            mul_div(amount_in, self.rate_den, self.rate_num)
        } else {
            return Err(SourceError::UnsupportedPair {
                from: pair.from.clone(),
                to: pair.to.clone(),
            });
        };
        let out = out.ok_or(SourceError::InsufficientLiquidity)?;
        match self.capacity {
            Some(cap) if out > cap => Err(SourceError::InsufficientLiquidity),
            _ => Ok(out),
        }
    }
}

#[async_trait]
impl LiquiditySource for RateWrapper {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.desc
    }

    async fn quote(&self, pair: &AssetPair, amount_in: u128) -> Result<u128, SourceError> {
        self.convert(pair, amount_in)
    }
}
