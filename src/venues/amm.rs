// AMM venue adapter module
// This file implements constant-product (x*y=k) pools as a liquidity source.
// One source may hold several pools, one per asset pair.
//
// Numan Thabit 2025 Nov

use async_trait::async_trait;
use std::collections::HashMap;

use super::adapter::{Asset, AssetPair, LiquiditySource, SourceDescriptor};
use crate::errors::SourceError;
use crate::quant::mul_div;

const FEE_DENOMINATOR: u128 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reserves {
    pub reserve_in: u128,
    pub reserve_out: u128,
}

/// Constant-product AMM source (Uniswap-style).
#[derive(Debug, Clone)]
pub struct ConstantProductPool {
    desc: SourceDescriptor,
    /// Fee in basis points charged on the input amount.
    fee_bps: u32,
    /// Keyed by the pair in canonical (sorted) order; reserves stored in that order.
    pools: HashMap<(Asset, Asset), (u128, u128)>,
}

impl ConstantProductPool {
    pub fn new(desc: SourceDescriptor, fee_bps: u32) -> Self {
        Self {
            desc,
            fee_bps: fee_bps.min(FEE_DENOMINATOR as u32),
            pools: HashMap::new(),
        }
    }

    /// Add (or replace) the pool for `a`/`b`.
    pub fn with_pool(
        mut self,
        a: impl Into<Asset>,
        reserve_a: u128,
        b: impl Into<Asset>,
        reserve_b: u128,
    ) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            self.pools.insert((a, b), (reserve_a, reserve_b));
        } else {
            self.pools.insert((b, a), (reserve_b, reserve_a));
        }
        self
    }

    pub fn reserves(&self, pair: &AssetPair) -> Option<Reserves> {
        if pair.from <= pair.to {
            self.pools
                .get(&(pair.from.clone(), pair.to.clone()))
                .map(|(r_from, r_to)| Reserves {
                    reserve_in: *r_from,
                    reserve_out: *r_to,
                })
        } else {
            self.pools
                .get(&(pair.to.clone(), pair.from.clone()))
                .map(|(r_to, r_from)| Reserves {
                    reserve_in: *r_from,
                    reserve_out: *r_to,
                })
        }
    }

    /// out = in*(1-fee)*R_out / (R_in + in*(1-fee))
    pub fn amount_out(&self, reserves: Reserves, amount_in: u128) -> Option<u128> {
        if amount_in == 0 || reserves.reserve_in == 0 || reserves.reserve_out == 0 {
            return Some(0);
        }
        let fee_factor = FEE_DENOMINATOR - self.fee_bps as u128;
        let in_with_fee = amount_in.checked_mul(fee_factor)?;
        let denom = reserves
            .reserve_in
            .checked_mul(FEE_DENOMINATOR)?
            .checked_add(in_with_fee)?;
        mul_div(in_with_fee, reserves.reserve_out, denom)
    }
}

#[async_trait]
impl LiquiditySource for ConstantProductPool {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.desc
    }

    async fn quote(&self, pair: &AssetPair, amount_in: u128) -> Result<u128, SourceError> {
        let reserves = self
            .reserves(pair)
            .ok_or_else(|| SourceError::UnsupportedPair {
                from: pair.from.clone(),
                to: pair.to.clone(),
            })?;
        self.amount_out(reserves, amount_in)
            .ok_or(SourceError::InsufficientLiquidity)
    }
}
