//! Mock liquidity sources and router wiring shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use split_aggr::config::RouterSettings;
use split_aggr::control::AdmissionControl;
use split_aggr::errors::SourceError;
use split_aggr::flags::Toggle;
use split_aggr::router::{QuoteTableBuilder, RouteSelector, Router, SimulatedExecutor};
use split_aggr::venues::{
    AssetPair, ConstantProductPool, LiquiditySource, RateWrapper, SourceDescriptor, SourceId,
    SourceRegistry,
};

pub fn descriptor(id: u16, name: &str, toggles: &[Toggle], wrap: bool) -> SourceDescriptor {
    SourceDescriptor {
        id: SourceId(id),
        name: name.to_string(),
        toggles: toggles.to_vec(),
        wrap,
    }
}

/// Source whose output is an arbitrary function of the input, for one pair.
pub struct CurveSource {
    desc: SourceDescriptor,
    pair: AssetPair,
    curve: Box<dyn Fn(u128) -> u128 + Send + Sync>,
    calls: Arc<AtomicUsize>,
}

impl CurveSource {
    pub fn new(
        desc: SourceDescriptor,
        pair: AssetPair,
        curve: impl Fn(u128) -> u128 + Send + Sync + 'static,
    ) -> Self {
        Self {
            desc,
            pair,
            curve: Box::new(curve),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Piecewise curve returning `cumulative[k-1]` for input `k * unit`.
    pub fn stepped(desc: SourceDescriptor, pair: AssetPair, unit: u128, gains: &[u128]) -> Self {
        let cumulative: Vec<u128> = gains
            .iter()
            .scan(0u128, |acc, g| {
                *acc += g;
                Some(*acc)
            })
            .collect();
        Self::new(desc, pair, move |amount| {
            let k = (amount / unit) as usize;
            match k {
                0 => 0,
                k => cumulative[(k - 1).min(cumulative.len() - 1)],
            }
        })
    }

    pub fn call_tracker(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl LiquiditySource for CurveSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.desc
    }

    async fn quote(&self, pair: &AssetPair, amount_in: u128) -> Result<u128, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *pair != self.pair {
            return Err(SourceError::UnsupportedPair {
                from: pair.from.clone(),
                to: pair.to.clone(),
            });
        }
        Ok((self.curve)(amount_in))
    }
}

/// Source that always fails.
pub struct FailingSource {
    desc: SourceDescriptor,
}

impl FailingSource {
    pub fn new(desc: SourceDescriptor) -> Self {
        Self { desc }
    }
}

#[async_trait]
impl LiquiditySource for FailingSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.desc
    }

    async fn quote(&self, _pair: &AssetPair, _amount_in: u128) -> Result<u128, SourceError> {
        Err(SourceError::Provider("quote reverted".to_string()))
    }
}

/// Source that answers generously but only after `delay`.
pub struct SlowSource {
    desc: SourceDescriptor,
    delay: Duration,
}

impl SlowSource {
    pub fn new(desc: SourceDescriptor, delay: Duration) -> Self {
        Self { desc, delay }
    }
}

#[async_trait]
impl LiquiditySource for SlowSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.desc
    }

    async fn quote(&self, _pair: &AssetPair, amount_in: u128) -> Result<u128, SourceError> {
        tokio::time::sleep(self.delay).await;
        Ok(amount_in * 10)
    }
}

pub fn registry(sources: Vec<Arc<dyn LiquiditySource>>) -> Arc<SourceRegistry> {
    let mut registry = SourceRegistry::new();
    for source in sources {
        registry.register(source).expect("register mock source");
    }
    Arc::new(registry)
}

pub fn router_with(registry: Arc<SourceRegistry>, settings: RouterSettings) -> Router {
    let selector = Arc::new(RouteSelector::new(
        registry.clone(),
        QuoteTableBuilder::new(AdmissionControl::new(16, None)),
        settings,
    ));
    Router::new(selector, Arc::new(SimulatedExecutor::new(registry)))
}

pub fn router(sources: Vec<Arc<dyn LiquiditySource>>) -> Router {
    router_with(registry(sources), RouterSettings::default())
}

/// Three constant-product venues quoting eth -> dai at slightly different depths.
pub fn eth_dai_pools() -> Vec<Arc<dyn LiquiditySource>> {
    vec![
        Arc::new(
            ConstantProductPool::new(
                descriptor(0, "uniswap", &[Toggle::Uniswap, Toggle::UniswapAll], false),
                30,
            )
            .with_pool("eth", 1_000_000_000_000, "dai", 400_000_000_000_000),
        ),
        Arc::new(
            ConstantProductPool::new(
                descriptor(1, "uniswap-v2", &[Toggle::UniswapV2, Toggle::UniswapV2All], false),
                30,
            )
            .with_pool("eth", 2_000_000_000_000, "dai", 790_000_000_000_000),
        ),
        Arc::new(
            ConstantProductPool::new(
                descriptor(2, "balancer-1", &[Toggle::Balancer1, Toggle::BalancerAll], false),
                10,
            )
            .with_pool("eth", 500_000_000_000, "dai", 201_000_000_000_000),
        ),
    ]
}

/// Bridged topology: no eth -> dai venue, but eth -> weth and weth -> dai.
pub fn bridged_sources() -> Vec<Arc<dyn LiquiditySource>> {
    vec![
        Arc::new(
            RateWrapper::one_to_one(descriptor(0, "weth", &[Toggle::Weth], true), "eth", "weth"),
        ),
        Arc::new(
            ConstantProductPool::new(
                descriptor(1, "uniswap-v2-eth", &[Toggle::UniswapV2Eth, Toggle::UniswapV2All], false),
                30,
            )
            .with_pool("weth", 1_000_000_000_000, "dai", 400_000_000_000_000),
        ),
        Arc::new(
            ConstantProductPool::new(
                descriptor(2, "balancer-2", &[Toggle::Balancer2, Toggle::BalancerAll], false),
                20,
            )
            .with_pool("weth", 300_000_000_000, "dai", 121_000_000_000_000),
        ),
    ]
}
