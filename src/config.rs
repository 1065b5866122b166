// Configuration management module
// This file handles loading and parsing of configuration settings
// from environment variables and an optional config file, and builds
// the source registry from the configured venues
//
// Numan Thabit 2025 Nov

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::flags::Toggle;
use crate::quant::{parse_amount, MAX_LANES};
use crate::venues::{
    Asset, ConstantProductPool, HttpQuoteSource, LiquiditySource, RateWrapper, SourceDescriptor,
    SourceRegistry,
};

/// Environment variable naming an optional config file (toml/json/yaml).
pub const CONFIG_FILE_ENV: &str = "SPLIT_AGGR_CONFIG";

/// Prefix for environment overrides, e.g. `SPLIT_AGGR__MAX_PARTS=50`.
pub const ENV_PREFIX: &str = "SPLIT_AGGR";

/// Hard bound on hops per route.
pub const MAX_HOPS_LIMIT: u32 = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Upper bound on the `parts` argument
    #[serde(default = "default_max_parts")]
    pub max_parts: u32,
    /// Maximum number of legs in a bridged route (1 disables bridging)
    #[serde(default = "default_max_hops")]
    pub max_hops: u32,
    /// Quote calls in flight across all requests
    #[serde(default = "default_quote_concurrency")]
    pub quote_concurrency: usize,
    /// Optional cap on quote calls started per second
    pub quote_rate_per_sec: Option<u32>,
    /// Deadline for building one quote table
    #[serde(default = "default_quote_timeout_ms")]
    pub quote_timeout_ms: u64,
    /// Reject masks carrying bits with no assigned meaning
    #[serde(default)]
    pub strict_flags: bool,
    /// Intermediate assets considered for bridged routes, in preference order
    #[serde(default)]
    pub bridge_assets: Vec<Asset>,
    /// HTTP API listen address
    #[serde(default = "default_api_addr")]
    pub api_addr: String,
    /// Display metadata
    #[serde(default)]
    pub assets: Vec<AssetMeta>,
    /// Venues registered at startup, in id order
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

fn default_max_parts() -> u32 {
    100
}

fn default_max_hops() -> u32 {
    2
}

fn default_quote_concurrency() -> usize {
    64
}

fn default_quote_timeout_ms() -> u64 {
    2_000
}

fn default_api_addr() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetMeta {
    pub symbol: Asset,
    pub decimals: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// Mask toggles that disable this source
    #[serde(default)]
    pub toggles: Vec<Toggle>,
    /// Source internally routes through an intermediate asset
    #[serde(default)]
    pub wrap: bool,
    pub venue: VenueConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VenueConfig {
    ConstantProduct {
        #[serde(default = "default_fee_bps")]
        fee_bps: u32,
        pools: Vec<PoolConfig>,
    },
    Wrapper {
        underlying: Asset,
        wrapped: Asset,
        #[serde(default = "default_rate")]
        rate_num: String,
        #[serde(default = "default_rate")]
        rate_den: String,
        capacity: Option<String>,
    },
    Http {
        url: String,
        #[serde(default = "default_rpc_method")]
        method: String,
    },
}

fn default_fee_bps() -> u32 {
    30
}

fn default_rate() -> String {
    "1".to_string()
}

fn default_rpc_method() -> String {
    "quote_getReturn".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    pub asset_a: Asset,
    pub reserve_a: String,
    pub asset_b: Asset,
    pub reserve_b: String,
}

/// Routing parameters the router needs at request time.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub max_parts: u32,
    pub max_hops: u32,
    pub strict_flags: bool,
    pub bridge_assets: Vec<Asset>,
    pub quote_timeout: Duration,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            max_parts: default_max_parts(),
            max_hops: default_max_hops(),
            strict_flags: false,
            bridge_assets: Vec::new(),
            quote_timeout: Duration::from_millis(default_quote_timeout_ms()),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            builder = builder.add_source(config::File::with_name(&path));
        }
        let cfg = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("bridge_assets"),
            )
            .build()
            .context("assemble configuration sources")?;
        let app: AppConfig = cfg
            .try_deserialize()
            .context("deserialize configuration")?;
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (1..=u8::MAX as u32).contains(&self.max_parts),
            "max_parts must be within 1..=255, got {}",
            self.max_parts
        );
        ensure!(
            (1..=MAX_HOPS_LIMIT).contains(&self.max_hops) && self.max_hops as usize <= MAX_LANES,
            "max_hops must be within 1..={MAX_HOPS_LIMIT}, got {}",
            self.max_hops
        );
        ensure!(self.quote_concurrency > 0, "quote_concurrency must be positive");
        ensure!(self.quote_timeout_ms > 0, "quote_timeout_ms must be positive");
        Ok(())
    }

    pub fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            max_parts: self.max_parts,
            max_hops: self.max_hops,
            strict_flags: self.strict_flags,
            bridge_assets: self.bridge_assets.clone(),
            quote_timeout: Duration::from_millis(self.quote_timeout_ms),
        }
    }

    pub fn decimals(&self) -> HashMap<Asset, u8> {
        self.assets
            .iter()
            .map(|a| (a.symbol.clone(), a.decimals))
            .collect()
    }

    /// Instantiate and register every configured venue in declaration order.
    pub fn build_registry(&self) -> Result<SourceRegistry> {
        let mut registry = SourceRegistry::new();
        for source in &self.sources {
            let desc = SourceDescriptor {
                id: registry.next_id(),
                name: source.name.clone(),
                toggles: source.toggles.clone(),
                wrap: source.wrap,
            };
            let venue = self
                .build_venue(desc, &source.venue)
                .with_context(|| format!("build source {}", source.name))?;
            registry.register(venue)?;
        }
        Ok(registry)
    }

    fn build_venue(
        &self,
        desc: SourceDescriptor,
        venue: &VenueConfig,
    ) -> Result<Arc<dyn LiquiditySource>> {
        Ok(match venue {
            VenueConfig::ConstantProduct { fee_bps, pools } => {
                ensure!(*fee_bps < 10_000, "fee_bps must be below 10000");
                let mut amm = ConstantProductPool::new(desc, *fee_bps);
                for pool in pools {
                    amm = amm.with_pool(
                        pool.asset_a.clone(),
                        parse_amount(&pool.reserve_a).context("reserve_a")?,
                        pool.asset_b.clone(),
                        parse_amount(&pool.reserve_b).context("reserve_b")?,
                    );
                }
                Arc::new(amm)
            }
            VenueConfig::Wrapper {
                underlying,
                wrapped,
                rate_num,
                rate_den,
                capacity,
            } => {
                let rate_num = parse_amount(rate_num).context("rate_num")?;
                let rate_den = parse_amount(rate_den).context("rate_den")?;
                ensure!(rate_num > 0 && rate_den > 0, "wrapper rate must be positive");
                let mut wrapper = RateWrapper::new(
                    desc,
                    underlying.clone(),
                    wrapped.clone(),
                    rate_num,
                    rate_den,
                );
                if let Some(cap) = capacity {
                    wrapper = wrapper.with_capacity(parse_amount(cap).context("capacity")?);
                }
                Arc::new(wrapper)
            }
            VenueConfig::Http { url, method } => Arc::new(HttpQuoteSource::new(
                desc,
                url.clone(),
                method.clone(),
                Duration::from_millis(self.quote_timeout_ms),
            )?),
        })
    }
}
