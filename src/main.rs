use anyhow::{anyhow, Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use split_aggr::config::AppConfig;
use split_aggr::control::AdmissionControl;
use split_aggr::router::{create_api_router, QuoteTableBuilder, RouteSelector, Router, SimulatedExecutor};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "fatal aggregator error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("load configuration")?;
    let registry = Arc::new(config.build_registry().context("build source registry")?);
    if registry.is_empty() {
        warn!("no liquidity sources configured; every quote will be a no-route result");
    }
    for desc in registry.descriptors() {
        info!(id = desc.id.0, name = %desc.name, wrap = desc.wrap, "source registered");
    }

    let admission = AdmissionControl::new(config.quote_concurrency, config.quote_rate_per_sec);
    let selector = Arc::new(RouteSelector::new(
        registry.clone(),
        QuoteTableBuilder::new(admission.clone()),
        config.router_settings(),
    ));
    let executor = Arc::new(SimulatedExecutor::new(registry.clone()));
    let router = Arc::new(Router::new(selector, executor).with_decimals(config.decimals()));

    let api_addr: SocketAddr = config
        .api_addr
        .parse()
        .with_context(|| format!("parse api_addr {}", config.api_addr))?;
    let listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("bind API server address {api_addr}"))?;
    info!(
        address = %api_addr,
        sources = registry.len(),
        max_parts = config.max_parts,
        max_hops = config.max_hops,
        bridges = config.bridge_assets.len(),
        "split aggregator online"
    );

    let api_router = create_api_router(router.clone());
    let _api_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, api_router).await {
            warn!(error = %e, "API server error");
        }
    });

    let mut ticker = tokio::time::interval(Duration::from_secs(30));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let stats = router.stats();
                info!(
                    quote_permits = admission.available(),
                    total_swaps = stats.total_executions,
                    successful = stats.successful_executions,
                    failed = stats.failed_executions,
                    slippage_failures = stats.slippage_failures,
                    "aggregator heartbeat"
                );
            }
            res = tokio::signal::ctrl_c() => {
                if let Err(err) = res {
                    warn!(error = %err, "ctrl_c listener error");
                }
                info!("Shutdown signal received, exiting");
                break;
            }
        }
    }
    Ok(())
}

fn init_tracing() -> Result<()> {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
