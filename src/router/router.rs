// Router facade and HTTP API
// This file ties route selection and swap execution together behind the
// get_expected_return and swap entry points, and exposes them over HTTP
//
// Numan Thabit 2025 Nov

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::execution::{ExecutionCounters, ExecutionPlan, ExecutionStats, HopPlan, SwapExecutor};
use super::routes::{HopResult, RoutingResult};
use super::selector::RouteSelector;
use super::validation::{decode_distribution, validate_bridge, validate_request};
use crate::errors::RouteError;
use crate::flags::{parse_mask, Behaviors, RouteFlags};
use crate::metrics::gather_text;
use crate::quant::{format_units, serde_amount, WideVisitor};
use crate::venues::{Asset, AssetPair, SourceDescriptor};

/// A swap order as handed to [`Router::swap`].
#[derive(Debug, Clone)]
pub struct SwapOrder {
    pub pair: AssetPair,
    pub amount_in: u128,
    pub min_return: u128,
    /// Wire distribution, one entry per enabled source.
    pub distribution: Vec<u64>,
    pub flags: u128,
    /// Intermediate assets for a bridged route; empty for a direct one.
    pub bridge: Vec<Asset>,
}

impl SwapOrder {
    pub fn new(
        from: impl Into<Asset>,
        to: impl Into<Asset>,
        amount_in: u128,
        min_return: u128,
        distribution: Vec<u64>,
        flags: u128,
    ) -> Self {
        Self {
            pair: AssetPair::new(from, to),
            amount_in,
            min_return,
            distribution,
            flags,
            bridge: Vec::new(),
        }
    }

    pub fn via(mut self, bridge: Vec<Asset>) -> Self {
        self.bridge = bridge;
        self
    }
}

/// High-level Router that ties selection and execution together
pub struct Router {
    selector: Arc<RouteSelector>,
    executor: Arc<dyn SwapExecutor>,
    counters: ExecutionCounters,
    decimals: HashMap<Asset, u8>,
}

impl Router {
    pub fn new(selector: Arc<RouteSelector>, executor: Arc<dyn SwapExecutor>) -> Self {
        Self {
            selector,
            executor,
            counters: ExecutionCounters::default(),
            decimals: HashMap::new(),
        }
    }

    pub fn with_decimals(mut self, decimals: HashMap<Asset, u8>) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn selector(&self) -> &Arc<RouteSelector> {
        &self.selector
    }

    pub fn stats(&self) -> ExecutionStats {
        self.counters.snapshot()
    }

    /// Human-readable amount when the asset's decimals are configured.
    pub fn format_amount(&self, asset: &Asset, amount: u128) -> Option<String> {
        self.decimals
            .get(asset)
            .map(|decimals| format_units(amount, *decimals))
    }

    /// Expected return and distribution for swapping `amount_in` of `from`
    /// into `to` split into `parts` steps, under the disable-flags `mask`.
    pub async fn get_expected_return(
        &self,
        from: impl Into<Asset>,
        to: impl Into<Asset>,
        amount_in: u128,
        parts: u32,
        mask: u128,
    ) -> Result<RoutingResult, RouteError> {
        let pair = AssetPair::new(from, to);
        let flags = RouteFlags::from_bits(mask);
        validate_request(self.selector.settings(), &pair, parts, &flags).into_result()?;
        let ctx = self.selector.context(flags, parts);
        Ok(self.selector.resolve(&ctx, &pair, amount_in).await)
    }

    /// Execute `order.distribution` and return the realized output. Fails
    /// with [`RouteError::InsufficientReturn`] below `order.min_return`.
    #[tracing::instrument(skip_all, fields(pair = %order.pair, amount_in = %order.amount_in))]
    pub async fn swap(&self, order: &SwapOrder) -> Result<u128, RouteError> {
        let plan = self.plan(order)?;
        let outcome = if plan.parts == 0 {
            Ok(0)
        } else {
            self.executor.execute(&plan).await
        };
        let outcome = outcome.and_then(|actual| {
            if actual < order.min_return {
                Err(RouteError::InsufficientReturn {
                    min_return: order.min_return,
                    actual,
                })
            } else {
                Ok(actual)
            }
        });
        self.counters.record(&outcome);
        match &outcome {
            Ok(actual) => info!(return_amount = %actual, "swap executed"),
            Err(err) => warn!(error = %err, "swap failed"),
        }
        outcome
    }

    /// Validate an order and expand it into per-hop legs.
    pub fn plan(&self, order: &SwapOrder) -> Result<ExecutionPlan, RouteError> {
        let settings = self.selector.settings();
        let flags = RouteFlags::from_bits(order.flags);
        validate_bridge(settings, &order.pair, &order.bridge).into_result()?;

        let ctx = self.selector.context(flags, 0);
        let hops = order.bridge.len() + 1;
        let decoded = decode_distribution(settings, &order.distribution, ctx.sources.len(), hops)?;
        validate_request(settings, &order.pair, decoded.parts.max(1), &ctx.flags).into_result()?;

        let mut path = Vec::with_capacity(hops + 1);
        path.push(order.pair.from.clone());
        path.extend(order.bridge.iter().cloned());
        path.push(order.pair.to.clone());

        let hops = path
            .windows(2)
            .zip(decoded.hops)
            .map(|(leg, distribution)| HopPlan {
                pair: AssetPair::new(leg[0].clone(), leg[1].clone()),
                distribution,
            })
            .collect();

        Ok(ExecutionPlan {
            amount_in: order.amount_in,
            min_return: order.min_return,
            parts: decoded.parts,
            sources: ctx.source_ids(),
            hops,
            behaviors: ctx.flags.behaviors,
        })
    }
}

fn deserialize_mask<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
    d.deserialize_any(WideVisitor {
        parse: parse_mask,
        expecting: "flags mask",
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub from_asset: Asset,
    pub to_asset: Asset,
    #[serde(with = "serde_amount")]
    pub amount_in: u128,
    pub parts: u32,
    #[serde(default, deserialize_with = "deserialize_mask")]
    pub flags: u128,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    #[serde(with = "serde_amount")]
    pub return_amount: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_return: Option<String>,
    pub distribution: Vec<u64>,
    pub sources: Vec<String>,
    pub bridge: Vec<Asset>,
    pub hops: Vec<HopResult>,
    pub no_route: bool,
    pub behaviors: Behaviors,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub from_asset: Asset,
    pub to_asset: Asset,
    #[serde(with = "serde_amount")]
    pub amount_in: u128,
    #[serde(with = "serde_amount")]
    pub min_return: u128,
    pub distribution: Vec<u64>,
    #[serde(default, deserialize_with = "deserialize_mask")]
    pub flags: u128,
    #[serde(default)]
    pub bridge: Vec<Asset>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    #[serde(with = "serde_amount")]
    pub return_amount: u128,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub execution: ExecutionStats,
    pub sources: usize,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: RouteError) -> ApiError {
    let status = match &err {
        e if e.is_configuration() => StatusCode::BAD_REQUEST,
        RouteError::InsufficientReturn { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Create the HTTP router with API endpoints
pub fn create_api_router(router: Arc<Router>) -> AxumRouter {
    AxumRouter::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/api/v1/quote", post(quote_route))
        .route("/api/v1/swap", post(execute_swap))
        .route("/api/v1/sources", get(list_sources))
        .route("/api/v1/stats", get(get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(router)
}

/// Health check endpoint
async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn metrics() -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_text(),
    )
        .into_response()
}

/// Quote endpoint - expected return and distribution, nothing executed
async fn quote_route(
    State(router): State<Arc<Router>>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let result = router
        .get_expected_return(req.from_asset, req.to_asset, req.amount_in, req.parts, req.flags)
        .await
        .map_err(api_error)?;
    let distribution = result.wire_distribution().map_err(|e| {
        api_error(RouteError::InvalidDistribution(e.to_string()))
    })?;

    let registry = router.selector().registry();
    let sources = result
        .sources
        .iter()
        .filter_map(|id| registry.get(*id))
        .map(|s| s.descriptor().name.clone())
        .collect();
    let to_asset = result
        .hops
        .last()
        .map(|h| h.to_asset.clone())
        .unwrap_or_else(|| Asset::new(""));

    Ok(Json(QuoteResponse {
        return_amount: result.return_amount,
        formatted_return: router.format_amount(&to_asset, result.return_amount),
        distribution,
        sources,
        bridge: result.bridge(),
        no_route: result.is_no_route(),
        behaviors: result.behaviors,
        hops: result.hops,
    }))
}

/// Swap endpoint - executes a previously quoted distribution
async fn execute_swap(
    State(router): State<Arc<Router>>,
    Json(req): Json<SwapRequest>,
) -> Result<Json<SwapResponse>, ApiError> {
    let order = SwapOrder::new(
        req.from_asset,
        req.to_asset,
        req.amount_in,
        req.min_return,
        req.distribution,
        req.flags,
    )
    .via(req.bridge);
    let return_amount = router.swap(&order).await.map_err(api_error)?;
    Ok(Json(SwapResponse { return_amount }))
}

/// Registered sources in id order
async fn list_sources(State(router): State<Arc<Router>>) -> Json<Vec<SourceDescriptor>> {
    Json(
        router
            .selector()
            .registry()
            .descriptors()
            .cloned()
            .collect(),
    )
}

/// Get execution statistics
async fn get_stats(State(router): State<Arc<Router>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        execution: router.stats(),
        sources: router.selector().registry().len(),
    })
}
