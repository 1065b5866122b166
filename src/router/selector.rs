// Route selector - multi-hop resolution over split routes
// Evaluates the direct route and every bridged path through the configured
// bridge assets, each leg as a quote table plus split optimization, and
// keeps the path with the highest final return
//
// Numan Thabit 2025 Nov

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use super::routes::{HopResult, RoutingResult};
use super::split::optimize;
use super::table::QuoteTableBuilder;
use crate::config::RouterSettings;
use crate::flags::RouteFlags;
use crate::metrics::ROUTES_RESOLVED;
use crate::venues::{Asset, AssetPair, LiquiditySource, SourceId, SourceRegistry};

/// Progress of a single routing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStage {
    Received,
    BuildingQuotes,
    Optimizing,
    Resolved,
}

/// Everything one request needs, resolved once at the boundary.
#[derive(Clone)]
pub struct RequestContext {
    pub flags: RouteFlags,
    pub parts: u32,
    /// Enabled sources in stable id order.
    pub sources: Vec<Arc<dyn LiquiditySource>>,
    /// Budget for building one quote table.
    pub quote_timeout: Duration,
}

impl RequestContext {
    pub fn source_ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|s| s.descriptor().id).collect()
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.quote_timeout
    }
}

/// Route selector that evaluates candidate paths and selects the best
pub struct RouteSelector {
    registry: Arc<SourceRegistry>,
    tables: QuoteTableBuilder,
    settings: RouterSettings,
}

impl RouteSelector {
    pub fn new(
        registry: Arc<SourceRegistry>,
        tables: QuoteTableBuilder,
        settings: RouterSettings,
    ) -> Self {
        Self {
            registry,
            tables,
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    pub fn context(&self, flags: RouteFlags, parts: u32) -> RequestContext {
        RequestContext {
            sources: self.registry.enabled(&flags),
            flags,
            parts,
            quote_timeout: self.settings.quote_timeout,
        }
    }

    /// Candidate asset paths from `pair.from` to `pair.to`: the direct path
    /// first, then bridged paths by hop count and bridge order.
    pub fn candidate_paths(&self, pair: &AssetPair, flags: &RouteFlags) -> Vec<Vec<Asset>> {
        let mut paths = vec![vec![pair.from.clone(), pair.to.clone()]];
        if !flags.allows_bridging() {
            return paths;
        }
        // Partial paths from `from` through bridges only, grown one leg per level.
        let mut frontier = vec![vec![pair.from.clone()]];
        for _ in 1..self.settings.max_hops {
            let mut next = Vec::new();
            for prefix in &frontier {
                for bridge in &self.settings.bridge_assets {
                    if *bridge == pair.to || prefix.contains(bridge) {
                        continue;
                    }
                    let mut grown = prefix.clone();
                    grown.push(bridge.clone());
                    let mut full = grown.clone();
                    full.push(pair.to.clone());
                    paths.push(full);
                    next.push(grown);
                }
            }
            frontier = next;
        }
        paths
    }

    /// Route `amount_in` along the best candidate path.
    #[tracing::instrument(skip_all, fields(pair = %pair, amount_in = %amount_in, parts = ctx.parts))]
    pub async fn resolve(
        &self,
        ctx: &RequestContext,
        pair: &AssetPair,
        amount_in: u128,
    ) -> RoutingResult {
        debug!(stage = ?RouteStage::Received, sources = ctx.sources.len(), "routing request");

        let paths = self.candidate_paths(pair, &ctx.flags);
        let evaluated = join_all(
            paths
                .iter()
                .map(|path| self.route_path(ctx, path, amount_in)),
        )
        .await;

        // Candidates are already ordered by preference, so the first maximum wins.
        let mut best: Option<Vec<HopResult>> = None;
        for hops in evaluated.into_iter().flatten() {
            let ret = final_return(&hops);
            if ret > 0 && best.as_ref().map_or(true, |b| ret > final_return(b)) {
                best = Some(hops);
            }
        }

        let result = match best {
            Some(hops) => RoutingResult {
                return_amount: final_return(&hops),
                parts: ctx.parts,
                sources: ctx.source_ids(),
                hops,
                behaviors: ctx.flags.behaviors,
            },
            None => {
                let mut none =
                    RoutingResult::no_route(pair, amount_in, ctx.parts, ctx.source_ids());
                none.behaviors = ctx.flags.behaviors;
                none
            }
        };

        let kind = result.kind();
        ROUTES_RESOLVED.with_label_values(&[kind.as_str()]).inc();
        info!(
            stage = ?RouteStage::Resolved,
            kind = kind.as_str(),
            return_amount = %result.return_amount,
            hops = result.hops.len(),
            candidates = paths.len(),
            "route resolved"
        );
        result
    }

    /// Route one leg: sample the enabled sources and split across them.
    pub async fn route_hop(
        &self,
        ctx: &RequestContext,
        pair: &AssetPair,
        amount_in: u128,
    ) -> HopResult {
        debug!(stage = ?RouteStage::BuildingQuotes, pair = %pair, amount_in = %amount_in);
        let table = self
            .tables
            .build(&ctx.sources, pair, amount_in, ctx.parts, ctx.deadline())
            .await;
        debug!(stage = ?RouteStage::Optimizing, pair = %pair);
        let split = optimize(&table);
        HopResult {
            from_asset: pair.from.clone(),
            to_asset: pair.to.clone(),
            amount_in,
            return_amount: split.return_amount,
            distribution: split.distribution,
        }
    }

    /// Chain legs along `path`. Gives up as soon as a leg yields nothing.
    async fn route_path(
        &self,
        ctx: &RequestContext,
        path: &[Asset],
        amount_in: u128,
    ) -> Option<Vec<HopResult>> {
        let mut hops = Vec::with_capacity(path.len().saturating_sub(1));
        let mut amount = amount_in;
        for leg in path.windows(2) {
            let pair = AssetPair::new(leg[0].clone(), leg[1].clone());
            let hop = self.route_hop(ctx, &pair, amount).await;
            if hop.return_amount == 0 {
                debug!(path = ?path, failed_leg = %pair, "candidate abandoned");
                return None;
            }
            amount = hop.return_amount;
            hops.push(hop);
        }
        Some(hops)
    }
}

fn final_return(hops: &[HopResult]) -> u128 {
    hops.last().map(|h| h.return_amount).unwrap_or(0)
}
