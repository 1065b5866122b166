// Execution plane - hands a chosen distribution to the swap executor
// This file defines the execution plan, the executor seam, a dry-run executor
// that re-quotes the registry, and execution statistics
//
// Numan Thabit 2025 Nov

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::routes::Distribution;
use crate::errors::RouteError;
use crate::flags::Behaviors;
use crate::quant::execution_amounts;
use crate::venues::{AssetPair, SourceId, SourceRegistry};

/// One leg of an execution plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopPlan {
    pub pair: AssetPair,
    pub distribution: Distribution,
}

/// A validated swap ready for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub amount_in: u128,
    pub min_return: u128,
    pub parts: u32,
    /// Enabled sources; distribution entry `i` maps to `sources[i]`.
    pub sources: Vec<SourceId>,
    pub hops: Vec<HopPlan>,
    pub behaviors: Behaviors,
}

impl ExecutionPlan {
    /// Per-source input amounts for `hop` when it receives `amount`. Sources
    /// with no allocation are left out.
    pub fn leg_amounts(&self, hop: usize, amount: u128) -> Vec<(SourceId, u128)> {
        let Some(plan) = self.hops.get(hop) else {
            return Vec::new();
        };
        execution_amounts(amount, plan.distribution.as_slice(), self.parts)
            .into_iter()
            .zip(self.sources.iter().copied())
            .filter(|(amt, _)| *amt > 0)
            .map(|(amt, id)| (id, amt))
            .collect()
    }
}

/// Performs the actual exchange described by a plan and reports the output.
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    async fn execute(&self, plan: &ExecutionPlan) -> Result<u128, RouteError>;
}

/// Executes by re-quoting every allocated source; moves no assets.
pub struct SimulatedExecutor {
    registry: Arc<SourceRegistry>,
}

impl SimulatedExecutor {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl SwapExecutor for SimulatedExecutor {
    #[tracing::instrument(skip_all, fields(amount_in = %plan.amount_in, hops = plan.hops.len()))]
    async fn execute(&self, plan: &ExecutionPlan) -> Result<u128, RouteError> {
        debug!(behaviors = ?plan.behaviors, "simulating swap");
        let mut amount = plan.amount_in;
        for (i, hop) in plan.hops.iter().enumerate() {
            let legs = plan.leg_amounts(i, amount);
            if legs.is_empty() {
                return Ok(0);
            }
            let quotes = join_all(legs.iter().map(|(id, amt)| async move {
                let source = self.registry.get(*id).ok_or_else(|| {
                    RouteError::Execution(format!("source {id} is not registered"))
                })?;
                source.quote(&hop.pair, *amt).await.map_err(|e| {
                    RouteError::Execution(format!(
                        "{} failed on {}: {e}",
                        source.descriptor().name,
                        hop.pair
                    ))
                })
            }))
            .await;
            let mut out = 0u128;
            for quote in quotes {
                out = out.saturating_add(quote?);
            }
            debug!(hop = i, pair = %hop.pair, amount_in = %amount, amount_out = %out, "leg executed");
            amount = out;
        }
        info!(amount_out = %amount, "simulated swap complete");
        Ok(amount)
    }
}

/// Execution statistics for monitoring
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStats {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    pub slippage_failures: u64,
    pub success_rate: f64,
}

/// Lock-free execution counters shared by concurrent swaps.
#[derive(Debug, Default)]
pub struct ExecutionCounters {
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    slippage: AtomicU64,
}

impl ExecutionCounters {
    pub fn record(&self, outcome: &Result<u128, RouteError>) {
        self.total.fetch_add(1, Ordering::Relaxed);
        match outcome {
            Ok(_) => {
                self.successful.fetch_add(1, Ordering::Relaxed);
            }
            Err(RouteError::InsufficientReturn { .. }) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.slippage.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn snapshot(&self) -> ExecutionStats {
        let total = self.total.load(Ordering::Relaxed);
        let successful = self.successful.load(Ordering::Relaxed);
        ExecutionStats {
            total_executions: total,
            successful_executions: successful,
            failed_executions: self.failed.load(Ordering::Relaxed),
            slippage_failures: self.slippage.load(Ordering::Relaxed),
            success_rate: if total > 0 {
                successful as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Toggle;
    use crate::venues::{ConstantProductPool, SourceDescriptor};

    fn plan(dist: Vec<u32>) -> ExecutionPlan {
        ExecutionPlan {
            amount_in: 1_000,
            min_return: 0,
            parts: 3,
            sources: vec![SourceId(0), SourceId(1), SourceId(2)],
            hops: vec![HopPlan {
                pair: AssetPair::new("eth", "dai"),
                distribution: Distribution(dist),
            }],
            behaviors: Behaviors::default(),
        }
    }

    #[test]
    fn leg_amounts_skip_idle_sources() {
        let plan = plan(vec![1, 0, 2]);
        assert_eq!(
            plan.leg_amounts(0, 1_000),
            vec![(SourceId(0), 333), (SourceId(2), 667)]
        );
        assert!(plan.leg_amounts(1, 1_000).is_empty());
    }

    #[tokio::test]
    async fn simulated_executor_requotes_sources() {
        let mut registry = SourceRegistry::new();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            let pool = ConstantProductPool::new(
                SourceDescriptor {
                    id: SourceId(i as u16),
                    name: name.to_string(),
                    toggles: vec![Toggle::Uniswap],
                    wrap: false,
                },
                0,
            )
            .with_pool("eth", 1_000_000, "dai", 1_000_000);
            registry.register(Arc::new(pool)).unwrap();
        }
        let executor = SimulatedExecutor::new(Arc::new(registry));
        let out = executor.execute(&plan(vec![1, 0, 2])).await.unwrap();
        // 333*1e6/(1e6+333) + 667*1e6/(1e6+667)
        assert_eq!(out, 332 + 666);
    }

    #[test]
    fn counters_track_slippage() {
        let counters = ExecutionCounters::default();
        counters.record(&Ok(5));
        counters.record(&Err(RouteError::InsufficientReturn {
            min_return: 10,
            actual: 5,
        }));
        counters.record(&Err(RouteError::Execution("boom".into())));
        let stats = counters.snapshot();
        assert_eq!(stats.total_executions, 3);
        assert_eq!(stats.successful_executions, 1);
        assert_eq!(stats.failed_executions, 2);
        assert_eq!(stats.slippage_failures, 1);
    }
}
