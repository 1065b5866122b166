// Quote table builder
// This file samples every enabled source's return curve at uniform steps of
// the trade amount, concurrently and under a per-request deadline
//
// Numan Thabit 2025 Nov

use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant as StdInstant;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use crate::control::AdmissionControl;
use crate::errors::SourceError;
use crate::metrics::{QUOTE_FAILURES, QUOTE_LATENCY};
use crate::quant::step_amount;
use crate::venues::{AssetPair, LiquiditySource};

/// Output of each source at each step. Column 0 is the implicit zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteTable {
    rows: Vec<Vec<u128>>,
    parts: u32,
}

impl QuoteTable {
    pub fn zeros(sources: usize, parts: u32) -> Self {
        Self {
            rows: vec![vec![0; parts as usize + 1]; sources],
            parts,
        }
    }

    /// Build a table from sampled rows. Each row lists the outputs for steps
    /// `1..=parts`; missing trailing steps read as zero.
    pub fn from_samples(samples: Vec<Vec<u128>>, parts: u32) -> Self {
        let rows = samples
            .into_iter()
            .map(|row| {
                let mut full = Vec::with_capacity(parts as usize + 1);
                full.push(0);
                full.extend(row.into_iter().take(parts as usize));
                full.resize(parts as usize + 1, 0);
                full
            })
            .collect();
        Self { rows, parts }
    }

    pub fn sources(&self) -> usize {
        self.rows.len()
    }

    pub fn parts(&self) -> u32 {
        self.parts
    }

    /// Output of `source` when allocated `step` parts.
    pub fn get(&self, source: usize, step: u32) -> u128 {
        self.rows
            .get(source)
            .and_then(|row| row.get(step as usize))
            .copied()
            .unwrap_or(0)
    }
}

/// Fills quote tables, sharing one admission limiter across requests.
#[derive(Clone, Default)]
pub struct QuoteTableBuilder {
    admission: AdmissionControl,
}

impl QuoteTableBuilder {
    pub fn new(admission: AdmissionControl) -> Self {
        Self { admission }
    }

    /// Any failed, late or missing quote becomes a zero cell; never fails.
    pub async fn build(
        &self,
        sources: &[Arc<dyn LiquiditySource>],
        pair: &AssetPair,
        amount: u128,
        parts: u32,
        deadline: Instant,
    ) -> QuoteTable {
        if amount == 0 || sources.is_empty() {
            return QuoteTable::zeros(sources.len(), parts);
        }
        let rows = sources.iter().map(|source| {
            join_all((1..=parts).map(|step| {
                let source = Arc::clone(source);
                let amount_in = step_amount(amount, step, parts);
                async move { self.quote_cell(source.as_ref(), pair, amount_in, deadline).await }
            }))
        });
        let samples = join_all(rows).await;
        QuoteTable::from_samples(samples, parts)
    }

    async fn quote_cell(
        &self,
        source: &dyn LiquiditySource,
        pair: &AssetPair,
        amount_in: u128,
        deadline: Instant,
    ) -> u128 {
        if amount_in == 0 {
            return 0;
        }
        let name = source.descriptor().name.as_str();
        let call = async {
            let _permit = self
                .admission
                .acquire()
                .await
                .map_err(|e| SourceError::Provider(e.to_string()))?;
            let started = StdInstant::now();
            let out = source.quote(pair, amount_in).await;
            QUOTE_LATENCY
                .with_label_values(&[name])
                .observe(started.elapsed().as_secs_f64());
            out
        };
        let result = match timeout_at(deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout),
        };
        match result {
            Ok(out) => out,
            Err(err) => {
                let reason = match err {
                    SourceError::UnsupportedPair { .. } => "unsupported",
                    SourceError::InsufficientLiquidity => "liquidity",
                    SourceError::Provider(_) => "provider",
                    SourceError::Timeout => "timeout",
                };
                QUOTE_FAILURES.with_label_values(&[name, reason]).inc();
                debug!(
                    source = name,
                    pair = %pair,
                    amount_in = %amount_in,
                    error = %err,
                    "quote failed; counting as zero"
                );
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Toggle;
    use crate::venues::{SourceDescriptor, SourceId};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Linear {
        desc: SourceDescriptor,
        calls: AtomicUsize,
        fail_above: Option<u128>,
    }

    #[async_trait]
    impl LiquiditySource for Linear {
        fn descriptor(&self) -> &SourceDescriptor {
            &self.desc
        }

        async fn quote(&self, _pair: &AssetPair, amount_in: u128) -> Result<u128, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_above {
                Some(limit) if amount_in > limit => Err(SourceError::InsufficientLiquidity),
                _ => Ok(amount_in * 2),
            }
        }
    }

    fn linear(fail_above: Option<u128>) -> Arc<Linear> {
        Arc::new(Linear {
            desc: SourceDescriptor {
                id: SourceId(0),
                name: "linear".to_string(),
                toggles: vec![Toggle::Bancor],
                wrap: false,
            },
            calls: AtomicUsize::new(0),
            fail_above,
        })
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(10)
    }

    #[tokio::test]
    async fn samples_floor_steps() {
        let source = linear(None);
        let sources: Vec<Arc<dyn LiquiditySource>> = vec![source.clone()];
        let table = QuoteTableBuilder::default()
            .build(&sources, &AssetPair::new("a", "b"), 10, 3, far_deadline())
            .await;
        assert_eq!(table.get(0, 0), 0);
        assert_eq!(table.get(0, 1), 6);
        assert_eq!(table.get(0, 2), 12);
        assert_eq!(table.get(0, 3), 20);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failures_become_zero_cells() {
        let sources: Vec<Arc<dyn LiquiditySource>> = vec![linear(Some(5))];
        let table = QuoteTableBuilder::default()
            .build(&sources, &AssetPair::new("a", "b"), 10, 2, far_deadline())
            .await;
        assert_eq!(table.get(0, 1), 10);
        assert_eq!(table.get(0, 2), 0);
    }

    #[tokio::test]
    async fn zero_amount_skips_sources() {
        let source = linear(None);
        let sources: Vec<Arc<dyn LiquiditySource>> = vec![source.clone()];
        let table = QuoteTableBuilder::default()
            .build(&sources, &AssetPair::new("a", "b"), 0, 4, far_deadline())
            .await;
        assert_eq!(table, QuoteTable::zeros(1, 4));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn from_samples_pads_rows() {
        let table = QuoteTable::from_samples(vec![vec![5], vec![1, 2, 3]], 2);
        assert_eq!(table.sources(), 2);
        assert_eq!(table.get(0, 1), 5);
        assert_eq!(table.get(0, 2), 0);
        assert_eq!(table.get(1, 2), 2);
        assert_eq!(table.get(5, 1), 0);
    }
}
