// Source registry module
// Fixed, read-only table of liquidity sources indexed by stable id
//
// Numan Thabit 2025 Nov

use anyhow::{ensure, Result};
use std::collections::HashSet;
use std::sync::Arc;

use super::adapter::{LiquiditySource, SourceDescriptor, SourceId};
use crate::flags::{RouteFlags, Toggle};

#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn LiquiditySource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next registered source must carry.
    pub fn next_id(&self) -> SourceId {
        SourceId(self.sources.len() as u16)
    }

    /// Register a source. Ids must be dense and assigned in registration order.
    pub fn register(&mut self, source: Arc<dyn LiquiditySource>) -> Result<SourceId> {
        let desc = source.descriptor();
        let expected = self.next_id();
        ensure!(
            desc.id == expected,
            "source {} registered with id {} but next id is {}",
            desc.name,
            desc.id,
            expected
        );
        ensure!(
            self.sources.iter().all(|s| s.descriptor().name != desc.name),
            "duplicate source name {}",
            desc.name
        );
        self.sources.push(source);
        Ok(expected)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, id: SourceId) -> Option<&Arc<dyn LiquiditySource>> {
        self.sources.get(id.0 as usize)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.sources.iter().map(|s| s.descriptor())
    }

    /// Sources enabled under `flags`, in stable id order.
    pub fn enabled(&self, flags: &RouteFlags) -> Vec<Arc<dyn LiquiditySource>> {
        self.sources
            .iter()
            .filter(|s| flags.is_enabled(s.descriptor()))
            .cloned()
            .collect()
    }

    /// Flags that leave enabled only the sources carrying one of `keep`.
    ///
    /// Every other source is switched off through its toggles that no kept
    /// source shares; a source whose toggles are all shared stays enabled.
    pub fn flags_enabling_only(&self, keep: &[Toggle]) -> RouteFlags {
        let kept: Vec<&SourceDescriptor> = self
            .descriptors()
            .filter(|d| d.toggles.iter().any(|t| keep.contains(t)))
            .collect();
        let protected: HashSet<Toggle> = kept
            .iter()
            .flat_map(|d| d.toggles.iter().copied())
            .collect();

        let mut flags = RouteFlags::default();
        for desc in self.descriptors() {
            if kept.iter().any(|k| k.id == desc.id) {
                continue;
            }
            flags.disabled.extend(
                desc.toggles
                    .iter()
                    .copied()
                    .filter(|t| !protected.contains(t)),
            );
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceError;
    use crate::venues::AssetPair;
    use async_trait::async_trait;

    struct Fixed(SourceDescriptor);

    #[async_trait]
    impl LiquiditySource for Fixed {
        fn descriptor(&self) -> &SourceDescriptor {
            &self.0
        }

        async fn quote(&self, _pair: &AssetPair, amount_in: u128) -> Result<u128, SourceError> {
            Ok(amount_in)
        }
    }

    fn fixed(id: u16, name: &str, toggles: &[Toggle]) -> Arc<dyn LiquiditySource> {
        Arc::new(Fixed(SourceDescriptor {
            id: SourceId(id),
            name: name.to_string(),
            toggles: toggles.to_vec(),
            wrap: false,
        }))
    }

    fn registry() -> SourceRegistry {
        let mut registry = SourceRegistry::new();
        registry
            .register(fixed(0, "uniswap", &[Toggle::Uniswap, Toggle::UniswapAll]))
            .unwrap();
        registry
            .register(fixed(1, "curve-y", &[Toggle::CurveY, Toggle::CurveAll]))
            .unwrap();
        registry
            .register(fixed(2, "curve-pax", &[Toggle::CurvePax, Toggle::CurveAll]))
            .unwrap();
        registry
    }

    #[test]
    fn register_rejects_out_of_order_ids() {
        let mut registry = SourceRegistry::new();
        assert!(registry.register(fixed(1, "x", &[])).is_err());
        registry.register(fixed(0, "x", &[])).unwrap();
        assert!(registry.register(fixed(1, "x", &[])).is_err());
    }

    #[test]
    fn enabled_keeps_id_order() {
        let registry = registry();
        let flags = RouteFlags::from_bits(Toggle::CurveY.bit());
        let ids: Vec<u16> = registry
            .enabled(&flags)
            .iter()
            .map(|s| s.descriptor().id.0)
            .collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn only_curve_family() {
        let registry = registry();
        let flags = registry.flags_enabling_only(&[Toggle::CurveAll]);
        let names: Vec<String> = registry
            .enabled(&flags)
            .iter()
            .map(|s| s.descriptor().name.clone())
            .collect();
        assert_eq!(names, vec!["curve-y", "curve-pax"]);
    }

    #[test]
    fn only_single_variant() {
        let registry = registry();
        let flags = registry.flags_enabling_only(&[Toggle::CurvePax]);
        let names: Vec<String> = registry
            .enabled(&flags)
            .iter()
            .map(|s| s.descriptor().name.clone())
            .collect();
        assert_eq!(names, vec!["curve-pax"]);
    }
}
