// Request validation module
// Rejects malformed routing and swap requests before any quote work begins
//
// Numan Thabit 2025 Nov

use crate::config::RouterSettings;
use crate::errors::RouteError;
use crate::flags::RouteFlags;
use crate::router::routes::{unpack_wire_distribution, Distribution};
use crate::venues::{Asset, AssetPair};

/// Validation outcome; keeps every problem found, reports the first.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<RouteError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: RouteError) {
        self.errors.push(error);
    }

    pub fn into_result(mut self) -> Result<(), RouteError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors.swap_remove(0))
        }
    }
}

/// Checks shared by `get_expected_return` and `swap`.
pub fn validate_request(
    settings: &RouterSettings,
    pair: &AssetPair,
    parts: u32,
    flags: &RouteFlags,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    if pair.from == pair.to {
        result.add_error(RouteError::SameAsset(pair.from.clone()));
    }
    if parts == 0 || parts > settings.max_parts {
        result.add_error(RouteError::InvalidParts {
            parts,
            max: settings.max_parts,
        });
    }
    if settings.strict_flags && flags.unknown_bits != 0 {
        result.add_error(RouteError::UnknownFlags(flags.unknown_bits));
    }
    result
}

/// Check a bridge path supplied to `swap`: within the hop budget and free of
/// repeated assets.
pub fn validate_bridge(settings: &RouterSettings, pair: &AssetPair, via: &[Asset]) -> ValidationResult {
    let mut result = ValidationResult::new();
    if via.len() + 1 > settings.max_hops as usize {
        result.add_error(RouteError::InvalidDistribution(format!(
            "{} hops exceed the limit of {}",
            via.len() + 1,
            settings.max_hops
        )));
    }
    let mut seen = vec![&pair.from, &pair.to];
    for asset in via {
        if seen.contains(&asset) {
            result.add_error(RouteError::InvalidDistribution(format!(
                "bridge asset {asset} repeats on the path"
            )));
        }
        seen.push(asset);
    }
    result
}

/// A decoded swap distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedDistribution {
    /// Step count every non-empty hop sums to; zero for an empty route.
    pub parts: u32,
    pub hops: Vec<Distribution>,
}

/// Decode and check a wire distribution against the enabled source count.
///
/// Every hop must allocate the same number of parts, within `max_parts`, or
/// the whole distribution must be zero.
pub fn decode_distribution(
    settings: &RouterSettings,
    wire: &[u64],
    sources: usize,
    hops: usize,
) -> Result<DecodedDistribution, RouteError> {
    if wire.len() != sources {
        return Err(RouteError::InvalidDistribution(format!(
            "expected {sources} entries, one per enabled source, got {}",
            wire.len()
        )));
    }
    let decoded = if hops <= 1 {
        let direct = wire
            .iter()
            .map(|d| u32::try_from(*d))
            .collect::<Result<Vec<u32>, _>>()
            .map_err(|_| RouteError::InvalidDistribution("entry exceeds u32".to_string()))?;
        vec![Distribution(direct)]
    } else {
        unpack_wire_distribution(wire, hops)
    };

    if decoded.iter().all(|d| d.is_zero()) {
        return Ok(DecodedDistribution {
            parts: 0,
            hops: decoded,
        });
    }
    let oversized = decoded
        .iter()
        .flat_map(|d| d.as_slice())
        .find(|d| **d > settings.max_parts);
    if let Some(entry) = oversized {
        return Err(RouteError::InvalidDistribution(format!(
            "entry {entry} exceeds max parts {}",
            settings.max_parts
        )));
    }
    let parts = decoded[0].total();
    if parts > settings.max_parts {
        return Err(RouteError::InvalidParts {
            parts,
            max: settings.max_parts,
        });
    }
    if let Some((hop, d)) = decoded.iter().enumerate().find(|(_, d)| d.total() != parts) {
        return Err(RouteError::InvalidDistribution(format!(
            "hop {hop} allocates {} parts, expected {parts}",
            d.total()
        )));
    }
    Ok(DecodedDistribution {
        parts,
        hops: decoded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_same_asset_and_bad_parts() {
        let settings = RouterSettings::default();
        let pair = AssetPair::new("DAI", "dai");
        let result = validate_request(&settings, &pair, 0, &RouteFlags::default());
        assert_eq!(result.errors.len(), 2);
        assert!(matches!(result.into_result(), Err(RouteError::SameAsset(_))));

        let pair = AssetPair::new("eth", "dai");
        let err = validate_request(&settings, &pair, 101, &RouteFlags::default())
            .into_result()
            .unwrap_err();
        assert!(matches!(err, RouteError::InvalidParts { parts: 101, max: 100 }));
        assert!(validate_request(&settings, &pair, 100, &RouteFlags::default()).is_valid());
    }

    #[test]
    fn unknown_bits_only_rejected_when_strict() {
        let pair = AssetPair::new("eth", "dai");
        let flags = RouteFlags::from_bits(1 << 90);
        let lenient = RouterSettings::default();
        assert!(validate_request(&lenient, &pair, 10, &flags).is_valid());
        let strict = RouterSettings {
            strict_flags: true,
            ..RouterSettings::default()
        };
        assert!(matches!(
            validate_request(&strict, &pair, 10, &flags).into_result(),
            Err(RouteError::UnknownFlags(_))
        ));
    }

    #[test]
    fn decodes_direct_and_bridged() {
        let settings = RouterSettings::default();
        let d = decode_distribution(&settings, &[3, 7], 2, 1).unwrap();
        assert_eq!(d.parts, 10);
        assert_eq!(d.hops, vec![Distribution(vec![3, 7])]);

        let d = decode_distribution(&settings, &[10 | (4 << 8), 6 << 8], 2, 2).unwrap();
        assert_eq!(d.parts, 10);
        assert_eq!(d.hops[1], Distribution(vec![4, 6]));

        let d = decode_distribution(&settings, &[0, 0], 2, 2).unwrap();
        assert_eq!(d.parts, 0);
    }

    #[test]
    fn rejects_mismatched_distributions() {
        let settings = RouterSettings::default();
        assert!(decode_distribution(&settings, &[1, 2, 3], 2, 1).is_err());
        // Second hop allocates 5 of 10 parts.
        assert!(decode_distribution(&settings, &[10 | (5 << 8), 0], 2, 2).is_err());
        assert!(matches!(
            decode_distribution(&settings, &[60, 50], 2, 1),
            Err(RouteError::InvalidParts { parts: 110, .. })
        ));
        assert!(matches!(
            decode_distribution(&settings, &[150, 0], 2, 1),
            Err(RouteError::InvalidDistribution(_))
        ));
    }

    #[test]
    fn oversized_entries_cannot_wrap_the_total() {
        let settings = RouterSettings::default();
        assert!(matches!(
            decode_distribution(&settings, &[u32::MAX as u64, 11, 0], 3, 1),
            Err(RouteError::InvalidDistribution(_))
        ));
        assert_eq!(Distribution(vec![u32::MAX, 11]).total(), u32::MAX);
    }

    #[test]
    fn bridge_paths_respect_budget() {
        let settings = RouterSettings::default();
        let pair = AssetPair::new("eth", "dai");
        assert!(validate_bridge(&settings, &pair, &[Asset::new("weth")]).is_valid());
        assert!(!validate_bridge(&settings, &pair, &[Asset::new("eth")]).is_valid());
        assert!(!validate_bridge(&settings, &pair, &[Asset::new("weth"), Asset::new("usdc")]).is_valid());
    }
}
