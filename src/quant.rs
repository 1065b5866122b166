// Amount arithmetic module
// This file handles step quantization of trade amounts, lane packing for
// multi-hop distributions and display formatting by asset decimals
//
// Numan Thabit 2025 Nov

use anyhow::{ensure, Result};

/// Bits reserved per hop inside a packed distribution entry.
pub const LANE_BITS: u32 = 8;

/// Maximum number of hops that fit inside a packed `u64` entry.
pub const MAX_LANES: usize = (u64::BITS / LANE_BITS) as usize;

/// Input amount for `step` out of `parts`, rounded down.
///
/// Computed as `q*step + r*step/parts` with `amount = q*parts + r` so the
/// intermediate product never exceeds `amount`.
pub fn step_amount(amount: u128, step: u32, parts: u32) -> u128 {
    if parts == 0 {
        return 0;
    }
    let parts = parts as u128;
    let step = step as u128;
    let q = amount / parts;
    let r = amount % parts;
    q * step + (r * step) / parts
}

/// `a * b / denom` rounded down, with a 256-bit intermediate product.
/// Returns `None` when `denom` is zero or the quotient does not fit in `u128`.
pub fn mul_div(a: u128, b: u128, denom: u128) -> Option<u128> {
    if denom == 0 {
        return None;
    }
    if let Some(product) = a.checked_mul(b) {
        return Some(product / denom);
    }
    let (hi, lo) = widening_mul(a, b);
    if hi >= denom {
        return None;
    }
    // Restoring long division of (hi, lo) by denom, one bit at a time.
    let mut rem = hi;
    let mut quotient = 0u128;
    for i in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> i) & 1);
        quotient <<= 1;
        if carry == 1 || rem >= denom {
            rem = rem.wrapping_sub(denom);
            quotient |= 1;
        }
    }
    Some(quotient)
}

fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = u64::MAX as u128;
    let (a_hi, a_lo) = (a >> 64, a & MASK);
    let (b_hi, b_lo) = (b >> 64, b & MASK);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    let mid = (ll >> 64) + (lh & MASK) + (hl & MASK);
    let lo = (ll & MASK) | (mid << 64);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

/// Split `amount` by `distribution` (which sums to `parts`). Every entry gets its
/// floored share, except that the last non-zero entry absorbs the rounding
/// remainder so the returned amounts always sum to `amount`.
pub fn execution_amounts(amount: u128, distribution: &[u32], parts: u32) -> Vec<u128> {
    let mut out: Vec<u128> = distribution
        .iter()
        .map(|d| step_amount(amount, *d, parts))
        .collect();
    if let Some(last) = distribution.iter().rposition(|d| *d > 0) {
        let spent: u128 = out.iter().sum();
        out[last] += amount.saturating_sub(spent);
    }
    out
}

/// Pack per-hop step counts into a single entry, hop `h` in bits `[8h, 8h+8)`.
pub fn pack_lanes(lanes: &[u32]) -> Result<u64> {
    ensure!(
        lanes.len() <= MAX_LANES,
        "at most {MAX_LANES} hops can be packed, got {}",
        lanes.len()
    );
    let mut packed = 0u64;
    for (hop, parts) in lanes.iter().enumerate() {
        ensure!(
            *parts < (1 << LANE_BITS),
            "hop {hop} allocation {parts} does not fit in {LANE_BITS} bits"
        );
        packed |= (*parts as u64) << (LANE_BITS * hop as u32);
    }
    Ok(packed)
}

/// Extract the step count for `hop` from a packed entry.
pub fn unpack_lane(packed: u64, hop: usize) -> u32 {
    if hop >= MAX_LANES {
        return 0;
    }
    ((packed >> (LANE_BITS * hop as u32)) & ((1 << LANE_BITS) - 1)) as u32
}

/// Render a raw amount with the given number of decimals, trimming trailing zeros.
pub fn format_units(amount: u128, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let Some(scale) = 10u128.checked_pow(decimals as u32) else {
        return amount.to_string();
    };
    let whole = amount / scale;
    let frac = amount % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Parse a raw amount written as a decimal string, allowing `_` separators.
pub fn parse_amount(text: &str) -> Result<u128> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    ensure!(!cleaned.is_empty(), "empty amount");
    cleaned
        .parse::<u128>()
        .map_err(|e| anyhow::anyhow!("invalid amount {text:?}: {e}"))
}

/// Visitor for `u128` values sent either as a string handed to `parse` or as
/// a JSON integer. JSON integers above `u64::MAX` arrive as floats and are
/// rejected; such values must be sent as strings.
pub struct WideVisitor<F> {
    pub parse: F,
    pub expecting: &'static str,
}

impl<'de, F, E> serde::de::Visitor<'de> for WideVisitor<F>
where
    F: FnOnce(&str) -> std::result::Result<u128, E>,
    E: std::fmt::Display,
{
    type Value = u128;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} as a string or a non-negative integer", self.expecting)
    }

    fn visit_str<Er: serde::de::Error>(self, v: &str) -> std::result::Result<u128, Er> {
        (self.parse)(v).map_err(Er::custom)
    }

    fn visit_u64<Er: serde::de::Error>(self, v: u64) -> std::result::Result<u128, Er> {
        Ok(v as u128)
    }

    fn visit_u128<Er: serde::de::Error>(self, v: u128) -> std::result::Result<u128, Er> {
        Ok(v)
    }

    fn visit_i64<Er: serde::de::Error>(self, v: i64) -> std::result::Result<u128, Er> {
        u128::try_from(v)
            .map_err(|_| Er::custom(format!("{} must not be negative, got {v}", self.expecting)))
    }

    fn visit_f64<Er: serde::de::Error>(self, v: f64) -> std::result::Result<u128, Er> {
        Err(Er::custom(format!(
            "{} {v} is not an exact integer; values above {} must be sent as strings",
            self.expecting,
            u64::MAX
        )))
    }
}

/// Serde adapter carrying `u128` amounts as decimal strings. Deserialization
/// also accepts plain JSON integers up to `u64::MAX`.
pub mod serde_amount {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        d.deserialize_any(super::WideVisitor {
            parse: super::parse_amount,
            expecting: "amount",
        })
    }
}
