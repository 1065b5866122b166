// Split optimizer
// Greedy incremental allocation of K equal steps across sources over a
// quote table. Optimal when every source's marginal output is non-increasing.
//
// Numan Thabit 2025 Nov

use std::cmp::{Ordering, Reverse};

use super::routes::Distribution;
use super::table::QuoteTable;

/// Signed marginal output of one extra step, ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Gain {
    Loss(Reverse<u128>),
    Zero,
    Profit(u128),
}

impl Gain {
    fn between(current: u128, next: u128) -> Self {
        match next.cmp(&current) {
            Ordering::Greater => Gain::Profit(next - current),
            Ordering::Equal => Gain::Zero,
            Ordering::Less => Gain::Loss(Reverse(current - next)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutcome {
    pub return_amount: u128,
    pub distribution: Distribution,
}

/// Allocate all `table.parts()` steps. A result with zero output is reported
/// with an all-zero distribution.
pub fn optimize(table: &QuoteTable) -> SplitOutcome {
    let sources = table.sources();
    let parts = table.parts();
    let mut alloc = vec![0u32; sources];
    if sources == 0 || parts == 0 {
        return SplitOutcome {
            return_amount: 0,
            distribution: Distribution(alloc),
        };
    }

    let mut remaining = parts;
    while remaining > 0 {
        let mut best: Option<(usize, Gain)> = None;
        for (s, cur) in alloc.iter().enumerate() {
            if *cur >= parts {
                continue;
            }
            let gain = Gain::between(table.get(s, *cur), table.get(s, cur + 1));
            // Strictly greater keeps the lowest index on ties.
            if best.map_or(true, |(_, g)| gain > g) {
                best = Some((s, gain));
            }
        }
        let Some((mut s, gain)) = best else { break };
        if gain == Gain::Zero {
            s = tail_recipient(table, &alloc, remaining);
            if is_flat(table, s, alloc[s], remaining) {
                alloc[s] += remaining;
                break;
            }
        }
        alloc[s] += 1;
        remaining -= 1;
    }

    let return_amount = alloc
        .iter()
        .enumerate()
        .fold(0u128, |acc, (s, d)| acc.saturating_add(table.get(s, *d)));
    if return_amount == 0 {
        alloc.iter_mut().for_each(|d| *d = 0);
    }
    SplitOutcome {
        return_amount,
        distribution: Distribution(alloc),
    }
}

/// Source that gains the most from taking every remaining step. Ties go to
/// the highest current contribution, then the lowest index.
fn tail_recipient(table: &QuoteTable, alloc: &[u32], remaining: u32) -> usize {
    let mut recipient = 0;
    let mut best: Option<(Gain, u128)> = None;
    for (s, d) in alloc.iter().enumerate() {
        let current = table.get(s, *d);
        let key = (Gain::between(current, table.get(s, d + remaining)), current);
        if best.map_or(true, |b| key > b) {
            recipient = s;
            best = Some(key);
        }
    }
    recipient
}

/// Whether row `s` holds its value at `from` for the next `steps` columns.
fn is_flat(table: &QuoteTable, s: usize, from: u32, steps: u32) -> bool {
    let base = table.get(s, from);
    (from + 1..=from + steps).all(|k| table.get(s, k) == base)
}
