/// Coalesces overlapping or touching applications into their union.
///
/// Two stacked applications of the same debuff on one target are one window of
/// uptime, never two: this is what keeps uptime at or below 100%. The output is
/// sorted, pairwise disjoint with gaps wider than `epsilon_ms`, and merging it
/// again returns it unchanged.
use super::Span;
use crate::model::MergedInterval;

pub fn merge<S: Span>(intervals: &[S], epsilon_ms: f64) -> Vec<MergedInterval> {
    let mut sorted: Vec<MergedInterval> = intervals
        .iter()
        .map(|iv| MergedInterval { start: iv.start(), end: iv.end() })
        .collect();
    sorted.sort_unstable_by_key(|iv| (iv.start, iv.end));

    let mut out: Vec<MergedInterval> = Vec::with_capacity(sorted.len());
    let mut iter = sorted.into_iter();
    let Some(mut current) = iter.next() else {
        return out;
    };

    for next in iter {
        let gap = next.start.saturating_sub(current.end) as f64;
        if gap <= epsilon_ms {
            current.end = current.end.max(next.end);
        } else {
            out.push(current);
            current = next;
        }
    }
    out.push(current);
    out
}

/// Total covered milliseconds of an already merged set.
pub fn covered_ms(merged: &[MergedInterval]) -> i64 {
    merged.iter().map(MergedInterval::length_ms).sum()
}
