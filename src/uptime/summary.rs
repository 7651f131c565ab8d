/// Uptime statistics shown next to each timeline.
///
/// Uptime is always the length of a union: per target over that target's
/// applications, and in total over every target's applications combined.
/// `applications` counts the individual (normalized) applications.
use super::merge::{covered_ms, merge};
use crate::model::{ActorId, FightWindow, MergedInterval, NormalizedInterval, TargetUptime, UptimeSummary};
use std::collections::BTreeMap;

fn percentage(part_ms: i64, whole_ms: i64) -> f64 {
    if whole_ms > 0 {
        part_ms as f64 / whole_ms as f64 * 100.0
    } else {
        0.0
    }
}

pub fn summarize(
    normalized:       &[NormalizedInterval],
    merged_all:       &[MergedInterval],
    window:           FightWindow,
    merge_epsilon_ms: f64,
) -> UptimeSummary {
    let duration_ms = window.duration_ms();

    let mut per_target: BTreeMap<ActorId, Vec<NormalizedInterval>> = BTreeMap::new();
    for iv in normalized {
        per_target.entry(iv.target_id).or_default().push(*iv);
    }

    let by_target: BTreeMap<ActorId, TargetUptime> = per_target
        .into_iter()
        .map(|(target_id, intervals)| {
            let uptime_ms = covered_ms(&merge(&intervals, merge_epsilon_ms));
            let entry = TargetUptime {
                uptime_ms,
                uptime_percentage: percentage(uptime_ms, duration_ms),
                applications:      intervals.len() as u32,
            };
            (target_id, entry)
        })
        .collect();

    let average_target_uptime_percentage = if by_target.is_empty() {
        0.0
    } else {
        by_target.values().map(|t| t.uptime_percentage).sum::<f64>() / by_target.len() as f64
    };

    let total_uptime_ms = covered_ms(merged_all);

    UptimeSummary {
        total_uptime_ms,
        uptime_seconds:    total_uptime_ms as f64 / 1_000.0,
        uptime_percentage: percentage(total_uptime_ms, duration_ms),
        applications:      normalized.len() as u32,
        target_count:      by_target.len() as u32,
        average_target_uptime_percentage,
        by_target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uptime::DEFAULT_MERGE_EPSILON_MS as EPS;

    const FIGHT: FightWindow = FightWindow { start_time: 0, end_time: 10_000 };

    fn norm(target_id: i64, start: i64, end: i64) -> NormalizedInterval {
        NormalizedInterval { ability_id: 1, target_id, start, end }
    }

    #[test]
    fn overlapping_applications_never_exceed_full_uptime() {
        let n = [norm(5, 0, 8_000), norm(5, 2_000, 10_000), norm(5, 4_000, 6_000)];
        let merged = merge(&n, EPS);
        let s = summarize(&n, &merged, FIGHT, EPS);
        assert_eq!(s.total_uptime_ms, 10_000);
        assert_eq!(s.uptime_percentage, 100.0);
        assert_eq!(s.applications, 3);
        assert_eq!(s.by_target[&5].uptime_ms, 10_000);
    }

    #[test]
    fn per_target_and_combined_views() {
        let n = [norm(5, 1_000, 3_000), norm(9, 2_000, 6_000)];
        let merged = merge(&n, EPS);
        let s = summarize(&n, &merged, FIGHT, EPS);

        assert_eq!(s.total_uptime_ms, 5_000);
        assert_eq!(s.uptime_seconds, 5.0);
        assert_eq!(s.target_count, 2);
        assert_eq!(s.by_target[&5].uptime_percentage, 20.0);
        assert_eq!(s.by_target[&9].uptime_percentage, 40.0);
        assert!((s.average_target_uptime_percentage - 30.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_is_all_zero() {
        let s = summarize(&[], &[], FIGHT, EPS);
        assert_eq!(s, UptimeSummary::default());
    }

    #[test]
    fn zero_length_fight_does_not_divide() {
        let s = summarize(&[], &[], FightWindow { start_time: 0, end_time: 0 }, EPS);
        assert_eq!(s.uptime_percentage, 0.0);
    }
}
