/// Clips raw apply/remove windows into the fight and applies the target filter.
///
/// No merging happens here: overlapping applications stay separate so that the
/// summary can still count them, and the merger sees only in-window data.
use crate::{
    filter::TargetFilter,
    model::{FightWindow, NormalizedInterval, RawInterval},
};

pub fn normalize(
    raw:     &[RawInterval],
    window:  FightWindow,
    targets: &TargetFilter,
) -> Vec<NormalizedInterval> {
    raw.iter()
        .filter(|iv| targets.allows(iv.target_id))
        .filter_map(|iv| {
            let start = iv.start.max(window.start_time);
            let end   = iv.end.min(window.end_time);
            (end > start).then_some(NormalizedInterval {
                ability_id: iv.ability_id,
                target_id:  iv.target_id,
                start,
                end,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(target_id: i64, start: i64, end: i64) -> RawInterval {
        RawInterval { ability_id: 17906, target_id, start, end }
    }

    const FIGHT: FightWindow = FightWindow { start_time: 0, end_time: 30_000 };

    #[test]
    fn clips_into_fight_window() {
        let out = normalize(&[raw(5, -500, 2_000), raw(5, 29_000, 31_000)], FIGHT, &TargetFilter::unrestricted());
        assert_eq!(out.len(), 2);
        assert_eq!((out[0].start, out[0].end), (0, 2_000));
        assert_eq!((out[1].start, out[1].end), (29_000, 30_000));
    }

    #[test]
    fn drops_intervals_with_no_length_left() {
        let out = normalize(
            &[raw(5, -900, -100), raw(5, 30_000, 35_000), raw(5, 4_000, 4_000), raw(5, 6_000, 5_000)],
            FIGHT,
            &TargetFilter::unrestricted(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn restricts_to_selected_targets() {
        let input = [raw(5, 1_000, 2_000), raw(9, 1_500, 2_500), raw(5, 8_000, 9_000)];
        let out = normalize(&input, FIGHT, &TargetFilter::from_ids([5]));
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|iv| iv.target_id == 5));
    }

    #[test]
    fn empty_filter_keeps_every_target() {
        let input = [raw(5, 1_000, 2_000), raw(9, 1_500, 2_500)];
        assert_eq!(normalize(&input, FIGHT, &TargetFilter::unrestricted()).len(), 2);
    }
}
