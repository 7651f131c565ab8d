/// Turns merged uptime windows into a 0/1 step chart.
///
/// Per ability the buff is either inactive or active; every merged window is
/// one INACTIVE -> ACTIVE -> INACTIVE round trip. Points are emitted in
/// fight-relative seconds so fights of different lengths line up on one axis:
///
///   (0, 0)  [ (s, prev) (s, 1) (e, 1) (e, 0) ]*  (duration, 0)
///
/// then rounded (x to 3 decimals, y to 5) and collapsed so that no point
/// repeats its predecessor.
use crate::model::{FightWindow, MergedInterval, TimelinePoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepState {
    Inactive,
    Active,
}

impl StepState {
    fn y(self) -> f64 {
        match self {
            Self::Inactive => 0.0,
            Self::Active   => 1.0,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

pub fn build_steps(merged: &[MergedInterval], window: FightWindow, dedup_epsilon: f64) -> Vec<TimelinePoint> {
    if window.is_empty() {
        return Vec::new();
    }

    let to_secs = |ts: i64| window.relative_secs(ts.clamp(window.start_time, window.end_time));

    let mut raw   = Vec::with_capacity(merged.len() * 4 + 2);
    let mut state = StepState::Inactive;
    raw.push((0.0, state.y()));

    for iv in merged {
        let start = to_secs(iv.start);
        let end   = to_secs(iv.end);

        raw.push((start, state.y()));
        state = StepState::Active;
        raw.push((start, state.y()));
        raw.push((end, state.y()));
        state = StepState::Inactive;
        raw.push((end, state.y()));
    }
    raw.push((window.duration_ms() as f64 / 1_000.0, StepState::Inactive.y()));

    let mut points: Vec<TimelinePoint> = Vec::with_capacity(raw.len());
    for (x, y) in raw {
        let p = TimelinePoint { x: round_to(x, 3), y: round_to(y, 5) };
        let repeats = points.last().is_some_and(|prev| {
            (prev.x - p.x).abs() <= dedup_epsilon && (prev.y - p.y).abs() <= dedup_epsilon
        });
        if !repeats {
            points.push(p);
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uptime::DEFAULT_DEDUP_EPSILON as EPS;

    const FIGHT: FightWindow = FightWindow { start_time: 10_000, end_time: 40_000 };

    fn pts(points: &[TimelinePoint]) -> Vec<(f64, f64)> {
        points.iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn no_uptime_is_a_flat_line() {
        let out = build_steps(&[], FIGHT, EPS);
        assert_eq!(pts(&out), vec![(0.0, 0.0), (30.0, 0.0)]);
    }

    #[test]
    fn single_window_in_relative_seconds() {
        let out = build_steps(&[MergedInterval { start: 11_000, end: 17_000 }], FIGHT, EPS);
        assert_eq!(
            pts(&out),
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (7.0, 1.0), (7.0, 0.0), (30.0, 0.0)]
        );
    }

    #[test]
    fn window_touching_fight_edges_collapses_duplicates() {
        let out = build_steps(&[MergedInterval { start: 10_000, end: 40_000 }], FIGHT, EPS);
        assert_eq!(pts(&out), vec![(0.0, 0.0), (0.0, 1.0), (30.0, 1.0), (30.0, 0.0)]);
    }

    #[test]
    fn re_enters_active_state() {
        let merged = [
            MergedInterval { start: 11_000, end: 12_000 },
            MergedInterval { start: 15_500, end: 16_250 },
        ];
        let out = build_steps(&merged, FIGHT, EPS);
        let ys: Vec<f64> = out.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
        assert_eq!(out[5].x, 5.5);
        assert_eq!(out[8].x, 6.25);
    }

    #[test]
    fn x_is_rounded_to_milliseconds() {
        let fight = FightWindow { start_time: 0, end_time: 10_000 };
        let out = build_steps(&[MergedInterval { start: 1_234, end: 5_678 }], fight, EPS);
        assert!(out.iter().any(|p| p.x == 1.234));
        assert!(out.iter().any(|p| p.x == 5.678));
    }

    #[test]
    fn consecutive_points_never_repeat() {
        let merged = [
            MergedInterval { start: 10_000, end: 11_000 },
            MergedInterval { start: 11_001, end: 40_000 },
        ];
        let out = build_steps(&merged, FIGHT, EPS);
        for pair in out.windows(2) {
            assert!(pair[0] != pair[1]);
            assert!(pair[0].x <= pair[1].x);
        }
        assert!(out.iter().all(|p| p.y == 0.0 || p.y == 1.0));
    }

    #[test]
    fn empty_window_yields_nothing() {
        assert!(build_steps(&[], FightWindow { start_time: 5, end_time: 5 }, EPS).is_empty());
    }
}
