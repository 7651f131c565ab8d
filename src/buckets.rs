/// Time-bucket aggregation for damage-over-time charts.
///
/// The fight `[start, end)` is cut into `N = ceil(duration / w)` buckets of
/// width `w`; the last bucket ends at `end` and may be narrower than `w`. DPS
/// is always taken over the nominal `w`, tail bucket included. An event lands
/// in `floor((ts - start) / w)`, clamped into `[0, N-1]`, so stragglers
/// before the pull or exactly at `end` fall into the first and last bucket
/// respectively.
///
/// All per-bucket state lives in a fixed-size `BucketArena` indexed by bucket
/// number. Damage is summed as integers, which keeps every total exact and
/// independent of the order events arrive in.
use crate::{
    error::{EngineError, EngineResult},
    model::{ActorId, CombatEvent, DataPoint, FightWindow, PlayerSeries, Roster},
};
use std::collections::BTreeMap;

pub type ByTarget   = BTreeMap<ActorId, BTreeMap<ActorId, PlayerSeries>>;
pub type AllTargets = BTreeMap<ActorId, PlayerSeries>;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketLayout {
    pub window:   FightWindow,
    pub width_ms: i64,
    pub count:    usize,
}

impl BucketLayout {
    /// `Ok(None)` for a window with no positive duration (nothing to bucket).
    /// A non-positive width or a bucket count above `max_buckets` is a caller error.
    pub fn new(window: FightWindow, width_ms: i64, max_buckets: u64) -> EngineResult<Option<Self>> {
        if width_ms <= 0 {
            return Err(EngineError::InvalidBucketWidth(width_ms));
        }
        if window.is_empty() {
            return Ok(None);
        }

        let duration = window.duration_ms() as u64;
        let count    = duration.div_ceil(width_ms as u64);
        if count > max_buckets {
            return Err(EngineError::TooManyBuckets {
                duration_ms: window.duration_ms(),
                bucket_ms:   width_ms,
                requested:   count,
                limit:       max_buckets,
            });
        }

        Ok(Some(Self { window, width_ms, count: count as usize }))
    }

    pub fn index_of(&self, timestamp_ms: i64) -> usize {
        let offset = timestamp_ms.saturating_sub(self.window.start_time);
        let raw    = offset.div_euclid(self.width_ms);
        raw.clamp(0, self.count as i64 - 1) as usize
    }

    pub fn bucket_start(&self, index: usize) -> i64 {
        self.window.start_time + index as i64 * self.width_ms
    }
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// Per-bucket damage and hit counters for one series.
#[derive(Debug, Clone)]
pub struct BucketArena {
    damage: Vec<u64>,
    counts: Vec<u32>,
}

impl BucketArena {
    pub fn new(count: usize) -> Self {
        Self { damage: vec![0; count], counts: vec![0; count] }
    }

    pub fn record(&mut self, bucket: usize, amount: u64) {
        self.damage[bucket] = self.damage[bucket].saturating_add(amount);
        self.counts[bucket] = self.counts[bucket].saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.damage.iter_mut().for_each(|d| *d = 0);
        self.counts.iter_mut().for_each(|c| *c = 0);
    }

    /// Turn the counters into a labelled series with derived DPS figures.
    pub fn to_series(
        &self,
        layout:      &BucketLayout,
        player_id:   ActorId,
        player_name: &str,
        target_id:   Option<ActorId>,
    ) -> PlayerSeries {
        let mut data_points  = Vec::with_capacity(layout.count);
        let mut total_damage = 0u64;
        let mut total_events = 0u64;
        let mut max_dps      = 0.0f64;
        let width_s          = layout.width_ms as f64 / 1_000.0;

        for i in 0..layout.count {
            let damage = self.damage[i];
            let dps    = damage as f64 / width_s;

            total_damage = total_damage.saturating_add(damage);
            total_events += u64::from(self.counts[i]);
            max_dps = max_dps.max(dps);

            data_points.push(DataPoint {
                timestamp:         layout.bucket_start(i),
                relative_time_sec: (i as i64 * layout.width_ms) as f64 / 1_000.0,
                damage,
                event_count:       self.counts[i],
                dps,
            });
        }

        let duration_s  = layout.window.duration_ms() as f64 / 1_000.0;
        let average_dps = if duration_s > 0.0 { total_damage as f64 / duration_s } else { 0.0 };

        PlayerSeries {
            player_id,
            player_name: player_name.to_owned(),
            target_id,
            data_points,
            total_damage,
            total_events,
            average_dps,
            max_dps,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// A qualifying event reduced to dense indices.
#[derive(Debug, Clone, Copy)]
struct Hit {
    player: usize,
    target: usize,
    bucket: usize,
    amount: u64,
}

/// Build both views over already-qualified damage events.
///
/// `by_target` holds one series per (target, player) pair that has at least one
/// hit; `all_targets` holds one series per roster player, computed in its own
/// pass over that player's hits regardless of target. Events whose source is not
/// on the roster are skipped.
pub fn player_target_series(
    layout: &BucketLayout,
    roster: &Roster,
    events: &[&CombatEvent],
) -> (ByTarget, AllTargets) {
    let players = roster.ids();

    let mut targets: Vec<ActorId> = events.iter().map(|e| e.target_id).collect();
    targets.sort_unstable();
    targets.dedup();

    let mut unknown_sources = 0usize;
    let mut hits: Vec<Hit> = Vec::with_capacity(events.len());
    for e in events {
        let Ok(player) = players.binary_search(&e.source_id) else {
            unknown_sources += 1;
            continue;
        };
        let Ok(target) = targets.binary_search(&e.target_id) else {
            continue;
        };
        hits.push(Hit {
            player,
            target,
            bucket: layout.index_of(e.timestamp),
            amount: e.amount.unwrap_or(0),
        });
    }
    if unknown_sources > 0 {
        tracing::debug!("{} damage events from sources outside the roster", unknown_sources);
    }

    hits.sort_unstable_by_key(|h| (h.player, h.target));

    let mut by_target   = ByTarget::new();
    let mut all_targets = AllTargets::new();
    let mut combined    = BucketArena::new(layout.count);
    let mut per_target  = BucketArena::new(layout.count);

    for player_hits in hits.chunk_by(|a, b| a.player == b.player) {
        let player_id = players[player_hits[0].player];
        let name      = roster.get(player_id).map(|a| a.name.as_str()).unwrap_or_default();

        combined.reset();
        for h in player_hits {
            combined.record(h.bucket, h.amount);
        }
        all_targets.insert(player_id, combined.to_series(layout, player_id, name, None));

        for target_hits in player_hits.chunk_by(|a, b| a.target == b.target) {
            let target_id = targets[target_hits[0].target];
            per_target.reset();
            for h in target_hits {
                per_target.record(h.bucket, h.amount);
            }
            by_target
                .entry(target_id)
                .or_default()
                .insert(player_id, per_target.to_series(layout, player_id, name, Some(target_id)));
        }
    }

    // Roster players without a single qualifying hit still get a flat series
    let empty = BucketArena::new(layout.count);
    for player_id in players {
        if !all_targets.contains_key(&player_id) {
            let name = roster.get(player_id).map(|a| a.name.as_str()).unwrap_or_default();
            all_targets.insert(player_id, empty.to_series(layout, player_id, name, None));
        }
    }

    (by_target, all_targets)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;

    fn layout(start: i64, end: i64, width: i64) -> BucketLayout {
        BucketLayout::new(FightWindow::new(start, end), width, 100_000)
            .unwrap()
            .expect("non-empty window")
    }

    fn aggregate(layout: &BucketLayout, hits: &[(i64, u64)]) -> BucketArena {
        let mut arena = BucketArena::new(layout.count);
        for &(ts, amount) in hits {
            arena.record(layout.index_of(ts), amount);
        }
        arena
    }

    fn roster() -> Roster {
        let mut r = Roster::default();
        r.insert(1, "Stonebraid");
        r.insert(2, "Ashveil");
        r
    }

    #[test]
    fn bucket_count_is_ceiling() {
        assert_eq!(layout(0, 30_000, 1_000).count, 30);
        assert_eq!(layout(0, 30_001, 1_000).count, 31);
        assert_eq!(layout(0, 1, 1_000).count, 1);
    }

    #[test]
    fn rejects_non_positive_width() {
        let w = FightWindow::new(0, 1_000);
        assert!(matches!(BucketLayout::new(w, 0, 10), Err(EngineError::InvalidBucketWidth(0))));
        assert!(matches!(BucketLayout::new(w, -250, 10), Err(EngineError::InvalidBucketWidth(-250))));
    }

    #[test]
    fn rejects_runaway_bucket_counts() {
        let w = FightWindow::new(0, 10_000_000);
        assert!(matches!(BucketLayout::new(w, 1, 1_000), Err(EngineError::TooManyBuckets { .. })));
    }

    #[test]
    fn empty_window_has_no_layout() {
        assert!(BucketLayout::new(FightWindow::new(5_000, 5_000), 1_000, 10).unwrap().is_none());
        assert!(BucketLayout::new(FightWindow::new(5_000, 1_000), 1_000, 10).unwrap().is_none());
    }

    #[test]
    fn index_uses_floor_and_clamps() {
        let l = layout(10_000, 40_000, 1_000);
        assert_eq!(l.index_of(10_000), 0);
        assert_eq!(l.index_of(10_999), 0);
        assert_eq!(l.index_of(11_000), 1);
        assert_eq!(l.index_of(9_500), 0);   // before the pull
        assert_eq!(l.index_of(40_000), 29); // exactly at end
        assert_eq!(l.index_of(95_000), 29);
    }

    #[test]
    fn short_tail_bucket_uses_nominal_width_for_dps() {
        let l = layout(0, 30_001, 1_000);
        assert_eq!(l.count, 31);
        assert_eq!(l.bucket_start(30), 30_000);

        let s = aggregate(&l, &[(30_000, 2_000)]).to_series(&l, 1, "Stonebraid", None);
        assert_eq!(s.data_points[30].damage, 2_000);
        assert_eq!(s.data_points[30].dps, 2_000.0);
        assert_eq!(s.max_dps, 2_000.0);
        assert!((s.average_dps - 2_000.0 / 30.001).abs() < 1e-9);
    }

    #[test]
    fn reset_clears_every_bucket() {
        let l = layout(0, 3_000, 1_000);
        let mut arena = aggregate(&l, &[(100, 5), (2_100, 7)]);
        arena.reset();
        let s = arena.to_series(&l, 1, "x", None);
        assert_eq!((s.total_damage, s.total_events), (0, 0));
    }

    #[test]
    fn single_hit_series() {
        let l = layout(0, 30_000, 1_000);
        let arena = aggregate(&l, &[(500, 2_000)]);
        let s = arena.to_series(&l, 1, "Stonebraid", Some(42));

        assert_eq!(s.data_points.len(), 30);
        assert_eq!(s.data_points[0].damage, 2_000);
        assert!(s.data_points[1..].iter().all(|p| p.damage == 0));
        assert_eq!(s.total_damage, 2_000);
        assert_eq!(s.total_events, 1);
        assert!((s.average_dps - 66.666_666).abs() < 1e-3);
        assert_eq!(s.max_dps, 2_000.0);
        assert_eq!(s.data_points[3].timestamp, 3_000);
        assert_eq!(s.data_points[3].relative_time_sec, 3.0);
    }

    #[test]
    fn zero_events_gives_zeroes_not_nan() {
        let l = layout(0, 5_000, 1_000);
        let s = BucketArena::new(l.count).to_series(&l, 1, "x", None);
        assert_eq!(s.total_damage, 0);
        assert_eq!(s.average_dps, 0.0);
        assert_eq!(s.max_dps, 0.0);
        assert!(s.data_points.iter().all(|p| p.dps == 0.0));
    }

    #[test]
    fn views_agree_per_player() {
        let l = layout(0, 10_000, 1_000);
        let events = [
            CombatEvent::damage(100, 1, 42, 500),
            CombatEvent::damage(1_100, 1, 43, 700),
            CombatEvent::damage(9_999, 2, 42, 300),
            CombatEvent::damage(2_000, 1, 42, 50),
            CombatEvent::damage(2_000, 77, 42, 9_999), // not on the roster
        ];
        let refs: Vec<&CombatEvent> = events.iter().collect();
        let (by_target, all_targets) = player_target_series(&l, &roster(), &refs);

        assert_eq!(by_target[&42][&1].total_damage, 550);
        assert_eq!(by_target[&43][&1].total_damage, 700);
        assert_eq!(by_target[&42][&2].total_damage, 300);
        assert!(!by_target[&42].contains_key(&77));

        assert_eq!(all_targets[&1].total_damage, 1_250);
        assert_eq!(all_targets[&1].target_id, None);
        assert_eq!(all_targets[&2].total_damage, 300);
        assert_eq!(all_targets[&1].player_name, "Stonebraid");
        assert_eq!(by_target[&43][&1].target_id, Some(43));
    }

    #[test]
    fn idle_roster_players_get_flat_series() {
        let l = layout(0, 3_000, 1_000);
        let events = [CombatEvent::damage(100, 1, 42, 500)];
        let refs: Vec<&CombatEvent> = events.iter().collect();
        let (_, all_targets) = player_target_series(&l, &roster(), &refs);
        let idle = &all_targets[&2];
        assert_eq!(idle.data_points.len(), 3);
        assert_eq!(idle.total_damage, 0);
        assert_eq!(idle.player_name, "Ashveil");
    }
}
