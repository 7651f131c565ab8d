/// Shared data model: engine inputs (fight window, roster, events, intervals)
/// and the result structures handed to the rendering layer.
///
/// Everything that crosses the library boundary is serialised camelCase so the
/// JSON matches what the charting front end already consumes.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type ActorId   = i64;
pub type AbilityId = u32;

// ---------------------------------------------------------------------------
// Fight window
// ---------------------------------------------------------------------------

/// One encounter, `[start_time, end_time)` in absolute milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FightWindow {
    pub start_time: i64,
    pub end_time:   i64,
}

impl FightWindow {
    pub fn new(start_time: i64, end_time: i64) -> Self {
        Self { start_time, end_time }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_time.saturating_sub(self.start_time)
    }

    /// A window with no positive duration has nothing to show.
    pub fn is_empty(&self) -> bool {
        self.duration_ms() <= 0
    }

    /// Seconds elapsed between fight start and `timestamp_ms`.
    pub fn relative_secs(&self, timestamp_ms: i64) -> f64 {
        (timestamp_ms - self.start_time) as f64 / 1_000.0
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id:   ActorId,
    pub name: String,
}

/// Players of the fight, used only to label output series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    actors: BTreeMap<ActorId, Actor>,
}

impl Roster {
    pub fn insert(&mut self, id: ActorId, name: impl Into<String>) {
        self.actors.insert(id, Actor { id, name: name.into() });
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Player ids in ascending order.
    pub fn ids(&self) -> Vec<ActorId> {
        self.actors.keys().copied().collect()
    }
}

// ---------------------------------------------------------------------------
// Combat events
// ---------------------------------------------------------------------------

/// Event type as reported by the log service. Payloads that omit the type
/// come from the damage-only query, hence the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    #[default]
    Damage,
    Heal,
    ApplyBuff,
    RemoveBuff,
    ApplyDebuff,
    RemoveDebuff,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatEvent {
    pub timestamp:          i64,
    #[serde(rename = "sourceID")]
    pub source_id:          ActorId,
    #[serde(rename = "targetID")]
    pub target_id:          ActorId,
    #[serde(rename = "type", default)]
    pub kind:               EventKind,
    #[serde(default)]
    pub amount:             Option<u64>,
    pub source_is_friendly: bool,
    pub target_is_friendly: bool,
    #[serde(rename = "abilityGameID", default)]
    pub ability_id:         Option<AbilityId>,
}

impl CombatEvent {
    /// Friendly-to-hostile damage event, the common case for the aggregator.
    pub fn damage(timestamp: i64, source_id: ActorId, target_id: ActorId, amount: u64) -> Self {
        Self {
            timestamp,
            source_id,
            target_id,
            kind:               EventKind::Damage,
            amount:             Some(amount),
            source_is_friendly: true,
            target_is_friendly: false,
            ability_id:         None,
        }
    }
}

// ---------------------------------------------------------------------------
// Buff / debuff intervals
// ---------------------------------------------------------------------------

/// One paired apply/remove window as delivered by the upstream lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInterval {
    pub ability_id: AbilityId,
    #[serde(rename = "targetID")]
    pub target_id:  ActorId,
    pub start:      i64,
    pub end:        i64,
}

/// A raw interval clipped into the fight window; always `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedInterval {
    pub ability_id: AbilityId,
    pub target_id:  ActorId,
    pub start:      i64,
    pub end:        i64,
}

/// Union window: "at least one application was active".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedInterval {
    pub start: i64,
    pub end:   i64,
}

impl MergedInterval {
    pub fn length_ms(&self) -> i64 {
        self.end - self.start
    }
}

/// `abilityId -> intervals`, as produced by the apply/remove pairing upstream.
pub type IntervalLookup = BTreeMap<AbilityId, Vec<RawInterval>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hostility {
    /// Applied by friendly actors.
    #[default]
    Buff,
    /// Applied to hostile actors.
    Debuff,
}

/// Display information for a tracked ability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityInfo {
    pub name:      Option<String>,
    #[serde(default)]
    pub hostility: Hostility,
}

pub type AbilityCatalog = BTreeMap<AbilityId, AbilityInfo>;

// ---------------------------------------------------------------------------
// Damage-over-time output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    pub timestamp:         i64,
    pub relative_time_sec: f64,
    pub damage:            u64,
    pub event_count:       u32,
    /// Bucket damage over the bucket's own width.
    pub dps:               f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSeries {
    pub player_id:    ActorId,
    pub player_name:  String,
    /// `None` for the all-targets view.
    pub target_id:    Option<ActorId>,
    pub data_points:  Vec<DataPoint>,
    pub total_damage: u64,
    pub total_events: u64,
    pub average_dps:  f64,
    pub max_dps:      f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageOverTimeResult {
    pub fight_start_time: i64,
    pub fight_end_time:   i64,
    pub fight_duration:   i64,
    pub bucket_size_ms:   i64,
    pub by_target:        BTreeMap<ActorId, BTreeMap<ActorId, PlayerSeries>>,
    pub all_targets:      BTreeMap<ActorId, PlayerSeries>,
}

impl DamageOverTimeResult {
    pub fn empty(window: FightWindow, bucket_size_ms: i64) -> Self {
        Self {
            fight_start_time: window.start_time,
            fight_end_time:   window.end_time,
            fight_duration:   window.duration_ms().max(0),
            bucket_size_ms,
            by_target:        BTreeMap::new(),
            all_targets:      BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Uptime output
// ---------------------------------------------------------------------------

/// One vertex of a 0/1 step chart; `x` in seconds from fight start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetUptime {
    pub uptime_ms:         i64,
    pub uptime_percentage: f64,
    pub applications:      u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeSummary {
    pub total_uptime_ms:                  i64,
    pub uptime_seconds:                   f64,
    pub uptime_percentage:                f64,
    pub applications:                     u32,
    pub target_count:                     u32,
    pub average_target_uptime_percentage: f64,
    pub by_target:                        BTreeMap<ActorId, TargetUptime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesMetadata {
    pub hostility: Hostility,
    #[serde(flatten)]
    pub summary:   UptimeSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeTimelineSeries {
    pub id:         String,
    pub ability_id: AbilityId,
    pub label:      String,
    pub points:     Vec<TimelinePoint>,
    pub metadata:   SeriesMetadata,
}

/// Both result structures for one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FightAnalysis {
    pub damage:  DamageOverTimeResult,
    pub uptimes: Vec<UptimeTimelineSeries>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_duration_and_relative_time() {
        let w = FightWindow::new(10_000, 40_000);
        assert_eq!(w.duration_ms(), 30_000);
        assert!(!w.is_empty());
        assert!((w.relative_secs(12_500) - 2.5).abs() < 1e-12);
        assert!(FightWindow::new(5, 5).is_empty());
        assert!(FightWindow::new(9, 5).is_empty());
    }

    #[test]
    fn event_deserializes_service_field_names() {
        let json = r#"{"timestamp":1500,"sourceID":1,"targetID":42,"type":"damage",
                       "amount":3210,"sourceIsFriendly":true,"targetIsFriendly":false,
                       "abilityGameID":61665}"#;
        let e: CombatEvent = serde_json::from_str(json).unwrap();
        assert_eq!(e.source_id, 1);
        assert_eq!(e.target_id, 42);
        assert_eq!(e.amount, Some(3210));
        assert_eq!(e.ability_id, Some(61665));
        assert_eq!(e.kind, EventKind::Damage);
    }

    #[test]
    fn unknown_event_type_maps_to_other() {
        let json = r#"{"timestamp":0,"sourceID":1,"targetID":2,"type":"cast",
                       "sourceIsFriendly":true,"targetIsFriendly":false}"#;
        let e: CombatEvent = serde_json::from_str(json).unwrap();
        assert_eq!(e.kind, EventKind::Other);
        assert_eq!(e.amount, None);
    }

    #[test]
    fn all_targets_series_serializes_null_target() {
        let s = PlayerSeries {
            player_id:    7,
            player_name:  "Stonebraid".into(),
            target_id:    None,
            data_points:  vec![],
            total_damage: 0,
            total_events: 0,
            average_dps:  0.0,
            max_dps:      0.0,
        };
        let v = serde_json::to_value(&s).unwrap();
        assert!(v["targetId"].is_null());
        assert_eq!(v["playerName"], "Stonebraid");
    }
}
