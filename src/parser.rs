/// Decodes the log service's JSON payloads into typed engine inputs.
///
/// Two payload shapes are accepted:
///
///   damage events    [ { "timestamp": 1500, "sourceID": 1, "targetID": 42,
///                        "amount": 3210, "sourceIsFriendly": true,
///                        "targetIsFriendly": false, ... }, ... ]
///
///   interval lookup  { "61665": [ { "start": 1000, "end": 5000, "targetID": 42 }, ... ],
///                      ... }
///
/// Decoding is tolerant at entry granularity: an entry with a missing or
/// mistyped required field is skipped and counted, it never blanks the rest
/// of the batch. Only a payload whose top level has the wrong shape is an error.
use crate::{
    error::{EngineError, EngineResult},
    model::{AbilityId, CombatEvent, EventKind, IntervalLookup, RawInterval},
};
use serde_json::{Map, Value};

/// Accepted/skipped counters for one decoded payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub accepted: usize,
    pub skipped:  usize,
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn get_i64(obj: &Map<String, Value>, key: &str) -> Option<i64> {
    let v = obj.get(key)?;
    v.as_i64().or_else(|| {
        // Timestamps occasionally arrive as whole floats ("1500.0")
        let f = v.as_f64()?;
        (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
    })
}

fn get_bool(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    obj.get(key)?.as_bool()
}

/// Damage amounts must be finite and non-negative; fractional values are rounded.
fn parse_amount(v: &Value) -> Option<u64> {
    if let Some(n) = v.as_u64() {
        return Some(n);
    }
    let f = v.as_f64()?;
    (f.is_finite() && f >= 0.0).then(|| f.round() as u64)
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Decode a single event object. `None` means the entry is malformed.
pub fn decode_event(v: &Value) -> Option<CombatEvent> {
    let obj = v.as_object()?;

    let timestamp          = get_i64(obj, "timestamp")?;
    let source_id          = get_i64(obj, "sourceID")?;
    let target_id          = get_i64(obj, "targetID")?;
    let source_is_friendly = get_bool(obj, "sourceIsFriendly")?;
    let target_is_friendly = get_bool(obj, "targetIsFriendly")?;

    let kind = match obj.get("type") {
        None           => EventKind::Damage,
        Some(raw_kind) => serde_json::from_value(raw_kind.clone()).ok()?,
    };

    // An amount that is present but unusable makes the entry malformed;
    // an absent one is legal (non-damage events).
    let amount = match obj.get("amount") {
        None | Some(Value::Null) => None,
        Some(raw)                => Some(parse_amount(raw)?),
    };

    let ability_id = obj
        .get("abilityGameID")
        .and_then(Value::as_u64)
        .and_then(|id| AbilityId::try_from(id).ok());

    Some(CombatEvent {
        timestamp,
        source_id,
        target_id,
        kind,
        amount,
        source_is_friendly,
        target_is_friendly,
        ability_id,
    })
}

pub fn parse_damage_events(json: &str) -> EngineResult<(Vec<CombatEvent>, ParseStats)> {
    let entries: Vec<Value> = serde_json::from_str(json)
        .map_err(|source| EngineError::MalformedPayload { expected: "array", source })?;

    let mut stats  = ParseStats::default();
    let mut events = Vec::with_capacity(entries.len());

    for (idx, entry) in entries.iter().enumerate() {
        match decode_event(entry) {
            Some(e) => {
                stats.accepted += 1;
                events.push(e);
            }
            None => {
                stats.skipped += 1;
                tracing::trace!("Skipping malformed event at index {}", idx);
            }
        }
    }

    if stats.skipped > 0 {
        tracing::warn!("Skipped {} malformed events of {}", stats.skipped, entries.len());
    }
    Ok((events, stats))
}

// ---------------------------------------------------------------------------
// Interval lookup
// ---------------------------------------------------------------------------

fn decode_interval(ability_id: AbilityId, v: &Value) -> Option<RawInterval> {
    let obj = v.as_object()?;
    Some(RawInterval {
        ability_id,
        target_id: get_i64(obj, "targetID")?,
        start:     get_i64(obj, "start")?,
        end:       get_i64(obj, "end")?,
    })
}

pub fn parse_interval_lookup(json: &str) -> EngineResult<(IntervalLookup, ParseStats)> {
    let root: Map<String, Value> = serde_json::from_str(json)
        .map_err(|source| EngineError::MalformedPayload { expected: "object", source })?;

    let mut stats  = ParseStats::default();
    let mut lookup = IntervalLookup::new();

    for (key, list) in &root {
        let Ok(ability_id) = key.parse::<AbilityId>() else {
            tracing::warn!("Skipping interval list with non-numeric ability key '{}'", key);
            stats.skipped += list.as_array().map_or(1, Vec::len);
            continue;
        };
        let Some(items) = list.as_array() else {
            stats.skipped += 1;
            continue;
        };

        let bucket = lookup.entry(ability_id).or_default();
        for item in items {
            match decode_interval(ability_id, item) {
                Some(iv) => {
                    stats.accepted += 1;
                    bucket.push(iv);
                }
                None => stats.skipped += 1,
            }
        }
    }

    if stats.skipped > 0 {
        tracing::warn!("Skipped {} malformed interval entries", stats.skipped);
    }
    Ok((lookup, stats))
}
