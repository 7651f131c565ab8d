/// Aggregation orchestrator: the entry point for one analysis request.
///
/// Damage:  events -> filter -> bucket layout -> per (target, player) and
///          per player series.
/// Uptime:  per tracked ability, intervals -> normalize -> merge -> step
///          timeline + summary.
///
/// Every function here is a pure function of its arguments. Callers that
/// recompute on every UI change should put `cache::AnalysisCache` (or the
/// `worker`) in front of it.
use crate::{
    buckets::{player_target_series, BucketLayout},
    config::AnalysisConfig,
    error::EngineResult,
    filter::{classify_damage, FilterStats, Verdict},
    model::{
        AbilityCatalog, CombatEvent, DamageOverTimeResult, FightAnalysis, FightWindow, IntervalLookup,
        Roster, SeriesMetadata, UptimeTimelineSeries,
    },
    uptime::{merge::merge, normalize::normalize, summary::summarize, timeline::build_steps, UptimeContext},
};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Immutable snapshot of everything one analysis needs.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    pub window:    FightWindow,
    pub roster:    &'a Roster,
    pub events:    &'a [CombatEvent],
    pub intervals: &'a IntervalLookup,
    pub abilities: &'a AbilityCatalog,
}

// ---------------------------------------------------------------------------
// Damage over time
// ---------------------------------------------------------------------------

pub fn damage_over_time(
    window: FightWindow,
    roster: &Roster,
    events: &[CombatEvent],
    config: &AnalysisConfig,
) -> EngineResult<DamageOverTimeResult> {
    config.validate()?;

    let Some(layout) = BucketLayout::new(window, config.bucket_size_ms, config.max_buckets)? else {
        tracing::debug!("Fight window {:?} has no duration, nothing to bucket", window);
        return Ok(DamageOverTimeResult::empty(window, config.bucket_size_ms));
    };

    let mut stats = FilterStats::default();
    let qualifying: Vec<&CombatEvent> = events
        .iter()
        .filter(|e| {
            let verdict = classify_damage(e, &config.target_filter);
            stats.record(verdict);
            verdict == Verdict::Keep
        })
        .collect();

    let (by_target, all_targets) = player_target_series(&layout, roster, &qualifying);

    tracing::debug!(
        "Damage over time: {} events ({} kept, {} rejected), {} buckets of {}ms, {} players, {} targets",
        events.len(),
        stats.kept,
        stats.rejected(),
        layout.count,
        layout.width_ms,
        all_targets.len(),
        by_target.len(),
    );

    Ok(DamageOverTimeResult {
        fight_start_time: window.start_time,
        fight_end_time:   window.end_time,
        fight_duration:   window.duration_ms(),
        bucket_size_ms:   config.bucket_size_ms,
        by_target,
        all_targets,
    })
}

// ---------------------------------------------------------------------------
// Uptime timelines
// ---------------------------------------------------------------------------

pub fn uptime_timelines(
    window:    FightWindow,
    intervals: &IntervalLookup,
    abilities: &AbilityCatalog,
    config:    &AnalysisConfig,
) -> EngineResult<Vec<UptimeTimelineSeries>> {
    config.validate()?;
    if window.is_empty() {
        return Ok(Vec::new());
    }

    let ctx = UptimeContext {
        merge_epsilon_ms: config.merge_epsilon_ms,
        dedup_epsilon:    config.dedup_epsilon,
        ..UptimeContext::new(window, &config.target_filter)
    };

    let mut series = Vec::with_capacity(intervals.len());
    for (&ability_id, raw) in intervals {
        let normalized = normalize(raw, ctx.window, ctx.targets);
        if normalized.is_empty() {
            continue;
        }

        let merged  = merge(&normalized, ctx.merge_epsilon_ms);
        let points  = build_steps(&merged, ctx.window, ctx.dedup_epsilon);
        let summary = summarize(&normalized, &merged, ctx.window, ctx.merge_epsilon_ms);

        let info  = abilities.get(&ability_id);
        let label = info
            .and_then(|i| i.name.clone())
            .unwrap_or_else(|| format!("Ability {}", ability_id));

        series.push(UptimeTimelineSeries {
            id: format!("{}-uptime", ability_id),
            ability_id,
            label,
            points,
            metadata: SeriesMetadata {
                hostility: info.map(|i| i.hostility).unwrap_or_default(),
                summary,
            },
        });
    }

    tracing::debug!("Uptime timelines: {} of {} abilities active in window", series.len(), intervals.len());
    Ok(series)
}

// ---------------------------------------------------------------------------
// Both
// ---------------------------------------------------------------------------

pub fn analyze(input: &AnalysisInput<'_>, config: &AnalysisConfig) -> EngineResult<FightAnalysis> {
    Ok(FightAnalysis {
        damage:  damage_over_time(input.window, input.roster, input.events, config)?,
        uptimes: uptime_timelines(input.window, input.intervals, input.abilities, config)?,
    })
}
