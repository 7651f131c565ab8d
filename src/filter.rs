/// Event qualification: the first stage of every analysis.
///
/// Damage: an event counts iff it is a damage event with an amount, dealt by a
/// friendly source to a non-friendly target (friendly fire is excluded), and its
/// target passes the optional target filter.
///
/// Buffs/debuffs: hostility and source/target matching is done by whoever pairs
/// apply/remove events into `RawInterval`s. That filtering must already have
/// happened when intervals reach `uptime::normalize`; the only check applied
/// here is the target filter.
use crate::model::{ActorId, CombatEvent, EventKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Target filter
// ---------------------------------------------------------------------------

/// Set of target ids to restrict analysis to. Empty means unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetFilter {
    ids: BTreeSet<ActorId>,
}

impl TargetFilter {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: impl IntoIterator<Item = ActorId>) -> Self {
        Self { ids: ids.into_iter().collect() }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn allows(&self, target_id: ActorId) -> bool {
        self.ids.is_empty() || self.ids.contains(&target_id)
    }

    /// Ids in ascending order; used as part of cache keys.
    pub fn ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.ids.iter().copied()
    }
}

// ---------------------------------------------------------------------------
// Damage qualification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    NotDamage,
    MissingAmount,
    FriendlyFire,
    HostileSource,
    FilteredTarget,
}

pub fn classify_damage(event: &CombatEvent, targets: &TargetFilter) -> Verdict {
    if event.kind != EventKind::Damage {
        return Verdict::NotDamage;
    }
    if event.amount.is_none() {
        return Verdict::MissingAmount;
    }
    if !event.source_is_friendly {
        return Verdict::HostileSource;
    }
    if event.target_is_friendly {
        return Verdict::FriendlyFire;
    }
    if !targets.allows(event.target_id) {
        return Verdict::FilteredTarget;
    }
    Verdict::Keep
}

/// Counters kept while classifying one batch, reported at debug level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub kept:            usize,
    pub not_damage:      usize,
    pub missing_amount:  usize,
    pub friendly_fire:   usize,
    pub hostile_source:  usize,
    pub filtered_target: usize,
}

impl FilterStats {
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Keep           => self.kept += 1,
            Verdict::NotDamage      => self.not_damage += 1,
            Verdict::MissingAmount  => self.missing_amount += 1,
            Verdict::FriendlyFire   => self.friendly_fire += 1,
            Verdict::HostileSource  => self.hostile_source += 1,
            Verdict::FilteredTarget => self.filtered_target += 1,
        }
    }

    pub fn rejected(&self) -> usize {
        self.not_damage + self.missing_amount + self.friendly_fire + self.hostile_source + self.filtered_target
    }
}
