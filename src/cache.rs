/// Explicitly keyed memo layer in front of `engine::analyze`.
///
/// A result depends only on the event set, the fight window, the bucket width
/// and the target filter (plus the epsilons, which rarely change), so those
/// form the key. The event set is identified by an opaque id chosen by the
/// caller, typically a report/fight fetch generation; the cache never hashes
/// event contents itself.
///
/// Eviction is oldest-inserted-first once `capacity` entries are held. Errors
/// are never cached.
use crate::{
    config::AnalysisConfig,
    engine::{analyze, AnalysisInput},
    error::EngineResult,
    filter::TargetFilter,
    model::{FightAnalysis, FightWindow},
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub event_set:      u64,
    pub window:         FightWindow,
    pub bucket_size_ms: i64,
    pub targets:        TargetFilter,
    merge_eps_bits:     u64,
    dedup_eps_bits:     u64,
}

impl CacheKey {
    pub fn new(event_set: u64, window: FightWindow, config: &AnalysisConfig) -> Self {
        Self {
            event_set,
            window,
            bucket_size_ms: config.bucket_size_ms,
            targets:        config.target_filter.clone(),
            merge_eps_bits: config.merge_epsilon_ms.to_bits(),
            dedup_eps_bits: config.dedup_epsilon.to_bits(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits:   u64,
    pub misses: u64,
}

#[derive(Debug)]
pub struct AnalysisCache {
    capacity: usize,
    entries:  HashMap<CacheKey, Arc<FightAnalysis>>,
    order:    VecDeque<CacheKey>,
    stats:    CacheStats,
}

impl AnalysisCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries:  HashMap::new(),
            order:    VecDeque::new(),
            stats:    CacheStats::default(),
        }
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<FightAnalysis>> {
        let found = self.entries.get(key).cloned();
        if found.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        found
    }

    pub fn insert(&mut self, key: CacheKey, value: FightAnalysis) -> Arc<FightAnalysis> {
        let value = Arc::new(value);
        if self.entries.insert(key.clone(), Arc::clone(&value)).is_none() {
            self.order.push_back(key);
        }
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else { break };
            self.entries.remove(&oldest);
        }
        value
    }

    /// Return the cached analysis for `key`, computing and storing it on a miss.
    pub fn get_or_analyze(
        &mut self,
        key:    CacheKey,
        input:  &AnalysisInput<'_>,
        config: &AnalysisConfig,
    ) -> EngineResult<Arc<FightAnalysis>> {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let fresh = analyze(input, config)?;
        Ok(self.insert(key, fresh))
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
