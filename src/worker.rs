/// Background analysis task: keeps the (possibly large) computation off the
/// caller's thread and delivers only the newest result.
///
/// Every submitted request is stamped with a generation number. The worker
/// skips requests that were superseded while queued, runs the rest under
/// `spawn_blocking`, and drops any result whose generation is no longer the
/// latest by the time it is ready (last result wins). Inputs travel as `Arc`
/// snapshots, so nothing is shared mutably and nothing needs locking.
///
/// Results go through an `AnalysisCache` owned by the worker task.
use crate::{
    cache::{AnalysisCache, CacheKey},
    config::AnalysisConfig,
    engine::{analyze, AnalysisInput},
    error::EngineResult,
    model::{AbilityCatalog, CombatEvent, FightAnalysis, FightWindow, IntervalLookup, Roster},
};
use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Immutable snapshot of one analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Caller-chosen identity of the event set (cache key component).
    pub event_set: u64,
    pub window:    FightWindow,
    pub roster:    Arc<Roster>,
    pub events:    Arc<[CombatEvent]>,
    pub intervals: Arc<IntervalLookup>,
    pub abilities: Arc<AbilityCatalog>,
    pub config:    AnalysisConfig,
}

impl AnalysisRequest {
    fn input(&self) -> AnalysisInput<'_> {
        AnalysisInput {
            window:    self.window,
            roster:    &self.roster,
            events:    &self.events,
            intervals: &self.intervals,
            abilities: &self.abilities,
        }
    }
}

#[derive(Debug)]
pub struct AnalysisOutcome {
    pub generation: u64,
    pub event_set:  u64,
    /// True when the result came straight from the cache.
    pub cached:     bool,
    pub result:     EngineResult<Arc<FightAnalysis>>,
}

/// Cheap, cloneable submission side of the worker.
#[derive(Debug, Clone)]
pub struct AnalysisHandle {
    tx:     Sender<(u64, AnalysisRequest)>,
    latest: Arc<AtomicU64>,
}

impl AnalysisHandle {
    /// Queue a request, superseding everything submitted before it.
    /// Returns its generation, or `None` if the worker has shut down.
    pub async fn submit(&self, request: AnalysisRequest) -> Option<u64> {
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        self.tx.send((generation, request)).await.ok()?;
        Some(generation)
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }
}

// ---------------------------------------------------------------------------
// Worker task
// ---------------------------------------------------------------------------

const QUEUE_DEPTH: usize = 16;

/// Start the worker on the current tokio runtime.
pub fn spawn(cache_capacity: usize) -> (AnalysisHandle, Receiver<AnalysisOutcome>, JoinHandle<Result<()>>) {
    let (req_tx, req_rx) = mpsc::channel(QUEUE_DEPTH);
    let (out_tx, out_rx) = mpsc::channel(QUEUE_DEPTH);
    let latest = Arc::new(AtomicU64::new(0));

    let handle = AnalysisHandle { tx: req_tx, latest: Arc::clone(&latest) };
    let task   = tokio::spawn(run(req_rx, out_tx, latest, AnalysisCache::new(cache_capacity)));
    (handle, out_rx, task)
}

async fn run(
    mut req_rx: Receiver<(u64, AnalysisRequest)>,
    out_tx:     Sender<AnalysisOutcome>,
    latest:     Arc<AtomicU64>,
    mut cache:  AnalysisCache,
) -> Result<()> {
    let is_current = |generation: u64| generation == latest.load(Ordering::Acquire);

    while let Some((generation, request)) = req_rx.recv().await {
        if !is_current(generation) {
            tracing::debug!("Analysis #{} superseded before it started", generation);
            continue;
        }

        let event_set = request.event_set;
        let key       = CacheKey::new(event_set, request.window, &request.config);

        let (result, cached) = match cache.get(&key) {
            Some(hit) => (Ok(hit), true),
            None => {
                let joined = tokio::task::spawn_blocking(move || analyze(&request.input(), &request.config)).await;
                match joined {
                    Ok(computed) => (computed.map(|a| cache.insert(key, a)), false),
                    Err(e) => {
                        tracing::error!("Analysis #{} panicked: {}", generation, e);
                        continue;
                    }
                }
            }
        };

        if !is_current(generation) {
            tracing::debug!("Dropping stale analysis #{}", generation);
            continue;
        }

        if let Err(e) = &result {
            tracing::warn!("Analysis #{} rejected: {}", generation, e);
        }

        let outcome = AnalysisOutcome { generation, event_set, cached, result };
        if out_tx.send(outcome).await.is_err() {
            break; // Receiver gone, nobody is waiting for results
        }
    }
    Ok(())
}
