pub mod merge;
pub mod normalize;
pub mod summary;
pub mod timeline;

use crate::{
    filter::TargetFilter,
    model::{FightWindow, MergedInterval, NormalizedInterval},
};

/// Adjacency tolerance for merging, in milliseconds. Timestamps are whole
/// milliseconds, so in practice intervals merge when they touch or overlap.
pub const DEFAULT_MERGE_EPSILON_MS: f64 = 1e-5;

/// Tolerance for collapsing consecutive timeline points.
pub const DEFAULT_DEDUP_EPSILON: f64 = 1e-5;

/// Read-only inputs shared by every stage of the uptime pipeline.
pub struct UptimeContext<'a> {
    pub window:           FightWindow,
    pub targets:          &'a TargetFilter,
    pub merge_epsilon_ms: f64,
    pub dedup_epsilon:    f64,
}

impl<'a> UptimeContext<'a> {
    pub fn new(window: FightWindow, targets: &'a TargetFilter) -> Self {
        Self {
            window,
            targets,
            merge_epsilon_ms: DEFAULT_MERGE_EPSILON_MS,
            dedup_epsilon:    DEFAULT_DEDUP_EPSILON,
        }
    }
}

/// Anything with a `[start, end]` extent in absolute milliseconds.
pub trait Span {
    fn start(&self) -> i64;
    fn end(&self) -> i64;
}

impl Span for NormalizedInterval {
    fn start(&self) -> i64 { self.start }
    fn end(&self) -> i64 { self.end }
}

impl Span for MergedInterval {
    fn start(&self) -> i64 { self.start }
    fn end(&self) -> i64 { self.end }
}
