/// Hard failures surfaced by the engine.
///
/// Only caller mistakes end up here. "Nothing to show" (no events, an empty
/// window, an empty interval lookup) is a normal outcome and yields empty
/// results, and a single bad event is skipped rather than reported.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("bucket width must be positive, got {0}ms")]
    InvalidBucketWidth(i64),

    #[error("fight of {duration_ms}ms at {bucket_ms}ms per bucket needs {requested} buckets (limit {limit})")]
    TooManyBuckets {
        duration_ms: i64,
        bucket_ms:   i64,
        requested:   u64,
        limit:       u64,
    },

    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidEpsilon { name: &'static str, value: f64 },

    #[error("payload is not a JSON {expected}: {source}")]
    MalformedPayload {
        expected: &'static str,
        #[source]
        source:   serde_json::Error,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
