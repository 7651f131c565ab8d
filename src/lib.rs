pub mod buckets;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod model;
pub mod parser;
pub mod uptime;
pub mod worker;

pub use config::AnalysisConfig;
pub use engine::{analyze, damage_over_time, uptime_timelines, AnalysisInput};
pub use error::{EngineError, EngineResult};
pub use filter::TargetFilter;
pub use model::*;

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

/// Install a global `tracing` subscriber for hosts that have none of their own.
///
/// With a `log_dir`, output goes to a daily rolling `timeline.log` in that
/// directory (no ANSI colours); otherwise to stderr. `RUST_LOG` overrides the
/// default `fight_timeline=info` directive.
///
/// Keep the returned guard alive for the lifetime of the process; dropping it
/// flushes and stops the background log writer. Returns `None` without
/// touching anything if a global subscriber is already installed.
pub fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fight_timeline=info"));

    let (writer, guard) = match log_dir {
        Some(dir) => {
            if let Err(e) = std::fs::create_dir_all(dir) {
                eprintln!("fight_timeline: cannot create log dir {}: {}", dir.display(), e);
                return None;
            }
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "timeline.log"))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(log_dir.is_none())
        .try_init()
        .ok()?;

    tracing::info!("fight_timeline logging initialised");
    Some(guard)
}
