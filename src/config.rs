/// Analysis configuration, optionally persisted as TOML next to the caller's
/// other settings.
///
///   bucket_size_ms   = 1000
///   target_filter    = [5, 9]
///   merge_epsilon_ms = 1e-5
///   dedup_epsilon    = 1e-5
///   max_buckets      = 100000
///
/// Every field has a default, so an empty file (or no file) is a valid config.
/// `validate()` holds the fail-fast checks; the engine calls it before doing
/// any work.
use crate::{
    error::{EngineError, EngineResult},
    filter::TargetFilter,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "analysis.toml";

// ---------------------------------------------------------------------------
// AnalysisConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Width of one damage bucket in milliseconds.
    #[serde(default = "default_bucket_size_ms")]
    pub bucket_size_ms: i64,

    /// Target ids to restrict both damage and uptime analysis to (empty = all)
    #[serde(default)]
    pub target_filter: TargetFilter,

    #[serde(default = "default_epsilon")]
    pub merge_epsilon_ms: f64,

    #[serde(default = "default_epsilon")]
    pub dedup_epsilon: f64,

    /// Ceiling on buckets per series; a request above it is treated as a caller bug.
    #[serde(default = "default_max_buckets")]
    pub max_buckets: u64,
}

fn default_bucket_size_ms() -> i64 { 1_000 }
fn default_epsilon() -> f64 { 1e-5 }
fn default_max_buckets() -> u64 { 100_000 }

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bucket_size_ms:   default_bucket_size_ms(),
            target_filter:    TargetFilter::unrestricted(),
            merge_epsilon_ms: default_epsilon(),
            dedup_epsilon:    default_epsilon(),
            max_buckets:      default_max_buckets(),
        }
    }
}

impl AnalysisConfig {
    pub fn with_bucket_size(mut self, bucket_size_ms: i64) -> Self {
        self.bucket_size_ms = bucket_size_ms;
        self
    }

    pub fn with_targets(mut self, targets: impl IntoIterator<Item = i64>) -> Self {
        self.target_filter = TargetFilter::from_ids(targets);
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.bucket_size_ms <= 0 {
            return Err(EngineError::InvalidBucketWidth(self.bucket_size_ms));
        }
        for (name, value) in [("merge_epsilon_ms", self.merge_epsilon_ms), ("dedup_epsilon", self.dedup_epsilon)] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidEpsilon { name, value });
            }
        }
        Ok(())
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| anyhow::anyhow!("Config parse error: {}", e))
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

pub fn load_or_default(config_dir: &Path) -> Result<AnalysisConfig> {
    let path = config_dir.join(CONFIG_FILE);
    if path.exists() {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let cfg = AnalysisConfig::from_toml_str(&raw)?;
        tracing::debug!("Loaded analysis config from {:?}", path);
        Ok(cfg)
    } else {
        Ok(AnalysisConfig::default())
    }
}

pub fn save(config: &AnalysisConfig, config_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(config_dir)?;
    let raw = toml::to_string_pretty(config)
        .map_err(|e| anyhow::anyhow!("Config serialize error: {}", e))?;
    std::fs::write(config_dir.join(CONFIG_FILE), raw)?;
    Ok(())
}
