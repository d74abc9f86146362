//! Engine tunables.

use ridelens_order::{NormalizerOptions, RecommendConfig};
use serde::{Deserialize, Serialize};

/// Externally-loadable pipeline and state-machine tunables.
///
/// Defaults match the currently-observed driver app and the original
/// deployment's thresholds; anything here may change without touching code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bounded queue capacity between the OS callbacks and the worker.
    pub queue_bound: usize,

    /// Suppression window for re-detections of the same fingerprint.
    pub min_redetect_ms: u64,

    /// Slack added past an order's expiry before the timeout fires, so a
    /// last-moment update still lands as an update.
    pub expiry_grace_ms: u64,

    /// Whether a new order may replace a still-pending one.
    pub supersede_pending: bool,

    /// Currency handling for fare parsing.
    pub normalizer: NormalizerOptions,

    /// Advisory accept/reject thresholds.
    pub recommend: RecommendConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_bound: 50,
            min_redetect_ms: 500,
            expiry_grace_ms: 250,
            supersede_pending: true,
            normalizer: NormalizerOptions::default(),
            recommend: RecommendConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON; absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
