//! Decomposition settings

use crate::intent::IntentModel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Controls how service requests turn into low-level intents.
///
/// Passed explicitly to every decomposition so runs with different settings
/// can coexist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompositionConfig {
    /// One intent covers both directions of a connection
    pub bidirectional: bool,
    /// Each direction gets its own intent; ignored while `bidirectional` is set
    pub unidirectional: bool,
    /// Low-level intent representation
    pub intent_model: IntentModel,
    /// Rank of the bandwidth constraint to keep (0 = highest)
    pub bandwidth_level: usize,
    /// Rank of the latency constraint to keep (0 = lowest)
    pub delay_level: usize,
    pub security_level: usize,
    /// Priority stamped on submitted intents
    pub intent_priority: u16,
    /// Upper bound for one submission round-trip
    pub submit_timeout_ms: u64,
}

impl DecompositionConfig {
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            bidirectional: true,
            unidirectional: false,
            intent_model: IntentModel::Legacy,
            bandwidth_level: 0,
            delay_level: 0,
            security_level: 0,
            intent_priority: 100,
            submit_timeout_ms: 5_000,
        }
    }
}
