//! Configuration for failure recovery.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Failure recovery tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Whether topology failures trigger resubmission
    pub enabled: bool,
    /// Resubmissions in flight at once
    pub worker_count: usize,
    /// Most queued topology events handled as one batch
    pub batch_size: usize,
    /// How long one resubmission may take before it counts as failed
    pub submit_timeout_ms: u64,
}

impl RecoveryConfig {
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            worker_count: 4,
            batch_size: 64,
            submit_timeout_ms: 5_000,
        }
    }
}
