//! Configuration for the status store.

use serde::{Deserialize, Serialize};

/// Store tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Conditional-replace attempts before an update gives up
    pub max_update_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_update_retries: 16,
        }
    }
}
