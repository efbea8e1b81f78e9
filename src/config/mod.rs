//! Configuration module for the orchestrator
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. Environment variables (`DISMI_*`, highest priority)
//! 2. Configuration file (TOML)
//! 3. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use dismi::config::OrchestratorConfig;
//! use dismi::intent::IntentModel;
//!
//! // Load defaults
//! let config = OrchestratorConfig::default();
//! assert!(config.decomposition.bidirectional);
//!
//! // Parse from TOML
//! let toml = r#"
//! [decomposition]
//! intent_model = "aci_pp"
//! "#;
//! let config: OrchestratorConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.decomposition.intent_model, IntentModel::AciPp);
//! ```

pub mod decomposition;
pub mod error;
pub mod logging;

pub use decomposition::DecompositionConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};

pub use crate::recovery::RecoveryConfig;
pub use crate::store::StoreConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Decomposition mode and constraint selection
    pub decomposition: DecompositionConfig,
    /// Status store tuning
    pub store: StoreConfig,
    /// Failure recovery engine
    pub recovery: RecoveryConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl OrchestratorConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: p.to_path_buf(),
                    source,
                })?;
                toml::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: p.to_path_buf(),
                    source,
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("DISMI_BIDIRECTIONAL") {
            if let Some(b) = parse_flag(&v) {
                self.decomposition.bidirectional = b;
            }
        }
        if let Ok(v) = std::env::var("DISMI_UNIDIRECTIONAL") {
            if let Some(b) = parse_flag(&v) {
                self.decomposition.unidirectional = b;
            }
        }
        if let Ok(model) = std::env::var("DISMI_INTENT_MODEL") {
            if let Ok(m) = model.parse() {
                self.decomposition.intent_model = m;
            }
        }
        if let Ok(workers) = std::env::var("DISMI_RECOVERY_WORKERS") {
            if let Ok(n) = workers.parse() {
                self.recovery.worker_count = n;
            }
        }

        if let Ok(level) = std::env::var("DISMI_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("DISMI_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.decomposition;
        if !d.bidirectional && !d.unidirectional {
            return Err(ConfigError::invalid(
                "decomposition",
                "one of bidirectional or unidirectional must be enabled",
            ));
        }
        if d.submit_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "decomposition.submit_timeout_ms",
                "timeout must be non-zero",
            ));
        }
        if self.recovery.submit_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "recovery.submit_timeout_ms",
                "timeout must be non-zero",
            ));
        }
        if self.store.max_update_retries == 0 {
            return Err(ConfigError::invalid(
                "store.max_update_retries",
                "at least one attempt is required",
            ));
        }
        if self.recovery.worker_count == 0 {
            return Err(ConfigError::invalid(
                "recovery.worker_count",
                "worker count must be non-zero",
            ));
        }
        if self.recovery.batch_size == 0 {
            return Err(ConfigError::invalid(
                "recovery.batch_size",
                "batch size must be non-zero",
            ));
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
