use crate::endpoint::ConnectionPoint;
use crate::intent::{IntentKey, IntentStatus, ServiceId};
use serde::{Deserialize, Serialize};

/// Kind of decomposition requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationType {
    /// First decomposition of a service
    Create,
    /// Re-decomposition; stale intents from the previous request are withdrawn
    Update,
    /// Withdraw everything the service installed
    Delete,
}

/// What happened to one derived intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IntentOutcome {
    /// Accepted by the intent service; `status` was recorded in the store
    Submitted { key: IntentKey, status: IntentStatus },
    /// Every candidate link was refused; recorded as FAILED
    Rejected { key: IntentKey, reason: String },
    /// A connection point resolved to no usable endpoint; nothing recorded
    EndpointNotFound { key: IntentKey, point: ConnectionPoint },
    /// Withdrawal requested
    Withdrawn { key: IntentKey },
    /// The intent service refused the withdrawal
    WithdrawFailed { key: IntentKey, reason: String },
}

impl IntentOutcome {
    pub fn key(&self) -> &IntentKey {
        match self {
            IntentOutcome::Submitted { key, .. }
            | IntentOutcome::Rejected { key, .. }
            | IntentOutcome::EndpointNotFound { key, .. }
            | IntentOutcome::Withdrawn { key }
            | IntentOutcome::WithdrawFailed { key, .. } => key,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            IntentOutcome::Rejected { .. }
                | IntentOutcome::EndpointNotFound { .. }
                | IntentOutcome::WithdrawFailed { .. }
        )
    }
}

/// Result of one decomposition run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionReport {
    pub service_id: ServiceId,
    pub validation: ValidationType,
    pub outcomes: Vec<IntentOutcome>,
    /// Issues recorded while expanding the action
    pub issues: Vec<String>,
}

impl DecompositionReport {
    pub(crate) fn new(service_id: ServiceId, validation: ValidationType) -> Self {
        Self {
            service_id,
            validation,
            outcomes: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn submitted_keys(&self) -> Vec<&IntentKey> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, IntentOutcome::Submitted { .. }))
            .map(IntentOutcome::key)
            .collect()
    }

    pub fn withdrawn_keys(&self) -> Vec<&IntentKey> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, IntentOutcome::Withdrawn { .. }))
            .map(IntentOutcome::key)
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &IntentOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}
