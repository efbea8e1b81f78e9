//! Service-level lifecycle aggregation.
//!
//! Each intent status event is folded into the owning service's record and
//! the resulting set of statuses is reduced to one [`ServiceFsmEvent`].

mod aggregate;

pub use aggregate::*;

use crate::intent::{
    IntentKey, IntentService, IntentServiceError, IntentStatus, LowLevelIntent, ServiceId,
    Submission,
};
use crate::store::{AciIntentKeyStatus, AciKeyStatusStore, ServiceRecord, StoreError};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Drives service lifecycle from low-level intent events.
pub struct ServiceStateHandler {
    store: Arc<AciKeyStatusStore>,
    intents: Arc<dyn IntentService>,
    submit_timeout: Duration,
}

impl ServiceStateHandler {
    pub fn new(store: Arc<AciKeyStatusStore>, intents: Arc<dyn IntentService>) -> Self {
        Self {
            store,
            intents,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
        }
    }

    /// Bound how long a fallback resubmission may wait for the intent
    /// framework. A submission that runs out of time counts as refused.
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    /// Decide the service event that `key` moving to `new_status` would cause.
    ///
    /// Pure over a snapshot of the service record; nothing is persisted,
    /// not even an empty record for an unknown service.
    pub fn next_service_event(
        &self,
        service_id: &ServiceId,
        key: &IntentKey,
        new_status: IntentStatus,
        is_calculated: bool,
    ) -> ServiceFsmEvent {
        let mut record = self.store.find_keys(service_id).unwrap_or_default();
        let next = match record.get(key) {
            Some(existing) => existing.with_status(new_status),
            None => AciIntentKeyStatus::new(key.clone(), new_status, Vec::new(), false),
        };
        record.upsert(next);
        aggregate(&record, is_calculated)
    }

    /// Apply a status event reported by the intent framework.
    ///
    /// Returns `None` when the intent belongs to no known service, which
    /// covers intents installed by someone else and services already
    /// removed. A failed intent that still has untried candidate links is
    /// resubmitted over the next one instead of failing the service.
    pub async fn handle_intent_event(
        &self,
        intent: &LowLevelIntent,
        status: IntentStatus,
    ) -> Result<Option<ServiceFsmEvent>, StoreError> {
        let Some(service_id) = self.store.find_service_id(&intent.key) else {
            tracing::debug!(
                intent_key = %intent.key,
                status = %status,
                "Ignoring event for intent not owned by any service"
            );
            return Ok(None);
        };

        let Some(record) = self.store.find_keys(&service_id) else {
            return Ok(None);
        };
        let mut current = record.get(&intent.key).cloned().unwrap_or_else(|| {
            AciIntentKeyStatus::new(intent.key.clone(), status, Vec::new(), false)
        });

        if status == IntentStatus::Failed && !current.abstraction_links().is_empty() {
            let resubmitted = self
                .resubmit_over_next_link(&service_id, intent, &current)
                .await?;
            if let Some(record) = resubmitted {
                let remaining = record
                    .get(&intent.key)
                    .map_or(0, |e| e.abstraction_links().len());
                tracing::info!(
                    service_id = %service_id,
                    intent_key = %intent.key,
                    remaining,
                    "Failed intent resubmitted over alternative link"
                );
                return Ok(Some(ServiceFsmEvent::SubmitForInstallation));
            }
            current = current.with_links(Vec::new());
        }

        let next = current
            .with_status(status)
            .with_calculated(intent.is_calculated());
        let Some(written) = self.store.update_key_if_present(&service_id, next)? else {
            return Ok(None);
        };

        let event = aggregate(&written, intent.is_calculated());
        tracing::debug!(
            service_id = %service_id,
            intent_key = %intent.key,
            status = %status,
            event = ?event,
            "Service event decided"
        );
        Ok(Some(event))
    }

    /// Try the remaining candidate links in order until one is accepted.
    ///
    /// Returns the written record on success, or `None` once every
    /// candidate was refused.
    async fn resubmit_over_next_link(
        &self,
        service_id: &ServiceId,
        intent: &LowLevelIntent,
        current: &AciIntentKeyStatus,
    ) -> Result<Option<ServiceRecord>, StoreError> {
        let mut remaining = current.abstraction_links().to_vec();

        while !remaining.is_empty() {
            let link = remaining.remove(0);
            let Some(candidate) = intent.rebuild_over(&link) else {
                continue;
            };

            let submitted = tokio::time::timeout(
                self.submit_timeout,
                self.intents.submit(candidate.clone()),
            )
            .await
            .unwrap_or_else(|_| Err(IntentServiceError::Timeout(intent.key.clone())));
            match submitted {
                Ok(submission) => {
                    let status = match submission {
                        Submission::Accepted => IntentStatus::InstallReq,
                        Submission::Negotiating => IntentStatus::NegotiationReq,
                    };
                    metrics::counter!("dismi_intents_submitted_total", "reason" => "fallback")
                        .increment(1);
                    self.store.add_key_intent(intent.key.clone(), candidate);
                    let next = current
                        .with_status(status)
                        .with_links(remaining)
                        .with_calculated(false);
                    return self.store.update_key_if_present(service_id, next);
                }
                Err(e) => {
                    metrics::counter!("dismi_intents_rejected_total").increment(1);
                    tracing::warn!(
                        intent_key = %intent.key,
                        link = %link,
                        error = %e,
                        "Alternative link rejected"
                    );
                }
            }
        }

        Ok(None)
    }
}
