//! Failure recovery for path-aware intents.
//!
//! Listens to topology events and, when a link or device fails, resubmits
//! every path-aware intent whose primary or backup path crosses it with
//! its paths cleared, so the intent framework computes new ones.

mod config;

pub use config::RecoveryConfig;

use crate::intent::{IntentKey, IntentService, IntentServiceError, LowLevelIntent};
use crate::topology::{FailedResource, TopologyEvent};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What one batch of topology events caused.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecoveryReport {
    /// Intents resubmitted for recomputation
    pub resubmitted: Vec<IntentKey>,
    /// Intents whose resubmission was refused or timed out
    pub failed: Vec<(IntentKey, IntentServiceError)>,
}

impl RecoveryReport {
    pub fn is_empty(&self) -> bool {
        self.resubmitted.is_empty() && self.failed.is_empty()
    }
}

/// Resubmits intents affected by topology failures.
pub struct FailureRecoveryEngine {
    intents: Arc<dyn IntentService>,
    config: RecoveryConfig,
}

impl FailureRecoveryEngine {
    pub fn new(intents: Arc<dyn IntentService>, config: RecoveryConfig) -> Self {
        Self { intents, config }
    }

    /// Handle a batch of topology events.
    ///
    /// Each affected intent is resubmitted once per batch even when several
    /// events hit it. Legacy intents carry no path and are never affected.
    pub async fn handle_events(&self, events: &[TopologyEvent]) -> RecoveryReport {
        let failures: Vec<FailedResource> =
            events.iter().filter_map(TopologyEvent::failure).collect();
        if failures.is_empty() {
            return RecoveryReport::default();
        }

        let affected = affected_intents(self.intents.get_intents().await, &failures);
        tracing::info!(
            failures = failures.len(),
            affected = affected.len(),
            "Topology failure detected"
        );

        let workers = self.config.worker_count.max(1);
        let timeout = self.config.submit_timeout();
        let results: Vec<(IntentKey, Result<(), IntentServiceError>)> =
            stream::iter(affected)
                .map(|intent| async move {
                    let key = intent.key.clone();
                    let result = tokio::time::timeout(
                        timeout,
                        self.intents.submit(intent.for_recomputation()),
                    )
                    .await
                    .unwrap_or_else(|_| Err(IntentServiceError::Timeout(key.clone())));
                    (key, result.map(|_| ()))
                })
                .buffer_unordered(workers)
                .collect()
                .await;

        let mut report = RecoveryReport::default();
        for (key, result) in results {
            match result {
                Ok(()) => {
                    metrics::counter!("dismi_recovery_resubmissions_total").increment(1);
                    tracing::debug!(intent_key = %key, "Intent resubmitted for recomputation");
                    report.resubmitted.push(key);
                }
                Err(e) => {
                    metrics::counter!("dismi_recovery_failures_total").increment(1);
                    tracing::warn!(intent_key = %key, error = %e, "Recovery resubmission refused");
                    report.failed.push((key, e));
                }
            }
        }
        report.resubmitted.sort();
        report.failed.sort_by(|a, b| a.0.cmp(&b.0));
        report
    }

    /// Run the engine over a channel of topology events until cancelled or
    /// until every sender is dropped.
    ///
    /// Events already queued are taken together, up to `batch_size`, so a
    /// burst of failures touching the same intent resubmits it once.
    pub fn start(
        self,
        mut events: mpsc::Receiver<TopologyEvent>,
        cancel_token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                enabled = self.config.enabled,
                worker_count = self.config.worker_count,
                "Failure recovery started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Failure recovery shutting down");
                        break;
                    }
                    received = events.recv() => {
                        let Some(first) = received else {
                            tracing::info!("Topology event channel closed");
                            break;
                        };
                        let mut batch = vec![first];
                        while batch.len() < self.config.batch_size.max(1) {
                            match events.try_recv() {
                                Ok(event) => batch.push(event),
                                Err(_) => break,
                            }
                        }

                        if !self.config.enabled {
                            tracing::debug!(dropped = batch.len(), "Recovery disabled, dropping events");
                            continue;
                        }
                        let report = self.handle_events(&batch).await;
                        tracing::debug!(
                            events = batch.len(),
                            resubmitted = report.resubmitted.len(),
                            failed = report.failed.len(),
                            "Recovery batch completed"
                        );
                    }
                }
            }
        })
    }
}

/// Path-aware intents whose primary or backup path any failure breaks, in
/// snapshot order without duplicates.
fn affected_intents(
    intents: Vec<LowLevelIntent>,
    failures: &[FailedResource],
) -> Vec<LowLevelIntent> {
    let mut seen = HashSet::new();
    intents
        .into_iter()
        .filter(|intent| {
            intent.as_path_aware().is_some_and(|p| {
                failures
                    .iter()
                    .any(|failure| p.uses(|link| failure.breaks(link)))
            })
        })
        .filter(|intent| seen.insert(intent.key.clone()))
        .collect()
}
