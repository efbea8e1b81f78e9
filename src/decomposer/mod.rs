//! Intent decomposition.
//!
//! Turns a declarative [`ServiceRequest`] into low-level intent submissions:
//! the action is expanded into legs, each leg's connection points are
//! resolved to endpoints, the candidate links between them are tried in
//! order, and every attempt is recorded in the [`AciKeyStatusStore`].

mod error;
mod plan;
mod report;
#[cfg(test)]
mod tests;

pub use error::*;
pub use report::*;

use crate::abstraction::{possible_links, AbstractionLink};
use crate::action::{ServiceRequest, Tracker};
use crate::config::DecompositionConfig;
use crate::constraint::{Constraint, ConstraintSelector};
use crate::endpoint::{ConnectionPoint, EndPoint, EndpointRegistry};
use crate::intent::{
    ApplicationId, IntentKey, IntentService, IntentServiceError, IntentStatus, LowLevelIntent,
    ServiceId, Submission,
};
use crate::store::{AciIntentKeyStatus, AciKeyStatusStore};
use plan::{plan, Leg};
use std::collections::HashSet;
use std::sync::Arc;

/// Decomposes service requests into low-level intents.
pub struct IntentDecomposer {
    app: ApplicationId,
    endpoints: Arc<dyn EndpointRegistry>,
    intents: Arc<dyn IntentService>,
    store: Arc<AciKeyStatusStore>,
}

impl IntentDecomposer {
    pub fn new(
        app: ApplicationId,
        endpoints: Arc<dyn EndpointRegistry>,
        intents: Arc<dyn IntentService>,
        store: Arc<AciKeyStatusStore>,
    ) -> Self {
        Self {
            app,
            endpoints,
            intents,
            store,
        }
    }

    /// Decompose `request` for `service_id`.
    ///
    /// `Create` and `Update` submit one intent per leg, keyed
    /// `"<service>-<n>"`; resubmitting an existing key replaces that intent.
    /// `Update` then withdraws keys that `previous` or the stored record
    /// hold but the new request no longer produces. `Delete` withdraws every
    /// key the service is known to own.
    ///
    /// Problems with individual intents do not stop their siblings and are
    /// reported as [`IntentOutcome`]s. Only configuration and store failures
    /// abort the run.
    pub async fn decompose(
        &self,
        service_id: &ServiceId,
        request: &ServiceRequest,
        previous: Option<&ServiceRequest>,
        validation: ValidationType,
        config: &DecompositionConfig,
    ) -> Result<DecompositionReport, DecomposeError> {
        if !config.bidirectional && !config.unidirectional {
            return Err(DecomposeError::NoDirectionality);
        }

        let mut tracker = Tracker::new();
        let legs = plan(&request.action, config, &mut tracker);
        let keys = self.keys_for(service_id, legs.len());
        let mut report = DecompositionReport::new(service_id.clone(), validation);

        tracing::info!(
            service_id = %service_id,
            validation = ?validation,
            legs = legs.len(),
            model = ?config.intent_model,
            "Decomposing service"
        );

        match validation {
            ValidationType::Create | ValidationType::Update => {
                let mut used = HashSet::new();
                for (leg, key) in legs.iter().zip(&keys) {
                    let outcome = self
                        .realize(service_id, key, leg, request, config, &mut used, &mut tracker)
                        .await?;
                    report.outcomes.push(outcome);
                }

                if validation == ValidationType::Update {
                    let previous_keys = previous
                        .map(|p| self.planned_keys(service_id, p, config))
                        .unwrap_or_default();
                    let stale: Vec<_> = self
                        .owned_keys(service_id, previous_keys)
                        .into_iter()
                        .filter(|k| !keys.contains(k))
                        .collect();
                    for key in stale {
                        report.outcomes.push(self.withdraw(service_id, &key, config).await?);
                    }
                }
            }
            ValidationType::Delete => {
                let mut candidates = keys;
                if let Some(p) = previous {
                    candidates.extend(self.planned_keys(service_id, p, config));
                }
                for key in self.owned_keys(service_id, candidates) {
                    report.outcomes.push(self.withdraw(service_id, &key, config).await?);
                }
            }
        }

        report.issues = tracker.issues().to_vec();
        tracing::info!(
            service_id = %service_id,
            outcomes = report.outcomes.len(),
            failures = report.failures().count(),
            "Service decomposition finished"
        );
        Ok(report)
    }

    fn keys_for(&self, service_id: &ServiceId, count: usize) -> Vec<IntentKey> {
        (1..=count)
            .map(|n| IntentKey::for_service(&self.app, service_id, n))
            .collect()
    }

    /// Keys `request` would produce under `config`, without side effects.
    fn planned_keys(
        &self,
        service_id: &ServiceId,
        request: &ServiceRequest,
        config: &DecompositionConfig,
    ) -> Vec<IntentKey> {
        let legs = plan(&request.action, config, &mut Tracker::new());
        self.keys_for(service_id, legs.len())
    }

    /// Stored keys of the service followed by `extra`, without duplicates.
    fn owned_keys(&self, service_id: &ServiceId, extra: Vec<IntentKey>) -> Vec<IntentKey> {
        let mut seen = HashSet::new();
        self.store
            .get_keys(service_id)
            .keys()
            .cloned()
            .chain(extra)
            .filter(|k| seen.insert(k.clone()))
            .collect()
    }

    /// Submit one leg, trying candidate links until one is accepted.
    #[allow(clippy::too_many_arguments)]
    async fn realize(
        &self,
        service_id: &ServiceId,
        key: &IntentKey,
        leg: &Leg,
        request: &ServiceRequest,
        config: &DecompositionConfig,
        used: &mut HashSet<EndPoint>,
        tracker: &mut Tracker,
    ) -> Result<IntentOutcome, DecomposeError> {
        let Some(src) = self.resolve(&leg.source.point).await else {
            tracker.record_issue(format!("{}: no endpoint for {}", key, leg.source.point));
            return Ok(IntentOutcome::EndpointNotFound {
                key: key.clone(),
                point: leg.source.point.clone(),
            });
        };
        let Some(dst) = self.resolve(&leg.destination.point).await else {
            tracker.record_issue(format!("{}: no endpoint for {}", key, leg.destination.point));
            return Ok(IntentOutcome::EndpointNotFound {
                key: key.clone(),
                point: leg.destination.point.clone(),
            });
        };

        // Links over endpoints taken earlier in this run go last
        let (fresh, reused): (Vec<_>, Vec<_>) = possible_links(&src, &dst)
            .into_iter()
            .partition(|link| !is_taken(link, leg.bidirectional, used));
        let candidates: Vec<AbstractionLink> = fresh.into_iter().chain(reused).collect();

        let mut constraints = ConstraintSelector::new(
            &leg.source.constraints,
            &leg.destination.constraints,
            &request.constraints,
        )
        .select(
            config.bandwidth_level,
            config.delay_level,
            config.security_level,
        );
        if request.negotiable {
            constraints.push(Constraint::Negotiable);
        }

        let mut last_error = String::from("no usable candidate link");
        for (i, link) in candidates.iter().enumerate() {
            let Some(intent) = LowLevelIntent::from_link(
                key.clone(),
                link,
                config.intent_model,
                constraints.clone(),
                config.intent_priority,
            ) else {
                continue;
            };

            match self.submit(intent.clone(), config).await {
                Ok(submission) => {
                    let status = match submission {
                        Submission::Accepted => IntentStatus::InstallReq,
                        Submission::Negotiating => IntentStatus::NegotiationReq,
                    };
                    let remaining = candidates[i + 1..].to_vec();
                    self.store.update_key(
                        service_id,
                        AciIntentKeyStatus::new(key.clone(), status, remaining, false),
                    )?;
                    self.store.add_key_intent(key.clone(), intent);
                    take(link, leg.bidirectional, used);

                    metrics::counter!("dismi_intents_submitted_total", "reason" => "decomposition")
                        .increment(1);
                    tracing::debug!(
                        service_id = %service_id,
                        intent_key = %key,
                        link = %link,
                        status = %status,
                        "Intent submitted"
                    );
                    return Ok(IntentOutcome::Submitted {
                        key: key.clone(),
                        status,
                    });
                }
                Err(e) => {
                    metrics::counter!("dismi_intents_rejected_total").increment(1);
                    tracing::warn!(
                        service_id = %service_id,
                        intent_key = %key,
                        link = %link,
                        error = %e,
                        "Intent submission refused"
                    );
                    last_error = e.to_string();
                }
            }
        }

        self.store.update_key(
            service_id,
            AciIntentKeyStatus::new(key.clone(), IntentStatus::Failed, Vec::new(), false),
        )?;
        Ok(IntentOutcome::Rejected {
            key: key.clone(),
            reason: last_error,
        })
    }

    async fn submit(
        &self,
        intent: LowLevelIntent,
        config: &DecompositionConfig,
    ) -> Result<Submission, IntentServiceError> {
        let key = intent.key.clone();
        tokio::time::timeout(config.submit_timeout(), self.intents.submit(intent))
            .await
            .unwrap_or(Err(IntentServiceError::Timeout(key)))
    }

    /// Addressable endpoints behind `point`, or `None` if there are none.
    async fn resolve(&self, point: &ConnectionPoint) -> Option<Vec<EndPoint>> {
        let endpoints = match self.endpoints.resolve(point).await {
            Ok(endpoints) => endpoints,
            Err(e) => {
                tracing::warn!(connection_point = %point, error = %e, "Endpoint resolution failed");
                return None;
            }
        };
        let usable: Vec<_> = endpoints
            .into_iter()
            .filter(EndPoint::is_addressable)
            .collect();
        if usable.is_empty() {
            tracing::warn!(connection_point = %point, "No addressable endpoint found");
            return None;
        }
        Some(usable)
    }

    async fn withdraw(
        &self,
        service_id: &ServiceId,
        key: &IntentKey,
        config: &DecompositionConfig,
    ) -> Result<IntentOutcome, DecomposeError> {
        let withdrawn = tokio::time::timeout(config.submit_timeout(), self.intents.withdraw(key))
            .await
            .unwrap_or_else(|_| Err(IntentServiceError::Timeout(key.clone())));

        // An intent the framework never accepted will report no WITHDRAWN
        // event, so it is marked withdrawn right away.
        let status = match withdrawn {
            Ok(()) => IntentStatus::WithdrawReq,
            Err(IntentServiceError::NotFound(_)) => IntentStatus::Withdrawn,
            Err(e) => {
                tracing::warn!(intent_key = %key, error = %e, "Withdrawal refused");
                return Ok(IntentOutcome::WithdrawFailed {
                    key: key.clone(),
                    reason: e.to_string(),
                });
            }
        };

        self.store.remove_intent_key(key);
        if let Some(entry) = self.store.get_keys(service_id).get(key) {
            self.store
                .update_key(service_id, entry.with_status(status))?;
        }
        tracing::debug!(service_id = %service_id, intent_key = %key, "Intent withdrawn");
        Ok(IntentOutcome::Withdrawn { key: key.clone() })
    }
}

fn is_taken(link: &AbstractionLink, bidirectional: bool, used: &HashSet<EndPoint>) -> bool {
    used.contains(&link.dst) || (bidirectional && used.contains(&link.src))
}

fn take(link: &AbstractionLink, bidirectional: bool, used: &mut HashSet<EndPoint>) {
    used.insert(link.dst.clone());
    if bidirectional {
        used.insert(link.src.clone());
    }
}
