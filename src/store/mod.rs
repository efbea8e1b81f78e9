//! ACI key status store.
//!
//! Maps each service to the status records of the low-level intents it was
//! decomposed into, and keeps a secondary index from intent key to the
//! submitted intent.

mod backend;
mod config;
mod error;
mod status;

pub use backend::*;
pub use config::*;
pub use error::*;
pub use status::*;

use crate::abstraction::AbstractionLink;
use crate::intent::{IntentKey, IntentStatus, LowLevelIntent, ServiceId};

/// Persistent service-to-status mapping.
///
/// Reads return snapshots and may be slightly stale. Every write to a
/// service goes through a conditional replace on the backend, retried up to
/// `max_update_retries` times, so concurrent decomposition and recovery
/// never lose each other's updates.
///
/// # Examples
///
/// ```
/// use dismi::intent::{ApplicationId, IntentKey, IntentStatus, ServiceId};
/// use dismi::store::{AciIntentKeyStatus, AciKeyStatusStore};
///
/// let store = AciKeyStatusStore::default();
/// let service = ServiceId::new("svc-1").unwrap();
/// let key = IntentKey::for_service(&ApplicationId::new(1, "dismi"), &service, 1);
///
/// store
///     .update_key(&service, AciIntentKeyStatus::new(key.clone(), IntentStatus::InstallReq, vec![], false))
///     .unwrap();
/// store
///     .update_key(&service, AciIntentKeyStatus::new(key, IntentStatus::Installed, vec![], true))
///     .unwrap();
///
/// let record = store.get_keys(&service);
/// assert_eq!(record.len(), 1);
/// ```
pub struct AciKeyStatusStore {
    services: Box<dyn VersionedMap<ServiceId, ServiceRecord>>,
    intents: Box<dyn VersionedMap<IntentKey, LowLevelIntent>>,
    config: StoreConfig,
}

impl AciKeyStatusStore {
    /// Create a store over in-memory backends.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_backends(
            Box::new(InMemoryMap::new()),
            Box::new(InMemoryMap::new()),
            config,
        )
    }

    /// Create a store over caller-provided backends.
    pub fn with_backends(
        services: Box<dyn VersionedMap<ServiceId, ServiceRecord>>,
        intents: Box<dyn VersionedMap<IntentKey, LowLevelIntent>>,
        config: StoreConfig,
    ) -> Self {
        Self {
            services,
            intents,
            config,
        }
    }

    /// Snapshot of the records for `service_id`.
    ///
    /// An unknown service gets an empty record created for it.
    pub fn get_keys(&self, service_id: &ServiceId) -> ServiceRecord {
        self.services
            .insert_if_absent(service_id.clone(), ServiceRecord::new())
            .value
    }

    /// Snapshot of the records for `service_id`, without creating one.
    pub fn find_keys(&self, service_id: &ServiceId) -> Option<ServiceRecord> {
        self.services.get(service_id).map(|v| v.value)
    }

    /// Replace the whole record.
    pub fn put(&self, service_id: &ServiceId, record: ServiceRecord) {
        self.services.put(service_id.clone(), record);
    }

    /// Upsert one status record by intent key.
    ///
    /// Returns the record as written.
    pub fn update_key(
        &self,
        service_id: &ServiceId,
        status: AciIntentKeyStatus,
    ) -> Result<ServiceRecord, StoreError> {
        self.modify(service_id, true, |record| record.upsert(status.clone()))
            .map(|written| written.unwrap_or_default())
    }

    /// Upsert one status record, only if the service is still known.
    ///
    /// Returns `None` when the service record was removed, so late status
    /// updates for withdrawn services leave no trace.
    pub fn update_key_if_present(
        &self,
        service_id: &ServiceId,
        status: AciIntentKeyStatus,
    ) -> Result<Option<ServiceRecord>, StoreError> {
        self.modify(service_id, false, |record| record.upsert(status.clone()))
    }

    /// Replace the candidate links of one intent, keeping its status.
    ///
    /// A key without a record yet gets one in `InstallReq`.
    pub fn update_abstract_link_list(
        &self,
        service_id: &ServiceId,
        key: &IntentKey,
        links: Vec<AbstractionLink>,
    ) -> Result<ServiceRecord, StoreError> {
        self.modify(service_id, true, |record| {
            let next = match record.get(key) {
                Some(existing) => existing.with_links(links.clone()),
                None => AciIntentKeyStatus::new(
                    key.clone(),
                    IntentStatus::InstallReq,
                    links.clone(),
                    false,
                ),
            };
            record.upsert(next);
        })
        .map(|written| written.unwrap_or_default())
    }

    /// Delete the service record. Returns whether one existed.
    pub fn remove_service(&self, service_id: &ServiceId) -> bool {
        let removed = self.services.remove(service_id).is_some();
        if removed {
            tracing::info!(service_id = %service_id, "Service record removed");
        }
        removed
    }

    /// Snapshot of all known service ids.
    pub fn list_service_ids(&self) -> Vec<ServiceId> {
        self.services.keys()
    }

    /// Index a submitted intent by its key.
    pub fn add_key_intent(&self, key: IntentKey, intent: LowLevelIntent) {
        self.intents.put(key, intent);
    }

    pub fn get_key_intent(&self, key: &IntentKey) -> Option<LowLevelIntent> {
        self.intents.get(key).map(|v| v.value)
    }

    pub fn remove_intent_key(&self, key: &IntentKey) -> Option<LowLevelIntent> {
        self.intents.remove(key)
    }

    /// The service whose record holds `key`, if any.
    pub fn find_service_id(&self, key: &IntentKey) -> Option<ServiceId> {
        self.services
            .entries()
            .into_iter()
            .find(|(_, record)| record.contains_key(key))
            .map(|(id, _)| id)
    }

    /// Read-modify-write on one service record via conditional replace.
    ///
    /// With `create` false an absent record is left absent and `Ok(None)`
    /// is returned.
    fn modify<F>(
        &self,
        service_id: &ServiceId,
        create: bool,
        mut apply: F,
    ) -> Result<Option<ServiceRecord>, StoreError>
    where
        F: FnMut(&mut ServiceRecord),
    {
        for attempt in 1..=self.config.max_update_retries {
            let current = if create {
                self.services
                    .insert_if_absent(service_id.clone(), ServiceRecord::new())
            } else {
                match self.services.get(service_id) {
                    Some(current) => current,
                    None => return Ok(None),
                }
            };

            let mut next = current.value;
            apply(&mut next);

            if self
                .services
                .replace(service_id, current.version, next.clone())
            {
                return Ok(Some(next));
            }

            metrics::counter!("dismi_store_retries_total").increment(1);
            tracing::debug!(
                service_id = %service_id,
                attempt,
                "Lost store update race, retrying"
            );
        }

        tracing::error!(
            service_id = %service_id,
            attempts = self.config.max_update_retries,
            "Store update retries exhausted"
        );
        Err(StoreError::TransientFailure {
            service_id: service_id.clone(),
            attempts: self.config.max_update_retries,
        })
    }
}

impl Default for AciKeyStatusStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}
