//! Shared test utilities for DISMI integration tests.
//!
//! Wires the decomposer, state handler and recovery engine over the
//! in-memory collaborators, and provides endpoint and topology builders.

#![allow(dead_code)]

use dismi::config::{DecompositionConfig, RecoveryConfig};
use dismi::decomposer::IntentDecomposer;
use dismi::endpoint::{ConnectionPoint, EndPoint, InMemoryEndpointRegistry};
use dismi::intent::{
    ApplicationId, InMemoryIntentService, IntentKey, IntentModel, IntentPayload, IntentService,
    LowLevelIntent, ServiceId,
};
use dismi::recovery::FailureRecoveryEngine;
use dismi::state::ServiceStateHandler;
use dismi::store::AciKeyStatusStore;
use dismi::topology::{ConnectPoint, Link, NetworkPath};
use std::sync::Arc;

// =============================================================================
// Identifiers
// =============================================================================

pub fn app() -> ApplicationId {
    ApplicationId::new(7, "org.dismi.it")
}

pub fn service(id: &str) -> ServiceId {
    ServiceId::new(id).unwrap()
}

pub fn key(service_id: &str, n: usize) -> IntentKey {
    IntentKey::for_service(&app(), &service(service_id), n)
}

// =============================================================================
// Endpoints and topology
// =============================================================================

pub fn ip(prefix: &str, device: &str, port: u32) -> EndPoint {
    EndPoint::ip(prefix.parse().unwrap(), device, port)
}

/// Registry with connection points "a" and "b" behind one host each.
pub fn two_host_registry() -> Arc<InMemoryEndpointRegistry> {
    let registry = InMemoryEndpointRegistry::new();
    registry.register(
        ConnectionPoint::new("a"),
        vec![ip("192.168.1.2/32", "null:1", 1)],
    );
    registry.register(
        ConnectionPoint::new("b"),
        vec![ip("192.168.1.3/32", "null:2", 1)],
    );
    Arc::new(registry)
}

pub fn link(src: &str, src_port: u32, dst: &str, dst_port: u32) -> Link {
    Link::new(ConnectPoint::new(src, src_port), ConnectPoint::new(dst, dst_port))
}

pub fn decomposition_config(bidirectional: bool, model: IntentModel) -> DecompositionConfig {
    DecompositionConfig {
        bidirectional,
        unidirectional: !bidirectional,
        intent_model: model,
        ..DecompositionConfig::default()
    }
}

// =============================================================================
// Harness
// =============================================================================

/// Every component wired over one store and one in-memory intent service.
pub struct Harness {
    pub endpoints: Arc<InMemoryEndpointRegistry>,
    pub intents: Arc<InMemoryIntentService>,
    pub store: Arc<AciKeyStatusStore>,
    pub decomposer: IntentDecomposer,
    pub state: ServiceStateHandler,
}

impl Harness {
    pub fn new(endpoints: Arc<InMemoryEndpointRegistry>) -> Self {
        let intents = Arc::new(InMemoryIntentService::new());
        let store = Arc::new(AciKeyStatusStore::default());
        Self {
            decomposer: IntentDecomposer::new(
                app(),
                endpoints.clone(),
                intents.clone(),
                Arc::clone(&store),
            ),
            state: ServiceStateHandler::new(Arc::clone(&store), intents.clone()),
            endpoints,
            intents,
            store,
        }
    }

    pub fn recovery(&self, config: RecoveryConfig) -> FailureRecoveryEngine {
        FailureRecoveryEngine::new(self.intents.clone(), config)
    }

    /// Play the intent framework computing `path` for a path-aware intent.
    ///
    /// Returns the intent as now installed.
    pub async fn compute_path(&self, key: &IntentKey, path: Vec<Link>) -> LowLevelIntent {
        let mut intent = self.intents.get_intent(key).await.unwrap();
        if let IntentPayload::PathAware(p) = &mut intent.payload {
            p.path = Some(NetworkPath::new(path));
            p.calculated = true;
        }
        self.intents.insert(intent.clone());
        intent
    }
}
