use super::*;
use crate::action::{Action, Connection, Mesh, Path, Subject};
use crate::endpoint::{InMemoryEndpointRegistry, IpPrefix};
use crate::intent::{InMemoryIntentService, IntentModel, IntentPayload};
use async_trait::async_trait;
use dashmap::DashSet;
use std::time::Duration;

fn app() -> ApplicationId {
    ApplicationId::new(1, "org.dismi.test")
}

fn service() -> ServiceId {
    ServiceId::new("svc").unwrap()
}

fn key(n: usize) -> IntentKey {
    IntentKey::for_service(&app(), &service(), n)
}

fn ip(prefix: &str, device: &str) -> EndPoint {
    EndPoint::ip(prefix.parse().unwrap(), device, 1)
}

fn registry() -> Arc<InMemoryEndpointRegistry> {
    let registry = InMemoryEndpointRegistry::new();
    registry.register(ConnectionPoint::new("a"), vec![ip("192.168.1.2/32", "null:1")]);
    registry.register(ConnectionPoint::new("b"), vec![ip("192.168.1.3/32", "null:2")]);
    Arc::new(registry)
}

fn config(bidirectional: bool, model: IntentModel) -> DecompositionConfig {
    DecompositionConfig {
        bidirectional,
        unidirectional: !bidirectional,
        intent_model: model,
        ..DecompositionConfig::default()
    }
}

fn connection(src: &str, dst: &str) -> ServiceRequest {
    ServiceRequest::new(Action::Connection(Connection::new(
        Subject::new(src),
        Subject::new(dst),
    )))
}

fn path(src: &str, dst: &str) -> ServiceRequest {
    ServiceRequest::new(Action::Path(Path::new(Subject::new(src), Subject::new(dst))))
}

struct Fixture {
    decomposer: IntentDecomposer,
    intents: Arc<InMemoryIntentService>,
    store: Arc<AciKeyStatusStore>,
}

fn fixture(endpoints: Arc<InMemoryEndpointRegistry>) -> Fixture {
    let intents = Arc::new(InMemoryIntentService::new());
    let store = Arc::new(AciKeyStatusStore::default());
    Fixture {
        decomposer: IntentDecomposer::new(app(), endpoints, intents.clone(), Arc::clone(&store)),
        intents,
        store,
    }
}

/// Refuses every intent whose destination is one of `refused`.
#[derive(Default)]
struct DestinationFilter {
    refused: DashSet<IpPrefix>,
    inner: InMemoryIntentService,
}

#[async_trait]
impl IntentService for DestinationFilter {
    async fn submit(&self, intent: LowLevelIntent) -> Result<Submission, IntentServiceError> {
        if intent
            .selector
            .ip_dst
            .is_some_and(|dst| self.refused.contains(&dst))
        {
            return Err(IntentServiceError::Rejected {
                key: intent.key,
                reason: "no capacity".to_string(),
            });
        }
        self.inner.submit(intent).await
    }

    async fn withdraw(&self, key: &IntentKey) -> Result<(), IntentServiceError> {
        self.inner.withdraw(key).await
    }

    async fn get_intent(&self, key: &IntentKey) -> Option<LowLevelIntent> {
        self.inner.get_intent(key).await
    }

    async fn get_intents(&self) -> Vec<LowLevelIntent> {
        self.inner.get_intents().await
    }
}

/// Never answers within any reasonable timeout.
struct Stalled;

#[async_trait]
impl IntentService for Stalled {
    async fn submit(&self, _intent: LowLevelIntent) -> Result<Submission, IntentServiceError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Submission::Accepted)
    }

    async fn withdraw(&self, _key: &IntentKey) -> Result<(), IntentServiceError> {
        futures::future::pending().await
    }

    async fn get_intent(&self, _key: &IntentKey) -> Option<LowLevelIntent> {
        None
    }

    async fn get_intents(&self) -> Vec<LowLevelIntent> {
        Vec::new()
    }
}

// ============================================================================
// Intent counts per action and mode
// ============================================================================

async fn intent_count(request: ServiceRequest, bidirectional: bool, model: IntentModel) -> usize {
    let f = fixture(registry());
    let report = f
        .decomposer
        .decompose(
            &service(),
            &request,
            None,
            ValidationType::Create,
            &config(bidirectional, model),
        )
        .await
        .unwrap();
    assert!(!report.has_failures(), "{report:?}");
    f.intents.intent_count()
}

#[tokio::test]
async fn test_connection_bidirectional_legacy_one_intent() {
    assert_eq!(intent_count(connection("a", "b"), true, IntentModel::Legacy).await, 1);
}

#[tokio::test]
async fn test_connection_unidirectional_legacy_two_intents() {
    assert_eq!(intent_count(connection("a", "b"), false, IntentModel::Legacy).await, 2);
}

#[tokio::test]
async fn test_connection_unidirectional_path_aware_two_intents() {
    assert_eq!(intent_count(connection("a", "b"), false, IntentModel::AciPp).await, 2);
}

#[tokio::test]
async fn test_connection_bidirectional_path_aware_one_intent() {
    assert_eq!(intent_count(connection("a", "b"), true, IntentModel::AciPp).await, 1);
}

#[tokio::test]
async fn test_path_bidirectional_legacy_one_intent() {
    assert_eq!(intent_count(path("a", "b"), true, IntentModel::Legacy).await, 1);
}

#[tokio::test]
async fn test_mesh_counts() {
    let registry = registry();
    registry.register(ConnectionPoint::new("c"), vec![ip("192.168.1.4/32", "null:3")]);
    let mesh = || {
        ServiceRequest::new(Action::Mesh(Mesh::new(vec![
            Subject::new("a"),
            Subject::new("b"),
            Subject::new("c"),
        ])))
    };

    let f = fixture(Arc::clone(&registry));
    f.decomposer
        .decompose(&service(), &mesh(), None, ValidationType::Create, &config(true, IntentModel::Legacy))
        .await
        .unwrap();
    assert_eq!(f.intents.intent_count(), 3);

    let f = fixture(registry);
    f.decomposer
        .decompose(&service(), &mesh(), None, ValidationType::Create, &config(false, IntentModel::Legacy))
        .await
        .unwrap();
    assert_eq!(f.intents.intent_count(), 6);
}

// ============================================================================
// Submission and recording
// ============================================================================

#[tokio::test]
async fn test_legacy_intent_connects_host_ids() {
    let f = fixture(registry());
    f.decomposer
        .decompose(&service(), &path("a", "b"), None, ValidationType::Create, &config(true, IntentModel::Legacy))
        .await
        .unwrap();

    let intent = f.intents.get_intent(&key(1)).await.unwrap();
    match intent.payload {
        IntentPayload::Connectivity { one, two } => {
            assert_eq!(one.as_str(), "192.168.1.2/32");
            assert_eq!(two.as_str(), "192.168.1.3/32");
        }
        other => panic!("expected connectivity payload, got {other:?}"),
    }
    assert_eq!(intent.priority, DecompositionConfig::default().intent_priority);
}

#[tokio::test]
async fn test_submission_recorded_in_store() {
    let f = fixture(registry());
    let report = f
        .decomposer
        .decompose(&service(), &path("a", "b"), None, ValidationType::Create, &config(true, IntentModel::AciPp))
        .await
        .unwrap();

    assert_eq!(report.submitted_keys(), vec![&key(1)]);
    let record = f.store.get_keys(&service());
    let entry = record.get(&key(1)).unwrap();
    assert_eq!(entry.status(), IntentStatus::InstallReq);
    assert!(!entry.is_calculated());
    assert!(entry.abstraction_links().is_empty());

    let indexed = f.store.get_key_intent(&key(1)).unwrap();
    assert!(indexed.as_path_aware().is_some());
    assert_eq!(f.store.find_service_id(&key(1)), Some(service()));
}

#[tokio::test]
async fn test_constraints_selected_per_leg() {
    let f = fixture(registry());
    let request = ServiceRequest::new(Action::Path(Path::new(
        Subject::new("a").with_constraint(Constraint::bandwidth_mbps(100.0)),
        Subject::new("b").with_constraint(Constraint::latency_ms(20)),
    )))
    .with_constraint(Constraint::bandwidth_mbps(400.0))
    .with_constraint(Constraint::Encryption);

    f.decomposer
        .decompose(&service(), &request, None, ValidationType::Create, &config(true, IntentModel::Legacy))
        .await
        .unwrap();

    let intent = f.intents.get_intent(&key(1)).await.unwrap();
    assert_eq!(
        intent.constraints,
        vec![
            Constraint::bandwidth_mbps(400.0),
            Constraint::latency_ms(20),
            Constraint::Encryption,
        ]
    );
}

#[tokio::test]
async fn test_negotiable_request_records_negotiation() {
    let f = fixture(registry());
    f.intents.negotiate(key(1));
    let request = path("a", "b").negotiable(true);

    let report = f
        .decomposer
        .decompose(&service(), &request, None, ValidationType::Create, &config(true, IntentModel::Legacy))
        .await
        .unwrap();

    assert_eq!(
        report.outcomes,
        vec![IntentOutcome::Submitted {
            key: key(1),
            status: IntentStatus::NegotiationReq,
        }]
    );
    let intent = f.intents.get_intent(&key(1)).await.unwrap();
    assert!(intent.constraints.contains(&Constraint::Negotiable));
    let record = f.store.get_keys(&service());
    assert_eq!(record.get(&key(1)).unwrap().status(), IntentStatus::NegotiationReq);
}

// ============================================================================
// Per-intent failures
// ============================================================================

#[tokio::test]
async fn test_unknown_connection_point_reported_not_recorded() {
    let f = fixture(registry());
    let report = f
        .decomposer
        .decompose(&service(), &path("a", "nowhere"), None, ValidationType::Create, &config(true, IntentModel::Legacy))
        .await
        .unwrap();

    assert_eq!(
        report.outcomes,
        vec![IntentOutcome::EndpointNotFound {
            key: key(1),
            point: ConnectionPoint::new("nowhere"),
        }]
    );
    assert_eq!(report.issues.len(), 1);
    assert_eq!(f.intents.total_submissions(), 0);
    assert!(f.store.get_keys(&service()).is_empty());
}

#[tokio::test]
async fn test_rejected_leg_recorded_failed_sibling_submitted() {
    let f = fixture(registry());
    f.intents.reject(key(1));

    let report = f
        .decomposer
        .decompose(&service(), &connection("a", "b"), None, ValidationType::Create, &config(false, IntentModel::Legacy))
        .await
        .unwrap();

    assert!(matches!(report.outcomes[0], IntentOutcome::Rejected { .. }));
    assert!(matches!(report.outcomes[1], IntentOutcome::Submitted { .. }));
    let record = f.store.get_keys(&service());
    assert_eq!(record.get(&key(1)).unwrap().status(), IntentStatus::Failed);
    assert_eq!(record.get(&key(2)).unwrap().status(), IntentStatus::InstallReq);
    assert!(f.store.get_key_intent(&key(1)).is_none());
}

#[tokio::test]
async fn test_refused_link_falls_back_to_next_candidate() {
    let registry = registry();
    registry.register(
        ConnectionPoint::new("b"),
        vec![
            ip("192.168.1.3/32", "null:2"),
            ip("192.168.1.4/32", "null:2"),
            ip("192.168.1.5/32", "null:2"),
        ],
    );
    let intents = Arc::new(DestinationFilter::default());
    intents.refused.insert("192.168.1.3/32".parse().unwrap());
    let store = Arc::new(AciKeyStatusStore::default());
    let decomposer = IntentDecomposer::new(app(), registry, intents.clone(), Arc::clone(&store));

    let report = decomposer
        .decompose(&service(), &path("a", "b"), None, ValidationType::Create, &config(true, IntentModel::Legacy))
        .await
        .unwrap();

    assert_eq!(report.submitted_keys(), vec![&key(1)]);
    let intent = intents.get_intent(&key(1)).await.unwrap();
    assert_eq!(intent.selector.ip_dst, Some("192.168.1.4/32".parse().unwrap()));

    let record = store.get_keys(&service());
    let links = record.get(&key(1)).unwrap().abstraction_links().to_vec();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].dst, ip("192.168.1.5/32", "null:2"));
}

#[tokio::test]
async fn test_submission_timeout_counts_as_refusal() {
    let store = Arc::new(AciKeyStatusStore::default());
    let decomposer = IntentDecomposer::new(app(), registry(), Arc::new(Stalled), Arc::clone(&store));
    let config = DecompositionConfig {
        submit_timeout_ms: 20,
        ..config(true, IntentModel::Legacy)
    };

    let report = decomposer
        .decompose(&service(), &path("a", "b"), None, ValidationType::Create, &config)
        .await
        .unwrap();

    match &report.outcomes[0] {
        IntentOutcome::Rejected { reason, .. } => assert!(reason.contains("in time")),
        other => panic!("expected rejection, got {other:?}"),
    }
    let record = store.get_keys(&service());
    assert_eq!(record.get(&key(1)).unwrap().status(), IntentStatus::Failed);
}

#[tokio::test]
async fn test_withdrawal_timeout_reported_without_blocking() {
    let store = Arc::new(AciKeyStatusStore::default());
    store
        .update_key(
            &service(),
            AciIntentKeyStatus::new(key(1), IntentStatus::Installed, vec![], true),
        )
        .unwrap();
    let decomposer = IntentDecomposer::new(app(), registry(), Arc::new(Stalled), Arc::clone(&store));
    let config = DecompositionConfig {
        submit_timeout_ms: 20,
        ..config(true, IntentModel::Legacy)
    };

    let report = tokio::time::timeout(
        Duration::from_secs(2),
        decomposer.decompose(&service(), &path("a", "b"), None, ValidationType::Delete, &config),
    )
    .await
    .expect("delete must finish within the withdrawal timeout")
    .unwrap();

    match &report.outcomes[..] {
        [IntentOutcome::WithdrawFailed { key: k, reason }] => {
            assert_eq!(k, &key(1));
            assert!(reason.contains("in time"));
        }
        other => panic!("expected one failed withdrawal, got {other:?}"),
    }
    // Status left untouched so the withdrawal can be retried
    let record = store.get_keys(&service());
    assert_eq!(record.get(&key(1)).unwrap().status(), IntentStatus::Installed);
}

#[tokio::test]
async fn test_no_directionality_is_an_error() {
    let f = fixture(registry());
    let config = DecompositionConfig {
        bidirectional: false,
        unidirectional: false,
        ..DecompositionConfig::default()
    };
    let err = f
        .decomposer
        .decompose(&service(), &path("a", "b"), None, ValidationType::Create, &config)
        .await
        .unwrap_err();
    assert_eq!(err, DecomposeError::NoDirectionality);
    assert_eq!(f.intents.total_submissions(), 0);
}

// ============================================================================
// Endpoint reuse
// ============================================================================

#[tokio::test]
async fn test_mesh_prefers_unused_endpoints() {
    let registry = registry();
    registry.register(
        ConnectionPoint::new("a"),
        vec![ip("192.168.1.2/32", "null:1"), ip("192.168.1.12/32", "null:1")],
    );
    registry.register(ConnectionPoint::new("c"), vec![ip("192.168.1.4/32", "null:3")]);
    let f = fixture(registry);
    let request = ServiceRequest::new(Action::Mesh(Mesh::new(vec![
        Subject::new("a"),
        Subject::new("b"),
        Subject::new("c"),
    ])));

    f.decomposer
        .decompose(&service(), &request, None, ValidationType::Create, &config(true, IntentModel::Legacy))
        .await
        .unwrap();

    // a-b takes the first address of "a"; a-c moves on to the second one
    let ab = f.intents.get_intent(&key(1)).await.unwrap();
    let ac = f.intents.get_intent(&key(2)).await.unwrap();
    assert_eq!(ab.selector.ip_src, Some("192.168.1.2/32".parse().unwrap()));
    assert_eq!(ac.selector.ip_src, Some("192.168.1.12/32".parse().unwrap()));

    let record = f.store.get_keys(&service());
    let remaining = record.get(&key(2)).unwrap().abstraction_links();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].src, ip("192.168.1.2/32", "null:1"));
}

// ============================================================================
// Update and delete
// ============================================================================

#[tokio::test]
async fn test_update_withdraws_stale_keys() {
    let f = fixture(registry());
    let config = config(false, IntentModel::Legacy);
    let before = connection("a", "b");
    let after = path("a", "b");

    f.decomposer
        .decompose(&service(), &before, None, ValidationType::Create, &config)
        .await
        .unwrap();
    let report = f
        .decomposer
        .decompose(&service(), &after, Some(&before), ValidationType::Update, &config)
        .await
        .unwrap();

    assert_eq!(report.submitted_keys(), vec![&key(1)]);
    assert_eq!(report.withdrawn_keys(), vec![&key(2)]);
    assert_eq!(f.intents.submission_count(&key(1)), 2);
    assert!(f.intents.was_withdrawn(&key(2)));

    let record = f.store.get_keys(&service());
    assert_eq!(record.get(&key(2)).unwrap().status(), IntentStatus::WithdrawReq);
    assert!(f.store.get_key_intent(&key(2)).is_none());
}

#[tokio::test]
async fn test_update_without_previous_uses_stored_keys() {
    let f = fixture(registry());
    let config = config(false, IntentModel::Legacy);
    f.decomposer
        .decompose(&service(), &connection("a", "b"), None, ValidationType::Create, &config)
        .await
        .unwrap();

    let report = f
        .decomposer
        .decompose(&service(), &path("a", "b"), None, ValidationType::Update, &config)
        .await
        .unwrap();
    assert_eq!(report.withdrawn_keys(), vec![&key(2)]);
}

#[tokio::test]
async fn test_delete_withdraws_everything() {
    let f = fixture(registry());
    let config = config(false, IntentModel::Legacy);
    let request = connection("a", "b");
    f.decomposer
        .decompose(&service(), &request, None, ValidationType::Create, &config)
        .await
        .unwrap();

    let report = f
        .decomposer
        .decompose(&service(), &request, None, ValidationType::Delete, &config)
        .await
        .unwrap();

    assert_eq!(report.withdrawn_keys(), vec![&key(1), &key(2)]);
    assert_eq!(f.intents.intent_count(), 0);
    let record = f.store.get_keys(&service());
    assert!(record.iter().all(|e| e.status() == IntentStatus::WithdrawReq));
}

#[tokio::test]
async fn test_delete_of_never_installed_intent_marks_withdrawn() {
    let f = fixture(registry());
    f.intents.reject(key(1));
    let config = config(true, IntentModel::Legacy);
    let request = path("a", "b");
    f.decomposer
        .decompose(&service(), &request, None, ValidationType::Create, &config)
        .await
        .unwrap();

    let report = f
        .decomposer
        .decompose(&service(), &request, None, ValidationType::Delete, &config)
        .await
        .unwrap();

    assert_eq!(report.withdrawn_keys(), vec![&key(1)]);
    let record = f.store.get_keys(&service());
    assert_eq!(record.get(&key(1)).unwrap().status(), IntentStatus::Withdrawn);
}
