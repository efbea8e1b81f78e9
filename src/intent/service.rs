use super::{IntentKey, IntentServiceError, LowLevelIntent};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

/// Outcome of an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Queued for installation
    Accepted,
    /// Constraints cannot be met as asked; alternatives are being negotiated
    Negotiating,
}

/// The intent framework that installs low-level intents.
///
/// Submitting an intent whose key is already known replaces it.
#[async_trait]
pub trait IntentService: Send + Sync + 'static {
    async fn submit(&self, intent: LowLevelIntent) -> Result<Submission, IntentServiceError>;

    async fn withdraw(&self, key: &IntentKey) -> Result<(), IntentServiceError>;

    async fn get_intent(&self, key: &IntentKey) -> Option<LowLevelIntent>;

    /// Snapshot of every known intent.
    async fn get_intents(&self) -> Vec<LowLevelIntent>;
}

/// In-process intent service.
///
/// Keeps submitted intents in a concurrent map and counts submissions per
/// key. Keys can be marked to be rejected or answered with a negotiation.
#[derive(Debug, Default)]
pub struct InMemoryIntentService {
    intents: DashMap<IntentKey, LowLevelIntent>,
    submissions: DashMap<IntentKey, u32>,
    withdrawn: DashSet<IntentKey>,
    rejected: DashSet<IntentKey>,
    negotiating: DashSet<IntentKey>,
}

impl InMemoryIntentService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an intent directly, as if installed earlier.
    pub fn insert(&self, intent: LowLevelIntent) {
        self.intents.insert(intent.key.clone(), intent);
    }

    /// Reject future submissions for `key`.
    pub fn reject(&self, key: IntentKey) {
        self.rejected.insert(key);
    }

    /// Answer future submissions for `key` with a negotiation.
    pub fn negotiate(&self, key: IntentKey) {
        self.negotiating.insert(key);
    }

    /// Number of intents currently held.
    pub fn intent_count(&self) -> usize {
        self.intents.len()
    }

    /// How many times `key` was submitted.
    pub fn submission_count(&self, key: &IntentKey) -> u32 {
        self.submissions.get(key).map(|n| *n).unwrap_or(0)
    }

    pub fn total_submissions(&self) -> u32 {
        self.submissions.iter().map(|entry| *entry.value()).sum()
    }

    pub fn was_withdrawn(&self, key: &IntentKey) -> bool {
        self.withdrawn.contains(key)
    }

    /// Keys currently held, sorted.
    pub fn keys(&self) -> Vec<IntentKey> {
        let mut keys: Vec<_> = self.intents.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl IntentService for InMemoryIntentService {
    async fn submit(&self, intent: LowLevelIntent) -> Result<Submission, IntentServiceError> {
        let key = intent.key.clone();
        *self.submissions.entry(key.clone()).or_insert(0) += 1;

        if self.rejected.contains(&key) {
            return Err(IntentServiceError::Rejected {
                key,
                reason: "rejected by intent service".to_string(),
            });
        }

        self.withdrawn.remove(&key);
        self.intents.insert(key.clone(), intent);

        if self.negotiating.contains(&key) {
            Ok(Submission::Negotiating)
        } else {
            Ok(Submission::Accepted)
        }
    }

    async fn withdraw(&self, key: &IntentKey) -> Result<(), IntentServiceError> {
        match self.intents.remove(key) {
            Some(_) => {
                self.withdrawn.insert(key.clone());
                Ok(())
            }
            None => Err(IntentServiceError::NotFound(key.clone())),
        }
    }

    async fn get_intent(&self, key: &IntentKey) -> Option<LowLevelIntent> {
        self.intents.get(key).map(|e| e.value().clone())
    }

    async fn get_intents(&self) -> Vec<LowLevelIntent> {
        self.intents.iter().map(|e| e.value().clone()).collect()
    }
}
