use crate::abstraction::AbstractionLink;
use crate::intent::{IntentKey, IntentStatus};
use serde::{Deserialize, Serialize};

/// Lifecycle record of one low-level intent under a service.
///
/// Records are immutable values. A transition produces a new record through
/// the `with_*` methods and the store swaps it in whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AciIntentKeyStatus {
    key: IntentKey,
    status: IntentStatus,
    /// Candidate links not yet tried for this intent
    abstraction_links: Vec<AbstractionLink>,
    calculated: bool,
}

impl AciIntentKeyStatus {
    pub fn new(
        key: IntentKey,
        status: IntentStatus,
        abstraction_links: Vec<AbstractionLink>,
        calculated: bool,
    ) -> Self {
        Self {
            key,
            status,
            abstraction_links,
            calculated,
        }
    }

    pub fn key(&self) -> &IntentKey {
        &self.key
    }

    pub fn status(&self) -> IntentStatus {
        self.status
    }

    pub fn abstraction_links(&self) -> &[AbstractionLink] {
        &self.abstraction_links
    }

    pub fn is_calculated(&self) -> bool {
        self.calculated
    }

    #[must_use]
    pub fn with_status(&self, status: IntentStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_links(&self, abstraction_links: Vec<AbstractionLink>) -> Self {
        Self {
            abstraction_links,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_calculated(&self, calculated: bool) -> Self {
        Self {
            calculated,
            ..self.clone()
        }
    }
}

/// The status records of one service, at most one per intent key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    entries: Vec<AciIntentKeyStatus>,
}

impl ServiceRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry with the same key, or append.
    pub fn upsert(&mut self, status: AciIntentKeyStatus) {
        match self.entries.iter_mut().find(|e| e.key == status.key) {
            Some(existing) => *existing = status,
            None => self.entries.push(status),
        }
    }

    pub fn get(&self, key: &IntentKey) -> Option<&AciIntentKeyStatus> {
        self.entries.iter().find(|e| &e.key == key)
    }

    pub fn contains_key(&self, key: &IntentKey) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AciIntentKeyStatus> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &IntentKey> {
        self.entries.iter().map(|e| &e.key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<AciIntentKeyStatus> {
        self.entries
    }
}

impl FromIterator<AciIntentKeyStatus> for ServiceRecord {
    /// Later entries win over earlier ones with the same key.
    fn from_iter<I: IntoIterator<Item = AciIntentKeyStatus>>(iter: I) -> Self {
        let mut record = ServiceRecord::new();
        for status in iter {
            record.upsert(status);
        }
        record
    }
}

impl<'a> IntoIterator for &'a ServiceRecord {
    type Item = &'a AciIntentKeyStatus;
    type IntoIter = std::slice::Iter<'a, AciIntentKeyStatus>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
