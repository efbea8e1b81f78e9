use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

/// A value together with the version it was written at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<V> {
    pub value: V,
    pub version: u64,
}

/// Key/value backend with per-key conditional replace.
///
/// Every write bumps the entry's version. `replace` succeeds only when the
/// caller's expected version is still current, which is what makes a
/// read-modify-write cycle linearizable per key.
pub trait VersionedMap<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<Versioned<V>>;

    /// Unconditional write; returns the new version.
    fn put(&self, key: K, value: V) -> u64;

    /// Current entry, inserting `value` first if the key is absent.
    fn insert_if_absent(&self, key: K, value: V) -> Versioned<V>;

    /// Write `value` only if the entry is still at `expected_version`.
    fn replace(&self, key: &K, expected_version: u64, value: V) -> bool;

    fn remove(&self, key: &K) -> Option<V>;

    /// Snapshot of all keys.
    fn keys(&self) -> Vec<K>;

    /// Snapshot of all entries.
    fn entries(&self) -> Vec<(K, V)>;
}

/// [`VersionedMap`] over a sharded concurrent map.
#[derive(Debug)]
pub struct InMemoryMap<K: Eq + Hash, V> {
    entries: DashMap<K, Versioned<V>>,
    clock: AtomicU64,
}

impl<K: Eq + Hash, V> InMemoryMap<K, V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            clock: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl<K: Eq + Hash, V> Default for InMemoryMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> VersionedMap<K, V> for InMemoryMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<Versioned<V>> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    fn put(&self, key: K, value: V) -> u64 {
        let version = self.tick();
        self.entries.insert(key, Versioned { value, version });
        version
    }

    fn insert_if_absent(&self, key: K, value: V) -> Versioned<V> {
        self.entries
            .entry(key)
            .or_insert_with(|| Versioned {
                value,
                version: self.tick(),
            })
            .value()
            .clone()
    }

    fn replace(&self, key: &K, expected_version: u64, value: V) -> bool {
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.version == expected_version => {
                *entry = Versioned {
                    value,
                    version: self.tick(),
                };
                true
            }
            _ => false,
        }
    }

    fn remove(&self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(_, v)| v.value)
    }

    fn keys(&self) -> Vec<K> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    fn entries(&self) -> Vec<(K, V)> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().value.clone()))
            .collect()
    }
}
