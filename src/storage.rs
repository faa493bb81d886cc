//! Registry storage for the container
//!
//! Uses DashMap keyed by [`ServiceKey`] so that the container itself only
//! needs `&self` for every operation.

use crate::entry::EntryType;
use crate::key::ServiceKey;
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;

/// Map from key to type-erased entry.
///
/// Lookups hand out a cloned `Arc` so that no shard guard is held while a
/// factory runs; factories may re-enter the container.
pub(crate) struct ServiceStorage {
    entries: DashMap<ServiceKey, Arc<dyn EntryType>, RandomState>,
}

impl ServiceStorage {
    /// Create new empty storage.
    ///
    /// Uses 8 shards; registries rarely hold more than a few dozen entries
    /// and the DashMap default of `num_cpus * 4` makes creation slow.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create with pre-allocated capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        let shard_amount = if capacity <= 16 {
            8
        } else if capacity <= 64 {
            16
        } else {
            32
        };
        Self {
            entries: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount,
            ),
        }
    }

    /// Store `entry` under `key`, returning whether a previous entry was replaced.
    #[inline]
    pub fn insert(&self, key: ServiceKey, entry: Arc<dyn EntryType>) -> bool {
        self.entries.insert(key, entry).is_some()
    }

    /// Look up the entry stored under `key`.
    #[inline]
    pub fn get(&self, key: &ServiceKey) -> Option<Arc<dyn EntryType>> {
        self.entries.get(key).map(|e| Arc::clone(e.value()))
    }

    #[inline]
    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.entries.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    #[inline]
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Descriptions of all entries, sorted for deterministic output.
    pub fn descriptions(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .entries
            .iter()
            .map(|e| e.value().describe(e.key()))
            .collect();
        lines.sort();
        lines
    }
}

impl Default for ServiceStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceStorage")
            .field("count", &self.len())
            .finish()
    }
}
