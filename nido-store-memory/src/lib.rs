//! In-memory credential store backend
//!
//! Keeps every record in a process-local [`DashMap`] with per-entry expiry.
//! Suitable for tests and single-process deployments; the store contract it
//! implements is the same one a networked key-value backend would provide.
//! Expired entries are dropped lazily on access; [`MemoryStore::cleanup_expired`]
//! sweeps the rest.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;

use async_trait::async_trait;
use nido_core::{CredentialStore, error::StoreError};

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn new(value: &[u8], ttl: Option<Duration>) -> Self {
        Self {
            value: value.to_vec(),
            expires_at: ttl.map(|ttl| Utc::now() + ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() > at)
    }
}

/// Process-local [`CredentialStore`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every expired entry. Entries are otherwise dropped lazily on
    /// access.
    pub fn cleanup_expired(&self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }

    /// Number of live (unexpired) entries
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.is_expired())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                drop(entry);
                self.entries.remove_if(key, |_, e| e.is_expired());
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), Entry::new(value, ttl));
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError> {
        // The entry API holds the shard lock, making the comparison and the
        // write one atomic step.
        match self.entries.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                let current = occupied.get();
                let live = !current.is_expired();
                let matches = match expected {
                    Some(expected) => live && current.value == expected,
                    None => !live,
                };
                if matches {
                    occupied.insert(Entry::new(value, ttl));
                }
                Ok(matches)
            }
            MapEntry::Vacant(vacant) => {
                if expected.is_none() {
                    vacant.insert(Entry::new(value, ttl));
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn persist(&self, key: &str) -> Result<(), StoreError> {
        if let Some(mut entry) = self.entries.get_mut(key) {
            if !entry.is_expired() {
                entry.expires_at = None;
            }
        }
        Ok(())
    }
}
