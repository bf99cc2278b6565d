//! Credential store contract
//!
//! Key-value persistence with per-key expiry, used for both user records and
//! token records. All operations are atomic at single-key granularity; no
//! multi-key transactions are assumed. Failures are infrastructure errors —
//! callers must never read business state out of them ("store unreachable"
//! is not "record absent").

use async_trait::async_trait;
use chrono::Duration;

use crate::error::StoreError;

#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Read the value for a key, `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write a value, optionally with a time-to-live
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>)
    -> Result<(), StoreError>;

    /// Write a value only if the current value equals `expected`
    /// (`None` = key must be absent). Returns whether the swap happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError>;

    /// Delete a key; deleting an absent key is not an error
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Clear any pending expiry, making the key durable
    async fn persist(&self, key: &str) -> Result<(), StoreError>;
}

/// Decorator bounding every store round trip with a timeout.
///
/// An elapsed timeout surfaces as [`StoreError::Timeout`], distinct from all
/// business error kinds.
pub struct TimedStore<S> {
    inner: S,
    timeout: std::time::Duration,
}

impl<S> TimedStore<S> {
    pub fn new(inner: S, timeout: std::time::Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: CredentialStore> CredentialStore for TimedStore<S> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        tokio::time::timeout(self.timeout, self.inner.get(key))
            .await
            .map_err(|_| StoreError::Timeout)?
    }

    async fn set(
        &self,
        key: &str,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        tokio::time::timeout(self.timeout, self.inner.set(key, value, ttl))
            .await
            .map_err(|_| StoreError::Timeout)?
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError> {
        tokio::time::timeout(
            self.timeout,
            self.inner.compare_and_swap(key, expected, value, ttl),
        )
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        tokio::time::timeout(self.timeout, self.inner.delete(key))
            .await
            .map_err(|_| StoreError::Timeout)?
    }

    async fn persist(&self, key: &str) -> Result<(), StoreError> {
        tokio::time::timeout(self.timeout, self.inner.persist(key))
            .await
            .map_err(|_| StoreError::Timeout)?
    }
}
