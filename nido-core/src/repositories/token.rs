use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;

use crate::{
    Error, error::StoreError, store::CredentialStore, token::SignedToken, user::SubjectId,
};

fn access_key(subject: &SubjectId) -> String {
    format!("access_token:{subject}")
}

fn refresh_key(subject: &SubjectId) -> String {
    format!("refresh_token:{subject}")
}

/// Repository for per-subject token records
///
/// Each subject has a single slot per token kind; storing a token overwrites
/// the previous one, which is what makes refresh rotation single-slot.
#[async_trait]
pub trait TokenRepository: Send + Sync + 'static {
    /// The refresh token currently on record for the subject, if any
    async fn current_refresh(&self, subject: &SubjectId) -> Result<Option<SignedToken>, Error>;

    /// Record a refresh token as the subject's current one
    async fn store_refresh(
        &self,
        subject: &SubjectId,
        token: &SignedToken,
        ttl: Duration,
    ) -> Result<(), Error>;

    /// Record the most recently issued access token
    async fn store_access(
        &self,
        subject: &SubjectId,
        token: &SignedToken,
        ttl: Duration,
    ) -> Result<(), Error>;

    /// Drop both token records; absent records are not an error
    async fn clear(&self, subject: &SubjectId) -> Result<(), Error>;
}

/// Default implementation of [`TokenRepository`] over a credential store.
pub struct StoreTokenRepository<S: CredentialStore> {
    store: Arc<S>,
}

impl<S: CredentialStore> StoreTokenRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: CredentialStore> TokenRepository for StoreTokenRepository<S> {
    async fn current_refresh(&self, subject: &SubjectId) -> Result<Option<SignedToken>, Error> {
        match self.store.get(&refresh_key(subject)).await? {
            Some(bytes) => {
                let token = String::from_utf8(bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(SignedToken::from(token)))
            }
            None => Ok(None),
        }
    }

    async fn store_refresh(
        &self,
        subject: &SubjectId,
        token: &SignedToken,
        ttl: Duration,
    ) -> Result<(), Error> {
        self.store
            .set(&refresh_key(subject), token.as_str().as_bytes(), Some(ttl))
            .await?;
        Ok(())
    }

    async fn store_access(
        &self,
        subject: &SubjectId,
        token: &SignedToken,
        ttl: Duration,
    ) -> Result<(), Error> {
        self.store
            .set(&access_key(subject), token.as_str().as_bytes(), Some(ttl))
            .await?;
        Ok(())
    }

    async fn clear(&self, subject: &SubjectId) -> Result<(), Error> {
        self.store.delete(&access_key(subject)).await?;
        self.store.delete(&refresh_key(subject)).await?;
        Ok(())
    }
}
