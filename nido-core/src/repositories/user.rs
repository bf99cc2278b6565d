use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    Error,
    error::{StoreError, UserError},
    store::CredentialStore,
    user::{Child, ChildPatch, SubjectId, User},
};

fn user_key(subject: &SubjectId) -> String {
    format!("user:{subject}")
}

/// Repository for the user aggregate
///
/// Every operation takes and returns full snapshots; there is no
/// partial-field API at this layer.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Find a user by subject
    async fn find(&self, subject: &SubjectId) -> Result<Option<User>, Error>;

    /// Create a new user; fails with `AlreadyExists` if the subject is taken
    async fn create(&self, user: User) -> Result<User, Error>;

    /// Overwrite an existing user; fails with `NotFound` if absent and with
    /// `Conflict` if the record changed since `user.version` was read
    async fn replace(&self, user: User) -> Result<User, Error>;

    /// Append a child record; the name must be unique within the user
    async fn add_child(&self, subject: &SubjectId, child: Child) -> Result<User, Error>;

    /// Merge patch fields into the named child record
    async fn update_child(
        &self,
        subject: &SubjectId,
        name: &str,
        patch: ChildPatch,
    ) -> Result<User, Error>;

    /// Remove the named child record
    async fn delete_child(&self, subject: &SubjectId, name: &str) -> Result<User, Error>;

    /// Delete a user by subject; fails with `NotFound` if absent
    async fn delete(&self, subject: &SubjectId) -> Result<(), Error>;
}

/// Default implementation of [`UserRepository`] over a credential store.
///
/// Mutations are read-modify-write: the record's `version` is bumped on
/// every write and the commit is a compare-and-swap against the bytes read,
/// so a concurrent writer makes the slower one fail with `Conflict` instead
/// of silently losing its update.
pub struct StoreUserRepository<S: CredentialStore> {
    store: Arc<S>,
}

impl<S: CredentialStore> StoreUserRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn decode(bytes: &[u8]) -> Result<User, Error> {
        serde_json::from_slice(bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()).into())
    }

    fn encode(user: &User) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(user).map_err(|e| StoreError::Serialization(e.to_string()).into())
    }

    /// Read the record, apply `mutate`, and commit conditionally on the
    /// bytes observed at read time.
    async fn read_modify_write<F>(&self, subject: &SubjectId, mutate: F) -> Result<User, Error>
    where
        F: FnOnce(&mut User) -> Result<(), Error> + Send,
    {
        let key = user_key(subject);
        let Some(read) = self.store.get(&key).await? else {
            return Err(UserError::NotFound.into());
        };

        let mut user = Self::decode(&read)?;
        mutate(&mut user)?;
        user.version += 1;
        user.updated_at = Utc::now();

        let written = Self::encode(&user)?;
        if !self
            .store
            .compare_and_swap(&key, Some(read.as_slice()), &written, None)
            .await?
        {
            tracing::debug!(subject = %subject, "Lost write race on user record");
            return Err(UserError::Conflict.into());
        }

        Ok(user)
    }
}

#[async_trait]
impl<S: CredentialStore> UserRepository for StoreUserRepository<S> {
    async fn find(&self, subject: &SubjectId) -> Result<Option<User>, Error> {
        match self.store.get(&user_key(subject)).await? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, user: User) -> Result<User, Error> {
        let bytes = Self::encode(&user)?;
        // CAS from absent: a racing duplicate registration loses atomically.
        if !self
            .store
            .compare_and_swap(&user_key(&user.subject), None, &bytes, None)
            .await?
        {
            return Err(UserError::AlreadyExists.into());
        }
        Ok(user)
    }

    async fn replace(&self, user: User) -> Result<User, Error> {
        let key = user_key(&user.subject);
        let Some(read) = self.store.get(&key).await? else {
            return Err(UserError::NotFound.into());
        };

        let current = Self::decode(&read)?;
        if current.version != user.version {
            return Err(UserError::Conflict.into());
        }

        let mut user = user;
        user.version += 1;
        user.updated_at = Utc::now();

        let written = Self::encode(&user)?;
        if !self
            .store
            .compare_and_swap(&key, Some(read.as_slice()), &written, None)
            .await?
        {
            tracing::debug!(subject = %user.subject, "Lost write race on user record");
            return Err(UserError::Conflict.into());
        }

        Ok(user)
    }

    async fn add_child(&self, subject: &SubjectId, child: Child) -> Result<User, Error> {
        self.read_modify_write(subject, |user| {
            if user.has_child(&child.name) {
                return Err(UserError::ChildAlreadyExists(child.name.clone()).into());
            }
            user.children.push(child);
            Ok(())
        })
        .await
    }

    async fn update_child(
        &self,
        subject: &SubjectId,
        name: &str,
        patch: ChildPatch,
    ) -> Result<User, Error> {
        self.read_modify_write(subject, |user| {
            let child = user
                .children
                .iter_mut()
                .find(|c| c.name == name)
                .ok_or_else(|| UserError::ChildNotFound(name.to_string()))?;
            child.apply(patch);
            Ok(())
        })
        .await
    }

    async fn delete_child(&self, subject: &SubjectId, name: &str) -> Result<User, Error> {
        self.read_modify_write(subject, |user| {
            let index = user
                .children
                .iter()
                .position(|c| c.name == name)
                .ok_or_else(|| UserError::ChildNotFound(name.to_string()))?;
            user.children.remove(index);
            Ok(())
        })
        .await
    }

    async fn delete(&self, subject: &SubjectId) -> Result<(), Error> {
        let key = user_key(subject);
        if self.store.get(&key).await?.is_none() {
            return Err(UserError::NotFound.into());
        }
        self.store.delete(&key).await?;
        Ok(())
    }
}
