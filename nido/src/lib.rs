//! # Nido
//!
//! Nido is an authentication and session backend: it takes the verified
//! identity produced by an upstream OAuth handshake, manages the user record
//! behind it (profile plus child records), and issues, rotates and verifies
//! the signed credentials protecting it. All durable state lives in a
//! key-value [`CredentialStore`]; nothing is shared in process memory across
//! requests.
//!
//! ## Example
//!
//! ```rust,no_run
//! use nido::{JwtConfig, MemoryStore, Nido, RegistrationInfo, VerifiedIdentity};
//!
//! #[tokio::main]
//! async fn main() {
//!     let jwt = JwtConfig::new_hs256(b"a_signing_secret_of_sufficient_length".to_vec());
//!     let nido = Nido::new(MemoryStore::new(), jwt);
//!
//!     let identity = VerifiedIdentity {
//!         subject: "google-user-id".into(),
//!         email: "user@example.com".to_string(),
//!         display_name: "A. User".to_string(),
//!         avatar_url: String::new(),
//!     };
//!
//!     let session = nido
//!         .register(identity, RegistrationInfo::default())
//!         .await
//!         .unwrap();
//!     println!("access token: {}", session.access_token);
//! }
//! ```

use std::sync::Arc;

use nido_core::{
    repositories::{StoreTokenRepository, StoreUserRepository},
    services::{AuthService, TokenService},
    store::TimedStore,
};

/// Re-export core types from nido_core
///
/// These types are commonly used when working with the Nido API.
pub use nido_core::{
    Child, ChildPatch, Claims, CredentialStore, Error, Gender, JwtAlgorithm, JwtConfig,
    RegistrationInfo, SignedToken, SubjectId, TokenKind, TokenPair, User, UserPatch,
    VerifiedIdentity, error,
};

pub use nido_core::services::{AuthSession, TokenLifetimes};

/// Re-export storage backends
///
/// These storage implementations are available when the corresponding
/// feature is enabled.
#[cfg(feature = "memory")]
pub use nido_store_memory::MemoryStore;

/// Configuration for the composed engine.
pub struct NidoConfig {
    /// Token lifetimes, applied to both the signed claims and the store TTLs
    pub lifetimes: TokenLifetimes,
    /// Upper bound on every credential-store round trip
    pub store_timeout: std::time::Duration,
}

impl Default for NidoConfig {
    fn default() -> Self {
        Self {
            lifetimes: TokenLifetimes::default(),
            store_timeout: std::time::Duration::from_secs(5),
        }
    }
}

impl NidoConfig {
    /// Set the token lifetimes
    pub fn with_lifetimes(mut self, lifetimes: TokenLifetimes) -> Self {
        self.lifetimes = lifetimes;
        self
    }

    /// Set the store round-trip timeout
    pub fn with_store_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.store_timeout = timeout;
        self
    }
}

type Engine<S> =
    AuthService<StoreUserRepository<TimedStore<S>>, StoreTokenRepository<TimedStore<S>>>;

/// The composed authentication backend.
///
/// `Nido` wires a credential store into the repositories and services and
/// exposes one method per operation of the session engine. The store is
/// wrapped in a [`TimedStore`] so every round trip is bounded by
/// [`NidoConfig::store_timeout`].
pub struct Nido<S: CredentialStore> {
    auth: Engine<S>,
}

impl<S: CredentialStore> Nido<S> {
    /// Create a new Nido instance with default configuration
    pub fn new(store: S, jwt_config: JwtConfig) -> Self {
        Self::with_config(store, jwt_config, NidoConfig::default())
    }

    /// Create a new Nido instance with the given configuration
    pub fn with_config(store: S, jwt_config: JwtConfig, config: NidoConfig) -> Self {
        let store = Arc::new(TimedStore::new(store, config.store_timeout));
        let users = Arc::new(StoreUserRepository::new(store.clone()));
        let tokens = Arc::new(StoreTokenRepository::new(store));
        let token_service =
            Arc::new(TokenService::new(jwt_config).with_lifetimes(config.lifetimes));

        Self {
            auth: AuthService::new(users, tokens, token_service),
        }
    }

    /// Register a new user from a verified identity; returns the first
    /// credential pair and the stored user
    pub async fn register(
        &self,
        identity: VerifiedIdentity,
        info: RegistrationInfo,
    ) -> Result<AuthSession, Error> {
        self.auth.register(identity, info).await
    }

    /// Log in an existing user, rotating its refresh token
    pub async fn login(&self, identity: VerifiedIdentity) -> Result<AuthSession, Error> {
        self.auth.login(identity).await
    }

    /// Exchange a valid, current refresh token for a new access token
    pub async fn refresh_access_token(
        &self,
        refresh_token: &SignedToken,
    ) -> Result<SignedToken, Error> {
        self.auth.refresh_access_token(refresh_token).await
    }

    /// Resolve the subject of a bearer access token
    pub fn verify_access_token(&self, token: &SignedToken) -> Result<SubjectId, Error> {
        self.auth.verify_access_token(token)
    }

    /// Drop the subject's token records
    pub async fn logout(&self, subject: &SubjectId) -> Result<(), Error> {
        self.auth.logout(subject).await
    }

    /// Fetch a user record
    pub async fn get_user(&self, subject: &SubjectId) -> Result<User, Error> {
        self.auth.get_user(subject).await
    }

    /// Merge a profile patch into a user record
    pub async fn update_user(
        &self,
        subject: &SubjectId,
        patch: UserPatch,
    ) -> Result<User, Error> {
        self.auth.update_user(subject, patch).await
    }

    /// Delete a user record together with its token records
    pub async fn delete_user(&self, subject: &SubjectId) -> Result<(), Error> {
        self.auth.delete_user(subject).await
    }

    /// Append a child record
    pub async fn add_child(&self, subject: &SubjectId, child: Child) -> Result<User, Error> {
        self.auth.add_child(subject, child).await
    }

    /// Merge patch fields into a named child record
    pub async fn update_child(
        &self,
        subject: &SubjectId,
        name: &str,
        patch: ChildPatch,
    ) -> Result<User, Error> {
        self.auth.update_child(subject, name, patch).await
    }

    /// Remove a named child record
    pub async fn delete_child(&self, subject: &SubjectId, name: &str) -> Result<User, Error> {
        self.auth.delete_child(subject, name).await
    }
}
