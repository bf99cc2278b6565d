use std::sync::Arc;

use serde::Serialize;

use crate::{
    Error,
    error::{AuthError, UserError},
    repositories::{TokenRepository, UserRepository},
    services::TokenService,
    token::{SignedToken, TokenKind},
    user::{Child, ChildPatch, RegistrationInfo, SubjectId, User, UserPatch, VerifiedIdentity},
    validation::validate_email,
};

/// Result of a successful registration or login: a fresh credential pair and
/// the user snapshot it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub access_token: SignedToken,
    pub refresh_token: SignedToken,
    pub user: User,
}

/// The session engine: orchestrates the credential lifecycle and user-record
/// management by composing the token service with the repositories.
///
/// Per subject there is a single current refresh token; every successful
/// registration or login replaces it (rotation), and `refresh_access_token`
/// accepts only the token that is both cryptographically valid and equal to
/// the stored one. Credential failures and unknown subjects collapse into
/// one `Unauthorized` kind so the refresh/login surface cannot be used to
/// enumerate valid provider ids. Store failures are exempt from collapsing.
pub struct AuthService<U: UserRepository, T: TokenRepository> {
    users: Arc<U>,
    tokens: Arc<T>,
    token_service: Arc<TokenService>,
}

impl<U: UserRepository, T: TokenRepository> AuthService<U, T> {
    /// Create a new AuthService with the given repositories
    pub fn new(users: Arc<U>, tokens: Arc<T>, token_service: Arc<TokenService>) -> Self {
        Self {
            users,
            tokens,
            token_service,
        }
    }

    /// Register a new user from a verified identity and issue its first
    /// credential pair
    pub async fn register(
        &self,
        identity: VerifiedIdentity,
        info: RegistrationInfo,
    ) -> Result<AuthSession, Error> {
        identity.validate()?;

        // Pre-check for a friendly error; the create below is
        // conditional-on-absent, so a racing duplicate still loses.
        if self.users.find(&identity.subject).await?.is_some() {
            return Err(UserError::AlreadyExists.into());
        }

        let user = User::builder()
            .subject(identity.subject)
            .email(identity.email)
            .display_name(identity.display_name)
            .avatar_url(identity.avatar_url)
            .nickname(info.nickname)
            .monthly_budget(info.monthly_budget)
            .build()?;

        let user = self.users.create(user).await?;
        let session = self.issue_session(user).await?;

        tracing::info!(subject = %session.user.subject, "Registered user");
        Ok(session)
    }

    /// Log in an already-registered subject, rotating its refresh token
    pub async fn login(&self, identity: VerifiedIdentity) -> Result<AuthSession, Error> {
        identity.validate()?;

        let user = match self.users.find(&identity.subject).await? {
            Some(user) => user,
            None => {
                tracing::debug!("Login attempt for unregistered subject");
                return Err(AuthError::Unauthorized.into());
            }
        };

        let session = self.issue_session(user).await?;

        tracing::info!(subject = %session.user.subject, "Logged in");
        Ok(session)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Two independent checks compose here: signature/expiry validity via
    /// the token service, and equality against the subject's stored refresh
    /// record. A token that was rotated out remains cryptographically valid
    /// until its expiry but fails the second check. The stored refresh token
    /// is never replaced by this operation.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &SignedToken,
    ) -> Result<SignedToken, Error> {
        let claims = self
            .token_service
            .verify(refresh_token)
            .map_err(|_| AuthError::Unauthorized)?;

        if claims.kind != TokenKind::Refresh {
            tracing::debug!("Non-refresh token presented for refresh");
            return Err(AuthError::Unauthorized.into());
        }

        let subject = claims.subject();
        if self.users.find(&subject).await?.is_none() {
            return Err(AuthError::Unauthorized.into());
        }

        match self.tokens.current_refresh(&subject).await? {
            Some(current) if current == *refresh_token => {}
            Some(_) => {
                tracing::debug!(subject = %subject, "Superseded refresh token presented");
                return Err(AuthError::Unauthorized.into());
            }
            None => return Err(AuthError::Unauthorized.into()),
        }

        let access = self.token_service.issue_access(&subject)?;
        self.tokens
            .store_access(&subject, &access, self.token_service.lifetimes().access)
            .await?;

        Ok(access)
    }

    /// Resolve the subject of a bearer access token.
    ///
    /// Stateless: signature, expiry and kind only — no store round trip.
    pub fn verify_access_token(&self, token: &SignedToken) -> Result<SubjectId, Error> {
        let claims = self
            .token_service
            .verify(token)
            .map_err(|_| AuthError::Unauthorized)?;

        if claims.kind != TokenKind::Access {
            return Err(AuthError::Unauthorized.into());
        }

        Ok(claims.subject())
    }

    /// Drop the subject's token records. Absent token records are fine;
    /// an absent user is not.
    pub async fn logout(&self, subject: &SubjectId) -> Result<(), Error> {
        if self.users.find(subject).await?.is_none() {
            return Err(UserError::NotFound.into());
        }

        self.tokens.clear(subject).await?;

        tracing::info!(subject = %subject, "Logged out");
        Ok(())
    }

    /// Fetch the user record for a subject
    pub async fn get_user(&self, subject: &SubjectId) -> Result<User, Error> {
        self.users
            .find(subject)
            .await?
            .ok_or_else(|| UserError::NotFound.into())
    }

    /// Merge a profile patch into the user record
    pub async fn update_user(&self, subject: &SubjectId, patch: UserPatch) -> Result<User, Error> {
        if let Some(email) = &patch.email {
            validate_email(email)?;
        }

        let mut user = self.get_user(subject).await?;
        user.apply(patch);
        self.users.replace(user).await
    }

    /// Delete the user record and both of its token records
    pub async fn delete_user(&self, subject: &SubjectId) -> Result<(), Error> {
        self.users.delete(subject).await?;
        self.tokens.clear(subject).await?;

        tracing::info!(subject = %subject, "Deleted user");
        Ok(())
    }

    /// Append a child record to the subject's user
    pub async fn add_child(&self, subject: &SubjectId, child: Child) -> Result<User, Error> {
        self.users.add_child(subject, child).await
    }

    /// Merge patch fields into the named child record
    pub async fn update_child(
        &self,
        subject: &SubjectId,
        name: &str,
        patch: ChildPatch,
    ) -> Result<User, Error> {
        self.users.update_child(subject, name, patch).await
    }

    /// Remove the named child record
    pub async fn delete_child(&self, subject: &SubjectId, name: &str) -> Result<User, Error> {
        self.users.delete_child(subject, name).await
    }

    /// Issue a credential pair and record both tokens, replacing whatever
    /// was stored before (this is what rotation is).
    async fn issue_session(&self, user: User) -> Result<AuthSession, Error> {
        let pair = self.token_service.issue_pair(&user.subject)?;
        let lifetimes = self.token_service.lifetimes();

        self.tokens
            .store_refresh(&user.subject, &pair.refresh, lifetimes.refresh)
            .await?;
        self.tokens
            .store_access(&user.subject, &pair.access, lifetimes.access)
            .await?;

        Ok(AuthSession {
            access_token: pair.access,
            refresh_token: pair.refresh,
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JwtConfig, user::Gender};
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    const TEST_HS256_SECRET: &[u8] = b"test_secret_key_for_hs256_jwt_tokens_not_for_production_use";

    #[derive(Default)]
    struct MockUserRepository {
        users: Mutex<HashMap<SubjectId, User>>,
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn find(&self, subject: &SubjectId) -> Result<Option<User>, Error> {
            Ok(self.users.lock().await.get(subject).cloned())
        }

        async fn create(&self, user: User) -> Result<User, Error> {
            let mut users = self.users.lock().await;
            if users.contains_key(&user.subject) {
                return Err(UserError::AlreadyExists.into());
            }
            users.insert(user.subject.clone(), user.clone());
            Ok(user)
        }

        async fn replace(&self, user: User) -> Result<User, Error> {
            let mut users = self.users.lock().await;
            if !users.contains_key(&user.subject) {
                return Err(UserError::NotFound.into());
            }
            users.insert(user.subject.clone(), user.clone());
            Ok(user)
        }

        async fn add_child(&self, subject: &SubjectId, child: Child) -> Result<User, Error> {
            let mut users = self.users.lock().await;
            let user = users.get_mut(subject).ok_or(UserError::NotFound)?;
            if user.has_child(&child.name) {
                return Err(UserError::ChildAlreadyExists(child.name).into());
            }
            user.children.push(child);
            Ok(user.clone())
        }

        async fn update_child(
            &self,
            subject: &SubjectId,
            name: &str,
            patch: ChildPatch,
        ) -> Result<User, Error> {
            let mut users = self.users.lock().await;
            let user = users.get_mut(subject).ok_or(UserError::NotFound)?;
            let child = user
                .children
                .iter_mut()
                .find(|c| c.name == name)
                .ok_or_else(|| UserError::ChildNotFound(name.to_string()))?;
            child.apply(patch);
            Ok(user.clone())
        }

        async fn delete_child(&self, subject: &SubjectId, name: &str) -> Result<User, Error> {
            let mut users = self.users.lock().await;
            let user = users.get_mut(subject).ok_or(UserError::NotFound)?;
            let index = user
                .children
                .iter()
                .position(|c| c.name == name)
                .ok_or_else(|| UserError::ChildNotFound(name.to_string()))?;
            user.children.remove(index);
            Ok(user.clone())
        }

        async fn delete(&self, subject: &SubjectId) -> Result<(), Error> {
            self.users
                .lock()
                .await
                .remove(subject)
                .map(|_| ())
                .ok_or_else(|| UserError::NotFound.into())
        }
    }

    #[derive(Default)]
    struct MockTokenRepository {
        refresh: Mutex<HashMap<SubjectId, SignedToken>>,
        access: Mutex<HashMap<SubjectId, SignedToken>>,
    }

    #[async_trait]
    impl TokenRepository for MockTokenRepository {
        async fn current_refresh(
            &self,
            subject: &SubjectId,
        ) -> Result<Option<SignedToken>, Error> {
            Ok(self.refresh.lock().await.get(subject).cloned())
        }

        async fn store_refresh(
            &self,
            subject: &SubjectId,
            token: &SignedToken,
            _ttl: Duration,
        ) -> Result<(), Error> {
            self.refresh
                .lock()
                .await
                .insert(subject.clone(), token.clone());
            Ok(())
        }

        async fn store_access(
            &self,
            subject: &SubjectId,
            token: &SignedToken,
            _ttl: Duration,
        ) -> Result<(), Error> {
            self.access
                .lock()
                .await
                .insert(subject.clone(), token.clone());
            Ok(())
        }

        async fn clear(&self, subject: &SubjectId) -> Result<(), Error> {
            self.refresh.lock().await.remove(subject);
            self.access.lock().await.remove(subject);
            Ok(())
        }
    }

    fn engine() -> AuthService<MockUserRepository, MockTokenRepository> {
        AuthService::new(
            Arc::new(MockUserRepository::default()),
            Arc::new(MockTokenRepository::default()),
            Arc::new(TokenService::new(JwtConfig::new_hs256(
                TEST_HS256_SECRET.to_vec(),
            ))),
        )
    }

    fn identity(subject: &str) -> VerifiedIdentity {
        VerifiedIdentity {
            subject: SubjectId::new(subject),
            email: "a@b.com".to_string(),
            display_name: "Ann Example".to_string(),
            avatar_url: "https://example.com/a.png".to_string(),
        }
    }

    fn kai() -> Child {
        Child {
            name: "Kai".to_string(),
            gender: Gender::Male,
            birthdate: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_register_applies_defaults() {
        let engine = engine();

        let session = engine
            .register(
                identity("g1"),
                RegistrationInfo {
                    nickname: Some("Ann".to_string()),
                    monthly_budget: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(session.user.nickname, "Ann");
        assert_eq!(session.user.monthly_budget, 0);
        assert!(session.user.children.is_empty());
    }

    #[tokio::test]
    async fn test_register_twice_fails() {
        let engine = engine();

        engine
            .register(identity("g1"), RegistrationInfo::default())
            .await
            .unwrap();
        let result = engine
            .register(identity("g1"), RegistrationInfo::default())
            .await;

        assert!(matches!(
            result,
            Err(Error::User(UserError::AlreadyExists))
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_incomplete_identity() {
        let engine = engine();

        let result = engine
            .register(identity(""), RegistrationInfo::default())
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));

        let mut bad_email = identity("g1");
        bad_email.email = "not-an-email".to_string();
        let result = engine.register(bad_email, RegistrationInfo::default()).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_for_unknown_subject_is_unauthorized() {
        let engine = engine();

        // Deliberately Unauthorized rather than NotFound.
        let result = engine.login(identity("nobody")).await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::Unauthorized))
        ));
    }

    #[tokio::test]
    async fn test_login_rotates_refresh_token() {
        let engine = engine();

        let registered = engine
            .register(identity("g1"), RegistrationInfo::default())
            .await
            .unwrap();
        let logged_in = engine.login(identity("g1")).await.unwrap();

        assert_ne!(registered.refresh_token, logged_in.refresh_token);

        // The rotated-out token no longer refreshes, despite being unexpired.
        let result = engine.refresh_access_token(&registered.refresh_token).await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::Unauthorized))
        ));

        // The current one does.
        assert!(
            engine
                .refresh_access_token(&logged_in.refresh_token)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_refresh_does_not_rotate() {
        let engine = engine();

        let session = engine
            .register(identity("g1"), RegistrationInfo::default())
            .await
            .unwrap();

        engine
            .refresh_access_token(&session.refresh_token)
            .await
            .unwrap();

        // Same refresh token keeps working: refresh never writes the slot.
        assert!(
            engine
                .refresh_access_token(&session.refresh_token)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let engine = engine();

        let session = engine
            .register(identity("g1"), RegistrationInfo::default())
            .await
            .unwrap();

        let result = engine.refresh_access_token(&session.access_token).await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::Unauthorized))
        ));
    }

    #[tokio::test]
    async fn test_refresh_rejects_garbage() {
        let engine = engine();

        let result = engine
            .refresh_access_token(&SignedToken::from("not.a.token"))
            .await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::Unauthorized))
        ));
    }

    #[tokio::test]
    async fn test_verify_access_token_rejects_refresh_token() {
        let engine = engine();

        let session = engine
            .register(identity("g1"), RegistrationInfo::default())
            .await
            .unwrap();

        assert_eq!(
            engine.verify_access_token(&session.access_token).unwrap(),
            SubjectId::new("g1")
        );
        assert!(engine.verify_access_token(&session.refresh_token).is_err());
    }

    #[tokio::test]
    async fn test_logout_clears_tokens_but_requires_user() {
        let engine = engine();

        let session = engine
            .register(identity("g1"), RegistrationInfo::default())
            .await
            .unwrap();

        engine.logout(&SubjectId::new("g1")).await.unwrap();

        let result = engine.refresh_access_token(&session.refresh_token).await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::Unauthorized))
        ));

        // Repeat logout is fine; logout of an unknown subject is not.
        engine.logout(&SubjectId::new("g1")).await.unwrap();
        let result = engine.logout(&SubjectId::new("nobody")).await;
        assert!(matches!(result, Err(Error::User(UserError::NotFound))));
    }

    #[tokio::test]
    async fn test_update_user_merges_patch() {
        let engine = engine();

        engine
            .register(identity("g1"), RegistrationInfo::default())
            .await
            .unwrap();

        let updated = engine
            .update_user(
                &SubjectId::new("g1"),
                UserPatch {
                    nickname: Some("Annie".to_string()),
                    monthly_budget: Some(300),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.nickname, "Annie");
        assert_eq!(updated.monthly_budget, 300);
        assert_eq!(updated.email, "a@b.com");
        assert_eq!(updated.subject, SubjectId::new("g1"));
    }

    #[tokio::test]
    async fn test_update_user_validates_patched_email() {
        let engine = engine();

        engine
            .register(identity("g1"), RegistrationInfo::default())
            .await
            .unwrap();

        let result = engine
            .update_user(
                &SubjectId::new("g1"),
                UserPatch {
                    email: Some("nope".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_user_revokes_credentials() {
        let engine = engine();

        let session = engine
            .register(identity("g1"), RegistrationInfo::default())
            .await
            .unwrap();

        engine.delete_user(&SubjectId::new("g1")).await.unwrap();

        assert!(matches!(
            engine.get_user(&SubjectId::new("g1")).await,
            Err(Error::User(UserError::NotFound))
        ));
        assert!(
            engine
                .refresh_access_token(&session.refresh_token)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_child_operations_propagate_repository_errors() {
        let engine = engine();
        let subject = SubjectId::new("g1");

        engine
            .register(identity("g1"), RegistrationInfo::default())
            .await
            .unwrap();

        engine.add_child(&subject, kai()).await.unwrap();

        let result = engine.add_child(&subject, kai()).await;
        assert!(matches!(
            result,
            Err(Error::User(UserError::ChildAlreadyExists(_)))
        ));

        let result = engine
            .update_child(&subject, "Noa", ChildPatch::default())
            .await;
        assert!(matches!(
            result,
            Err(Error::User(UserError::ChildNotFound(_)))
        ));

        let result = engine.delete_child(&subject, "Noa").await;
        assert!(matches!(
            result,
            Err(Error::User(UserError::ChildNotFound(_)))
        ));

        let user = engine.delete_child(&subject, "Kai").await.unwrap();
        assert!(user.children.is_empty());
    }
}
