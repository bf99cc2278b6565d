use chrono::{Duration, Utc};

use crate::{
    Error,
    id::generate_prefixed_id,
    token::{Claims, JwtConfig, SignedToken, TokenKind, TokenPair},
    user::SubjectId,
};

/// Authoritative token lifetimes.
///
/// The same value feeds both the signed `exp` claim and the TTL applied to
/// the token's store record — the two must never drift apart, or a token
/// could outlive its record (or the record its token).
#[derive(Debug, Clone, Copy)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::hours(1),
            refresh: Duration::days(7),
        }
    }
}

/// Service for issuing and verifying signed credentials
///
/// Issuance is pure: no store access happens here. Recording the issued
/// token as the subject's current one is the session engine's job.
pub struct TokenService {
    config: JwtConfig,
    lifetimes: TokenLifetimes,
}

impl TokenService {
    /// Create a new TokenService with the given signing configuration
    pub fn new(config: JwtConfig) -> Self {
        Self {
            config,
            lifetimes: TokenLifetimes::default(),
        }
    }

    /// Override the default token lifetimes
    pub fn with_lifetimes(mut self, lifetimes: TokenLifetimes) -> Self {
        self.lifetimes = lifetimes;
        self
    }

    pub fn lifetimes(&self) -> TokenLifetimes {
        self.lifetimes
    }

    /// Issue a short-lived access token for the subject
    pub fn issue_access(&self, subject: &SubjectId) -> Result<SignedToken, Error> {
        SignedToken::new(
            &self.claims(subject, TokenKind::Access, self.lifetimes.access, None),
            &self.config,
        )
    }

    /// Issue a refresh token for the subject, carrying a fresh `jti`
    pub fn issue_refresh(&self, subject: &SubjectId) -> Result<SignedToken, Error> {
        let jti = generate_prefixed_id("jti");
        SignedToken::new(
            &self.claims(subject, TokenKind::Refresh, self.lifetimes.refresh, Some(jti)),
            &self.config,
        )
    }

    /// Issue an access/refresh pair together
    pub fn issue_pair(&self, subject: &SubjectId) -> Result<TokenPair, Error> {
        Ok(TokenPair {
            access: self.issue_access(subject)?,
            refresh: self.issue_refresh(subject)?,
        })
    }

    /// Verify signature and expiry and return the claims.
    ///
    /// Bad signature, malformed input and expired tokens are
    /// indistinguishable to the caller.
    pub fn verify(&self, token: &SignedToken) -> Result<Claims, Error> {
        token.verify(&self.config)
    }

    fn claims(
        &self,
        subject: &SubjectId,
        kind: TokenKind,
        lifetime: Duration,
        jti: Option<String>,
    ) -> Claims {
        let now = Utc::now();
        Claims {
            sub: subject.to_string(),
            kind,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            iss: self.config.issuer.clone(),
            jti,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::validate_prefixed_id;

    const TEST_HS256_SECRET: &[u8] = b"test_secret_key_for_hs256_jwt_tokens_not_for_production_use";

    fn service() -> TokenService {
        TokenService::new(JwtConfig::new_hs256(TEST_HS256_SECRET.to_vec()))
    }

    #[test]
    fn test_access_token_claims() {
        let service = service();
        let subject = SubjectId::new("g1");

        let token = service.issue_access(&subject).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.subject(), subject);
        assert!(claims.jti.is_none());
        assert_eq!(claims.exp - claims.iat, Duration::hours(1).num_seconds());
    }

    #[test]
    fn test_refresh_token_carries_unique_jti() {
        let service = service();
        let subject = SubjectId::new("g1");

        let first = service.verify(&service.issue_refresh(&subject).unwrap()).unwrap();
        let second = service.verify(&service.issue_refresh(&subject).unwrap()).unwrap();

        let first_jti = first.jti.unwrap();
        let second_jti = second.jti.unwrap();
        assert!(validate_prefixed_id(&first_jti, "jti"));
        assert_ne!(first_jti, second_jti);
    }

    #[test]
    fn test_lifetimes_apply_to_claims() {
        let service = service().with_lifetimes(TokenLifetimes {
            access: Duration::minutes(5),
            refresh: Duration::days(1),
        });
        let subject = SubjectId::new("g1");

        let access = service.verify(&service.issue_access(&subject).unwrap()).unwrap();
        let refresh = service.verify(&service.issue_refresh(&subject).unwrap()).unwrap();

        assert_eq!(access.exp - access.iat, Duration::minutes(5).num_seconds());
        assert_eq!(refresh.exp - refresh.iat, Duration::days(1).num_seconds());
    }

    #[test]
    fn test_expired_issue_is_rejected_on_verify() {
        let service = service().with_lifetimes(TokenLifetimes {
            access: Duration::hours(-2),
            refresh: Duration::days(7),
        });

        let token = service.issue_access(&SubjectId::new("g1")).unwrap();
        assert!(service.verify(&token).is_err());
    }
}
