use serde::{Deserialize, Serialize};

use nido::{AuthSession, Child, ChildPatch, RegistrationInfo, SignedToken, User, UserPatch, VerifiedIdentity};

/// Body for `POST /register`: the identity assertion produced by the OAuth
/// collaborator plus the profile fields collected from the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub identity: VerifiedIdentity,
    #[serde(default)]
    pub info: RegistrationInfo,
}

/// Body for `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub identity: VerifiedIdentity,
}

/// Body for `POST /refresh`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: SignedToken,
}

/// Body for `POST /children`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddChildRequest {
    #[serde(flatten)]
    pub child: Child,
}

/// Body for `PATCH /children/{name}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateChildRequest {
    #[serde(flatten)]
    pub patch: ChildPatch,
}

/// Body for `PATCH /user`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(flatten)]
    pub patch: UserPatch,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub access_token: SignedToken,
    pub refresh_token: SignedToken,
    pub user: User,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            user: session.user,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub access_token: SignedToken,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
