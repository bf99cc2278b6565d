use axum::{extract::FromRequestParts, http::request::Parts};

use nido::SubjectId;

use crate::error::ApiError;

/// The authenticated subject, as resolved by the auth middleware.
///
/// Rejects with 401 when no valid bearer access token accompanied the
/// request.
pub struct AuthSubject(pub SubjectId);

impl<S> FromRequestParts<S> for AuthSubject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Option<SubjectId>>()
            .cloned()
            .flatten()
            .map(AuthSubject)
            .ok_or(ApiError::Unauthorized)
    }
}
