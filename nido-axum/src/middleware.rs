use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use nido::{CredentialStore, Nido, SignedToken, SubjectId};

pub struct AuthState<S: CredentialStore> {
    pub nido: Arc<Nido<S>>,
}

impl<S: CredentialStore> Clone for AuthState<S> {
    fn clone(&self) -> Self {
        Self {
            nido: self.nido.clone(),
        }
    }
}

/// Resolve the bearer access token, if any, into the request's subject.
///
/// The subject lands in the request extensions as `Option<SubjectId>`;
/// handlers needing authentication pull it out via the `AuthSubject`
/// extractor. Verification is stateless (signature, expiry, token kind).
pub async fn auth_middleware<S>(
    State(state): State<AuthState<S>>,
    mut request: Request,
    next: Next,
) -> Response
where
    S: CredentialStore,
{
    request.extensions_mut().insert(None::<SubjectId>);

    if let Some(token) = extract_bearer_token(&request) {
        match state.nido.verify_access_token(&SignedToken::from(token)) {
            Ok(subject) => {
                request.extensions_mut().insert(Some(subject));
            }
            Err(e) => {
                tracing::debug!("Invalid bearer token: {e}");
            }
        }
    }

    next.run(request).await
}

fn extract_bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}
