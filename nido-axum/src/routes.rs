use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use nido::{CredentialStore, Nido};

use crate::{
    error::Result,
    extractors::AuthSubject,
    middleware::{AuthState, auth_middleware},
    types::*,
};

pub fn create_router<S>(nido: Arc<Nido<S>>) -> Router
where
    S: CredentialStore,
{
    let state = AuthState { nido };

    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/refresh", post(refresh_handler));

    let protected_routes = Router::new()
        .route("/logout", post(logout_handler))
        .route(
            "/user",
            get(get_user_handler)
                .patch(update_user_handler)
                .delete(delete_user_handler),
        )
        .route("/children", post(add_child_handler))
        .route(
            "/children/{name}",
            axum::routing::patch(update_child_handler).delete(delete_child_handler),
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<S>,
        ))
        .with_state(state)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn register_handler<S>(
    State(state): State<AuthState<S>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse>
where
    S: CredentialStore,
{
    let session = state.nido.register(payload.identity, payload.info).await?;

    Ok((StatusCode::CREATED, Json(AuthResponse::from(session))))
}

async fn login_handler<S>(
    State(state): State<AuthState<S>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse>
where
    S: CredentialStore,
{
    let session = state.nido.login(payload.identity).await?;

    Ok(Json(AuthResponse::from(session)))
}

async fn refresh_handler<S>(
    State(state): State<AuthState<S>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse>
where
    S: CredentialStore,
{
    let access_token = state
        .nido
        .refresh_access_token(&payload.refresh_token)
        .await?;

    Ok(Json(RefreshResponse { access_token }))
}

async fn logout_handler<S>(
    State(state): State<AuthState<S>>,
    AuthSubject(subject): AuthSubject,
) -> Result<impl IntoResponse>
where
    S: CredentialStore,
{
    state.nido.logout(&subject).await?;

    Ok(Json(MessageResponse {
        message: "Successfully logged out".to_string(),
    }))
}

async fn get_user_handler<S>(
    State(state): State<AuthState<S>>,
    AuthSubject(subject): AuthSubject,
) -> Result<impl IntoResponse>
where
    S: CredentialStore,
{
    let user = state.nido.get_user(&subject).await?;

    Ok(Json(UserResponse { user }))
}

async fn update_user_handler<S>(
    State(state): State<AuthState<S>>,
    AuthSubject(subject): AuthSubject,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse>
where
    S: CredentialStore,
{
    let user = state.nido.update_user(&subject, payload.patch).await?;

    Ok(Json(UserResponse { user }))
}

async fn delete_user_handler<S>(
    State(state): State<AuthState<S>>,
    AuthSubject(subject): AuthSubject,
) -> Result<impl IntoResponse>
where
    S: CredentialStore,
{
    state.nido.delete_user(&subject).await?;

    Ok(Json(MessageResponse {
        message: "User deleted".to_string(),
    }))
}

async fn add_child_handler<S>(
    State(state): State<AuthState<S>>,
    AuthSubject(subject): AuthSubject,
    Json(payload): Json<AddChildRequest>,
) -> Result<impl IntoResponse>
where
    S: CredentialStore,
{
    let user = state.nido.add_child(&subject, payload.child).await?;

    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

async fn update_child_handler<S>(
    State(state): State<AuthState<S>>,
    AuthSubject(subject): AuthSubject,
    Path(name): Path<String>,
    Json(payload): Json<UpdateChildRequest>,
) -> Result<impl IntoResponse>
where
    S: CredentialStore,
{
    let user = state
        .nido
        .update_child(&subject, &name, payload.patch)
        .await?;

    Ok(Json(UserResponse { user }))
}

async fn delete_child_handler<S>(
    State(state): State<AuthState<S>>,
    AuthSubject(subject): AuthSubject,
    Path(name): Path<String>,
) -> Result<impl IntoResponse>
where
    S: CredentialStore,
{
    let user = state.nido.delete_child(&subject, &name).await?;

    Ok(Json(UserResponse { user }))
}
