//! # Nido Axum Integration
//!
//! This crate provides Axum routes and middleware for the nido
//! authentication backend. It maps one route onto each engine operation and
//! translates the engine's typed failures into HTTP statuses; all the real
//! behavior lives in the `nido` crate.
//!
//! Protected routes expect `Authorization: Bearer <access token>`. The
//! upstream OAuth handshake is not handled here — `/register` and `/login`
//! take the already-verified identity payload that handshake produces.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nido::{JwtConfig, MemoryStore, Nido};
//!
//! #[tokio::main]
//! async fn main() {
//!     let jwt = JwtConfig::new_hs256(b"a_signing_secret_of_sufficient_length".to_vec());
//!     let nido = Arc::new(Nido::new(MemoryStore::new(), jwt));
//!
//!     let app = axum::Router::new().nest("/auth", nido_axum::routes(nido));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

mod error;
mod extractors;
mod middleware;
mod routes;
mod types;

pub use error::{ApiError, Result};
pub use extractors::AuthSubject;
pub use middleware::{AuthState, auth_middleware};
pub use routes::create_router;
pub use types::{
    AddChildRequest, AuthResponse, HealthResponse, LoginRequest, MessageResponse,
    RefreshRequest, RefreshResponse, RegisterRequest, UpdateChildRequest, UpdateUserRequest,
    UserResponse,
};

use axum::Router;
use nido::{CredentialStore, Nido};
use std::sync::Arc;

/// Create authentication routes for your Axum application.
///
/// Returns a router that can be nested into your application at any path
/// (e.g. "/auth").
pub fn routes<S>(nido: Arc<Nido<S>>) -> Router
where
    S: CredentialStore,
{
    create_router(nido)
}
