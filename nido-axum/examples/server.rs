//! Minimal runnable nido server backed by the in-memory store.
//!
//! Configuration comes from the environment:
//! - `NIDO_ADDR`        listen address (default `127.0.0.1:3001`)
//! - `NIDO_JWT_SECRET`  HS256 signing secret (required)
//!
//! The signing secret is read once at startup and never changes afterwards.

use std::sync::Arc;

use nido::{JwtConfig, MemoryStore, Nido};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let addr = std::env::var("NIDO_ADDR").unwrap_or_else(|_| "127.0.0.1:3001".to_string());
    let secret = std::env::var("NIDO_JWT_SECRET")
        .map_err(|_| "Missing required environment variable: NIDO_JWT_SECRET")?;

    let jwt = JwtConfig::new_hs256(secret.into_bytes()).with_issuer("nido");
    let nido = Arc::new(Nido::new(MemoryStore::new(), jwt));

    let app = axum::Router::new()
        .nest("/auth", nido_axum::routes(nido))
        .layer(CorsLayer::permissive());

    tracing::info!(%addr, "Starting nido server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
