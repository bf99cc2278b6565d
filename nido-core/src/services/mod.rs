//! Service layer for business logic
//!
//! This module contains concrete service implementations that encapsulate
//! credential issuance and the session engine.

pub mod auth;
pub mod token;

pub use auth::{AuthService, AuthSession};
pub use token::{TokenLifetimes, TokenService};
