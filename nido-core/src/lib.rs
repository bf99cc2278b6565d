//! Core functionality for the nido project
//!
//! This module contains the credential lifecycle and user-record engine:
//! the user aggregate, the signed-token machinery, the credential-store
//! contract, and the repositories and services composed on top of them.
//!
//! It is designed to be used as a dependency for storage backends and
//! transport layers and is not intended to be used directly by application
//! code; see the `nido` crate for the composed facade.
//!
//! See [`User`] for the user aggregate, [`CredentialStore`] for the storage
//! contract, and [`services::AuthService`] for the session engine.

pub mod error;
pub mod id;
pub mod repositories;
pub mod services;
pub mod store;
pub mod token;
pub mod user;
pub mod validation;

pub use error::Error;
pub use store::{CredentialStore, TimedStore};
pub use token::{Claims, JwtAlgorithm, JwtConfig, SignedToken, TokenKind, TokenPair};
pub use user::{
    Child, ChildPatch, Gender, RegistrationInfo, SubjectId, User, UserPatch, VerifiedIdentity,
};
