//! Repository traits for data access
//!
//! Repositories translate between domain types and the raw bytes held by a
//! [`CredentialStore`](crate::store::CredentialStore). Services depend on the
//! traits; the `Store*` implementations beside them work against any store
//! backend and own the key scheme:
//!
//! | Key pattern               | Value                  | TTL                    |
//! | ------------------------- | ---------------------- | ---------------------- |
//! | `user:{subject}`          | serialized user record | none (durable)         |
//! | `access_token:{subject}`  | signed access token    | access-token lifetime  |
//! | `refresh_token:{subject}` | signed refresh token   | refresh-token lifetime |

pub mod token;
pub mod user;

pub use token::{StoreTokenRepository, TokenRepository};
pub use user::{StoreUserRepository, UserRepository};
