use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("User error: {0}")]
    User(#[from] UserError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User already exists")]
    AlreadyExists,

    #[error("User not found")]
    NotFound,

    #[error("Child already exists: {0}")]
    ChildAlreadyExists(String),

    #[error("Child not found: {0}")]
    ChildNotFound(String),

    #[error("Record was modified concurrently")]
    Conflict,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Infrastructure failures from the credential store. Always retryable and
/// never a statement about whether a record exists.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Operation timed out")]
    Timeout,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Credential or identity verification failed. The transport layer maps
    /// this to a 401 without further distinction.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Error::Auth(AuthError::Unauthorized) | Error::Auth(AuthError::InvalidToken)
        )
    }

    /// Infrastructure failure; the caller may retry the operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Store(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::User(UserError::Conflict))
    }
}
