use thiserror::Error;

use crate::domain::session::errors::SessionStoreError;
use crate::user::errors::DisplayNameError;
use crate::user::errors::EmailError;
use crate::user::errors::UserIdError;

/// Top-level error taxonomy for the token lifecycle and account operations.
///
/// All variants are recoverable and are mapped to a response classification
/// at the HTTP boundary. `InvalidCredentials` deliberately covers both "no
/// such account" and "wrong password" to avoid account enumeration;
/// `InvalidOrExpiredToken` likewise hides whether a refresh token ever
/// existed.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Invalid value: {0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired refresh token")]
    InvalidOrExpiredToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Operation failed: {0}")]
    Failure(String),
}

impl From<UserIdError> for AuthError {
    fn from(err: UserIdError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<EmailError> for AuthError {
    fn from(err: EmailError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<DisplayNameError> for AuthError {
    fn from(err: DisplayNameError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<auth::PasswordError> for AuthError {
    fn from(err: auth::PasswordError) -> Self {
        AuthError::Failure(err.to_string())
    }
}

impl From<auth::JwtError> for AuthError {
    fn from(err: auth::JwtError) -> Self {
        AuthError::Failure(err.to_string())
    }
}

impl From<SessionStoreError> for AuthError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::NotFound | SessionStoreError::Expired => {
                AuthError::InvalidOrExpiredToken
            }
            SessionStoreError::Database(msg) => AuthError::Failure(msg),
        }
    }
}
