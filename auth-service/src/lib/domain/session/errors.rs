use thiserror::Error;

/// Error for refresh-session store operations.
///
/// `NotFound` and `Expired` are distinct so callers can log them separately
/// for audit purposes; both must be treated as an authentication failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionStoreError {
    #[error("Refresh session not found")]
    NotFound,

    #[error("Refresh session expired")]
    Expired,

    #[error("Database error: {0}")]
    Database(String),
}
