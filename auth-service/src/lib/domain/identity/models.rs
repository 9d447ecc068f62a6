use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::user::models::UserId;

/// The pair handed to a client on login, registration, and refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    /// Opaque refresh token value backing the paired session.
    pub refresh_token: Uuid,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Authenticated caller identity extracted from a validated access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: UserId,
    /// The token's pairing key, when present and well-formed.
    pub jti: Option<Uuid>,
    pub display_name: String,
}

/// Command to authenticate with email and password.
#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

/// Command to create an account and issue a first token pair.
#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Command to rotate a token pair.
///
/// `caller` is present when the request carried a still-valid access token;
/// its subject and pairing key are then checked against the session.
#[derive(Debug, Clone)]
pub struct RefreshCommand {
    pub refresh_token: String,
    pub caller: Option<CurrentUser>,
}

/// Command to end one session or all of the caller's sessions.
#[derive(Debug, Clone)]
pub struct LogoutCommand {
    pub refresh_token: Option<String>,
    pub all_devices: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutScope {
    Current,
    All,
}

/// Acknowledgement of a completed logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutAck {
    pub scope: LogoutScope,
    pub at: DateTime<Utc>,
}

/// Command to change the caller's password.
#[derive(Debug, Clone)]
pub struct ChangePasswordCommand {
    pub current_password: String,
    pub new_password: String,
}

/// Command to change the caller's email, confirmed by password.
#[derive(Debug, Clone)]
pub struct ChangeEmailCommand {
    pub new_email: String,
    pub password: String,
}

/// Acknowledgement of a credential or profile mutation.
///
/// `sessions_revoked` is false when the mutation itself succeeded but the
/// best-effort invalidation of existing refresh sessions did not; those
/// sessions then live until their natural expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationAck {
    pub message: String,
    pub sessions_revoked: bool,
}
