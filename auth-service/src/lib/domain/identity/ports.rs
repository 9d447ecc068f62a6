use async_trait::async_trait;

use crate::domain::identity::errors::AuthError;
use crate::domain::identity::models::ChangeEmailCommand;
use crate::domain::identity::models::ChangePasswordCommand;
use crate::domain::identity::models::CurrentUser;
use crate::domain::identity::models::LoginCommand;
use crate::domain::identity::models::LogoutAck;
use crate::domain::identity::models::LogoutCommand;
use crate::domain::identity::models::MutationAck;
use crate::domain::identity::models::RefreshCommand;
use crate::domain::identity::models::RegisterCommand;
use crate::domain::identity::models::TokenPair;

/// Port for the token lifecycle and account operations exposed to request
/// handlers.
#[async_trait]
pub trait IdentityServicePort: Send + Sync + 'static {
    /// Verify credentials and issue a fresh token pair.
    ///
    /// # Errors
    /// * `Validation` - Empty email or password
    /// * `InvalidCredentials` - Unknown account, wrong password, or a
    ///   locked-out/deleted account (never distinguished)
    /// * `Failure` - Signing or persistence failed
    async fn login(&self, command: LoginCommand) -> Result<TokenPair, AuthError>;

    /// Create an account with the default role and issue its first pair.
    ///
    /// # Errors
    /// * `Validation` - Missing or malformed email/password/display name
    /// * `Conflict` - Email in use, including by a soft-deleted account
    ///   (permanently rejected)
    /// * `Failure` - Persistence or signing failed
    async fn register(&self, command: RegisterCommand) -> Result<TokenPair, AuthError>;

    /// Rotate a token pair: mint a new pair, then retire the old session.
    ///
    /// # Errors
    /// * `Validation` - Empty refresh token
    /// * `InvalidOrExpiredToken` - Unknown or timed-out refresh token
    /// * `Forbidden` - Caller identity does not own the session, or the
    ///   presented access token is not the session's pair
    /// * `NotFound` - Session owner vanished
    async fn refresh(&self, command: RefreshCommand) -> Result<TokenPair, AuthError>;

    /// End one session (ownership-checked) or all of the caller's sessions.
    ///
    /// # Errors
    /// * `Validation` - No refresh token given for a single-session logout
    /// * `InvalidOrExpiredToken` - Unknown or timed-out refresh token
    /// * `Forbidden` - Session belongs to another user
    /// * `Failure` - Delete failed
    async fn logout(
        &self,
        command: LogoutCommand,
        caller: &CurrentUser,
    ) -> Result<LogoutAck, AuthError>;

    /// Whether a visible (non-deleted) account exists for the email.
    ///
    /// # Errors
    /// * `Validation` - Blank email
    async fn check_email(&self, email: &str) -> Result<bool, AuthError>;

    /// Change the caller's password, rotate the security stamp, and revoke
    /// all refresh sessions (best-effort, reported in the ack).
    ///
    /// # Errors
    /// * `Validation` - Missing passwords, unchanged value, or wrong current
    ///   password
    /// * `NotFound` - Caller's account vanished
    /// * `Failure` - Persistence failed
    async fn change_password(
        &self,
        command: ChangePasswordCommand,
        caller: &CurrentUser,
    ) -> Result<MutationAck, AuthError>;

    /// Change the caller's email, rotate the security stamp, and revoke all
    /// refresh sessions (best-effort, reported in the ack).
    ///
    /// # Errors
    /// * `Validation` - Missing input, wrong password, or unchanged value
    /// * `Conflict` - Email in use by any account, including deleted ones
    /// * `NotFound` - Caller's account vanished
    /// * `Failure` - Persistence failed
    async fn change_email(
        &self,
        command: ChangeEmailCommand,
        caller: &CurrentUser,
    ) -> Result<MutationAck, AuthError>;

    /// Soft-delete the caller's account (idempotent) and revoke all refresh
    /// sessions (best-effort, reported in the ack).
    ///
    /// # Errors
    /// * `NotFound` - Caller's account vanished
    /// * `Failure` - Persistence failed
    async fn delete_profile(&self, caller: &CurrentUser) -> Result<MutationAck, AuthError>;
}
