use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use chrono::Utc;

use crate::domain::identity::errors::AuthError;
use crate::domain::identity::models::ChangeEmailCommand;
use crate::domain::identity::models::ChangePasswordCommand;
use crate::domain::identity::models::CurrentUser;
use crate::domain::identity::models::LoginCommand;
use crate::domain::identity::models::LogoutAck;
use crate::domain::identity::models::LogoutCommand;
use crate::domain::identity::models::LogoutScope;
use crate::domain::identity::models::MutationAck;
use crate::domain::identity::models::RefreshCommand;
use crate::domain::identity::models::RegisterCommand;
use crate::domain::identity::models::TokenPair;
use crate::domain::identity::ports::IdentityServicePort;
use crate::domain::identity::token::TokenIssuer;
use crate::domain::session::errors::SessionStoreError;
use crate::domain::session::ports::RefreshSessionStore;
use crate::user::models::DisplayName;
use crate::user::models::EmailAddress;
use crate::user::models::User;
use crate::user::ports::PermissionCatalog;
use crate::user::ports::UserRepository;
use crate::user::ports::Visibility;

/// Role granted to every self-registered account.
pub const DEFAULT_ROLE: &str = "USER";

/// Domain service implementing the refresh/rotation protocol and the
/// account operations that feed it.
pub struct IdentityService<UR, SS, PC>
where
    UR: UserRepository,
    SS: RefreshSessionStore,
    PC: PermissionCatalog,
{
    users: Arc<UR>,
    sessions: Arc<SS>,
    issuer: TokenIssuer<SS, PC>,
    password_hasher: PasswordHasher,
}

impl<UR, SS, PC> IdentityService<UR, SS, PC>
where
    UR: UserRepository,
    SS: RefreshSessionStore,
    PC: PermissionCatalog,
{
    pub fn new(users: Arc<UR>, sessions: Arc<SS>, issuer: TokenIssuer<SS, PC>) -> Self {
        Self {
            users,
            sessions,
            issuer,
            password_hasher: PasswordHasher::new(),
        }
    }

    /// Best-effort bulk session invalidation after a successful credential
    /// mutation. The mutation is not rolled back on failure; the caller is
    /// told whether old sessions are actually gone.
    async fn revoke_all_sessions(&self, user: &User) -> bool {
        match self.sessions.delete_all_for_user(&user.id).await {
            Ok(count) => {
                tracing::info!(user_id = %user.id, revoked = count, "Refresh sessions revoked");
                true
            }
            Err(e) => {
                tracing::error!(
                    user_id = %user.id,
                    error = %e,
                    "Mutation persisted but refresh sessions could not be revoked; \
                     they remain live until natural expiry"
                );
                false
            }
        }
    }

    fn lookup_failure(e: SessionStoreError) -> AuthError {
        match &e {
            SessionStoreError::NotFound => {
                tracing::warn!("Refresh session not found");
            }
            SessionStoreError::Expired => {
                tracing::warn!("Refresh session expired");
            }
            SessionStoreError::Database(msg) => {
                tracing::error!(error = %msg, "Refresh session lookup failed");
            }
        }
        e.into()
    }
}

#[async_trait]
impl<UR, SS, PC> IdentityServicePort for IdentityService<UR, SS, PC>
where
    UR: UserRepository,
    SS: RefreshSessionStore,
    PC: PermissionCatalog,
{
    async fn login(&self, command: LoginCommand) -> Result<TokenPair, AuthError> {
        if command.email.trim().is_empty() || command.password.is_empty() {
            return Err(AuthError::Validation("email/password".to_string()));
        }

        // A malformed email cannot match an account; report it the same way
        // as an unknown one to avoid enumeration.
        let email = EmailAddress::new(command.email.as_str())
            .map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .users
            .find_by_email(&email, Visibility::ActiveOnly)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Login rejected: unknown account");
                AuthError::InvalidCredentials
            })?;

        if user.is_locked_out(Utc::now()) {
            tracing::warn!(user_id = %user.id, "Login rejected: account locked out");
            return Err(AuthError::InvalidCredentials);
        }

        let password_ok = self
            .password_hasher
            .verify(&command.password, &user.password_hash)?;
        if !password_ok {
            tracing::warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.issuer.issue_pair(&user).await?;
        tracing::info!(user_id = %user.id, "Login succeeded");

        Ok(pair)
    }

    async fn register(&self, command: RegisterCommand) -> Result<TokenPair, AuthError> {
        if command.email.trim().is_empty() {
            return Err(AuthError::Validation("email is required".to_string()));
        }
        if command.password.is_empty() {
            return Err(AuthError::Validation("password is required".to_string()));
        }

        let email = EmailAddress::new(command.email.as_str())?;
        let display_name = DisplayName::new(command.display_name.as_str())?;

        // Deleted accounts keep their claim on the address forever, so the
        // conflict check must see them.
        if let Some(existing) = self
            .users
            .find_by_email(&email, Visibility::IncludeDeleted)
            .await?
        {
            if existing.is_deleted() {
                tracing::warn!(
                    user_id = %existing.id,
                    "Registration rejected: email belongs to a deleted account"
                );
                return Err(AuthError::Conflict(
                    "An account with this email was previously deleted; re-registration is not allowed"
                        .to_string(),
                ));
            }
            tracing::warn!(user_id = %existing.id, "Registration rejected: email already in use");
            return Err(AuthError::Conflict("Email is already in use".to_string()));
        }

        let password_hash = self.password_hasher.hash(&command.password)?;
        let user = User::create(display_name, email, password_hash);

        let user = self.users.create(user).await?;
        self.users.add_to_role(&user.id, DEFAULT_ROLE).await?;

        let pair = self.issuer.issue_pair(&user).await?;
        tracing::info!(user_id = %user.id, "Registration completed");

        Ok(pair)
    }

    async fn refresh(&self, command: RefreshCommand) -> Result<TokenPair, AuthError> {
        if command.refresh_token.trim().is_empty() {
            return Err(AuthError::Validation("refreshToken is required".to_string()));
        }

        let session = self
            .sessions
            .find_by_token(&command.refresh_token)
            .await
            .map_err(Self::lookup_failure)?;

        if let Some(caller) = &command.caller {
            if caller.user_id != session.user_id {
                tracing::warn!(
                    expected = %session.user_id,
                    actual = %caller.user_id,
                    "Refresh rejected: session owner mismatch"
                );
                return Err(AuthError::Forbidden("session owner mismatch".to_string()));
            }

            if let Some(jti) = caller.jti {
                if jti != session.jti {
                    tracing::warn!(
                        expected = %session.jti,
                        actual = %jti,
                        "Refresh rejected: token pair mismatch"
                    );
                    return Err(AuthError::Forbidden("token pair mismatch".to_string()));
                }
            }
        }

        let user = self
            .users
            .find_by_id(&session.user_id, Visibility::ActiveOnly)
            .await?
            .ok_or_else(|| {
                tracing::warn!(user_id = %session.user_id, "Refresh rejected: owner not found");
                AuthError::NotFound("User".to_string())
            })?;

        // New pair before old delete: a crash between the two leaves an extra
        // valid session rather than locking the user out.
        let pair = self.issuer.issue_pair(&user).await?;

        if let Err(e) = self.sessions.delete_one(session.id).await {
            tracing::error!(
                session_id = %session.id,
                error = %e,
                "Old refresh session could not be deleted; it will self-expire"
            );
        }

        tracing::info!(user_id = %user.id, "Token pair rotated");

        Ok(pair)
    }

    async fn logout(
        &self,
        command: LogoutCommand,
        caller: &CurrentUser,
    ) -> Result<LogoutAck, AuthError> {
        if command.all_devices {
            self.sessions
                .delete_all_for_user(&caller.user_id)
                .await
                .map_err(|e| AuthError::Failure(e.to_string()))?;

            tracing::info!(user_id = %caller.user_id, "All refresh sessions deleted");
            return Ok(LogoutAck {
                scope: LogoutScope::All,
                at: Utc::now(),
            });
        }

        let token = command
            .refresh_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AuthError::Validation("refreshToken is required".to_string()))?;

        let session = self
            .sessions
            .find_by_token(token)
            .await
            .map_err(Self::lookup_failure)?;

        if session.user_id != caller.user_id {
            tracing::warn!(
                user_id = %caller.user_id,
                session_owner = %session.user_id,
                "Logout rejected: session belongs to another user"
            );
            return Err(AuthError::Forbidden("session owner mismatch".to_string()));
        }

        self.sessions
            .delete_one(session.id)
            .await
            .map_err(|e| AuthError::Failure(e.to_string()))?;

        tracing::info!(user_id = %caller.user_id, session_id = %session.id, "Session deleted");

        Ok(LogoutAck {
            scope: LogoutScope::Current,
            at: Utc::now(),
        })
    }

    async fn check_email(&self, email: &str) -> Result<bool, AuthError> {
        if email.trim().is_empty() {
            return Err(AuthError::Validation("email is required".to_string()));
        }

        // Garbage never matches an account; deleted accounts stay hidden.
        let Ok(email) = EmailAddress::new(email) else {
            return Ok(false);
        };

        let exists = self
            .users
            .find_by_email(&email, Visibility::ActiveOnly)
            .await?
            .is_some();

        tracing::info!(exists, "Email existence checked");
        Ok(exists)
    }

    async fn change_password(
        &self,
        command: ChangePasswordCommand,
        caller: &CurrentUser,
    ) -> Result<MutationAck, AuthError> {
        if command.current_password.is_empty() {
            return Err(AuthError::Validation("currentPassword is required".to_string()));
        }
        if command.new_password.is_empty() {
            return Err(AuthError::Validation("newPassword is required".to_string()));
        }
        if command.current_password == command.new_password {
            return Err(AuthError::Validation(
                "newPassword must differ from the current password".to_string(),
            ));
        }

        let mut user = self
            .users
            .find_by_id(&caller.user_id, Visibility::ActiveOnly)
            .await?
            .ok_or_else(|| AuthError::NotFound("User".to_string()))?;

        let current_ok = self
            .password_hasher
            .verify(&command.current_password, &user.password_hash)?;
        if !current_ok {
            tracing::warn!(user_id = %user.id, "Password change rejected: wrong current password");
            return Err(AuthError::Validation("currentPassword is invalid".to_string()));
        }

        user.password_hash = self.password_hasher.hash(&command.new_password)?;
        user.rotate_security_stamp();
        self.users.update(&user).await?;

        let sessions_revoked = self.revoke_all_sessions(&user).await;

        tracing::info!(user_id = %user.id, "Password changed");

        Ok(MutationAck {
            message: if sessions_revoked {
                "Password changed".to_string()
            } else {
                "Password changed, but existing sessions could not be terminated".to_string()
            },
            sessions_revoked,
        })
    }

    async fn change_email(
        &self,
        command: ChangeEmailCommand,
        caller: &CurrentUser,
    ) -> Result<MutationAck, AuthError> {
        if command.new_email.trim().is_empty() {
            return Err(AuthError::Validation("newEmail is required".to_string()));
        }
        if command.password.is_empty() {
            return Err(AuthError::Validation("password is required".to_string()));
        }

        let mut user = self
            .users
            .find_by_id(&caller.user_id, Visibility::ActiveOnly)
            .await?
            .ok_or_else(|| AuthError::NotFound("User".to_string()))?;

        let password_ok = self
            .password_hasher
            .verify(&command.password, &user.password_hash)?;
        if !password_ok {
            tracing::warn!(user_id = %user.id, "Email change rejected: wrong password");
            return Err(AuthError::Validation("password is invalid".to_string()));
        }

        let new_email = EmailAddress::new(command.new_email.as_str())?;
        if new_email.normalized() == user.email.normalized() {
            return Err(AuthError::Validation(
                "newEmail matches the current email".to_string(),
            ));
        }

        if self
            .users
            .find_by_email(&new_email, Visibility::IncludeDeleted)
            .await?
            .is_some()
        {
            tracing::warn!(user_id = %user.id, "Email change rejected: address already in use");
            return Err(AuthError::Conflict("Email is already in use".to_string()));
        }

        user.email = new_email;
        user.rotate_security_stamp();
        self.users.update(&user).await?;

        let sessions_revoked = self.revoke_all_sessions(&user).await;

        tracing::info!(user_id = %user.id, "Email changed");

        Ok(MutationAck {
            message: if sessions_revoked {
                "Email changed".to_string()
            } else {
                "Email changed, but existing sessions could not be terminated".to_string()
            },
            sessions_revoked,
        })
    }

    async fn delete_profile(&self, caller: &CurrentUser) -> Result<MutationAck, AuthError> {
        let mut user = self
            .users
            .find_by_id(&caller.user_id, Visibility::IncludeDeleted)
            .await?
            .ok_or_else(|| AuthError::NotFound("User".to_string()))?;

        if user.is_deleted() {
            // Retry after a degraded first deletion may still have live sessions
            let sessions_revoked = self.revoke_all_sessions(&user).await;
            tracing::info!(user_id = %user.id, "Profile already deleted");
            return Ok(MutationAck {
                message: "Profile is already deleted".to_string(),
                sessions_revoked,
            });
        }

        user.soft_delete(Some(caller.user_id), Utc::now());
        self.users.update(&user).await?;

        let sessions_revoked = self.revoke_all_sessions(&user).await;

        tracing::info!(user_id = %user.id, "Profile soft-deleted");

        Ok(MutationAck {
            message: if sessions_revoked {
                "Profile deleted".to_string()
            } else {
                "Profile deleted, but existing sessions could not be terminated".to_string()
            },
            sessions_revoked,
        })
    }
}
