use std::sync::Arc;

use auth::AccessClaims;
use auth::JwtHandler;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::identity::errors::AuthError;
use crate::domain::identity::models::TokenPair;
use crate::domain::session::models::RefreshSession;
use crate::domain::session::ports::RefreshSessionStore;
use crate::user::models::User;
use crate::user::ports::PermissionCatalog;

/// Token lifetime configuration, immutable after startup.
#[derive(Debug, Clone)]
pub struct TokenOptions {
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub access_lifetime_minutes: i64,
    pub refresh_lifetime_days: i64,
}

/// A freshly signed access token and its validity window.
#[derive(Debug, Clone)]
pub struct IssuedAccessToken {
    pub token: String,
    /// Pairing key stored on the refresh session created alongside.
    pub jti: Uuid,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
}

/// Builds and signs access tokens and creates their paired refresh sessions.
///
/// Claims are a point-in-time snapshot: roles and effective permission codes
/// are read from the catalog here and never re-queried per request, so grant
/// changes take effect on the next issuance or rotation.
pub struct TokenIssuer<SS, PC>
where
    SS: RefreshSessionStore,
    PC: PermissionCatalog,
{
    jwt: Arc<JwtHandler>,
    sessions: Arc<SS>,
    catalog: Arc<PC>,
    options: TokenOptions,
}

impl<SS, PC> TokenIssuer<SS, PC>
where
    SS: RefreshSessionStore,
    PC: PermissionCatalog,
{
    pub fn new(jwt: Arc<JwtHandler>, sessions: Arc<SS>, catalog: Arc<PC>, options: TokenOptions) -> Self {
        Self {
            jwt,
            sessions,
            catalog,
            options,
        }
    }

    /// Assemble claims and sign an access token for the user.
    ///
    /// Role names and permission codes are deduplicated case-insensitively;
    /// the validity window is `[now, now + access_lifetime_minutes)`.
    pub async fn issue_access_token(&self, user: &User) -> Result<IssuedAccessToken, AuthError> {
        let roles = self.catalog.role_names(&user.id).await?;
        let permissions = self.catalog.permission_codes(&user.id).await?;

        let now = Utc::now();
        let valid_to = now + Duration::minutes(self.options.access_lifetime_minutes);
        let jti = Uuid::new_v4();

        let mut claims = AccessClaims::issue(
            user.id,
            user.display_name.as_str(),
            user.email.as_str(),
            jti,
            now.timestamp(),
            valid_to.timestamp(),
        )
        .with_roles(roles)
        .with_permissions(permissions);

        if let Some(iss) = &self.options.issuer {
            claims = claims.with_issuer(iss);
        }
        if let Some(aud) = &self.options.audience {
            claims = claims.with_audience(aud);
        }

        let token = self.jwt.encode(&claims)?;

        tracing::debug!(user_id = %user.id, %jti, "Access token issued");

        Ok(IssuedAccessToken {
            token,
            jti,
            valid_from: now,
            valid_to,
        })
    }

    /// Persist the refresh session paired to the given access-token `jti`.
    pub async fn issue_refresh_session(
        &self,
        user: &User,
        jti: Uuid,
    ) -> Result<RefreshSession, AuthError> {
        let session = RefreshSession::mint(
            user.id,
            jti,
            Utc::now(),
            self.options.refresh_lifetime_days,
        );

        let session = self.sessions.create(session).await.map_err(|e| {
            tracing::error!(user_id = %user.id, error = %e, "Failed to persist refresh session");
            AuthError::Failure(e.to_string())
        })?;

        tracing::debug!(user_id = %user.id, session_id = %session.id, "Refresh session created");

        Ok(session)
    }

    /// Mint a full token pair: sign the access token, then durably persist
    /// the paired session.
    ///
    /// Issuance is atomic from the caller's view: if persistence fails, the
    /// already-computed access token is discarded and no pair is returned.
    pub async fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access = self.issue_access_token(user).await?;
        let session = self.issue_refresh_session(user, access.jti).await?;

        Ok(TokenPair {
            access_token: access.token,
            access_expires_at: access.valid_to,
            refresh_token: session.refresh_token,
            refresh_expires_at: session.expires_at,
        })
    }
}
