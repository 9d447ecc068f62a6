use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::session::errors::SessionStoreError;
use crate::domain::session::models::RefreshSession;
use crate::domain::session::ports::RefreshSessionStore;
use crate::domain::user::models::UserId;

/// PostgreSQL implementation of RefreshSessionStore.
///
/// The refresh token column carries a unique index; lookups parse the opaque
/// client value as a UUID first, so garbage input never reaches the database
/// and behaves exactly like an unknown token.
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    jti: Uuid,
    refresh_token: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for RefreshSession {
    fn from(row: SessionRow) -> Self {
        RefreshSession {
            id: row.id,
            user_id: UserId(row.user_id),
            jti: row.jti,
            refresh_token: row.refresh_token,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

#[async_trait]
impl RefreshSessionStore for PostgresSessionStore {
    async fn create(&self, session: RefreshSession) -> Result<RefreshSession, SessionStoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_sessions (id, user_id, jti, refresh_token, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(session.id)
        .bind(session.user_id.0)
        .bind(session.jti)
        .bind(session.refresh_token)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionStoreError::Database(e.to_string()))?;

        tracing::debug!(session_id = %session.id, user_id = %session.user_id, "Session row created");
        Ok(session)
    }

    async fn find_by_token(&self, refresh_token: &str) -> Result<RefreshSession, SessionStoreError> {
        let token = Uuid::parse_str(refresh_token.trim()).map_err(|_| SessionStoreError::NotFound)?;

        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, jti, refresh_token, created_at, expires_at
            FROM refresh_sessions
            WHERE refresh_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionStoreError::Database(e.to_string()))?;

        let session: RefreshSession = row.ok_or(SessionStoreError::NotFound)?.into();

        // Expiry is checked in code so the caller can tell an expired session
        // apart from an unknown token in its logs
        if session.is_expired(Utc::now()) {
            return Err(SessionStoreError::Expired);
        }

        Ok(session)
    }

    async fn delete_one(&self, session_id: Uuid) -> Result<(), SessionStoreError> {
        let result = sqlx::query("DELETE FROM refresh_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| SessionStoreError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            tracing::debug!(session_id = %session_id, "Session already gone");
        }

        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: &UserId) -> Result<u64, SessionStoreError> {
        let result = sqlx::query("DELETE FROM refresh_sessions WHERE user_id = $1")
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| SessionStoreError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
