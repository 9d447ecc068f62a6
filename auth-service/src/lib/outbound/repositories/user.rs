use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::identity::errors::AuthError;
use crate::domain::user::models::AccountStatus;
use crate::domain::user::models::DisplayName;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::domain::user::ports::Visibility;

/// PostgreSQL implementation of UserRepository.
///
/// Soft delete is stored as a nullable `deleted_at`/`deleted_by` pair; the
/// visibility filter becomes a `deleted_at IS NULL` predicate. Email
/// uniqueness is enforced case-insensitively by a unique index on
/// `lower(email)`.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    display_name: String,
    email: String,
    password_hash: String,
    security_stamp: Uuid,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<Uuid>,
    lockout_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let status = match row.deleted_at {
            Some(at) => AccountStatus::Deleted {
                at,
                by: row.deleted_by.map(UserId),
            },
            None => AccountStatus::Active,
        };

        Ok(User {
            id: UserId(row.id),
            display_name: DisplayName::new(row.display_name)
                .map_err(|e| AuthError::Failure(format!("Corrupt display name in database: {}", e)))?,
            email: EmailAddress::new(row.email)
                .map_err(|e| AuthError::Failure(format!("Corrupt email in database: {}", e)))?,
            password_hash: row.password_hash,
            security_stamp: row.security_stamp,
            status,
            lockout_end: row.lockout_end,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, display_name, email, password_hash, security_stamp, \
                            deleted_at, deleted_by, lockout_end, created_at";

fn deleted_fields(user: &User) -> (Option<DateTime<Utc>>, Option<Uuid>) {
    match user.status {
        AccountStatus::Active => (None, None),
        AccountStatus::Deleted { at, by } => (Some(at), by.map(|id| id.0)),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, AuthError> {
        let (deleted_at, deleted_by) = deleted_fields(&user);

        sqlx::query(
            r#"
            INSERT INTO users (id, display_name, email, password_hash, security_stamp,
                               deleted_at, deleted_by, lockout_end, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id.0)
        .bind(user.display_name.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.security_stamp)
        .bind(deleted_at)
        .bind(deleted_by)
        .bind(user.lockout_end)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AuthError::Conflict("Email is already in use".to_string());
                }
            }
            AuthError::Failure(e.to_string())
        })?;

        tracing::debug!(user_id = %user.id, "User row created");
        Ok(user)
    }

    async fn find_by_id(
        &self,
        id: &UserId,
        visibility: Visibility,
    ) -> Result<Option<User>, AuthError> {
        let sql = match visibility {
            Visibility::ActiveOnly => format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
            ),
            Visibility::IncludeDeleted => {
                format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1")
            }
        };

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Failure(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
        visibility: Visibility,
    ) -> Result<Option<User>, AuthError> {
        let sql = match visibility {
            Visibility::ActiveOnly => format!(
                "SELECT {USER_COLUMNS} FROM users \
                 WHERE lower(email) = $1 AND deleted_at IS NULL"
            ),
            Visibility::IncludeDeleted => {
                format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = $1")
            }
        };

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.normalized())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Failure(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn update(&self, user: &User) -> Result<(), AuthError> {
        let (deleted_at, deleted_by) = deleted_fields(user);

        let result = sqlx::query(
            r#"
            UPDATE users
            SET display_name = $2,
                email = $3,
                password_hash = $4,
                security_stamp = $5,
                deleted_at = $6,
                deleted_by = $7,
                lockout_end = $8
            WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(user.display_name.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.security_stamp)
        .bind(deleted_at)
        .bind(deleted_by)
        .bind(user.lockout_end)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AuthError::Conflict("Email is already in use".to_string());
                }
            }
            AuthError::Failure(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound("User".to_string()));
        }

        tracing::debug!(user_id = %user.id, "User row updated");
        Ok(())
    }

    async fn add_to_role(&self, id: &UserId, role: &str) -> Result<(), AuthError> {
        let role_id: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM roles WHERE lower(name) = lower($1)")
                .bind(role)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AuthError::Failure(e.to_string()))?;

        let role_id = role_id.ok_or_else(|| AuthError::NotFound(format!("Role {}", role)))?;

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id.0)
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Failure(e.to_string()))?;

        tracing::debug!(user_id = %id, role, "Role granted");
        Ok(())
    }
}
