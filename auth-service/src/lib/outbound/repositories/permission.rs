use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::identity::errors::AuthError;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::PermissionCatalog;

/// PostgreSQL implementation of PermissionCatalog.
///
/// Effective permissions are the union of role-attached grants and direct
/// per-user grants. Queried only at token issuance; revocations take effect
/// when the outstanding access tokens expire.
pub struct PostgresPermissionCatalog {
    pool: PgPool,
}

impl PostgresPermissionCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionCatalog for PostgresPermissionCatalog {
    async fn role_names(&self, user_id: &UserId) -> Result<Vec<String>, AuthError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::Failure(e.to_string()))
    }

    async fn permission_codes(&self, user_id: &UserId) -> Result<Vec<String>, AuthError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT p.code
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            JOIN user_roles ur ON ur.role_id = rp.role_id
            WHERE ur.user_id = $1
            UNION
            SELECT p.code
            FROM permissions p
            JOIN user_permissions up ON up.permission_id = p.id
            WHERE up.user_id = $1
            ORDER BY 1
            "#,
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::Failure(e.to_string()))
    }
}
