use async_trait::async_trait;

use crate::domain::identity::errors::AuthError;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Query-layer visibility filter for soft-deleted accounts.
///
/// Deleted rows are excluded by default; every call site that needs to see
/// them says so explicitly, keeping the visibility rules auditable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    ActiveOnly,
    IncludeDeleted,
}

/// Persistence operations for the user aggregate (Account State).
///
/// Users are never hard-deleted; removal is a status change via `update`.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new user.
    ///
    /// # Errors
    /// * `Conflict` - Email is already registered (any account, incl. deleted)
    /// * `Failure` - Database operation failed
    async fn create(&self, user: User) -> Result<User, AuthError>;

    /// Retrieve a user by identifier.
    ///
    /// # Errors
    /// * `Failure` - Database operation failed
    async fn find_by_id(&self, id: &UserId, visibility: Visibility)
        -> Result<Option<User>, AuthError>;

    /// Retrieve a user by email (matched on the normalized form).
    ///
    /// # Errors
    /// * `Failure` - Database operation failed
    async fn find_by_email(
        &self,
        email: &EmailAddress,
        visibility: Visibility,
    ) -> Result<Option<User>, AuthError>;

    /// Persist changed fields of an existing user.
    ///
    /// # Errors
    /// * `NotFound` - User row does not exist
    /// * `Conflict` - New email is already registered
    /// * `Failure` - Database operation failed
    async fn update(&self, user: &User) -> Result<(), AuthError>;

    /// Grant a role to a user by role name. Granting an already-held role is
    /// not an error.
    ///
    /// # Errors
    /// * `NotFound` - Role does not exist in the catalog
    /// * `Failure` - Database operation failed
    async fn add_to_role(&self, id: &UserId, role: &str) -> Result<(), AuthError>;
}

/// Read access to the permission catalog.
///
/// Consulted at token issuance only; request-time authorization reads the
/// claims already baked into the presented access token.
#[async_trait]
pub trait PermissionCatalog: Send + Sync + 'static {
    /// Role names granted to the user.
    async fn role_names(&self, user_id: &UserId) -> Result<Vec<String>, AuthError>;

    /// Effective permission codes: union of role grants and direct grants.
    async fn permission_codes(&self, user_id: &UserId) -> Result<Vec<String>, AuthError>;
}
