use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::session::errors::SessionStoreError;
use crate::domain::session::models::RefreshSession;
use crate::user::models::UserId;

/// Persistence operations for refresh sessions.
///
/// The store is the single source of truth for session existence; callers
/// never cache it in memory.
#[async_trait]
pub trait RefreshSessionStore: Send + Sync + 'static {
    /// Durably persist a new session.
    ///
    /// Issuance is atomic from the caller's view: if this fails, the paired
    /// access token must not be handed out.
    ///
    /// # Errors
    /// * `Database` - Insert failed
    async fn create(&self, session: RefreshSession) -> Result<RefreshSession, SessionStoreError>;

    /// Look up a session by its exact opaque token value.
    ///
    /// A malformed token value behaves as an unknown one.
    ///
    /// # Errors
    /// * `NotFound` - No session carries this token value
    /// * `Expired` - Session exists but its expiry has passed
    /// * `Database` - Lookup failed
    async fn find_by_token(&self, refresh_token: &str)
        -> Result<RefreshSession, SessionStoreError>;

    /// Remove exactly one session by identifier.
    ///
    /// Idempotent: deleting an already-gone session is not an error.
    ///
    /// # Errors
    /// * `Database` - Delete failed
    async fn delete_one(&self, session_id: Uuid) -> Result<(), SessionStoreError>;

    /// Remove every session owned by the user in one set-based statement.
    ///
    /// Returns the number of sessions removed.
    ///
    /// # Errors
    /// * `Database` - Delete failed
    async fn delete_all_for_user(&self, user_id: &UserId) -> Result<u64, SessionStoreError>;
}
