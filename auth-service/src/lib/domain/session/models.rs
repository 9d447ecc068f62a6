use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::user::models::UserId;

/// One active refresh session.
///
/// The persisted backing record of a long-lived opaque refresh token. `jti`
/// pairs the session to exactly one issued access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSession {
    pub id: Uuid,
    pub user_id: UserId,
    /// Identifier of the paired access token.
    pub jti: Uuid,
    /// Opaque unguessable token value, unique across all sessions.
    pub refresh_token: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RefreshSession {
    /// Mint a new session for a freshly issued access token.
    pub fn mint(user_id: UserId, jti: Uuid, now: DateTime<Utc>, lifetime_days: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            jti,
            refresh_token: Uuid::new_v4(),
            created_at: now,
            expires_at: now + Duration::days(lifetime_days),
        }
    }

    /// A session is valid iff `expires_at > now`; expiry is terminal.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_sets_window_and_random_token() {
        let now = Utc::now();
        let user_id = UserId::new();
        let jti = Uuid::new_v4();

        let a = RefreshSession::mint(user_id, jti, now, 30);
        let b = RefreshSession::mint(user_id, jti, now, 30);

        assert_eq!(a.expires_at, now + Duration::days(30));
        assert_eq!(a.jti, jti);
        assert_ne!(a.refresh_token, b.refresh_token);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let session = RefreshSession::mint(UserId::new(), Uuid::new_v4(), now, 30);

        assert!(!session.is_expired(now));
        assert!(session.is_expired(session.expires_at));
        assert!(session.is_expired(session.expires_at + Duration::seconds(1)));
    }
}
