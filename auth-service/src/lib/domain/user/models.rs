use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::user::errors::DisplayNameError;
use crate::user::errors::EmailError;
use crate::user::errors::UserIdError;

/// User aggregate entity.
///
/// Holds identity, the credential hash, the security stamp, and the
/// soft-delete/lockout state consulted by the token lifecycle.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub display_name: DisplayName,
    pub email: EmailAddress,
    pub password_hash: String,
    /// Opaque value rotated on any credential-affecting change; prior
    /// sessions are treated as stale once it moves.
    pub security_stamp: Uuid,
    pub status: AccountStatus,
    /// Login is blocked while `Some(end)` with `end` in the future.
    pub lockout_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Account lifecycle state.
///
/// Soft-delete is a tagged state, not a flag: a deleted account keeps its row
/// (and its claim on the email address) forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    Deleted {
        at: DateTime<Utc>,
        by: Option<UserId>,
    },
}

impl AccountStatus {
    pub fn is_deleted(&self) -> bool {
        matches!(self, AccountStatus::Deleted { .. })
    }
}

impl User {
    /// Create a new active user.
    pub fn create(display_name: DisplayName, email: EmailAddress, password_hash: String) -> Self {
        Self {
            id: UserId::new(),
            display_name,
            email,
            password_hash,
            security_stamp: Uuid::new_v4(),
            status: AccountStatus::Active,
            lockout_end: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.status.is_deleted()
    }

    /// Whether login is currently blocked by a lockout window.
    ///
    /// Invariant: a soft-deleted account is always locked out; the reverse
    /// need not hold (an admin lockout without deletion is legal).
    pub fn is_locked_out(&self, now: DateTime<Utc>) -> bool {
        self.lockout_end.is_some_and(|end| end > now)
    }

    /// Mark the account as deleted.
    ///
    /// Engages a far-future lockout and rotates the security stamp.
    /// Idempotent: deleting an already-deleted account changes nothing.
    pub fn soft_delete(&mut self, by: Option<UserId>, now: DateTime<Utc>) {
        if self.is_deleted() {
            return;
        }

        self.lockout_end = Some(DateTime::<Utc>::MAX_UTC);
        self.rotate_security_stamp();
        self.status = AccountStatus::Deleted { at: now, by };
    }

    /// Undo a soft delete.
    ///
    /// Lifts the lockout and rotates the security stamp. Idempotent.
    pub fn restore(&mut self) {
        if !self.is_deleted() {
            return;
        }

        self.lockout_end = None;
        self.rotate_security_stamp();
        self.status = AccountStatus::Active;
    }

    /// Rotate the security stamp after a credential-affecting change.
    pub fn rotate_security_stamp(&mut self) {
        self.security_stamp = Uuid::new_v4();
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates format using an RFC 5322 compliant parser and carries the
/// case-insensitive normalized form used for uniqueness checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: impl Into<String>) -> Result<Self, EmailError> {
        let email = email.into();
        email_address::EmailAddress::from_str(email.trim())
            .map(|_| EmailAddress(email.trim().to_string()))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as entered.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased form used for case-insensitive uniqueness.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name value type
///
/// Ensures the name is non-blank and at most 64 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    const MAX_LENGTH: usize = 64;

    /// Create a new valid display name.
    ///
    /// # Errors
    /// * `Blank` - Name is empty or whitespace only
    /// * `TooLong` - Name longer than 64 characters
    pub fn new(name: impl Into<String>) -> Result<Self, DisplayNameError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DisplayNameError::Blank);
        }
        if name.chars().count() > Self::MAX_LENGTH {
            return Err(DisplayNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: name.chars().count(),
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
