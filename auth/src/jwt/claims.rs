use serde::Deserialize;
use serde::Serialize;

/// Claims carried by a signed access token.
///
/// The payload is a fixed contract between the issuer and every service that
/// validates these tokens: identity (`sub`, `username`, `email`), the pairing
/// key (`jti`) linking the token to exactly one refresh session, and the
/// point-in-time authorization snapshot (`roles`, `permissions`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessClaims {
    /// Subject (user identifier)
    pub sub: String,

    /// Unique token identifier, pairs the token to its refresh session
    pub jti: String,

    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,

    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,

    /// Issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Display name at issuance time
    pub username: String,

    /// Email at issuance time
    pub email: String,

    /// Role names, deduplicated case-insensitively at issuance
    #[serde(default)]
    pub roles: Vec<String>,

    /// Effective permission codes, deduplicated case-insensitively at issuance
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl AccessClaims {
    /// Create claims for a freshly issued access token.
    ///
    /// # Arguments
    /// * `sub` - User identifier
    /// * `username` - Display name snapshot
    /// * `email` - Email snapshot
    /// * `jti` - Unique token identifier
    /// * `iat` - Issued-at Unix timestamp (seconds)
    /// * `exp` - Expiration Unix timestamp (seconds)
    pub fn issue(
        sub: impl ToString,
        username: impl ToString,
        email: impl ToString,
        jti: impl ToString,
        iat: i64,
        exp: i64,
    ) -> Self {
        Self {
            sub: sub.to_string(),
            jti: jti.to_string(),
            iat,
            exp,
            iss: None,
            aud: None,
            username: username.to_string(),
            email: email.to_string(),
            roles: Vec::new(),
            permissions: Vec::new(),
        }
    }

    /// Set issuer.
    pub fn with_issuer(mut self, iss: impl ToString) -> Self {
        self.iss = Some(iss.to_string());
        self
    }

    /// Set audience.
    pub fn with_audience(mut self, aud: impl ToString) -> Self {
        self.aud = Some(aud.to_string());
        self
    }

    /// Set role claims, trimmed and deduplicated case-insensitively.
    ///
    /// The first casing seen wins; blank entries are dropped.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.roles = dedup_case_insensitive(roles);
        self
    }

    /// Set permission claims, trimmed and deduplicated case-insensitively.
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.permissions = dedup_case_insensitive(permissions);
        self
    }

    /// Check whether the token carries a permission code (case-insensitive).
    pub fn has_permission(&self, code: &str) -> bool {
        self.permissions.iter().any(|p| p.eq_ignore_ascii_case(code))
    }

    /// Check whether the token carries a role name (case-insensitive).
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    /// Check if the token is expired at the given timestamp.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }
}

fn dedup_case_insensitive<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: Vec<String> = Vec::new();
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        let lowered = trimmed.to_ascii_lowercase();
        if seen.contains(&lowered) {
            continue;
        }
        seen.push(lowered);
        out.push(trimmed.to_string());
    }
    out
}
