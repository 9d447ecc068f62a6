use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

use auth::AccessClaims;

use crate::domain::identity::errors::AuthError;

/// A named authorization requirement: the caller's token must carry the
/// permission code.
///
/// Checks read only the claims snapshot baked into the presented token;
/// grants revoked after issuance keep working until the token expires.
#[derive(Debug)]
pub struct PermissionPolicy {
    code: String,
}

impl PermissionPolicy {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Check the policy against a token's claims.
    ///
    /// # Errors
    /// * `Forbidden` - Token does not carry the permission code
    pub fn check(&self, claims: &AccessClaims) -> Result<(), AuthError> {
        if claims.has_permission(&self.code) {
            return Ok(());
        }

        tracing::warn!(
            sub = %claims.sub,
            permission = %self.code,
            "Authorization denied: missing permission"
        );
        Err(AuthError::Forbidden(format!(
            "Missing permission: {}",
            self.code
        )))
    }
}

/// Memoizing factory for permission policies.
///
/// One policy instance exists per distinct permission code, keyed
/// case-insensitively, so every route guard for a code shares the same
/// `Arc`. Policies are immutable once built; the map only grows.
#[derive(Debug, Default)]
pub struct PolicyResolver {
    policies: RwLock<HashMap<String, Arc<PermissionPolicy>>>,
}

impl PolicyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or build the policy for a permission code.
    pub fn policy_for(&self, code: &str) -> Arc<PermissionPolicy> {
        let key = code.trim().to_ascii_lowercase();

        if let Some(policy) = self.policies.read().expect("policy map poisoned").get(&key) {
            return Arc::clone(policy);
        }

        let mut policies = self.policies.write().expect("policy map poisoned");
        // A racing writer may have built it first
        Arc::clone(
            policies
                .entry(key)
                .or_insert_with(|| Arc::new(PermissionPolicy::new(code.trim()))),
        )
    }

    /// Check a single permission code against a token's claims.
    ///
    /// # Errors
    /// * `Forbidden` - Token does not carry the permission code
    pub fn authorize(&self, claims: &AccessClaims, code: &str) -> Result<(), AuthError> {
        self.policy_for(code).check(claims)
    }

    /// Require every listed permission.
    ///
    /// # Errors
    /// * `Forbidden` - Any listed permission is missing from the token
    pub fn authorize_all(&self, claims: &AccessClaims, codes: &[&str]) -> Result<(), AuthError> {
        for code in codes {
            self.authorize(claims, code)?;
        }
        Ok(())
    }

    /// Require at least one of the listed permissions.
    ///
    /// # Errors
    /// * `Forbidden` - None of the listed permissions is on the token
    pub fn authorize_any(&self, claims: &AccessClaims, codes: &[&str]) -> Result<(), AuthError> {
        if codes
            .iter()
            .any(|code| self.policy_for(code).check(claims).is_ok())
        {
            return Ok(());
        }

        Err(AuthError::Forbidden(format!(
            "Missing all of: {}",
            codes.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_with(permissions: &[&str]) -> AccessClaims {
        AccessClaims::issue("user-1", "ann", "a@x.com", "jti-1", 1000, 2000)
            .with_permissions(permissions.iter().copied())
    }

    #[test]
    fn test_policy_grants_held_permission_case_insensitively() {
        let policy = PermissionPolicy::new("orders.read");
        assert!(policy.check(&claims_with(&["ORDERS.READ"])).is_ok());
        assert!(policy.check(&claims_with(&["orders.read"])).is_ok());
    }

    #[test]
    fn test_policy_denies_missing_permission() {
        let policy = PermissionPolicy::new("orders.write");
        let result = policy.check(&claims_with(&["orders.read"]));
        assert!(matches!(result, Err(AuthError::Forbidden(_))));
    }

    #[test]
    fn test_resolver_memoizes_per_code() {
        let resolver = PolicyResolver::new();
        let first = resolver.policy_for("orders.read");
        let again = resolver.policy_for("orders.read");
        assert!(Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn test_resolver_keys_are_case_insensitive() {
        let resolver = PolicyResolver::new();
        let lower = resolver.policy_for("orders.read");
        let upper = resolver.policy_for("Orders.Read");
        assert!(Arc::ptr_eq(&lower, &upper));
    }

    #[test]
    fn test_distinct_codes_get_distinct_policies() {
        let resolver = PolicyResolver::new();
        let read = resolver.policy_for("orders.read");
        let write = resolver.policy_for("orders.write");
        assert!(!Arc::ptr_eq(&read, &write));
    }

    #[test]
    fn test_authorize_all_requires_every_code() {
        let resolver = PolicyResolver::new();
        let claims = claims_with(&["a.read", "a.write"]);

        assert!(resolver.authorize_all(&claims, &["a.read", "a.write"]).is_ok());
        assert!(matches!(
            resolver.authorize_all(&claims, &["a.read", "a.delete"]),
            Err(AuthError::Forbidden(_))
        ));
    }

    #[test]
    fn test_authorize_any_requires_one_code() {
        let resolver = PolicyResolver::new();
        let claims = claims_with(&["a.read"]);

        assert!(resolver.authorize_any(&claims, &["a.delete", "a.read"]).is_ok());
        assert!(matches!(
            resolver.authorize_any(&claims, &["a.delete", "a.write"]),
            Err(AuthError::Forbidden(_))
        ));
    }
}
