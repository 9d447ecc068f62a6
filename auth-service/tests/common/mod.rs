use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::AccessClaims;
use auth::JwtHandler;
use auth_service::domain::identity::errors::AuthError;
use auth_service::domain::identity::models::CurrentUser;
use auth_service::domain::identity::models::TokenPair;
use auth_service::domain::identity::service::IdentityService;
use auth_service::domain::identity::token::TokenIssuer;
use auth_service::domain::identity::token::TokenOptions;
use auth_service::domain::session::errors::SessionStoreError;
use auth_service::domain::session::models::RefreshSession;
use auth_service::domain::session::ports::RefreshSessionStore;
use auth_service::user::models::EmailAddress;
use auth_service::user::models::User;
use auth_service::user::models::UserId;
use auth_service::user::ports::PermissionCatalog;
use auth_service::user::ports::UserRepository;
use auth_service::user::ports::Visibility;
use chrono::Utc;
use uuid::Uuid;

pub const TEST_SECRET: &[u8] = b"integration_test_secret_32_bytes!!!!";

/// In-memory backing store implementing every persistence port, so protocol
/// scenarios run end to end without a database.
pub struct InMemoryAuthStore {
    users: Mutex<Vec<User>>,
    user_roles: Mutex<HashMap<Uuid, Vec<String>>>,
    /// Fixed role catalog, keyed by lowercased role name.
    role_permissions: HashMap<String, Vec<String>>,
    sessions: Mutex<Vec<RefreshSession>>,
    /// When set, session deletes fail as if the database dropped out.
    pub fail_session_deletes: AtomicBool,
}

impl InMemoryAuthStore {
    pub fn new() -> Self {
        let mut role_permissions = HashMap::new();
        role_permissions.insert(
            "user".to_string(),
            vec![
                "auth.service".to_string(),
                "profile.read".to_string(),
                "profile.write".to_string(),
            ],
        );

        Self {
            users: Mutex::new(Vec::new()),
            user_roles: Mutex::new(HashMap::new()),
            role_permissions,
            sessions: Mutex::new(Vec::new()),
            fail_session_deletes: AtomicBool::new(false),
        }
    }

    /// Insert a session directly, bypassing the issuer. Lets tests plant
    /// already-expired sessions.
    pub fn insert_session(&self, session: RefreshSession) {
        self.sessions.lock().unwrap().push(session);
    }

    pub fn session_count_for(&self, user_id: &UserId) -> usize {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == *user_id)
            .count()
    }

    /// Strip all role grants from a user, as an admin-side revocation.
    pub fn revoke_roles(&self, user_id: &UserId) {
        self.user_roles.lock().unwrap().remove(&user_id.0);
    }
}

impl Default for InMemoryAuthStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryAuthStore {
    async fn create(&self, user: User) -> Result<User, AuthError> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.email.normalized() == user.email.normalized())
        {
            return Err(AuthError::Conflict("Email is already in use".to_string()));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(
        &self,
        id: &UserId,
        visibility: Visibility,
    ) -> Result<Option<User>, AuthError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.id == *id && (visibility == Visibility::IncludeDeleted || !u.is_deleted()))
            .cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
        visibility: Visibility,
    ) -> Result<Option<User>, AuthError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| {
                u.email.normalized() == email.normalized()
                    && (visibility == Visibility::IncludeDeleted || !u.is_deleted())
            })
            .cloned())
    }

    async fn update(&self, user: &User) -> Result<(), AuthError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AuthError::NotFound("User".to_string())),
        }
    }

    async fn add_to_role(&self, id: &UserId, role: &str) -> Result<(), AuthError> {
        if !self.role_permissions.contains_key(&role.to_lowercase()) {
            return Err(AuthError::NotFound(format!("Role {}", role)));
        }

        let mut user_roles = self.user_roles.lock().unwrap();
        let roles = user_roles.entry(id.0).or_default();
        if !roles.iter().any(|r| r.eq_ignore_ascii_case(role)) {
            roles.push(role.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl PermissionCatalog for InMemoryAuthStore {
    async fn role_names(&self, user_id: &UserId) -> Result<Vec<String>, AuthError> {
        Ok(self
            .user_roles
            .lock()
            .unwrap()
            .get(&user_id.0)
            .cloned()
            .unwrap_or_default())
    }

    async fn permission_codes(&self, user_id: &UserId) -> Result<Vec<String>, AuthError> {
        let roles = self.role_names(user_id).await?;
        let mut codes = Vec::new();
        for role in roles {
            if let Some(grants) = self.role_permissions.get(&role.to_lowercase()) {
                codes.extend(grants.iter().cloned());
            }
        }
        Ok(codes)
    }
}

#[async_trait]
impl RefreshSessionStore for InMemoryAuthStore {
    async fn create(&self, session: RefreshSession) -> Result<RefreshSession, SessionStoreError> {
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session)
    }

    async fn find_by_token(&self, refresh_token: &str) -> Result<RefreshSession, SessionStoreError> {
        let token =
            Uuid::parse_str(refresh_token.trim()).map_err(|_| SessionStoreError::NotFound)?;

        let sessions = self.sessions.lock().unwrap();
        let session = sessions
            .iter()
            .find(|s| s.refresh_token == token)
            .cloned()
            .ok_or(SessionStoreError::NotFound)?;

        if session.is_expired(Utc::now()) {
            return Err(SessionStoreError::Expired);
        }

        Ok(session)
    }

    async fn delete_one(&self, session_id: Uuid) -> Result<(), SessionStoreError> {
        if self.fail_session_deletes.load(Ordering::SeqCst) {
            return Err(SessionStoreError::Database("simulated outage".to_string()));
        }

        self.sessions.lock().unwrap().retain(|s| s.id != session_id);
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: &UserId) -> Result<u64, SessionStoreError> {
        if self.fail_session_deletes.load(Ordering::SeqCst) {
            return Err(SessionStoreError::Database("simulated outage".to_string()));
        }

        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| s.user_id != *user_id);
        Ok((before - sessions.len()) as u64)
    }
}

pub type TestIdentityService =
    IdentityService<InMemoryAuthStore, InMemoryAuthStore, InMemoryAuthStore>;

/// Build a service over a shared in-memory store, mirroring the production
/// wiring with short but realistic token lifetimes.
pub fn test_service() -> (Arc<InMemoryAuthStore>, TestIdentityService, Arc<JwtHandler>) {
    let store = Arc::new(InMemoryAuthStore::new());
    let jwt = Arc::new(JwtHandler::new(TEST_SECRET).with_issuer("auth-service"));

    let issuer = TokenIssuer::new(
        Arc::clone(&jwt),
        Arc::clone(&store),
        Arc::clone(&store),
        TokenOptions {
            issuer: Some("auth-service".to_string()),
            audience: None,
            access_lifetime_minutes: 15,
            refresh_lifetime_days: 30,
        },
    );

    let service = IdentityService::new(Arc::clone(&store), Arc::clone(&store), issuer);
    (store, service, jwt)
}

/// Decode a pair's access token into claims, as request middleware would.
pub fn claims_of(jwt: &JwtHandler, pair: &TokenPair) -> AccessClaims {
    jwt.decode(&pair.access_token).expect("valid access token")
}

/// Build the caller identity a validated bearer token would produce.
pub fn caller_from(jwt: &JwtHandler, pair: &TokenPair) -> CurrentUser {
    let claims = claims_of(jwt, pair);
    CurrentUser {
        user_id: UserId::from_string(&claims.sub).expect("valid sub claim"),
        jti: Uuid::parse_str(&claims.jti).ok(),
        display_name: claims.username,
    }
}
