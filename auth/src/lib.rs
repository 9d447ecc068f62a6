//! Authentication utilities library
//!
//! Provides the token-level building blocks for the auth service:
//! - Password hashing (Argon2id)
//! - Access-token claims and HS256 signing/validation
//!
//! The crate is deliberately IO-free: claim assembly, session storage, and
//! protocol orchestration live in the service that consumes it.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Access Tokens
//! ```
//! use auth::{AccessClaims, JwtHandler};
//! use chrono::Utc;
//!
//! let now = Utc::now().timestamp();
//! let handler = JwtHandler::new(b"secret_key_at_least_32_bytes_long!");
//! let claims = AccessClaims::issue("user123", "ann", "a@x.com", "jti-1", now, now + 900)
//!     .with_permissions(["orders.read"]);
//! let token = handler.encode(&claims).unwrap();
//! let decoded: AccessClaims = handler.decode(&token).unwrap();
//! assert!(decoded.has_permission("ORDERS.READ"));
//! ```

pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use jwt::AccessClaims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use password::PasswordError;
pub use password::PasswordHasher;
