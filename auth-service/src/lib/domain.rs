pub mod authorize;
pub mod identity;
pub mod session;
pub mod user;
