pub mod permission;
pub mod session;
pub mod user;
