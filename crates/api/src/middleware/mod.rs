//! Request middleware.

pub mod auth;

pub use auth::{AuthUser, Permission, auth_middleware};
