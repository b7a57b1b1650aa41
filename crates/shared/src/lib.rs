//! Shared types, errors, and configuration for Kosh.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT claims, roles, and token handling

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::{Claims, Role};
pub use config::{AppConfig, JwtConfig, TaxConfig};
pub use error::{AppError, AppResult};
pub use jwt::{JwtError, JwtService};
