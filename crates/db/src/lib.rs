//! PostgreSQL storage for Kosh with `SeaORM`.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the withholding tables
//! - Implementations of the `kosh_core` repository traits
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

use std::sync::Arc;
use std::time::Duration;

use kosh_core::Repositories;
use kosh_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

pub use repositories::{
    PgCertificateRepository, PgRateRepository, PgTransactionRepository, PgVendorRepository,
};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Connects to `database_url` with the pool settings from configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(
    database_url: &str,
    config: &DatabaseConfig,
) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}

/// Builds the repository set over one connection pool.
#[must_use]
pub fn repositories(db: &DatabaseConnection) -> Repositories {
    Repositories {
        rates: Arc::new(PgRateRepository::new(db.clone())),
        vendors: Arc::new(PgVendorRepository::new(db.clone())),
        transactions: Arc::new(PgTransactionRepository::new(db.clone())),
        certificates: Arc::new(PgCertificateRepository::new(db.clone())),
    }
}
