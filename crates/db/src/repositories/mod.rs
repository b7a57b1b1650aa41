//! PostgreSQL implementations of the core storage traits.
//!
//! Each repository wraps a `DatabaseConnection` and converts between `SeaORM`
//! models and the domain types in `kosh_core`.

pub mod certificate;
pub mod rate;
pub mod transaction;
pub mod vendor;

pub use certificate::PgCertificateRepository;
pub use rate::PgRateRepository;
pub use transaction::PgTransactionRepository;
pub use vendor::PgVendorRepository;

use chrono::{DateTime, FixedOffset, Utc};
use kosh_core::RepositoryError;
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Foreign key from `tax_transactions` to `vendors`.
pub(crate) const VENDOR_FK: &str = "fk_tax_transactions_vendor";

/// Maps a database error. Unique violations become `Duplicate(key)` and
/// foreign-key violations `Referenced(key)`.
pub(crate) fn write_error(err: DbErr, key: &str) -> RepositoryError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(constraint)) => {
            debug!(key, constraint = %constraint, "unique constraint violation");
            RepositoryError::Duplicate(key.to_string())
        }
        Some(SqlErr::ForeignKeyConstraintViolation(constraint)) => {
            debug!(key, constraint = %constraint, "foreign key violation");
            RepositoryError::Referenced(key.to_string())
        }
        _ => match err {
            DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => {
                RepositoryError::NotFound(key.to_string())
            }
            other => storage(other),
        },
    }
}

pub(crate) fn storage(err: DbErr) -> RepositoryError {
    RepositoryError::Storage(err.to_string())
}

/// A stored value that no longer parses.
pub(crate) fn corrupt(column: &str, value: &str) -> RepositoryError {
    RepositoryError::Storage(format!("unreadable {column} value: {value}"))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(value).map_err(|e| RepositoryError::Storage(e.to_string()))
}

pub(crate) fn from_json<T: DeserializeOwned>(
    column: &str,
    value: serde_json::Value,
) -> Result<T, RepositoryError> {
    serde_json::from_value(value)
        .map_err(|e| RepositoryError::Storage(format!("unreadable {column}: {e}")))
}

pub(crate) fn utc(at: DateTime<FixedOffset>) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}
