//! Schema migrations for the withholding tables.
//!
//! Run through the `migrator` binary or [`Migrator::up`] in tests.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_withholding;

/// Ordered list of schema migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260301_000001_withholding::Migration)]
    }
}
