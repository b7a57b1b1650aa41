//! `SeaORM` entities for the withholding tables.

pub mod certificates;
pub mod tax_rates;
pub mod tax_transactions;
pub mod vendors;
