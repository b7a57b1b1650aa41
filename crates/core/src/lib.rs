//! Core withholding-tax logic for Kosh.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage is reached through the traits in [`repository`]; an in-memory
//! implementation lives in [`memory`].
//!
//! # Modules
//!
//! - `rate` - TDS/TCS rate records, validity windows and lookup
//! - `vendor` - Vendor tax identities
//! - `transaction` - Withholding calculation and recorded transactions
//! - `certificate` - Certificates issued from completed transactions
//! - `filing` - Quarterly return aggregation (26Q / 27EQ)
//! - `reports` - Summaries and compliance status
//! - `alerts` - On-demand compliance alerts
//! - `workflow` - Invoice processing and rate change
//! - `period` - Indian financial year quarters and due dates
//! - `identity` - PAN/TAN validation and text sanitizing
//! - `section` - Section catalog and transaction-type mapping

pub mod alerts;
pub mod certificate;
pub mod context;
pub mod engine;
pub mod error;
pub mod filing;
pub mod identity;
pub mod memory;
pub mod period;
pub mod rate;
pub mod reports;
pub mod repository;
pub mod section;
pub mod transaction;
pub mod vendor;
pub mod workflow;

pub use context::Actor;
pub use engine::{EngineConfig, TaxEngine};
pub use error::TaxError;
pub use period::FinancialQuarter;
pub use repository::{RepositoryError, Repositories};
pub use section::TaxKind;
