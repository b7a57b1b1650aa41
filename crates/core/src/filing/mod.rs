//! Quarterly filing aggregation.
//!
//! Builds the data of a TDS (26Q) or TCS (27EQ) quarterly return from stored
//! transactions and certificates, with a validation pass.

pub mod service;
pub mod types;

pub use service::{FilingInputs, FilingService, assemble};
pub use types::{
    ChallanRow, DeducteeRow, DeductorBlock, FilingHeader, FilingReturn, FilingTotals,
    FilingValidation, SectionSummary, VendorSummary,
};
