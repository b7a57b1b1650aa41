//! Withholding reports.
//!
//! - TDS / TCS summaries grouped by section, vendor, month or status
//! - Compliance status snapshot

pub mod service;
pub mod types;

#[cfg(test)]
mod summary_props;

pub use service::{ReportService, compliance_score, summarize, totals, upcoming_returns};
pub use types::{
    CertificateCompliance, ComplianceStatus, SummaryBy, SummaryGroup, SummaryTotals, TaxSummary,
    TransactionCompliance, UpcomingReturn, VendorCompliance,
};
