//! Report types.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TaxError;
use crate::period::FinancialQuarter;
use crate::section::TaxKind;

/// Grouping key for summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryBy {
    /// By section code.
    Section,
    /// By vendor ID.
    Vendor,
    /// By calendar month, `YYYY-MM`.
    Month,
    /// By transaction status.
    Status,
}

impl SummaryBy {
    /// Lowercase form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Vendor => "vendor",
            Self::Month => "month",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for SummaryBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryBy {
    type Err = TaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "section" => Ok(Self::Section),
            "vendor" => Ok(Self::Vendor),
            "month" => Ok(Self::Month),
            "status" => Ok(Self::Status),
            other => Err(TaxError::Validation(format!(
                "invalid summaryBy: {other} (expected section, vendor, month or status)"
            ))),
        }
    }
}

/// Totals of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryGroup {
    /// Group key.
    pub key: String,
    /// Transactions in the group.
    pub count: u64,
    /// Sum of amounts.
    pub total_amount: Decimal,
    /// Sum of tax.
    pub total_tax: Decimal,
    /// Transactions below the threshold.
    pub below_threshold_count: u64,
}

/// Totals over a set of transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTotals {
    /// Transactions counted.
    pub count: u64,
    /// Sum of amounts.
    pub total_amount: Decimal,
    /// Sum of tax.
    pub total_tax: Decimal,
    /// Transactions below the threshold.
    pub below_threshold_count: u64,
}

/// TDS or TCS summary report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSummary {
    /// Report name, `tds_summary` or `tcs_summary`.
    pub report_type: String,
    /// TDS or TCS. Unset when the summarized rows mix both.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<TaxKind>,
    /// Range start, when given.
    pub from: Option<NaiveDate>,
    /// Range end, when given.
    pub to: Option<NaiveDate>,
    /// Grouping applied.
    pub group_by: SummaryBy,
    /// Overall totals.
    pub totals: SummaryTotals,
    /// Per-group totals, ordered by key.
    pub groups: Vec<SummaryGroup>,
}

/// Vendor counts.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorCompliance {
    /// All vendors.
    pub total: u64,
    /// Active vendors.
    pub active: u64,
    /// Active liable vendors without a PAN.
    pub missing_pan: u64,
    /// Vendors whose PAN holder type contradicts their category.
    pub pan_category_mismatch: u64,
}

/// Transaction counts.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCompliance {
    /// All transactions.
    pub total: u64,
    /// Pending.
    pub pending: u64,
    /// Completed.
    pub completed: u64,
    /// Cancelled.
    pub cancelled: u64,
    /// Pending past the deposit due date.
    pub overdue: u64,
    /// Tax on overdue transactions.
    pub overdue_tax: Decimal,
}

/// Certificate counts.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateCompliance {
    /// All certificates issued.
    pub issued: u64,
    /// Delivered at least once.
    pub delivered: u64,
    /// Revoked.
    pub revoked: u64,
}

/// A quarterly return that is still to be filed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingReturn {
    /// TDS or TCS.
    pub kind: TaxKind,
    /// Form number.
    pub form: String,
    /// Quarter.
    pub quarter: FinancialQuarter,
    /// Filing due date.
    pub due_date: NaiveDate,
    /// Days from the report date to the due date.
    pub days_remaining: i64,
}

/// Compliance snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceStatus {
    /// Snapshot date.
    pub as_of: NaiveDate,
    /// Vendor counts.
    pub vendors: VendorCompliance,
    /// Transaction counts.
    pub transactions: TransactionCompliance,
    /// Certificate counts.
    pub certificates: CertificateCompliance,
    /// Returns due on or after `as_of`.
    pub upcoming_returns: Vec<UpcomingReturn>,
    /// Percent of non-cancelled transactions that are not overdue.
    pub compliance_score: Decimal,
}
