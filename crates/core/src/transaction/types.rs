//! Tax transaction types.
//!
//! Lifecycle:
//! - Pending → Completed (deposit made)
//! - Pending → Cancelled
//! - Completed → Pending, Cancelled → Pending (explicit reopen)

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use kosh_shared::types::{CompanyId, TransactionId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rate::AppliedRate;
use crate::section::TaxKind;

/// Transaction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Recorded, tax not yet deposited. Amount is editable.
    Pending,
    /// Tax deposited.
    Completed,
    /// Voided.
    Cancelled,
}

impl TransactionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Whether moving to `to` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Completed | Self::Cancelled)
                | (Self::Completed | Self::Cancelled, Self::Pending)
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the payment settles an invoice or precedes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// Payment against an invoice.
    #[default]
    Normal,
    /// Advance payment.
    Advance,
}

impl PaymentType {
    /// Lowercase storage form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Advance => "advance",
        }
    }

    /// Parses the storage form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "advance" => Some(Self::Advance),
            _ => None,
        }
    }
}

/// How the tax amount came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxOutcome {
    /// Tax computed at the effective rate.
    Withheld,
    /// Amount below the threshold; no tax.
    BelowThreshold,
    /// Vendor not liable for the kind; no tax.
    NotApplicable,
}

impl TaxOutcome {
    /// snake_case storage form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Withheld => "withheld",
            Self::BelowThreshold => "below_threshold",
            Self::NotApplicable => "not_applicable",
        }
    }

    /// Parses the storage form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "withheld" => Some(Self::Withheld),
            "below_threshold" => Some(Self::BelowThreshold),
            "not_applicable" => Some(Self::NotApplicable),
            _ => None,
        }
    }
}

/// Audit detail of a tax computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationBreakdown {
    /// Amount the tax is computed on.
    pub base_amount: Decimal,
    /// Base rate applied.
    pub rate: Decimal,
    /// Tax at the base rate.
    pub base_tax: Decimal,
    /// Surcharge on the base tax.
    pub surcharge_amount: Decimal,
    /// Cess on tax plus surcharge.
    pub cess_amount: Decimal,
    /// Combined rate.
    pub effective_rate: Decimal,
    /// Final tax, rounded to 2 dp.
    pub tax_amount: Decimal,
    /// Threshold in force.
    pub threshold_limit: Decimal,
    /// Whether the amount fell below the threshold.
    pub is_below_threshold: bool,
}

/// A recorded withholding event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxTransaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Invoice or payment number.
    pub reference: Option<String>,
    /// Vendor business key. Immutable.
    pub vendor_id: String,
    /// Mapping key used to resolve the section.
    pub transaction_type: String,
    /// TDS or TCS.
    pub kind: TaxKind,
    /// Section code. Immutable.
    pub section: String,
    /// Frozen rate; absent when the vendor is not liable.
    pub applied_rate: Option<AppliedRate>,
    /// Gross amount.
    pub amount: Decimal,
    /// Tax withheld or collected.
    pub tax_amount: Decimal,
    /// How the tax amount came about.
    pub outcome: TaxOutcome,
    /// Calculation detail.
    pub calculation_breakdown: CalculationBreakdown,
    /// PAN used for the deduction.
    pub pan_number: Option<String>,
    /// Date of the invoice or payment.
    pub transaction_date: NaiveDate,
    /// Deposit due date.
    pub due_date: NaiveDate,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// Normal or advance.
    pub payment_type: PaymentType,
    /// Who recorded it.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for computing (and recording) a transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Vendor business key.
    pub vendor_id: String,
    /// Mapping key.
    pub transaction_type: String,
    /// Gross amount.
    pub amount: Decimal,
    /// Date of the invoice or payment.
    pub transaction_date: NaiveDate,
    /// Explicit section, overriding the mapping.
    pub section: Option<String>,
    /// PAN supplied with the request, overriding the vendor's.
    pub pan_number: Option<String>,
    /// Invoice or payment number.
    pub reference: Option<String>,
    /// Normal or advance.
    pub payment_type: PaymentType,
    /// Explicit deposit due date.
    pub due_date: Option<NaiveDate>,
}

/// Partial update of a transaction.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    /// Must equal the current vendor if given.
    pub vendor_id: Option<String>,
    /// Must equal the current section if given.
    pub section: Option<String>,
    /// New amount; only while pending.
    pub amount: Option<Decimal>,
    /// New status.
    pub status: Option<TransactionStatus>,
    /// New reference.
    pub reference: Option<String>,
    /// New deposit due date.
    pub due_date: Option<NaiveDate>,
    /// New payment type.
    pub payment_type: Option<PaymentType>,
}

/// Filters for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Only this vendor.
    pub vendor_id: Option<String>,
    /// Only this kind.
    pub kind: Option<TaxKind>,
    /// Only this section.
    pub section: Option<String>,
    /// Only this status.
    pub status: Option<TransactionStatus>,
    /// On or after this date.
    pub from: Option<NaiveDate>,
    /// On or before this date.
    pub to: Option<NaiveDate>,
}

impl TransactionFilter {
    /// Evaluates the filter against a transaction.
    #[must_use]
    pub fn matches(&self, tx: &TaxTransaction) -> bool {
        self.vendor_id.as_deref().is_none_or(|v| tx.vendor_id == v)
            && self.kind.is_none_or(|k| tx.kind == k)
            && self
                .section
                .as_deref()
                .is_none_or(|s| tx.section.eq_ignore_ascii_case(s.trim()))
            && self.status.is_none_or(|s| tx.status == s)
            && self.from.is_none_or(|d| tx.transaction_date >= d)
            && self.to.is_none_or(|d| tx.transaction_date <= d)
    }
}

/// A computed (not necessarily persisted) withholding result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    /// Vendor business key.
    pub vendor_id: String,
    /// TDS or TCS.
    pub kind: TaxKind,
    /// Section code.
    pub section: String,
    /// Nature label used for the rate lookup.
    pub nature: Option<String>,
    /// Rate applied; absent when not applicable.
    pub applied_rate: Option<AppliedRate>,
    /// How the tax amount came about.
    pub outcome: TaxOutcome,
    /// Final tax.
    pub tax_amount: Decimal,
    /// Calculation detail.
    pub calculation_breakdown: CalculationBreakdown,
    /// PAN used.
    pub pan_number: Option<String>,
}

/// One item of a bulk calculation request.
#[derive(Debug, Clone)]
pub struct BulkItem {
    /// Vendor business key.
    pub vendor_id: String,
    /// Mapping key.
    pub transaction_type: String,
    /// Gross amount.
    pub amount: Decimal,
    /// Date.
    pub transaction_date: NaiveDate,
    /// Explicit section.
    pub section: Option<String>,
    /// PAN override.
    pub pan_number: Option<String>,
}

/// Failure of one bulk item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemError {
    /// Stable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Result of one bulk item, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemResult {
    /// Position in the request.
    pub index: usize,
    /// Whether the item computed.
    pub success: bool,
    /// The computation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation: Option<Calculation>,
    /// The failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ItemError>,
}

/// Totals of a bulk calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    /// Items received.
    pub total_items: usize,
    /// Items computed.
    pub succeeded: usize,
    /// Items failed.
    pub failed: usize,
    /// Sum of amounts of computed items.
    pub total_amount: Decimal,
    /// Sum of tax of computed items.
    pub total_tax: Decimal,
}

/// Full bulk calculation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    /// Per-item results in input order.
    pub results: Vec<BulkItemResult>,
    /// Totals.
    pub summary: BulkSummary,
}
