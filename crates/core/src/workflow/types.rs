//! Workflow inputs, outcomes and step log.

use chrono::NaiveDate;
use kosh_shared::types::TransactionId;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::rate::RateRecord;
use crate::section::TaxKind;
use crate::transaction::{PaymentType, TaxTransaction};

/// How a workflow step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Ran and succeeded.
    Completed,
    /// Not needed for this request.
    Skipped,
}

/// One entry of the step log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    /// Step name.
    pub name: &'static str,
    /// Outcome.
    pub status: StepStatus,
    /// Short description.
    pub detail: String,
}

impl WorkflowStep {
    pub(crate) fn completed(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: StepStatus::Completed,
            detail: detail.into(),
        }
    }

    pub(crate) fn skipped(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: StepStatus::Skipped,
            detail: detail.into(),
        }
    }
}

/// An invoice to record.
#[derive(Debug, Clone)]
pub struct InvoiceInput {
    /// Vendor business key.
    pub vendor_id: String,
    /// Mapping key.
    pub transaction_type: String,
    /// Gross invoice amount.
    pub gross_amount: Decimal,
    /// Invoice date.
    pub invoice_date: NaiveDate,
    /// Invoice number, stored as the transaction reference.
    pub invoice_number: Option<String>,
    /// Explicit section.
    pub section: Option<String>,
    /// PAN override.
    pub pan_number: Option<String>,
    /// Normal or advance.
    pub payment_type: PaymentType,
    /// Mark the transaction Completed right away.
    pub mark_completed: bool,
}

/// Result of invoice processing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceOutcome {
    /// Recorded transaction.
    pub transaction: TaxTransaction,
    /// Gross invoice amount.
    pub gross_amount: Decimal,
    /// Tax withheld or collected.
    pub tax_amount: Decimal,
    /// Amount payable to (TDS) or receivable from (TCS) the vendor.
    pub net_payable: Decimal,
    /// Step log.
    pub steps: Vec<WorkflowStep>,
}

/// A scheduled rate change.
#[derive(Debug, Clone)]
pub struct RateChange {
    /// TDS or TCS.
    pub kind: TaxKind,
    /// Section code.
    pub section: String,
    /// Nature label of the rate being replaced.
    pub nature: Option<String>,
    /// First day of the new rate.
    pub effective_from: NaiveDate,
    /// New base rate; defaults to the current one.
    pub rate: Option<Decimal>,
    /// New surcharge; defaults to the current one.
    pub surcharge_rate: Option<Decimal>,
    /// New cess; defaults to the current one.
    pub education_cess_rate: Option<Decimal>,
    /// New threshold; defaults to the current one.
    pub threshold_limit: Option<Decimal>,
    /// New PAN requirement; defaults to the current one.
    pub pan_required: Option<bool>,
    /// New TAN requirement; defaults to the current one.
    pub tan_required: Option<bool>,
    /// End of the new rate; defaults to the end of the current one.
    pub valid_to: Option<NaiveDate>,
    /// Note on the new record.
    pub description: Option<String>,
}

/// A pending transaction that keeps the old frozen rate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedTransaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Vendor business key.
    pub vendor_id: String,
    /// Transaction date.
    pub transaction_date: NaiveDate,
    /// Amount.
    pub amount: Decimal,
    /// Tax at the frozen rate.
    pub current_tax: Decimal,
    /// Tax the new rate would give.
    pub tax_at_new_rate: Decimal,
}

/// Impact of a rate change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateChangeImpact {
    /// Pending transactions dated on or after the effective date.
    pub affected_transactions: Vec<AffectedTransaction>,
    /// Sum of tax at the frozen rate.
    pub current_tax_total: Decimal,
    /// Sum of tax at the new rate.
    pub new_tax_total: Decimal,
}

/// Result of a rate change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateChangeOutcome {
    /// The replaced record, now closed.
    pub previous_rate: RateRecord,
    /// The new record.
    pub new_rate: RateRecord,
    /// Impact on pending transactions.
    pub impact: RateChangeImpact,
    /// Step log.
    pub steps: Vec<WorkflowStep>,
}
