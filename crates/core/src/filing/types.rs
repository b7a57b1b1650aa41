//! Quarterly return types (Form 26Q for TDS, Form 27EQ for TCS).

use chrono::NaiveDate;
use kosh_shared::types::TransactionId;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::certificate::Certificate;
use crate::period::FinancialQuarter;
use crate::section::TaxKind;

/// Return header.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingHeader {
    /// Form number, `26Q` or `27EQ`.
    pub form: String,
    /// TDS or TCS.
    pub kind: TaxKind,
    /// Quarter covered.
    pub quarter: FinancialQuarter,
    /// Financial year label, e.g. `2024-25`.
    pub financial_year: String,
    /// First day of the quarter.
    pub period_start: NaiveDate,
    /// Last day of the quarter.
    pub period_end: NaiveDate,
    /// Statutory filing due date.
    pub due_date: NaiveDate,
    /// Date the return was prepared.
    pub prepared_on: NaiveDate,
}

/// Deductor (TDS) or collector (TCS) particulars.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductorBlock {
    /// Legal name.
    pub name: String,
    /// TAN.
    pub tan: String,
    /// PAN.
    pub pan: String,
    /// Registered address.
    pub address: String,
    /// Person responsible for deduction.
    pub responsible_person: String,
}

/// Tax deposited for one section in one month.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallanRow {
    /// Section code.
    pub section: String,
    /// Month, `YYYY-MM`.
    pub month: String,
    /// Deposit due date for the month.
    pub deposit_due_date: NaiveDate,
    /// Transactions in the row.
    pub transaction_count: u64,
    /// Amount paid or received.
    pub total_amount: Decimal,
    /// Tax to deposit.
    pub total_tax: Decimal,
}

/// One completed transaction as reported for the deductee or collectee.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeducteeRow {
    /// Transaction ID.
    pub transaction_id: TransactionId,
    /// Vendor business key.
    pub vendor_id: String,
    /// Vendor name, when the profile still exists.
    pub vendor_name: Option<String>,
    /// PAN used for the deduction.
    pub pan_number: Option<String>,
    /// Section code.
    pub section: String,
    /// Transaction date.
    pub transaction_date: NaiveDate,
    /// Amount paid or received.
    pub amount: Decimal,
    /// Effective rate applied; absent when not applicable.
    pub rate: Option<Decimal>,
    /// Tax withheld or collected.
    pub tax_amount: Decimal,
}

/// Section-wise totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    /// Section code.
    pub section: String,
    /// Transactions counted.
    pub transaction_count: u64,
    /// Amount paid or received.
    pub total_amount: Decimal,
    /// Tax withheld or collected.
    pub total_tax: Decimal,
}

/// Vendor-wise totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorSummary {
    /// Vendor business key.
    pub vendor_id: String,
    /// Vendor name.
    pub vendor_name: Option<String>,
    /// Vendor PAN.
    pub pan_number: Option<String>,
    /// Transactions counted.
    pub transaction_count: u64,
    /// Amount paid or received.
    pub total_amount: Decimal,
    /// Tax withheld or collected.
    pub total_tax: Decimal,
    /// Certificate issued for the quarter, if any.
    pub certificate_number: Option<String>,
}

/// Pre-submission checks.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingValidation {
    /// Problems that block filing.
    pub errors: Vec<String>,
    /// Problems worth reviewing.
    pub warnings: Vec<String>,
    /// True when there are no errors.
    pub is_valid: bool,
}

/// Grand totals of the return.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingTotals {
    /// Completed transactions reported.
    pub transaction_count: u64,
    /// Amount paid or received.
    pub total_amount: Decimal,
    /// Tax withheld or collected.
    pub total_tax: Decimal,
    /// Pending transactions left out of the return.
    pub pending_count: u64,
}

/// A quarterly return. Derived on request, never stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingReturn {
    /// Header.
    pub header: FilingHeader,
    /// Deductor or collector.
    pub deductor: DeductorBlock,
    /// Challans by section and month.
    pub challans: Vec<ChallanRow>,
    /// Deductee or collectee rows.
    pub deductees: Vec<DeducteeRow>,
    /// Section-wise summary.
    pub section_summary: Vec<SectionSummary>,
    /// Vendor-wise summary.
    pub vendor_summary: Vec<VendorSummary>,
    /// Certificates issued for the quarter.
    pub certificates: Vec<Certificate>,
    /// Grand totals.
    pub totals: FilingTotals,
    /// Validation result.
    pub validation: FilingValidation,
}
