//! Rate record types.

use chrono::{DateTime, NaiveDate, Utc};
use kosh_shared::types::{CompanyId, RateId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::section::TaxKind;
use crate::transaction::CalculationBreakdown;

/// A time-bounded TDS or TCS rate for one section and nature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRecord {
    /// Record ID.
    pub id: RateId,
    /// Owning company.
    pub company_id: CompanyId,
    /// TDS or TCS.
    pub kind: TaxKind,
    /// Section code.
    pub section: String,
    /// Nature of payment (TDS) or sale (TCS).
    pub nature: Option<String>,
    /// Base rate in percent.
    pub rate: Decimal,
    /// Surcharge in percent of the base tax.
    pub surcharge_rate: Decimal,
    /// Health and education cess in percent of tax plus surcharge.
    pub education_cess_rate: Decimal,
    /// Derived combined rate.
    pub effective_rate: Decimal,
    /// First day the rate applies.
    pub valid_from: NaiveDate,
    /// Last day the rate applies; open-ended when absent.
    pub valid_to: Option<NaiveDate>,
    /// Amount below which no tax applies.
    pub threshold_limit: Decimal,
    /// Deductee PAN required above the threshold.
    pub pan_required: bool,
    /// Vendor TAN required.
    pub tan_required: bool,
    /// Inactive rates are never applied.
    pub is_active: bool,
    /// Free-text note.
    pub description: Option<String>,
    /// Who created the record.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl RateRecord {
    /// Whether the validity window contains `date`.
    #[must_use]
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.valid_from && self.valid_to.is_none_or(|to| date <= to)
    }

    /// Whether this record's window overlaps `[from, to]`.
    #[must_use]
    pub fn overlaps(&self, from: NaiveDate, to: Option<NaiveDate>) -> bool {
        windows_overlap(self.valid_from, self.valid_to, from, to)
    }

    /// Whether the nature label matches, ignoring case and surrounding space.
    #[must_use]
    pub fn nature_matches(&self, nature: Option<&str>) -> bool {
        same_nature(self.nature.as_deref(), nature)
    }
}

/// Closed-interval overlap with open ends.
#[must_use]
pub fn windows_overlap(
    a_from: NaiveDate,
    a_to: Option<NaiveDate>,
    b_from: NaiveDate,
    b_to: Option<NaiveDate>,
) -> bool {
    a_to.is_none_or(|a_to| b_from <= a_to) && b_to.is_none_or(|b_to| a_from <= b_to)
}

pub(crate) fn same_nature(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        (None, None) => true,
        _ => false,
    }
}

/// The rate frozen into a transaction at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedRate {
    /// Source rate record.
    pub rate_id: RateId,
    /// TDS or TCS.
    pub kind: TaxKind,
    /// Section code.
    pub section: String,
    /// Nature label of the record.
    pub nature: Option<String>,
    /// Base rate.
    pub rate: Decimal,
    /// Surcharge rate.
    pub surcharge_rate: Decimal,
    /// Cess rate.
    pub education_cess_rate: Decimal,
    /// Combined rate.
    pub effective_rate: Decimal,
    /// Threshold at the time of creation.
    pub threshold_limit: Decimal,
    /// PAN requirement at the time of creation.
    pub pan_required: bool,
    /// TAN requirement at the time of creation.
    pub tan_required: bool,
}

impl From<&RateRecord> for AppliedRate {
    fn from(record: &RateRecord) -> Self {
        Self {
            rate_id: record.id,
            kind: record.kind,
            section: record.section.clone(),
            nature: record.nature.clone(),
            rate: record.rate,
            surcharge_rate: record.surcharge_rate,
            education_cess_rate: record.education_cess_rate,
            effective_rate: record.effective_rate,
            threshold_limit: record.threshold_limit,
            pan_required: record.pan_required,
            tan_required: record.tan_required,
        }
    }
}

/// Input for creating a rate record.
#[derive(Debug, Clone)]
pub struct NewRate {
    /// TDS or TCS.
    pub kind: TaxKind,
    /// Section code.
    pub section: String,
    /// Nature label.
    pub nature: Option<String>,
    /// Base rate.
    pub rate: Decimal,
    /// Surcharge rate.
    pub surcharge_rate: Decimal,
    /// Cess rate.
    pub education_cess_rate: Decimal,
    /// Window start.
    pub valid_from: NaiveDate,
    /// Window end.
    pub valid_to: Option<NaiveDate>,
    /// Threshold.
    pub threshold_limit: Decimal,
    /// PAN requirement.
    pub pan_required: bool,
    /// TAN requirement.
    pub tan_required: bool,
    /// Note.
    pub description: Option<String>,
}

/// Partial update of a rate record. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct RatePatch {
    /// Must equal the current section if given.
    pub section: Option<String>,
    /// Must equal the current nature if given.
    pub nature: Option<String>,
    /// New base rate.
    pub rate: Option<Decimal>,
    /// New surcharge rate.
    pub surcharge_rate: Option<Decimal>,
    /// New cess rate.
    pub education_cess_rate: Option<Decimal>,
    /// New threshold.
    pub threshold_limit: Option<Decimal>,
    /// New window start.
    pub valid_from: Option<NaiveDate>,
    /// New window end.
    pub valid_to: Option<NaiveDate>,
    /// New PAN requirement.
    pub pan_required: Option<bool>,
    /// New TAN requirement.
    pub tan_required: Option<bool>,
    /// Activate or deactivate.
    pub is_active: Option<bool>,
    /// New note.
    pub description: Option<String>,
}

impl RatePatch {
    /// Whether the patch touches a value frozen into transactions.
    #[must_use]
    pub fn changes_values(&self, current: &RateRecord) -> bool {
        self.rate.is_some_and(|v| v != current.rate)
            || self.surcharge_rate.is_some_and(|v| v != current.surcharge_rate)
            || self
                .education_cess_rate
                .is_some_and(|v| v != current.education_cess_rate)
            || self
                .threshold_limit
                .is_some_and(|v| v != current.threshold_limit)
    }
}

/// Filters for listing rate records.
#[derive(Debug, Clone, Default)]
pub struct RateFilter {
    /// Only this kind.
    pub kind: Option<TaxKind>,
    /// Only active or inactive records.
    pub active: Option<bool>,
    /// Only this section.
    pub section: Option<String>,
    /// Only records whose window contains this date.
    pub applicable_on: Option<NaiveDate>,
}

impl RateFilter {
    /// Evaluates the filter against a record.
    #[must_use]
    pub fn matches(&self, record: &RateRecord) -> bool {
        self.kind.is_none_or(|k| record.kind == k)
            && self.active.is_none_or(|a| record.is_active == a)
            && self
                .section
                .as_deref()
                .is_none_or(|s| record.section.eq_ignore_ascii_case(s.trim()))
            && self.applicable_on.is_none_or(|d| record.covers(d))
    }
}

/// A rate with an optional worked example.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateListing {
    /// The record.
    #[serde(flatten)]
    pub rate: RateRecord,
    /// Calculation for the requested sample amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation_example: Option<CalculationBreakdown>,
}
