//! Certificate types.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use kosh_shared::types::{CertificateId, CompanyId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::period::FinancialQuarter;
use crate::section::TaxKind;

/// What a certificate covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateType {
    /// Tax deducted (Form 16A).
    Tds,
    /// Tax collected (Form 27D).
    Tcs,
    /// Both kinds in one document.
    Consolidated,
}

impl CertificateType {
    /// Lowercase storage form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tds => "tds",
            Self::Tcs => "tcs",
            Self::Consolidated => "consolidated",
        }
    }

    /// Prefix of the certificate number.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Tds => "TDS",
            Self::Tcs => "TCS",
            Self::Consolidated => "CONS",
        }
    }

    /// The single kind covered, or `None` for consolidated.
    #[must_use]
    pub const fn kind(self) -> Option<TaxKind> {
        match self {
            Self::Tds => Some(TaxKind::Tds),
            Self::Tcs => Some(TaxKind::Tcs),
            Self::Consolidated => None,
        }
    }

    /// Parses the storage form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tds" => Some(Self::Tds),
            "tcs" => Some(Self::Tcs),
            "consolidated" => Some(Self::Consolidated),
            _ => None,
        }
    }
}

/// Certificate status.
///
/// Generated → Delivered (re-deliverable), Generated → Revoked (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    /// Issued, not yet sent.
    Generated,
    /// Sent to the deductee.
    Delivered,
    /// Withdrawn.
    Revoked,
}

impl CertificateStatus {
    /// Lowercase storage form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generated => "generated",
            Self::Delivered => "delivered",
            Self::Revoked => "revoked",
        }
    }

    /// Parses the storage form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "generated" => Some(Self::Generated),
            "delivered" => Some(Self::Delivered),
            "revoked" => Some(Self::Revoked),
            _ => None,
        }
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The uniqueness key of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CertificateKey {
    /// Type.
    pub certificate_type: CertificateType,
    /// Quarter.
    pub quarter: FinancialQuarter,
    /// Vendor; `None` for a company-wide consolidated certificate.
    pub vendor_id: Option<String>,
}

impl CertificateKey {
    /// Deterministic certificate number, e.g. `TDS/2024-25/Q1/V001`.
    #[must_use]
    pub fn number(&self) -> String {
        format!(
            "{}/{}/{}",
            self.certificate_type.prefix(),
            self.quarter,
            self.vendor_id.as_deref().unwrap_or("ALL")
        )
    }
}

/// Per-section totals on a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateLine {
    /// TDS or TCS.
    pub kind: TaxKind,
    /// Section code.
    pub section: String,
    /// Transactions counted.
    pub transaction_count: u64,
    /// Amount paid or received.
    pub amount_paid: Decimal,
    /// Tax withheld or collected.
    pub tax_amount: Decimal,
}

/// An issued certificate. Financial totals never change after issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Certificate ID.
    pub id: CertificateId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Number derived from the key; unique per company.
    pub certificate_number: String,
    /// Vendor; absent for company-wide consolidated certificates.
    pub vendor_id: Option<String>,
    /// Vendor name at issue.
    pub vendor_name: Option<String>,
    /// Vendor PAN at issue.
    pub vendor_pan: Option<String>,
    /// Type.
    pub certificate_type: CertificateType,
    /// Quarter.
    pub quarter: FinancialQuarter,
    /// First day covered.
    pub period_start: NaiveDate,
    /// Last day covered.
    pub period_end: NaiveDate,
    /// Total TDS.
    pub total_tds: Decimal,
    /// Total TCS.
    pub total_tcs: Decimal,
    /// Total amount paid or received.
    pub total_amount_paid: Decimal,
    /// Transactions counted.
    pub transaction_count: u64,
    /// Per-section totals.
    pub lines: Vec<CertificateLine>,
    /// Status.
    pub status: CertificateStatus,
    /// False once revoked.
    pub is_active: bool,
    /// Recipient of the last delivery.
    pub delivered_to: Option<String>,
    /// Channel of the last delivery.
    pub delivery_method: Option<String>,
    /// Time of the last delivery.
    pub delivered_at: Option<DateTime<Utc>>,
    /// Number of deliveries.
    pub delivery_count: u32,
    /// Why it was revoked.
    pub revocation_reason: Option<String>,
    /// When it was revoked.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Who issued it.
    pub issued_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Certificate {
    /// Whether this certificate covers `vendor_id` for `kind`.
    #[must_use]
    pub fn covers(&self, vendor_id: &str, kind: TaxKind) -> bool {
        let type_ok = self.certificate_type.kind().is_none_or(|k| k == kind);
        let vendor_ok = self.vendor_id.as_deref().is_none_or(|v| v == vendor_id);
        self.is_active && type_ok && vendor_ok
    }
}

/// Input for generating a certificate.
#[derive(Debug, Clone)]
pub struct GenerateCertificate {
    /// Vendor; required unless consolidated.
    pub vendor_id: Option<String>,
    /// Type.
    pub certificate_type: CertificateType,
    /// First day covered.
    pub period_start: NaiveDate,
    /// Last day covered.
    pub period_end: NaiveDate,
    /// Quarter; defaults to the one containing `period_start`.
    pub quarter: Option<FinancialQuarter>,
}

/// Requested status change.
#[derive(Debug, Clone)]
pub struct StatusChange {
    /// Target status.
    pub status: CertificateStatus,
    /// Recipient, required for delivery.
    pub delivered_to: Option<String>,
    /// Channel, e.g. "email".
    pub delivery_method: Option<String>,
    /// Reason, required for revocation.
    pub reason: Option<String>,
}

/// Filters for listing certificates.
#[derive(Debug, Clone, Default)]
pub struct CertificateFilter {
    /// Only this vendor.
    pub vendor_id: Option<String>,
    /// Only this type.
    pub certificate_type: Option<CertificateType>,
    /// Only this quarter.
    pub quarter: Option<FinancialQuarter>,
    /// Only this status.
    pub status: Option<CertificateStatus>,
}

impl CertificateFilter {
    /// Evaluates the filter against a certificate.
    #[must_use]
    pub fn matches(&self, certificate: &Certificate) -> bool {
        self.vendor_id
            .as_deref()
            .is_none_or(|v| certificate.vendor_id.as_deref() == Some(v))
            && self
                .certificate_type
                .is_none_or(|t| certificate.certificate_type == t)
            && self.quarter.is_none_or(|q| certificate.quarter == q)
            && self.status.is_none_or(|s| certificate.status == s)
    }
}
