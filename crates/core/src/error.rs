//! Withholding-tax error types.
//!
//! Every error carries a stable error code and an HTTP status. Messages are
//! part of the API contract: automated clients match on substrings such as
//! "vendor not found", "already exists" or "invalid PAN format".

use chrono::NaiveDate;
use kosh_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::repository::RepositoryError;
use crate::section::TaxKind;

/// Errors that can occur in the withholding engine.
#[derive(Debug, Error)]
pub enum TaxError {
    // ========== Validation Errors ==========
    /// A percentage was outside 0–100.
    #[error("{field} must be between 0 and 100, got {value}")]
    PercentOutOfRange {
        /// Offending field name.
        field: &'static str,
        /// Offending value.
        value: Decimal,
    },

    /// Threshold limit was negative.
    #[error("thresholdLimit cannot be negative")]
    NegativeThreshold,

    /// Validity window is empty or inverted.
    #[error("validFrom ({from}) must be before validTo ({to})")]
    InvalidValidityWindow {
        /// Start of the window.
        from: NaiveDate,
        /// End of the window.
        to: NaiveDate,
    },

    /// Section code is not in the catalog.
    #[error("invalid {} section: {code}", kind_label(.kind))]
    InvalidSection {
        /// Kind the section was requested for, when known.
        kind: Option<TaxKind>,
        /// The unknown code.
        code: String,
    },

    /// Transaction type has no section mapping.
    #[error("invalid transaction type: {0} has no section mapping")]
    UnknownTransactionType(String),

    /// PAN does not match the configured pattern.
    #[error("invalid PAN format: {0}")]
    InvalidPan(String),

    /// TAN does not match the configured pattern.
    #[error("invalid TAN format: {0}")]
    InvalidTan(String),

    /// Rate requires a PAN and none is available.
    #[error("PAN number is required for section {0} above the threshold limit")]
    PanRequired(String),

    /// Rate requires a TAN and the vendor has none.
    #[error("TAN number is required for section {0}")]
    TanRequired(String),

    /// Amount was negative.
    #[error("amount cannot be negative")]
    NegativeAmount,

    /// Certificate period is empty or inverted.
    #[error("periodStart ({start}) must be before periodEnd ({end})")]
    InvalidPeriod {
        /// Start of the period.
        start: NaiveDate,
        /// End of the period.
        end: NaiveDate,
    },

    /// Certificate period leaves the quarter it is issued for.
    #[error("period {start} to {end} is not within quarter {quarter}")]
    PeriodOutsideQuarter {
        /// Start of the period.
        start: NaiveDate,
        /// End of the period.
        end: NaiveDate,
        /// Quarter label, e.g. `2024-25/Q1`.
        quarter: String,
    },

    /// Vendor is deactivated.
    #[error("vendor is inactive: {0}")]
    VendorInactive(String),

    /// Several rate records match and no nature was given.
    #[error("multiple rates apply to section {section} on {date}; specify the nature of payment")]
    AmbiguousRate {
        /// Section code.
        section: String,
        /// Lookup date.
        date: NaiveDate,
    },

    /// Generic validation failure.
    #[error("{0}")]
    Validation(String),

    // ========== Immutability / Referential Errors ==========
    /// Attempt to change a field that is fixed after creation.
    #[error("{0} is immutable and cannot be changed after creation")]
    ImmutableField(&'static str),

    /// Rate values cannot change once transactions reference the rate.
    #[error("rate cannot be modified: it is referenced by {0} existing transactions")]
    RateInUse(u64),

    /// Vendor cannot be removed while transactions reference it.
    #[error("vendor {0} cannot be deleted: referenced by transactions")]
    VendorInUse(String),

    /// Transaction is not editable in its current status.
    #[error("transaction is {0} and its amount can no longer be changed")]
    TransactionLocked(&'static str),

    /// Status change is not allowed by the lifecycle.
    #[error("invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: &'static str,
        /// Requested status.
        to: &'static str,
    },

    // ========== Not Found Errors ==========
    /// Vendor not found.
    #[error("vendor not found: {0}")]
    VendorNotFound(String),

    /// Rate record not found.
    #[error("rate not found: {0}")]
    RateNotFound(String),

    /// No active rate covers the date.
    #[error("no applicable rate for section {section} on {date}")]
    NoApplicableRate {
        /// Section code.
        section: String,
        /// Lookup date.
        date: NaiveDate,
    },

    /// Transaction not found.
    #[error("transaction not found: {0}")]
    TransactionNotFound(String),

    /// Certificate not found.
    #[error("certificate not found: {0}")]
    CertificateNotFound(String),

    // ========== Conflict Errors ==========
    /// Overlapping active rate for the same section and nature.
    #[error("rate already exists for section {section} with an overlapping validity window")]
    DuplicateRate {
        /// Section code.
        section: String,
    },

    /// Vendor id already taken.
    #[error("vendor already exists: {0}")]
    DuplicateVendor(String),

    /// Certificate for the key already generated.
    #[error("certificate already exists: {0}")]
    DuplicateCertificate(String),

    /// Transaction id already taken.
    #[error("transaction already exists: {0}")]
    DuplicateTransaction(String),

    // ========== Infrastructure Errors ==========
    /// Invalid engine configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

fn kind_label(kind: &Option<TaxKind>) -> &'static str {
    match kind {
        Some(TaxKind::Tcs) => "TCS",
        Some(TaxKind::Tds) | None => "TDS",
    }
}

impl TaxError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PercentOutOfRange { .. } => "PERCENT_OUT_OF_RANGE",
            Self::NegativeThreshold => "NEGATIVE_THRESHOLD",
            Self::InvalidValidityWindow { .. } => "INVALID_VALIDITY_WINDOW",
            Self::InvalidSection { .. } => "INVALID_SECTION",
            Self::UnknownTransactionType(_) => "UNKNOWN_TRANSACTION_TYPE",
            Self::InvalidPan(_) => "INVALID_PAN",
            Self::InvalidTan(_) => "INVALID_TAN",
            Self::PanRequired(_) => "PAN_REQUIRED",
            Self::TanRequired(_) => "TAN_REQUIRED",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::PeriodOutsideQuarter { .. } => "PERIOD_OUTSIDE_QUARTER",
            Self::VendorInactive(_) => "VENDOR_INACTIVE",
            Self::AmbiguousRate { .. } => "AMBIGUOUS_RATE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ImmutableField(_) => "IMMUTABLE_FIELD",
            Self::RateInUse(_) => "RATE_IN_USE",
            Self::VendorInUse(_) => "VENDOR_IN_USE",
            Self::TransactionLocked(_) => "TRANSACTION_LOCKED",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::VendorNotFound(_) => "VENDOR_NOT_FOUND",
            Self::RateNotFound(_) => "RATE_NOT_FOUND",
            Self::NoApplicableRate { .. } => "NO_APPLICABLE_RATE",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::CertificateNotFound(_) => "CERTIFICATE_NOT_FOUND",
            Self::DuplicateRate { .. } => "DUPLICATE_RATE",
            Self::DuplicateVendor(_) => "DUPLICATE_VENDOR",
            Self::DuplicateCertificate(_) => "DUPLICATE_CERTIFICATE",
            Self::DuplicateTransaction(_) => "DUPLICATE_TRANSACTION",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation, immutability, referenced data
            Self::PercentOutOfRange { .. }
            | Self::NegativeThreshold
            | Self::InvalidValidityWindow { .. }
            | Self::InvalidSection { .. }
            | Self::UnknownTransactionType(_)
            | Self::InvalidPan(_)
            | Self::InvalidTan(_)
            | Self::PanRequired(_)
            | Self::TanRequired(_)
            | Self::NegativeAmount
            | Self::InvalidPeriod { .. }
            | Self::PeriodOutsideQuarter { .. }
            | Self::VendorInactive(_)
            | Self::AmbiguousRate { .. }
            | Self::Validation(_)
            | Self::ImmutableField(_)
            | Self::RateInUse(_)
            | Self::VendorInUse(_)
            | Self::TransactionLocked(_)
            | Self::InvalidStatusTransition { .. } => 400,

            // 404 Not Found
            Self::VendorNotFound(_)
            | Self::RateNotFound(_)
            | Self::NoApplicableRate { .. }
            | Self::TransactionNotFound(_)
            | Self::CertificateNotFound(_) => 404,

            // 409 Conflict - duplicates
            Self::DuplicateRate { .. }
            | Self::DuplicateVendor(_)
            | Self::DuplicateCertificate(_)
            | Self::DuplicateTransaction(_) => 409,

            // 500 Internal Server Error
            Self::Configuration(_) | Self::Storage(_) => 500,
        }
    }
}

impl From<RepositoryError> for TaxError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(key) => Self::Validation(format!("{key} already exists")),
            RepositoryError::NotFound(key) => Self::Storage(format!("record vanished: {key}")),
            RepositoryError::Referenced(key) => {
                Self::Validation(format!("{key} is referenced by other records"))
            }
            RepositoryError::Storage(msg) => Self::Storage(msg),
        }
    }
}

impl From<TaxError> for AppError {
    fn from(err: TaxError) -> Self {
        let message = err.to_string();
        match err.http_status_code() {
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            500 => match err {
                TaxError::Storage(_) => Self::Database(message),
                _ => Self::Internal(message),
            },
            _ => Self::Validation(message),
        }
    }
}
