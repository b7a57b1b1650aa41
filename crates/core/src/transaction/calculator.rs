//! Withholding arithmetic.
//!
//! Pure functions: no storage, no clock. Everything is `Decimal`; tax is
//! rounded to paise with midpoint-away-from-zero.

use rust_decimal::{Decimal, RoundingStrategy};

use super::types::{CalculationBreakdown, TaxOutcome};
use crate::error::TaxError;
use crate::rate::AppliedRate;
use crate::vendor::VendorProfile;

/// Decimal places for currency amounts.
pub const AMOUNT_SCALE: u32 = 2;

/// Rounds a currency amount to 2 dp, midpoint away from zero.
#[must_use]
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Effective rate: base rate, plus surcharge on it, plus cess on the subtotal.
///
/// `r + r*s/100 + (r + r*s/100)*c/100`
#[must_use]
pub fn effective_rate(rate: Decimal, surcharge_rate: Decimal, cess_rate: Decimal) -> Decimal {
    let with_surcharge = rate + rate * surcharge_rate / Decimal::ONE_HUNDRED;
    (with_surcharge + with_surcharge * cess_rate / Decimal::ONE_HUNDRED).normalize()
}

/// Computes the breakdown of `amount` under `applied`, honouring the threshold.
///
/// The threshold is inclusive: tax applies at `amount >= threshold`.
#[must_use]
pub fn breakdown(amount: Decimal, applied: &AppliedRate) -> CalculationBreakdown {
    let is_below_threshold = amount < applied.threshold_limit;
    if is_below_threshold {
        return CalculationBreakdown {
            base_amount: amount,
            rate: applied.rate,
            base_tax: Decimal::ZERO,
            surcharge_amount: Decimal::ZERO,
            cess_amount: Decimal::ZERO,
            effective_rate: applied.effective_rate,
            tax_amount: Decimal::ZERO,
            threshold_limit: applied.threshold_limit,
            is_below_threshold,
        };
    }

    let base_tax = amount * applied.rate / Decimal::ONE_HUNDRED;
    let surcharge = base_tax * applied.surcharge_rate / Decimal::ONE_HUNDRED;
    let cess = (base_tax + surcharge) * applied.education_cess_rate / Decimal::ONE_HUNDRED;

    CalculationBreakdown {
        base_amount: amount,
        rate: applied.rate,
        base_tax: round_amount(base_tax),
        surcharge_amount: round_amount(surcharge),
        cess_amount: round_amount(cess),
        effective_rate: applied.effective_rate,
        tax_amount: round_amount(amount * applied.effective_rate / Decimal::ONE_HUNDRED),
        threshold_limit: applied.threshold_limit,
        is_below_threshold,
    }
}

/// Breakdown for a vendor not liable to the section's kind.
#[must_use]
pub fn not_applicable(amount: Decimal) -> CalculationBreakdown {
    CalculationBreakdown {
        base_amount: amount,
        rate: Decimal::ZERO,
        base_tax: Decimal::ZERO,
        surcharge_amount: Decimal::ZERO,
        cess_amount: Decimal::ZERO,
        effective_rate: Decimal::ZERO,
        tax_amount: Decimal::ZERO,
        threshold_limit: Decimal::ZERO,
        is_below_threshold: false,
    }
}

/// Outcome of assessing one amount against a frozen rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    /// Withheld or below threshold.
    pub outcome: TaxOutcome,
    /// Calculation detail.
    pub breakdown: CalculationBreakdown,
    /// PAN used for the deduction, if any.
    pub pan_number: Option<String>,
}

/// Assesses `amount` for `vendor` under `applied`.
///
/// `pan_override` must already be validated. Below the threshold, or for a
/// zero amount, the PAN/TAN requirements are not enforced.
///
/// # Errors
///
/// Returns `TaxError::NegativeAmount`, `TaxError::PanRequired` or
/// `TaxError::TanRequired`.
pub fn assess(
    vendor: &VendorProfile,
    applied: &AppliedRate,
    amount: Decimal,
    pan_override: Option<&str>,
) -> Result<Assessment, TaxError> {
    if amount < Decimal::ZERO {
        return Err(TaxError::NegativeAmount);
    }

    let pan_number = pan_override
        .map(str::to_string)
        .or_else(|| vendor.pan_number.clone());
    let breakdown = breakdown(amount, applied);

    if breakdown.is_below_threshold {
        return Ok(Assessment {
            outcome: TaxOutcome::BelowThreshold,
            breakdown,
            pan_number,
        });
    }

    if !amount.is_zero() {
        if applied.pan_required && pan_number.is_none() {
            return Err(TaxError::PanRequired(applied.section.clone()));
        }
        if applied.tan_required && vendor.tan_number.is_none() {
            return Err(TaxError::TanRequired(applied.section.clone()));
        }
    }

    Ok(Assessment {
        outcome: TaxOutcome::Withheld,
        breakdown,
        pan_number,
    })
}
