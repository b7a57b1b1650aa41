//! Workflow routes.

use axum::{Router, extract::State, response::IntoResponse, routing::post};
use chrono::{NaiveDate, Utc};
use kosh_core::TaxKind;
use kosh_core::transaction::PaymentType;
use kosh_core::workflow::{InvoiceInput, RateChange};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::{
    AppState,
    error::ApiResult,
    extractors::ValidatedJson,
    middleware::{AuthUser, Permission},
    response,
};

/// Creates workflow routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/workflow/invoice-processing", post(process_invoice))
        .route("/workflow/rate-change", post(change_rate))
}

/// Request body for invoice processing.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    /// Vendor.
    #[validate(length(min = 1, max = 64, message = "vendorId is required"))]
    pub vendor_id: String,
    /// Transaction type.
    #[validate(length(min = 1, max = 64, message = "transactionType is required"))]
    pub transaction_type: String,
    /// Gross invoice amount.
    #[serde(alias = "amount")]
    pub gross_amount: Decimal,
    /// Invoice date; defaults to today.
    pub invoice_date: Option<NaiveDate>,
    /// Invoice number.
    #[validate(length(max = 128))]
    pub invoice_number: Option<String>,
    /// Section override.
    pub section: Option<String>,
    /// PAN fallback.
    pub pan_number: Option<String>,
    /// Normal or advance.
    #[serde(default)]
    pub payment_type: PaymentType,
    /// Mark the transaction completed.
    #[serde(default)]
    pub mark_completed: bool,
}

/// Request body for a rate change.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RateChangeRequest {
    /// TDS or TCS.
    pub kind: TaxKind,
    /// Section code.
    #[validate(length(min = 1, max = 32, message = "section is required"))]
    pub section: String,
    /// Nature label of the rate being replaced.
    #[serde(alias = "natureOfPayment", alias = "natureOfSale")]
    pub nature: Option<String>,
    /// First day of the new rate.
    pub effective_from: NaiveDate,
    /// New base rate.
    #[serde(alias = "newRate")]
    pub rate: Option<Decimal>,
    /// New surcharge.
    pub surcharge_rate: Option<Decimal>,
    /// New cess.
    pub education_cess_rate: Option<Decimal>,
    /// New threshold.
    pub threshold_limit: Option<Decimal>,
    /// New PAN requirement.
    pub pan_required: Option<bool>,
    /// New TAN requirement.
    pub tan_required: Option<bool>,
    /// End of the new rate.
    pub valid_to: Option<NaiveDate>,
    /// Note on the new record.
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

impl From<RateChangeRequest> for RateChange {
    fn from(req: RateChangeRequest) -> Self {
        Self {
            kind: req.kind,
            section: req.section,
            nature: req.nature,
            effective_from: req.effective_from,
            rate: req.rate,
            surcharge_rate: req.surcharge_rate,
            education_cess_rate: req.education_cess_rate,
            threshold_limit: req.threshold_limit,
            pan_required: req.pan_required,
            tan_required: req.tan_required,
            valid_to: req.valid_to,
            description: req.description,
        }
    }
}

/// POST `/workflow/invoice-processing`
async fn process_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<InvoiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Write)?;
    let input = InvoiceInput {
        vendor_id: req.vendor_id,
        transaction_type: req.transaction_type,
        gross_amount: req.gross_amount,
        invoice_date: req.invoice_date.unwrap_or_else(|| Utc::now().date_naive()),
        invoice_number: req.invoice_number,
        section: req.section,
        pan_number: req.pan_number,
        payment_type: req.payment_type,
        mark_completed: req.mark_completed,
    };
    let outcome = state
        .engine
        .workflows()
        .process_invoice(&actor, input)
        .await?;

    info!(
        company_id = %actor.company_id,
        transaction_id = %outcome.transaction.id,
        net_payable = %outcome.net_payable,
        "invoice processed"
    );
    Ok(response::ok(outcome))
}

/// POST `/workflow/rate-change`
async fn change_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<RateChangeRequest>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::ManageRates)?;
    let outcome = state
        .engine
        .workflows()
        .change_rate(&actor, req.into())
        .await?;

    info!(
        company_id = %actor.company_id,
        previous_rate_id = %outcome.previous_rate.id,
        new_rate_id = %outcome.new_rate.id,
        affected = outcome.impact.affected_transactions.len(),
        "rate change applied"
    );
    Ok(response::ok(outcome))
}
