//! Certificate routes.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::NaiveDate;
use kosh_core::FinancialQuarter;
use kosh_core::certificate::{
    CertificateFilter, CertificateStatus, CertificateType, GenerateCertificate, StatusChange,
};
use kosh_shared::types::CertificateId;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::parse_id;
use crate::{
    AppState,
    error::ApiResult,
    extractors::{QueryParams, ValidatedJson},
    middleware::{AuthUser, Permission},
    response,
};

/// Creates certificate routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/certificates", get(list_certificates))
        .route("/certificates/generate", post(generate_certificate))
        .route("/certificates/{id}", get(get_certificate))
        .route("/certificates/{id}/status", put(update_status))
}

/// Request body for generating a certificate.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCertificateRequest {
    /// Vendor; omitted for consolidated certificates.
    #[validate(length(min = 1, max = 64))]
    pub vendor_id: Option<String>,
    /// `tds`, `tcs` or `consolidated`.
    pub certificate_type: CertificateType,
    /// First day covered.
    pub period_start: NaiveDate,
    /// Last day covered.
    pub period_end: NaiveDate,
    /// Quarter label such as `2024-25/Q1`.
    pub quarter: Option<FinancialQuarter>,
}

impl From<GenerateCertificateRequest> for GenerateCertificate {
    fn from(req: GenerateCertificateRequest) -> Self {
        Self {
            vendor_id: req.vendor_id,
            certificate_type: req.certificate_type,
            period_start: req.period_start,
            period_end: req.period_end,
            quarter: req.quarter,
        }
    }
}

/// Request body for a status change.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeRequest {
    /// Target status.
    pub status: CertificateStatus,
    /// Recipient address.
    #[validate(length(min = 1, max = 255))]
    pub delivered_to: Option<String>,
    /// Channel.
    #[validate(length(max = 32))]
    pub delivery_method: Option<String>,
    /// Revocation reason.
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

/// Query parameters for listing certificates.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCertificatesQuery {
    /// Vendor.
    pub vendor_id: Option<String>,
    /// Type.
    pub certificate_type: Option<CertificateType>,
    /// Quarter label.
    pub quarter: Option<FinancialQuarter>,
    /// Status.
    pub status: Option<CertificateStatus>,
}

/// POST `/certificates/generate`
async fn generate_certificate(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<GenerateCertificateRequest>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Write)?;
    let certificate = state
        .engine
        .certificates()
        .generate(&actor, req.into())
        .await?;

    info!(
        company_id = %actor.company_id,
        certificate_number = %certificate.certificate_number,
        transactions = certificate.transaction_count,
        "certificate generated via API"
    );
    Ok(response::created(certificate))
}

/// GET `/certificates`
async fn list_certificates(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListCertificatesQuery>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Read)?;
    let filter = CertificateFilter {
        vendor_id: query.vendor_id,
        certificate_type: query.certificate_type,
        quarter: query.quarter,
        status: query.status,
    };
    let certificates = state
        .engine
        .certificates()
        .list(actor.company_id, &filter)
        .await?;
    Ok(response::ok(certificates))
}

/// GET `/certificates/{id}`
async fn get_certificate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Read)?;
    let id: CertificateId = parse_id(&id, "certificate")?;
    let certificate = state
        .engine
        .certificates()
        .get(actor.company_id, id)
        .await?;
    Ok(response::ok(certificate))
}

/// PUT `/certificates/{id}/status`
async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<StatusChangeRequest>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Write)?;
    let id: CertificateId = parse_id(&id, "certificate")?;
    let change = StatusChange {
        status: req.status,
        delivered_to: req.delivered_to,
        delivery_method: req.delivery_method,
        reason: req.reason,
    };
    let certificate = state
        .engine
        .certificates()
        .set_status(&actor, id, change)
        .await?;
    Ok(response::ok(certificate))
}
