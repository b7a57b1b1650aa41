//! Report routes.

use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use kosh_core::reports::SummaryBy;
use kosh_core::{FinancialQuarter, TaxKind};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::{
    AppState,
    error::ApiResult,
    extractors::{QueryParams, ValidatedJson},
    middleware::{AuthUser, Permission},
    response,
};

/// Creates report routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/tds-summary", get(tds_summary))
        .route("/reports/tcs-summary", get(tcs_summary))
        .route("/reports/compliance-status", get(compliance_status))
        .route("/reports/quarterly-filing", post(quarterly_filing))
}

/// Query parameters for a summary.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    /// First transaction date.
    pub from: Option<NaiveDate>,
    /// Last transaction date.
    pub to: Option<NaiveDate>,
    /// Grouping; defaults to section.
    pub group_by: Option<String>,
}

/// Query parameters for the compliance snapshot.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceQuery {
    /// Reference date; defaults to today.
    pub as_of: Option<NaiveDate>,
}

const fn default_kind() -> TaxKind {
    TaxKind::Tds
}

/// Request body for a quarterly return.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FilingRequest {
    /// Quarter label such as `2024-25/Q1`.
    pub quarter: FinancialQuarter,
    /// `tds` (26Q) or `tcs` (27EQ).
    #[serde(default = "default_kind")]
    pub kind: TaxKind,
    /// Reference date for late-filing checks; defaults to today.
    pub as_of: Option<NaiveDate>,
}

async fn summary(
    state: AppState,
    auth: &AuthUser,
    kind: TaxKind,
    query: SummaryQuery,
) -> ApiResult<impl IntoResponse + use<>> {
    let actor = auth.require(Permission::Read)?;
    let group_by = match query.group_by.as_deref() {
        Some(raw) => raw.parse::<SummaryBy>()?,
        None => SummaryBy::Section,
    };
    let report = state
        .engine
        .reports()
        .tax_summary(actor.company_id, kind, query.from, query.to, group_by)
        .await?;
    Ok(response::ok(report))
}

/// GET `/reports/tds-summary`
async fn tds_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<SummaryQuery>,
) -> ApiResult<impl IntoResponse> {
    summary(state, &auth, TaxKind::Tds, query).await
}

/// GET `/reports/tcs-summary`
async fn tcs_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<SummaryQuery>,
) -> ApiResult<impl IntoResponse> {
    summary(state, &auth, TaxKind::Tcs, query).await
}

/// GET `/reports/compliance-status`
async fn compliance_status(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ComplianceQuery>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Read)?;
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let status = state
        .engine
        .reports()
        .compliance_status(actor.company_id, as_of)
        .await?;
    Ok(response::ok(status))
}

/// POST `/reports/quarterly-filing`
async fn quarterly_filing(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<FilingRequest>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Write)?;
    let as_of = req.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let filing = state
        .engine
        .filings()
        .generate(actor.company_id, req.quarter, req.kind, as_of)
        .await?;

    info!(
        company_id = %actor.company_id,
        quarter = %req.quarter,
        kind = %req.kind,
        valid = filing.validation.is_valid,
        "quarterly return assembled"
    );
    Ok(response::ok(filing))
}
