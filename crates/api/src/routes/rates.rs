//! TDS and TCS rate administration routes.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, put},
};
use chrono::NaiveDate;
use kosh_core::TaxKind;
use kosh_core::rate::{NewRate, RateFilter, RatePatch};
use kosh_shared::types::RateId;
use rust_decimal::Decimal;
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

/// Creates the rate routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tds-rates", get(list_tds_rates).post(create_tds_rate))
        .route("/tds-rates/{id}", get(get_tds_rate).put(update_tds_rate))
        .route("/tcs-rates", get(list_tcs_rates).post(create_tcs_rate))
        .route("/tcs-rates/{id}", put(update_tcs_rate).get(get_tcs_rate))
}

/// Request body for creating a rate.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRateRequest {
    /// Section code.
    #[validate(length(min = 1, max = 32, message = "section is required"))]
    pub section: String,
    /// Nature of payment (TDS) or sale (TCS).
    #[serde(alias = "natureOfPayment", alias = "natureOfSale")]
    #[validate(length(max = 255))]
    pub nature: Option<String>,
    /// Base rate in percent.
    pub rate: Decimal,
    /// Surcharge in percent.
    #[serde(default)]
    pub surcharge_rate: Decimal,
    /// Cess in percent.
    #[serde(default)]
    pub education_cess_rate: Decimal,
    /// First day the rate applies.
    pub valid_from: NaiveDate,
    /// Last day the rate applies.
    pub valid_to: Option<NaiveDate>,
    /// Threshold limit.
    #[serde(default)]
    pub threshold_limit: Decimal,
    /// PAN requirement.
    #[serde(default)]
    pub pan_required: bool,
    /// TAN requirement.
    #[serde(default)]
    pub tan_required: bool,
    /// Free-text note.
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

impl CreateRateRequest {
    fn into_input(self, kind: TaxKind) -> NewRate {
        NewRate {
            kind,
            section: self.section,
            nature: self.nature,
            rate: self.rate,
            surcharge_rate: self.surcharge_rate,
            education_cess_rate: self.education_cess_rate,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            threshold_limit: self.threshold_limit,
            pan_required: self.pan_required,
            tan_required: self.tan_required,
            description: self.description,
        }
    }
}

/// Request body for updating a rate. Absent fields stay unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRateRequest {
    /// Must equal the current section.
    pub section: Option<String>,
    /// Must equal the current nature.
    #[serde(alias = "natureOfPayment", alias = "natureOfSale")]
    pub nature: Option<String>,
    /// New base rate.
    pub rate: Option<Decimal>,
    /// New surcharge.
    pub surcharge_rate: Option<Decimal>,
    /// New cess.
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
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

impl From<UpdateRateRequest> for RatePatch {
    fn from(req: UpdateRateRequest) -> Self {
        Self {
            section: req.section,
            nature: req.nature,
            rate: req.rate,
            surcharge_rate: req.surcharge_rate,
            education_cess_rate: req.education_cess_rate,
            threshold_limit: req.threshold_limit,
            valid_from: req.valid_from,
            valid_to: req.valid_to,
            pan_required: req.pan_required,
            tan_required: req.tan_required,
            is_active: req.is_active,
            description: req.description,
        }
    }
}

/// Query parameters for listing rates.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRatesQuery {
    /// Only active or inactive records.
    pub active: Option<bool>,
    /// Only this section.
    pub section: Option<String>,
    /// Only records applicable on this date.
    pub applicable_date: Option<NaiveDate>,
    /// Attach a worked calculation for this amount.
    pub sample_amount: Option<Decimal>,
}

async fn create_rate(
    state: AppState,
    auth: &AuthUser,
    kind: TaxKind,
    req: CreateRateRequest,
) -> ApiResult<impl IntoResponse + use<>> {
    let actor = auth.require(Permission::ManageRates)?;
    let rate = state
        .engine
        .rates()
        .add_rate(&actor, req.into_input(kind))
        .await?;

    info!(
        company_id = %actor.company_id,
        rate_id = %rate.id,
        kind = %kind,
        section = %rate.section,
        "rate created via API"
    );
    Ok(response::created(rate))
}

async fn update_rate(
    state: AppState,
    auth: &AuthUser,
    kind: TaxKind,
    raw_id: &str,
    req: UpdateRateRequest,
) -> ApiResult<impl IntoResponse + use<>> {
    let actor = auth.require(Permission::ManageRates)?;
    let id: RateId = parse_id(raw_id, "rate")?;
    let rate = state
        .engine
        .rates()
        .update_rate(&actor, kind, id, req.into())
        .await?;
    Ok(response::ok(rate))
}

async fn get_rate(
    state: AppState,
    auth: &AuthUser,
    kind: TaxKind,
    raw_id: &str,
) -> ApiResult<impl IntoResponse + use<>> {
    let actor = auth.require(Permission::Read)?;
    let id: RateId = parse_id(raw_id, "rate")?;
    let rate = state.engine.rates().get(actor.company_id, kind, id).await?;
    Ok(response::ok(rate))
}

async fn list_rates(
    state: AppState,
    auth: &AuthUser,
    kind: TaxKind,
    query: ListRatesQuery,
) -> ApiResult<impl IntoResponse + use<>> {
    let actor = auth.require(Permission::Read)?;
    let filter = RateFilter {
        kind: Some(kind),
        active: query.active,
        section: query.section,
        applicable_on: query.applicable_date,
    };
    let rates = state
        .engine
        .rates()
        .list(actor.company_id, &filter, query.sample_amount)
        .await?;
    Ok(response::ok(rates))
}

/// POST `/tds-rates`
async fn create_tds_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateRateRequest>,
) -> ApiResult<impl IntoResponse> {
    create_rate(state, &auth, TaxKind::Tds, req).await
}

/// POST `/tcs-rates`
async fn create_tcs_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateRateRequest>,
) -> ApiResult<impl IntoResponse> {
    create_rate(state, &auth, TaxKind::Tcs, req).await
}

/// PUT `/tds-rates/{id}`
async fn update_tds_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateRateRequest>,
) -> ApiResult<impl IntoResponse> {
    update_rate(state, &auth, TaxKind::Tds, &id, req).await
}

/// PUT `/tcs-rates/{id}`
async fn update_tcs_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateRateRequest>,
) -> ApiResult<impl IntoResponse> {
    update_rate(state, &auth, TaxKind::Tcs, &id, req).await
}

/// GET `/tds-rates/{id}`
async fn get_tds_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    get_rate(state, &auth, TaxKind::Tds, &id).await
}

/// GET `/tcs-rates/{id}`
async fn get_tcs_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    get_rate(state, &auth, TaxKind::Tcs, &id).await
}

/// GET `/tds-rates`
async fn list_tds_rates(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListRatesQuery>,
) -> ApiResult<impl IntoResponse> {
    list_rates(state, &auth, TaxKind::Tds, query).await
}

/// GET `/tcs-rates`
async fn list_tcs_rates(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListRatesQuery>,
) -> ApiResult<impl IntoResponse> {
    list_rates(state, &auth, TaxKind::Tcs, query).await
}
