//! Compliance alert routes.

use axum::{Router, extract::State, response::IntoResponse, routing::post};
use chrono::{NaiveDate, Utc};
use kosh_core::alerts::MAX_HORIZON_DAYS;
use serde::Deserialize;
use validator::Validate;

use crate::{
    AppState,
    error::ApiResult,
    extractors::ValidatedJson,
    middleware::{AuthUser, Permission},
    response,
};

/// Creates alert routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/alerts/generate", post(generate_alerts))
}

/// Request body for alert generation. Every field is optional.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAlertsRequest {
    /// Reference date; defaults to today.
    pub as_of: Option<NaiveDate>,
    /// Days ahead to look for upcoming deadlines.
    #[validate(range(min = 1, max = MAX_HORIZON_DAYS))]
    pub horizon_days: Option<u32>,
}

/// POST `/alerts/generate`
async fn generate_alerts(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<GenerateAlertsRequest>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Read)?;
    let as_of = req.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let report = state
        .engine
        .alerts()
        .generate(actor.company_id, as_of, req.horizon_days)
        .await?;
    Ok(response::ok(report))
}
