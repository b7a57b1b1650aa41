//! Vendor routes.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use kosh_core::vendor::{DeleteOutcome, NewVendor, VendorCategory, VendorFilter, VendorPatch};
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

/// Creates vendor routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vendors", get(list_vendors).post(create_vendor))
        .route(
            "/vendors/{vendor_id}",
            get(get_vendor).put(update_vendor).delete(delete_vendor),
        )
}

const fn default_true() -> bool {
    true
}

/// Request body for registering a vendor.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVendorRequest {
    /// Company-chosen identifier.
    #[validate(length(min = 1, max = 64, message = "vendorId is required"))]
    pub vendor_id: String,
    /// Display name.
    #[validate(length(min = 1, max = 255, message = "name is required"))]
    pub name: String,
    /// PAN.
    pub pan_number: Option<String>,
    /// TAN.
    pub tan_number: Option<String>,
    /// Category; defaults to `other`.
    pub category: Option<VendorCategory>,
    /// Subject to TDS; defaults to true.
    #[serde(default = "default_true")]
    pub tds_applicable: bool,
    /// Subject to TCS.
    #[serde(default)]
    pub tcs_applicable: bool,
    /// Contact email.
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    /// Postal address.
    #[validate(length(max = 1000))]
    pub address: Option<String>,
}

impl From<CreateVendorRequest> for NewVendor {
    fn from(req: CreateVendorRequest) -> Self {
        Self {
            vendor_id: req.vendor_id,
            name: req.name,
            pan_number: req.pan_number,
            tan_number: req.tan_number,
            category: req.category.unwrap_or(VendorCategory::Other),
            tds_applicable: req.tds_applicable,
            tcs_applicable: req.tcs_applicable,
            email: req.email,
            address: req.address,
        }
    }
}

/// Request body for updating a vendor.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVendorRequest {
    /// New identifier.
    #[validate(length(min = 1, max = 64))]
    pub vendor_id: Option<String>,
    /// New name.
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    /// New PAN.
    pub pan_number: Option<String>,
    /// New TAN.
    pub tan_number: Option<String>,
    /// New category.
    pub category: Option<VendorCategory>,
    /// New TDS flag.
    pub tds_applicable: Option<bool>,
    /// New TCS flag.
    pub tcs_applicable: Option<bool>,
    /// New email.
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    /// New address.
    #[validate(length(max = 1000))]
    pub address: Option<String>,
    /// Reactivate or deactivate.
    pub is_active: Option<bool>,
}

impl From<UpdateVendorRequest> for VendorPatch {
    fn from(req: UpdateVendorRequest) -> Self {
        Self {
            vendor_id: req.vendor_id,
            name: req.name,
            pan_number: req.pan_number,
            tan_number: req.tan_number,
            category: req.category,
            tds_applicable: req.tds_applicable,
            tcs_applicable: req.tcs_applicable,
            email: req.email,
            address: req.address,
            is_active: req.is_active,
        }
    }
}

/// Query parameters for listing vendors.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVendorsQuery {
    /// TDS liability.
    pub tds_applicable: Option<bool>,
    /// TCS liability.
    pub tcs_applicable: Option<bool>,
    /// Category.
    pub category: Option<VendorCategory>,
    /// Active flag.
    pub active: Option<bool>,
}

/// Query parameters for deleting a vendor.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteVendorQuery {
    /// Remove the record instead of deactivating it.
    #[serde(default)]
    pub hard_delete: bool,
}

/// POST `/vendors`
async fn create_vendor(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateVendorRequest>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Write)?;
    let vendor = state.engine.vendors().create(&actor, req.into()).await?;

    info!(
        company_id = %actor.company_id,
        vendor_id = %vendor.vendor_id,
        "vendor registered via API"
    );
    Ok(response::created(vendor))
}

/// GET `/vendors`
async fn list_vendors(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListVendorsQuery>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Read)?;
    let filter = VendorFilter {
        tds_applicable: query.tds_applicable,
        tcs_applicable: query.tcs_applicable,
        category: query.category,
        active: query.active,
    };
    let vendors = state
        .engine
        .vendors()
        .list(actor.company_id, &filter)
        .await?;
    Ok(response::ok(vendors))
}

/// GET `/vendors/{vendor_id}`
async fn get_vendor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(vendor_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Read)?;
    let vendor = state
        .engine
        .vendors()
        .get(actor.company_id, &vendor_id)
        .await?;
    Ok(response::ok(vendor))
}

/// PUT `/vendors/{vendor_id}`
async fn update_vendor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(vendor_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateVendorRequest>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Write)?;
    let vendor = state
        .engine
        .vendors()
        .update(&actor, &vendor_id, req.into())
        .await?;
    Ok(response::ok(vendor))
}

/// DELETE `/vendors/{vendor_id}`
async fn delete_vendor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(vendor_id): Path<String>,
    QueryParams(query): QueryParams<DeleteVendorQuery>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Write)?;
    let outcome = state
        .engine
        .vendors()
        .delete(&actor, &vendor_id, query.hard_delete)
        .await?;

    let message = match &outcome {
        DeleteOutcome::Deleted { .. } => "vendor deleted",
        DeleteOutcome::Deactivated { .. } => "vendor deactivated",
    };
    Ok(response::with_message(StatusCode::OK, outcome, message))
}
