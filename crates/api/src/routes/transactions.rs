//! Transaction routes: calculation, recording, listing and bulk preview.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use kosh_core::TaxKind;
use kosh_core::reports::{SummaryBy, TaxSummary, summarize, totals};
use kosh_core::transaction::{
    BulkItem, NewTransaction, PaymentType, TaxOutcome, TransactionFilter,
    TransactionPatch, TransactionStatus,
};
use kosh_shared::AppError;
use kosh_shared::types::{PageRequest, PageResponse, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use validator::Validate;

use super::parse_id;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::{QueryParams, ValidatedJson},
    middleware::{AuthUser, Permission},
    response,
};

/// Creates transaction routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/transactions/bulk-calculate", post(bulk_calculate))
        .route(
            "/transactions/{id}",
            get(get_transaction).put(update_transaction),
        )
}

/// Request body for recording a transaction.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// Vendor the payment goes to or the sale comes from.
    #[validate(length(min = 1, max = 64, message = "vendorId is required"))]
    pub vendor_id: String,
    /// Configured transaction type.
    #[validate(length(min = 1, max = 64, message = "transactionType is required"))]
    pub transaction_type: String,
    /// Gross amount.
    pub amount: Decimal,
    /// Defaults to today.
    pub transaction_date: Option<NaiveDate>,
    /// Section override.
    pub section: Option<String>,
    /// PAN fallback when the vendor has none on file.
    pub pan_number: Option<String>,
    /// Invoice or voucher number.
    #[validate(length(max = 128))]
    pub reference: Option<String>,
    /// Normal or advance.
    #[serde(default)]
    pub payment_type: PaymentType,
    /// Deposit due date override.
    pub due_date: Option<NaiveDate>,
}

/// Request body for updating a transaction.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    /// Must equal the stored vendor.
    pub vendor_id: Option<String>,
    /// Must equal the stored section.
    pub section: Option<String>,
    /// New amount (Pending only).
    pub amount: Option<Decimal>,
    /// New status.
    pub status: Option<TransactionStatus>,
    /// New reference.
    #[validate(length(max = 128))]
    pub reference: Option<String>,
    /// New due date.
    pub due_date: Option<NaiveDate>,
    /// New payment type.
    pub payment_type: Option<PaymentType>,
}

impl From<UpdateTransactionRequest> for TransactionPatch {
    fn from(req: UpdateTransactionRequest) -> Self {
        Self {
            vendor_id: req.vendor_id,
            section: req.section,
            amount: req.amount,
            status: req.status,
            reference: req.reference,
            due_date: req.due_date,
            payment_type: req.payment_type,
        }
    }
}

/// Query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    /// Vendor.
    pub vendor_id: Option<String>,
    /// `tds` or `tcs`.
    pub kind: Option<TaxKind>,
    /// Section code.
    pub section: Option<String>,
    /// Status.
    pub status: Option<String>,
    /// First transaction date.
    pub from: Option<NaiveDate>,
    /// Last transaction date.
    pub to: Option<NaiveDate>,
    /// Attach a grouped summary of the filtered set.
    pub summary_by: Option<String>,
    /// Keep the calculation breakdown on each row; defaults to true.
    pub include_calculations: Option<bool>,
    /// Page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
}

/// One item of a bulk preview.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemRequest {
    /// Vendor.
    #[validate(length(min = 1, max = 64, message = "vendorId is required"))]
    pub vendor_id: String,
    /// Transaction type.
    #[validate(length(min = 1, max = 64, message = "transactionType is required"))]
    pub transaction_type: String,
    /// Amount.
    pub amount: Decimal,
    /// Defaults to today.
    pub transaction_date: Option<NaiveDate>,
    /// Section override.
    pub section: Option<String>,
    /// PAN fallback.
    pub pan_number: Option<String>,
}

/// Request body for a bulk preview.
#[derive(Debug, Deserialize, Validate)]
pub struct BulkCalculateRequest {
    /// Items to compute, in order.
    #[validate(length(min = 1, max = 1000, message = "items must hold 1 to 1000 entries"))]
    pub items: Vec<BulkItemRequest>,
}

/// Paged listing with an optional summary.
#[derive(Debug, Serialize)]
pub struct TransactionListing {
    /// The page.
    pub transactions: PageResponse<Value>,
    /// Summary over the whole filtered set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<TaxSummary>,
}

fn parse_status(raw: Option<&str>) -> Result<Option<TransactionStatus>, ApiError> {
    raw.map(|s| {
        TransactionStatus::parse(s)
            .ok_or_else(|| ApiError::bad_request(format!("invalid status: {s}")))
    })
    .transpose()
}

/// POST `/transactions`
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateTransactionRequest>,
) -> ApiResult<Response> {
    let actor = auth.require(Permission::Write)?;
    let input = NewTransaction {
        vendor_id: req.vendor_id,
        transaction_type: req.transaction_type,
        amount: req.amount,
        transaction_date: req
            .transaction_date
            .unwrap_or_else(|| Utc::now().date_naive()),
        section: req.section,
        pan_number: req.pan_number,
        reference: req.reference,
        payment_type: req.payment_type,
        due_date: req.due_date,
    };
    let transaction = state.engine.transactions().create(&actor, input).await?;

    if transaction.outcome == TaxOutcome::BelowThreshold {
        debug!(
            transaction_id = %transaction.id,
            amount = %transaction.amount,
            "transaction below threshold"
        );
        return Ok(response::with_message(
            StatusCode::OK,
            transaction,
            "amount is below the threshold limit; no tax applies",
        )
        .into_response());
    }

    Ok(response::created(transaction).into_response())
}

/// GET `/transactions`
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListTransactionsQuery>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Read)?;
    let summary_by = query
        .summary_by
        .as_deref()
        .map(str::parse::<SummaryBy>)
        .transpose()?;
    let filter = TransactionFilter {
        vendor_id: query.vendor_id,
        kind: query.kind,
        section: query.section,
        status: parse_status(query.status.as_deref())?,
        from: query.from,
        to: query.to,
    };

    let transactions = state
        .engine
        .transactions()
        .list(actor.company_id, &filter)
        .await?;

    let summary = summary_by.map(|by| TaxSummary {
        report_type: "transaction_summary".to_string(),
        kind: filter.kind,
        from: filter.from,
        to: filter.to,
        group_by: by,
        totals: totals(&transactions),
        groups: summarize(&transactions, by),
    });

    let include_calculations = query.include_calculations.unwrap_or(true);
    let rows = transactions
        .into_iter()
        .map(|tx| {
            let mut value = serde_json::to_value(tx)
                .map_err(|e| AppError::Internal(format!("serialize transaction: {e}")))?;
            if !include_calculations && let Value::Object(map) = &mut value {
                map.remove("calculationBreakdown");
            }
            Ok(value)
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    let page = PageRequest::new(query.page, query.limit).apply(rows);
    Ok(response::ok(TransactionListing {
        transactions: page,
        summary,
    }))
}

/// GET `/transactions/{id}`
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Read)?;
    let id: TransactionId = parse_id(&id, "transaction")?;
    let transaction = state
        .engine
        .transactions()
        .get(actor.company_id, id)
        .await?;
    Ok(response::ok(transaction))
}

/// PUT `/transactions/{id}`
async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateTransactionRequest>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Write)?;
    let id: TransactionId = parse_id(&id, "transaction")?;
    let transaction = state
        .engine
        .transactions()
        .update(&actor, id, req.into())
        .await?;

    info!(
        company_id = %actor.company_id,
        transaction_id = %transaction.id,
        status = %transaction.status,
        "transaction updated via API"
    );
    Ok(response::ok(transaction))
}

/// POST `/transactions/bulk-calculate`
async fn bulk_calculate(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<BulkCalculateRequest>,
) -> ApiResult<impl IntoResponse> {
    let actor = auth.require(Permission::Write)?;
    let today = Utc::now().date_naive();
    let items = req
        .items
        .into_iter()
        .map(|item| BulkItem {
            vendor_id: item.vendor_id,
            transaction_type: item.transaction_type,
            amount: item.amount,
            transaction_date: item.transaction_date.unwrap_or(today),
            section: item.section,
            pan_number: item.pan_number,
        })
        .collect();

    let outcome = state
        .engine
        .transactions()
        .bulk_calculate(actor.company_id, items)
        .await?;

    Ok(response::ok(outcome))
}
