//! API route definitions.

use std::str::FromStr;

use axum::{Router, middleware};

use crate::{AppState, error::ApiError, middleware::auth_middleware};

pub mod alerts;
pub mod certificates;
pub mod health;
pub mod rates;
pub mod reports;
pub mod transactions;
pub mod vendors;
pub mod workflow;

/// Routes under `/api/tds-tcs`, all behind bearer authentication.
#[allow(clippy::needless_pass_by_value)]
pub fn tax_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(rates::routes())
        .merge(vendors::routes())
        .merge(transactions::routes())
        .merge(certificates::routes())
        .merge(reports::routes())
        .merge(workflow::routes())
        .merge(alerts::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Parses a path ID, answering 400 on garbage.
pub(crate) fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("invalid {what} id: {raw}")))
}
