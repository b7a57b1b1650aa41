//! HTTP error mapping.
//!
//! Every failure leaves the API in the response envelope
//! `{success: false, message, code, errors?}`. Server faults are logged with
//! their detail and answered with the generic "Internal server error".

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kosh_core::TaxError;
use kosh_shared::AppError;
use serde::Serialize;
use tracing::error;

use crate::response::Envelope;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as sent by the client.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

/// An error on its way to the client.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    code: &'static str,
    errors: Vec<FieldError>,
}

impl ApiError {
    /// 400 with per-field detail.
    #[must_use]
    pub fn invalid(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            error: AppError::Validation(message.into()),
            code: "VALIDATION_ERROR",
            errors,
        }
    }

    /// 400 without field detail.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::Validation(message.into()).into()
    }

    /// 401.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into()).into()
    }

    /// 403 "insufficient permissions".
    #[must_use]
    pub fn forbidden() -> Self {
        AppError::Forbidden("insufficient permissions".to_string()).into()
    }

    /// HTTP status of this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Stable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        let code = error.error_code();
        Self {
            error,
            code,
            errors: Vec::new(),
        }
    }
}

impl From<TaxError> for ApiError {
    fn from(err: TaxError) -> Self {
        let code = err.error_code();
        Self {
            error: err.into(),
            code,
            errors: Vec::new(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.error.is_server_error() {
            error!(error = %self.error, code = self.code, "request failed");
        }

        let body = Envelope::<()> {
            success: false,
            data: None,
            message: Some(self.error.public_message()),
            code: Some(self.code),
            errors: (!self.errors.is_empty()).then_some(self.errors),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_error_keeps_domain_code() {
        let err = ApiError::from(TaxError::VendorNotFound("V404".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "VENDOR_NOT_FOUND");
    }

    #[test]
    fn test_storage_fault_is_500() {
        let err = ApiError::from(TaxError::Storage("pool timed out".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_forbidden() {
        let err = ApiError::forbidden();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.code(), "FORBIDDEN");
    }
}
