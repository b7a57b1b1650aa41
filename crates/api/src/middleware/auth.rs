//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use kosh_core::Actor;
use kosh_shared::types::{CompanyId, UserId};
use kosh_shared::{Claims, JwtError, Role};
use tracing::{debug, warn};

use crate::AppState;
use crate::error::ApiError;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that validates JWT tokens.
///
/// Valid claims are stored in the request extensions for [`AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return ApiError::unauthorized("Authorization header with Bearer token is required")
            .into_response();
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(JwtError::Expired) => ApiError::unauthorized("Token has expired").into_response(),
        Err(e) => {
            debug!(error = %e, "rejected bearer token");
            ApiError::unauthorized("Invalid or malformed token").into_response()
        }
    }
}

/// What a handler needs the caller to be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Read records and reports, generate alerts.
    Read,
    /// Vendors, transactions, certificates, filings, invoice workflow.
    Write,
    /// Rate records and the rate-change workflow.
    ManageRates,
}

impl Permission {
    /// Whether `role` carries this permission.
    #[must_use]
    pub const fn granted_to(self, role: Role) -> bool {
        match self {
            Self::Read => true,
            Self::Write => role.can_write(),
            Self::ManageRates => role.can_manage_rates(),
        }
    }
}

/// Extractor for authenticated user claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the company the caller acts for.
    #[must_use]
    pub fn company_id(&self) -> CompanyId {
        CompanyId::from_uuid(self.0.company_id())
    }

    /// Returns the caller as an engine actor.
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor::new(self.company_id(), UserId::from_uuid(self.0.user_id()))
    }

    /// Checks the caller's role and returns the actor.
    ///
    /// # Errors
    ///
    /// Returns 403 "insufficient permissions" when the role is unknown or
    /// lacks the permission.
    pub fn require(&self, permission: Permission) -> Result<Actor, ApiError> {
        match self.0.role() {
            Some(role) if permission.granted_to(role) => Ok(self.actor()),
            _ => {
                warn!(
                    user_id = %self.0.user_id(),
                    role = %self.0.role,
                    ?permission,
                    "permission denied"
                );
                Err(ApiError::forbidden())
            }
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
