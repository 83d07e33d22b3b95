// ============================================================================
// BizDesk API - Error Mapping
// File: crates/bizdesk-api/src/error.rs
// ============================================================================

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use bizdesk_core::error::DomainError;

use crate::response::ApiResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => DomainError::Validation(e.body_text()).into(),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            ApiError::Domain(e) => match e {
                DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                DomainError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                DomainError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
                DomainError::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
                DomainError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
                DomainError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                DomainError::TenantNotActive => (StatusCode::FORBIDDEN, "TENANT_NOT_ACTIVE"),
                DomainError::ExternalService { .. } => (StatusCode::BAD_GATEWAY, "EXTERNAL_SERVICE_ERROR"),
                DomainError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
                DomainError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();

        let message = match &self {
            // Database and internal details stay in the logs.
            ApiError::Domain(DomainError::DatabaseError(_) | DomainError::InternalError(_)) => {
                tracing::error!(code, "{}", self);
                "Internal server error".to_string()
            }
            ApiError::Domain(DomainError::ExternalService { .. }) | ApiError::Unavailable(_) => {
                tracing::error!(code, "{}", self);
                self.to_string()
            }
            _ => {
                tracing::warn!(code, "{}", self);
                self.to_string()
            }
        };

        (status, Json(ApiResponse::error(code, message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(e: impl Into<ApiError>) -> StatusCode {
        e.into().into_response().status()
    }

    #[test]
    fn test_domain_status_mapping() {
        assert_eq!(status_of(DomainError::not_found("Product")), StatusCode::NOT_FOUND);
        assert_eq!(status_of(DomainError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(DomainError::Validation("x".into())), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_of(DomainError::InvalidState("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(DomainError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(DomainError::TenantNotActive), StatusCode::FORBIDDEN);
        assert_eq!(status_of(DomainError::external("gemini", "down")), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_of(DomainError::DatabaseError("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_request_level_errors() {
        assert_eq!(status_of(ApiError::Unauthorized("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(ApiError::BadRequest("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(ApiError::Unavailable("db".into())), StatusCode::SERVICE_UNAVAILABLE);
    }
}
