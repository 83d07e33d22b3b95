// ============================================================================
// BizDesk API - Request Extractors
// File: crates/bizdesk-api/src/extractors.rs
// Description: Tenant context resolution and envelope-aware JSON/Path/Query
// ============================================================================

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use tracing::warn;
use uuid::Uuid;

use bizdesk_core::context::TenantContext;
use bizdesk_core::error::DomainError;
use bizdesk_shared::constants::{HEADER_API_KEY, HEADER_TENANT_ID};

use crate::error::ApiError;
use crate::state::AppState;

/// `axum::Json` with rejections rendered in the response envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// The tenant and actor of an authenticated request.
///
/// Resolution order: a bearer JWT (tenant from its claim), otherwise the
/// service API key together with `x-tenant-id`. A tenant header that
/// disagrees with the token is refused, as is a tenant that is missing,
/// deactivated or deleted.
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub TenantContext);

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
    headers
        .get(name)
        .map(|v| {
            v.to_str()
                .map(str::trim)
                .map_err(|_| ApiError::BadRequest(format!("{} header is not valid text", name)))
        })
        .transpose()
}

fn header_tenant(headers: &HeaderMap) -> Result<Option<Uuid>, ApiError> {
    header_str(headers, HEADER_TENANT_ID)?
        .map(|raw| {
            Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("{} is not a valid UUID", HEADER_TENANT_ID)))
        })
        .transpose()
}

fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(value) = header_str(headers, AUTHORIZATION.as_str())? else {
        return Ok(None);
    };
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(Some(token.trim()))
        }
        _ => Err(ApiError::Unauthorized("Authorization must be a Bearer token".to_string())),
    }
}

pub(crate) fn resolve_context(headers: &HeaderMap, state: &AppState) -> Result<TenantContext, ApiError> {
    let claimed_tenant = header_tenant(headers)?;

    if let Some(token) = bearer_token(headers)? {
        let claims = state.jwt.validate_token(token).map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            ApiError::Unauthorized("invalid or expired token".to_string())
        })?;
        if let Some(claimed) = claimed_tenant {
            if claimed != claims.tenant_id {
                warn!(token_tenant = %claims.tenant_id, header_tenant = %claimed, "Tenant header mismatch");
                return Err(ApiError::Forbidden("tenant header does not match token".to_string()));
            }
        }
        return Ok(TenantContext::staff(claims.tenant_id, claims.sub, claims.role));
    }

    if let Some(key) = header_str(headers, HEADER_API_KEY)? {
        if state.service_api_key.is_empty() || key != &*state.service_api_key {
            warn!("Rejected service API key");
            return Err(ApiError::Unauthorized("invalid API key".to_string()));
        }
        let tenant_id = claimed_tenant
            .ok_or_else(|| ApiError::BadRequest(format!("{} header is required", HEADER_TENANT_ID)))?;
        return Ok(TenantContext::service(tenant_id));
    }

    Err(ApiError::Unauthorized("missing credentials".to_string()))
}

impl FromRequestParts<AppState> for CurrentTenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ctx = resolve_context(&parts.headers, state)?;

        state.auth.resolve_tenant(&ctx.tenant_id).await.map_err(|e| match e {
            DomainError::NotFound { .. } | DomainError::TenantNotActive => {
                warn!(tenant_id = %ctx.tenant_id, "Request for unavailable tenant");
                ApiError::Forbidden("tenant is not available".to_string())
            }
            other => other.into(),
        })?;

        Ok(CurrentTenant(ctx))
    }
}
