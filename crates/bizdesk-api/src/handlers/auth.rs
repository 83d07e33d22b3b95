// ============================================================================
// BizDesk API - Tenant & Auth Handlers
// File: crates/bizdesk-api/src/handlers/auth.rs
// ============================================================================
//! Sign-up, login and the current tenant

use axum::extract::State;
use serde::Deserialize;
use validator::Validate;

use bizdesk_core::domain::Tenant;
use bizdesk_core::error::DomainError;
use bizdesk_core::services::{AuthResult, RegisterTenant};
use bizdesk_shared::constants::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

// `validator` length bounds are `u64`; the shared constants are `usize`.
const MIN_PASSWORD_LENGTH_U64: u64 = MIN_PASSWORD_LENGTH as u64;
const MAX_PASSWORD_LENGTH_U64: u64 = MAX_PASSWORD_LENGTH as u64;

use super::{created, ok, ApiResult, Created};
use crate::extractors::{ApiJson, CurrentTenant};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterTenantRequest {
    #[validate(length(min = 2, max = 100, message = "Tenant name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(length(min = 2, max = 100, message = "Slug must be between 2 and 100 characters"))]
    pub slug: String,
    pub rut: Option<String>,
    #[validate(email(message = "Invalid owner e-mail"))]
    pub owner_email: String,
    #[validate(length(min = 2, max = 100, message = "Owner name must be between 2 and 100 characters"))]
    pub owner_name: String,
    #[validate(length(
        min = MIN_PASSWORD_LENGTH_U64,
        max = MAX_PASSWORD_LENGTH_U64,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub tenant_slug: String,
    pub email: String,
    pub password: String,
}

/// POST /api/tenants
pub async fn register_tenant(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterTenantRequest>,
) -> Created<AuthResult> {
    payload.validate().map_err(DomainError::from)?;

    let result = state
        .auth
        .register_tenant(RegisterTenant {
            name: payload.name,
            slug: payload.slug,
            rut: payload.rut,
            owner_email: payload.owner_email,
            owner_name: payload.owner_name,
            password: payload.password,
        })
        .await?;
    created(result)
}

/// POST /api/auth/login
pub async fn login(State(state): State<AppState>, ApiJson(payload): ApiJson<LoginRequest>) -> ApiResult<AuthResult> {
    if payload.tenant_slug.trim().is_empty() || payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(DomainError::Validation("tenant_slug, email and password are required".to_string()).into());
    }
    let result = state
        .auth
        .login(&payload.tenant_slug, &payload.email, &payload.password)
        .await?;
    ok(result)
}

/// GET /api/tenants/current
pub async fn current_tenant(State(state): State<AppState>, CurrentTenant(ctx): CurrentTenant) -> ApiResult<Tenant> {
    ok(state.auth.current_tenant(&ctx).await?)
}
