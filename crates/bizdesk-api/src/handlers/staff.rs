// ============================================================================
// BizDesk API - Staff & Role Handlers
// File: crates/bizdesk-api/src/handlers/staff.rs
// ============================================================================

use axum::extract::State;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use bizdesk_core::domain::{Role, Staff};
use bizdesk_core::error::DomainError;
use bizdesk_core::repositories::StaffFilter;
use bizdesk_core::services::{NewStaff, StaffUpdate};
use bizdesk_shared::constants::{MAX_MONTHLY_AMOUNT_CLP, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use bizdesk_shared::{Page, Pagination};

use super::{created, ok, ApiResult, Created};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, CurrentTenant};
use crate::response::Deleted;
use crate::state::AppState;

// `validator` length bounds are `u64`; the shared constants are `usize`.
const MIN_PASSWORD_LENGTH_U64: u64 = MIN_PASSWORD_LENGTH as u64;
const MAX_PASSWORD_LENGTH_U64: u64 = MAX_PASSWORD_LENGTH as u64;

#[derive(Debug, Default, Deserialize)]
pub struct StaffQuery {
    pub search: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStaffRequest {
    #[validate(email(message = "Invalid e-mail"))]
    pub email: String,
    #[validate(length(min = 2, max = 100, message = "Full name must be between 2 and 100 characters"))]
    pub full_name: String,
    pub role: Option<String>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub rut: Option<String>,
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(range(min = 0, max = MAX_MONTHLY_AMOUNT_CLP, message = "Base salary is out of range"))]
    pub base_salary: i64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "PTO balance cannot be negative"))]
    pub pto_balance_days: f32,
    #[validate(length(
        min = MIN_PASSWORD_LENGTH_U64,
        max = MAX_PASSWORD_LENGTH_U64,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateStaffRequest {
    #[validate(length(min = 2, max = 100, message = "Full name must be between 2 and 100 characters"))]
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub rut: Option<String>,
    pub hire_date: Option<NaiveDate>,
    #[validate(range(min = 0, max = MAX_MONTHLY_AMOUNT_CLP, message = "Base salary is out of range"))]
    pub base_salary: Option<i64>,
    #[validate(range(min = 0.0, message = "PTO balance cannot be negative"))]
    pub pto_balance_days: Option<f32>,
    pub is_active: Option<bool>,
    #[validate(length(
        min = MIN_PASSWORD_LENGTH_U64,
        max = MAX_PASSWORD_LENGTH_U64,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// GET /api/staff
pub async fn list_staff(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiQuery(query): ApiQuery<StaffQuery>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Staff>> {
    let filter = StaffFilter {
        search: query.search,
        active: query.active,
    };
    ok(state.staff.list(&ctx, &filter, pagination.normalized()).await?)
}

/// GET /api/staff/{id}
pub async fn get_staff(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Staff> {
    ok(state.staff.get(&ctx, &id).await?)
}

/// POST /api/staff
pub async fn create_staff(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiJson(payload): ApiJson<CreateStaffRequest>,
) -> Created<Staff> {
    payload.validate().map_err(DomainError::from)?;
    let staff = state
        .staff
        .create(
            &ctx,
            NewStaff {
                email: payload.email,
                full_name: payload.full_name,
                role: payload.role,
                job_title: payload.job_title,
                phone: payload.phone,
                rut: payload.rut,
                hire_date: payload.hire_date,
                base_salary: payload.base_salary,
                pto_balance_days: payload.pto_balance_days,
                password: payload.password,
            },
        )
        .await?;
    created(staff)
}

/// PUT /api/staff/{id}
pub async fn update_staff(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateStaffRequest>,
) -> ApiResult<Staff> {
    payload.validate().map_err(DomainError::from)?;
    let update = StaffUpdate {
        full_name: payload.full_name,
        role: payload.role,
        job_title: payload.job_title,
        phone: payload.phone,
        rut: payload.rut,
        hire_date: payload.hire_date,
        base_salary: payload.base_salary,
        pto_balance_days: payload.pto_balance_days,
        is_active: payload.is_active,
        password: payload.password,
    };
    ok(state.staff.update(&ctx, &id, update).await?)
}

/// DELETE /api/staff/{id}
pub async fn delete_staff(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.staff.delete(&ctx, &id).await?;
    Ok(axum::Json(Deleted::ok()))
}

/// GET /api/roles
pub async fn list_roles(State(state): State<AppState>, CurrentTenant(ctx): CurrentTenant) -> ApiResult<Vec<Role>> {
    ok(state.staff.list_roles(&ctx).await?)
}

/// POST /api/roles
pub async fn create_role(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiJson(payload): ApiJson<CreateRoleRequest>,
) -> Created<Role> {
    let role = state
        .staff
        .create_role(&ctx, payload.name, payload.description, payload.permissions)
        .await?;
    created(role)
}

/// DELETE /api/roles/{id}
pub async fn delete_role(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.staff.delete_role(&ctx, &id).await?;
    Ok(axum::Json(Deleted::ok()))
}
