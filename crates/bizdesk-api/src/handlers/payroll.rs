// ============================================================================
// BizDesk API - Payroll Handlers
// File: crates/bizdesk-api/src/handlers/payroll.rs
// ============================================================================

use std::collections::HashMap;

use axum::extract::State;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use bizdesk_core::domain::PayrollRun;
use bizdesk_core::services::NewPayrollRun;
use bizdesk_shared::{Page, Pagination};

use super::{created, ok, ApiResult, Created};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, CurrentTenant};
use crate::response::Deleted;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePayrollRequest {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Staff id to bonus, CLP.
    #[serde(default)]
    pub bonuses: HashMap<Uuid, i64>,
}

/// GET /api/payroll
pub async fn list_runs(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<PayrollRun>> {
    ok(state.payroll.list(&ctx, pagination.normalized()).await?)
}

/// GET /api/payroll/{id}
pub async fn get_run(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<PayrollRun> {
    ok(state.payroll.get(&ctx, &id).await?)
}

/// POST /api/payroll
pub async fn create_run(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiJson(payload): ApiJson<CreatePayrollRequest>,
) -> Created<PayrollRun> {
    let run = state
        .payroll
        .create(
            &ctx,
            NewPayrollRun {
                period_start: payload.period_start,
                period_end: payload.period_end,
                bonuses: payload.bonuses,
            },
        )
        .await?;
    created(run)
}

/// POST /api/payroll/{id}/approve
pub async fn approve_run(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<PayrollRun> {
    ok(state.payroll.approve(&ctx, &id).await?)
}

/// POST /api/payroll/{id}/pay
pub async fn pay_run(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<PayrollRun> {
    ok(state.payroll.mark_paid(&ctx, &id).await?)
}

/// DELETE /api/payroll/{id}
pub async fn delete_run(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.payroll.delete(&ctx, &id).await?;
    Ok(axum::Json(Deleted::ok()))
}
