use axum::extract::State;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use bizdesk_core::domain::{PtoKind, PtoRequest, PtoStatus, ReviewAction};
use bizdesk_core::repositories::PtoFilter;
use bizdesk_core::services::NewPtoRequest;
use bizdesk_shared::{Page, Pagination};

use super::{created, ok, ApiResult, Created};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, CurrentTenant};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PtoQuery {
    pub staff_id: Option<Uuid>,
    pub status: Option<PtoStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePtoRequest {
    pub staff_id: Option<Uuid>,
    pub kind: PtoKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub action: ReviewAction,
    pub note: Option<String>,
}

/// GET /api/pto
pub async fn list_requests(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiQuery(query): ApiQuery<PtoQuery>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<PtoRequest>> {
    let filter = PtoFilter {
        staff_id: query.staff_id,
        status: query.status,
    };
    ok(state.pto.list(&ctx, filter, pagination.normalized()).await?)
}

/// GET /api/pto/{id}
pub async fn get_request(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<PtoRequest> {
    ok(state.pto.get(&ctx, &id).await?)
}

/// POST /api/pto
pub async fn create_request(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiJson(payload): ApiJson<CreatePtoRequest>,
) -> Created<PtoRequest> {
    let request = state
        .pto
        .create(
            &ctx,
            NewPtoRequest {
                staff_id: payload.staff_id,
                kind: payload.kind,
                start_date: payload.start_date,
                end_date: payload.end_date,
                reason: payload.reason,
            },
        )
        .await?;
    created(request)
}

/// PATCH /api/pto/{id}
pub async fn review_request(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ReviewRequest>,
) -> ApiResult<PtoRequest> {
    ok(state.pto.review(&ctx, &id, payload.action, payload.note).await?)
}

/// DELETE /api/pto/{id}
///
/// Cancels; the request stays on record.
pub async fn cancel_request(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<PtoRequest> {
    ok(state.pto.cancel(&ctx, &id).await?)
}
