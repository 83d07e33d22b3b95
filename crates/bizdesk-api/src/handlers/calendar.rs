use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use bizdesk_core::domain::Event;
use bizdesk_core::services::EventInput;
use bizdesk_shared::{Page, Pagination};

use super::{created, ok, ApiResult, Created};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, CurrentTenant};
use crate::response::Deleted;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EventWindow {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// GET /api/events
pub async fn list_events(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiQuery(window): ApiQuery<EventWindow>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Event>> {
    ok(state
        .calendar
        .list(&ctx, window.from, window.to, pagination.normalized())
        .await?)
}

/// GET /api/events/{id}
pub async fn get_event(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Event> {
    ok(state.calendar.get(&ctx, &id).await?)
}

/// POST /api/events
pub async fn create_event(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiJson(payload): ApiJson<EventInput>,
) -> Created<Event> {
    created(state.calendar.create(&ctx, payload).await?)
}

/// PUT /api/events/{id}
pub async fn update_event(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<EventInput>,
) -> ApiResult<Event> {
    ok(state.calendar.update(&ctx, &id, payload).await?)
}

/// DELETE /api/events/{id}
pub async fn delete_event(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.calendar.delete(&ctx, &id).await?;
    Ok(axum::Json(Deleted::ok()))
}
