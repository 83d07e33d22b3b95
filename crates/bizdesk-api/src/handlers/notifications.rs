// ============================================================================
// BizDesk API - Notification Handlers
// File: crates/bizdesk-api/src/handlers/notifications.rs
// ============================================================================
//! Templates and rules (admin) plus the signed-in user's inbox

use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bizdesk_core::domain::{Notification, NotificationRule, NotificationTemplate};
use bizdesk_core::services::{RuleInput, TemplateInput};
use bizdesk_shared::{Page, Pagination};

use super::{created, ok, ApiResult, Created};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, CurrentTenant};
use crate::response::Deleted;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct InboxQuery {
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

// ----------------------------------------------------------------- templates

/// GET /api/notification-templates
pub async fn list_templates(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
) -> ApiResult<Vec<NotificationTemplate>> {
    ok(state.notifications.list_templates(&ctx).await?)
}

/// POST /api/notification-templates
pub async fn create_template(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiJson(payload): ApiJson<TemplateInput>,
) -> Created<NotificationTemplate> {
    created(state.notifications.create_template(&ctx, payload).await?)
}

/// PUT /api/notification-templates/{id}
pub async fn update_template(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<TemplateInput>,
) -> ApiResult<NotificationTemplate> {
    ok(state.notifications.update_template(&ctx, &id, payload).await?)
}

/// DELETE /api/notification-templates/{id}
pub async fn delete_template(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.notifications.delete_template(&ctx, &id).await?;
    Ok(axum::Json(Deleted::ok()))
}

// --------------------------------------------------------------------- rules

/// GET /api/notification-rules
pub async fn list_rules(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
) -> ApiResult<Vec<NotificationRule>> {
    ok(state.notifications.list_rules(&ctx).await?)
}

/// POST /api/notification-rules
pub async fn create_rule(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiJson(payload): ApiJson<RuleInput>,
) -> Created<NotificationRule> {
    created(state.notifications.create_rule(&ctx, payload).await?)
}

/// PUT /api/notification-rules/{id}
pub async fn update_rule(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<RuleInput>,
) -> ApiResult<NotificationRule> {
    ok(state.notifications.update_rule(&ctx, &id, payload).await?)
}

/// DELETE /api/notification-rules/{id}
pub async fn delete_rule(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.notifications.delete_rule(&ctx, &id).await?;
    Ok(axum::Json(Deleted::ok()))
}

// --------------------------------------------------------------------- inbox

/// GET /api/notifications
pub async fn list_mine(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiQuery(query): ApiQuery<InboxQuery>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Notification>> {
    ok(state
        .notifications
        .list_mine(&ctx, query.unread, pagination.normalized())
        .await?)
}

/// POST /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<MarkedRead> {
    state.notifications.mark_read(&ctx, &id).await?;
    ok(MarkedRead { updated: 1 })
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(State(state): State<AppState>, CurrentTenant(ctx): CurrentTenant) -> ApiResult<MarkedRead> {
    let updated = state.notifications.mark_all_read(&ctx).await?;
    ok(MarkedRead { updated })
}
