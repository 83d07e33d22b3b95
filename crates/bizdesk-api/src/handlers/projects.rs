// ============================================================================
// BizDesk API - Project & Task Handlers
// File: crates/bizdesk-api/src/handlers/projects.rs
// ============================================================================

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use bizdesk_core::domain::{Project, Task, TaskStatus};
use bizdesk_core::repositories::TaskFilter;
use bizdesk_core::services::{ProjectInput, TaskInput};
use bizdesk_shared::{Page, Pagination};

use super::{created, ok, ApiResult, Created};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, CurrentTenant};
use crate::response::Deleted;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Deserialize)]
pub struct TaskStatusRequest {
    pub status: TaskStatus,
}

// ------------------------------------------------------------------ projects

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Project>> {
    ok(state.projects.list_projects(&ctx, pagination.normalized()).await?)
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Project> {
    ok(state.projects.get_project(&ctx, &id).await?)
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiJson(payload): ApiJson<ProjectInput>,
) -> Created<Project> {
    created(state.projects.create_project(&ctx, payload).await?)
}

/// PUT /api/projects/{id}
pub async fn update_project(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ProjectInput>,
) -> ApiResult<Project> {
    ok(state.projects.update_project(&ctx, &id, payload).await?)
}

/// DELETE /api/projects/{id}
pub async fn delete_project(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.projects.delete_project(&ctx, &id).await?;
    Ok(axum::Json(Deleted::ok()))
}

// --------------------------------------------------------------------- tasks

/// GET /api/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiQuery(query): ApiQuery<TaskQuery>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Task>> {
    let filter = TaskFilter {
        project_id: query.project_id,
        assignee_id: query.assignee_id,
        status: query.status,
    };
    ok(state.projects.list_tasks(&ctx, &filter, pagination.normalized()).await?)
}

/// GET /api/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Task> {
    ok(state.projects.get_task(&ctx, &id).await?)
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiJson(payload): ApiJson<TaskInput>,
) -> Created<Task> {
    created(state.projects.create_task(&ctx, payload).await?)
}

/// PUT /api/tasks/{id}
pub async fn update_task(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<TaskInput>,
) -> ApiResult<Task> {
    ok(state.projects.update_task(&ctx, &id, payload).await?)
}

/// PATCH /api/tasks/{id}/status
pub async fn set_task_status(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<TaskStatusRequest>,
) -> ApiResult<Task> {
    ok(state.projects.set_task_status(&ctx, &id, payload.status).await?)
}

/// DELETE /api/tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    CurrentTenant(ctx): CurrentTenant,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.projects.delete_task(&ctx, &id).await?;
    Ok(axum::Json(Deleted::ok()))
}
