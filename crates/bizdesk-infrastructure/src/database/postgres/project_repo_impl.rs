// ============================================================================
// BizDesk Infrastructure - PostgreSQL Project & Task Repositories
// File: crates/bizdesk-infrastructure/src/database/postgres/project_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use bizdesk_core::domain::{Project, ProjectStatus, Task, TaskPriority, TaskStatus};
use bizdesk_core::error::DomainError;
use bizdesk_core::repositories::{ProjectRepository, TaskFilter, TaskRepository};

use crate::database::db_error;

pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    description: Option<String>,
    status: String,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            description: row.description,
            status: ProjectStatus::from_str(&row.status).unwrap_or_default(),
            due_date: row.due_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
        }
    }
}

const PROJECT_COLUMNS: &str =
    "id, tenant_id, name, description, status, due_date, created_at, updated_at, is_deleted, deleted_at";

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn list(&self, tenant_id: &Uuid, pagination: Pagination) -> Result<Page<Project>, DomainError> {
        let rows: Vec<ProjectRow> = sqlx::query_as(&format!(
            r#"SELECT {} FROM projects WHERE tenant_id = $1 AND NOT is_deleted
               ORDER BY due_date NULLS LAST, name LIMIT $2 OFFSET $3"#,
            PROJECT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("project", e))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE tenant_id = $1 AND NOT is_deleted")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("project", e))?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), pagination, total))
    }

    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<Project>, DomainError> {
        let row: Option<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {} FROM projects WHERE tenant_id = $1 AND id = $2 AND NOT is_deleted",
            PROJECT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("project", e))?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, project: &Project) -> Result<Project, DomainError> {
        let row: ProjectRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO projects (id, tenant_id, name, description, status, due_date,
                                  created_at, updated_at, is_deleted, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(project.id)
        .bind(project.tenant_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.status.as_str())
        .bind(project.due_date)
        .bind(project.created_at)
        .bind(project.updated_at)
        .bind(project.is_deleted)
        .bind(project.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("project", e))?;

        Ok(row.into())
    }

    async fn update(&self, project: &Project) -> Result<Project, DomainError> {
        let row: Option<ProjectRow> = sqlx::query_as(&format!(
            r#"
            UPDATE projects
            SET name = $3, description = $4, status = $5, due_date = $6,
                updated_at = $7, is_deleted = $8, deleted_at = $9
            WHERE tenant_id = $1 AND id = $2
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(project.tenant_id)
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.status.as_str())
        .bind(project.due_date)
        .bind(project.updated_at)
        .bind(project.is_deleted)
        .bind(project.deleted_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("project", e))?;

        row.map(Into::into).ok_or_else(|| DomainError::not_found("Project"))
    }

    async fn count_open_tasks(&self, tenant_id: &Uuid, project_id: &Uuid) -> Result<i64, DomainError> {
        sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM tasks
               WHERE tenant_id = $1 AND project_id = $2 AND NOT is_deleted AND status <> 'done'"#,
        )
        .bind(tenant_id)
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("task", e))
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: Uuid,
    tenant_id: Uuid,
    project_id: Option<Uuid>,
    title: String,
    description: Option<String>,
    assignee_id: Option<Uuid>,
    status: String,
    priority: String,
    due_date: Option<NaiveDate>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            tenant_id: row.tenant_id,
            project_id: row.project_id,
            title: row.title,
            description: row.description,
            assignee_id: row.assignee_id,
            status: TaskStatus::from_str(&row.status).unwrap_or_default(),
            priority: TaskPriority::from_str(&row.priority).unwrap_or_default(),
            due_date: row.due_date,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
        }
    }
}

const TASK_COLUMNS: &str = r#"id, tenant_id, project_id, title, description, assignee_id, status, priority,
    due_date, completed_at, created_at, updated_at, is_deleted, deleted_at"#;

const TASK_FILTER: &str = r#"
    WHERE tenant_id = $1 AND NOT is_deleted
      AND ($2::uuid IS NULL OR project_id = $2)
      AND ($3::uuid IS NULL OR assignee_id = $3)
      AND ($4::text IS NULL OR status = $4)
"#;

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn list(
        &self,
        tenant_id: &Uuid,
        filter: &TaskFilter,
        pagination: Pagination,
    ) -> Result<Page<Task>, DomainError> {
        let status = filter.status.map(|s| s.as_str());

        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            r#"SELECT {} FROM tasks {}
               ORDER BY CASE priority WHEN 'urgent' THEN 0 WHEN 'high' THEN 1 WHEN 'medium' THEN 2 ELSE 3 END,
                        due_date NULLS LAST, created_at
               LIMIT $5 OFFSET $6"#,
            TASK_COLUMNS, TASK_FILTER
        ))
        .bind(tenant_id)
        .bind(filter.project_id)
        .bind(filter.assignee_id)
        .bind(status)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("task", e))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM tasks {}", TASK_FILTER))
            .bind(tenant_id)
            .bind(filter.project_id)
            .bind(filter.assignee_id)
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("task", e))?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), pagination, total))
    }

    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<Task>, DomainError> {
        let row: Option<TaskRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tasks WHERE tenant_id = $1 AND id = $2 AND NOT is_deleted",
            TASK_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("task", e))?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, task: &Task) -> Result<Task, DomainError> {
        let row: TaskRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO tasks (
                id, tenant_id, project_id, title, description, assignee_id, status, priority,
                due_date, completed_at, created_at, updated_at, is_deleted, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(task.id)
        .bind(task.tenant_id)
        .bind(task.project_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.assignee_id)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(task.completed_at)
        .bind(task.created_at)
        .bind(task.updated_at)
        .bind(task.is_deleted)
        .bind(task.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("task", e))?;

        Ok(row.into())
    }

    async fn update(&self, task: &Task) -> Result<Task, DomainError> {
        let row: Option<TaskRow> = sqlx::query_as(&format!(
            r#"
            UPDATE tasks
            SET project_id = $3, title = $4, description = $5, assignee_id = $6, status = $7,
                priority = $8, due_date = $9, completed_at = $10, updated_at = $11,
                is_deleted = $12, deleted_at = $13
            WHERE tenant_id = $1 AND id = $2
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(task.tenant_id)
        .bind(task.id)
        .bind(task.project_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.assignee_id)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(task.completed_at)
        .bind(task.updated_at)
        .bind(task.is_deleted)
        .bind(task.deleted_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("task", e))?;

        row.map(Into::into).ok_or_else(|| DomainError::not_found("Task"))
    }
}
