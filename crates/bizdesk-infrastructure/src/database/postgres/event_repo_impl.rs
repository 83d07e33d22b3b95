// ============================================================================
// BizDesk Infrastructure - PostgreSQL Calendar Event Repository
// File: crates/bizdesk-infrastructure/src/database/postgres/event_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use bizdesk_core::domain::Event;
use bizdesk_core::error::DomainError;
use bizdesk_core::repositories::EventRepository;

use crate::database::db_error;

pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    tenant_id: Uuid,
    title: String,
    description: Option<String>,
    location: Option<String>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    all_day: bool,
    attendee_ids: Vec<Uuid>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            tenant_id: row.tenant_id,
            title: row.title,
            description: row.description,
            location: row.location,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            all_day: row.all_day,
            attendee_ids: row.attendee_ids,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
        }
    }
}

const COLUMNS: &str = r#"id, tenant_id, title, description, location, starts_at, ends_at, all_day,
    attendee_ids, created_by, created_at, updated_at, is_deleted, deleted_at"#;

// Overlap: the event ends after the window opens and starts before it closes.
const WINDOW: &str = r#"
    WHERE tenant_id = $1 AND NOT is_deleted
      AND ($2::timestamptz IS NULL OR ends_at >= $2)
      AND ($3::timestamptz IS NULL OR starts_at <= $3)
"#;

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn list(
        &self,
        tenant_id: &Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        pagination: Pagination,
    ) -> Result<Page<Event>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "SELECT {} FROM events {} ORDER BY starts_at LIMIT $4 OFFSET $5",
            COLUMNS, WINDOW
        ))
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("event", e))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM events {}", WINDOW))
            .bind(tenant_id)
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("event", e))?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), pagination, total))
    }

    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<Event>, DomainError> {
        let row: Option<EventRow> = sqlx::query_as(&format!(
            "SELECT {} FROM events WHERE tenant_id = $1 AND id = $2 AND NOT is_deleted",
            COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("event", e))?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, event: &Event) -> Result<Event, DomainError> {
        let row: EventRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO events (
                id, tenant_id, title, description, location, starts_at, ends_at, all_day,
                attendee_ids, created_by, created_at, updated_at, is_deleted, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(event.id)
        .bind(event.tenant_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .bind(event.all_day)
        .bind(&event.attendee_ids)
        .bind(event.created_by)
        .bind(event.created_at)
        .bind(event.updated_at)
        .bind(event.is_deleted)
        .bind(event.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("event", e))?;

        Ok(row.into())
    }

    async fn update(&self, event: &Event) -> Result<Event, DomainError> {
        let row: Option<EventRow> = sqlx::query_as(&format!(
            r#"
            UPDATE events
            SET title = $3, description = $4, location = $5, starts_at = $6, ends_at = $7,
                all_day = $8, attendee_ids = $9, updated_at = $10, is_deleted = $11, deleted_at = $12
            WHERE tenant_id = $1 AND id = $2
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(event.tenant_id)
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .bind(event.all_day)
        .bind(&event.attendee_ids)
        .bind(event.updated_at)
        .bind(event.is_deleted)
        .bind(event.deleted_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("event", e))?;

        row.map(Into::into).ok_or_else(|| DomainError::not_found("Event"))
    }
}
