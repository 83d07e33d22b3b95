// ============================================================================
// BizDesk Infrastructure - PostgreSQL PTO Repository
// File: crates/bizdesk-infrastructure/src/database/postgres/pto_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use bizdesk_core::domain::{PtoKind, PtoRequest, PtoStatus};
use bizdesk_core::error::DomainError;
use bizdesk_core::repositories::{PtoFilter, PtoRepository};

use crate::database::db_error;

pub struct PgPtoRepository {
    pool: PgPool,
}

impl PgPtoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PtoRow {
    id: Uuid,
    tenant_id: Uuid,
    staff_id: Uuid,
    kind: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    days: f32,
    reason: Option<String>,
    status: String,
    reviewer_id: Option<Uuid>,
    review_note: Option<String>,
    reviewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<PtoRow> for PtoRequest {
    type Error = DomainError;

    fn try_from(row: PtoRow) -> Result<Self, Self::Error> {
        let kind = PtoKind::from_str(&row.kind)
            .ok_or_else(|| DomainError::DatabaseError(format!("unknown PTO kind '{}'", row.kind)))?;
        let status = PtoStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::DatabaseError(format!("unknown PTO status '{}'", row.status)))?;
        Ok(PtoRequest {
            id: row.id,
            tenant_id: row.tenant_id,
            staff_id: row.staff_id,
            kind,
            start_date: row.start_date,
            end_date: row.end_date,
            days: row.days,
            reason: row.reason,
            status,
            reviewer_id: row.reviewer_id,
            review_note: row.review_note,
            reviewed_at: row.reviewed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
        })
    }
}

fn convert(rows: Vec<PtoRow>) -> Result<Vec<PtoRequest>, DomainError> {
    rows.into_iter().map(PtoRequest::try_from).collect()
}

const COLUMNS: &str = r#"id, tenant_id, staff_id, kind, start_date, end_date, days, reason, status,
    reviewer_id, review_note, reviewed_at, created_at, updated_at, is_deleted, deleted_at"#;

const FILTER: &str = r#"
    WHERE tenant_id = $1 AND NOT is_deleted
      AND ($2::uuid IS NULL OR staff_id = $2)
      AND ($3::text IS NULL OR status = $3)
"#;

#[async_trait]
impl PtoRepository for PgPtoRepository {
    async fn list(
        &self,
        tenant_id: &Uuid,
        filter: &PtoFilter,
        pagination: Pagination,
    ) -> Result<Page<PtoRequest>, DomainError> {
        let status = filter.status.map(|s| s.as_str());

        let rows: Vec<PtoRow> = sqlx::query_as(&format!(
            "SELECT {} FROM pto_requests {} ORDER BY start_date DESC LIMIT $4 OFFSET $5",
            COLUMNS, FILTER
        ))
        .bind(tenant_id)
        .bind(filter.staff_id)
        .bind(status)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("PTO request", e))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM pto_requests {}", FILTER))
            .bind(tenant_id)
            .bind(filter.staff_id)
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("PTO request", e))?;

        Ok(Page::new(convert(rows)?, pagination, total))
    }

    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<PtoRequest>, DomainError> {
        let row: Option<PtoRow> = sqlx::query_as(&format!(
            "SELECT {} FROM pto_requests WHERE tenant_id = $1 AND id = $2 AND NOT is_deleted",
            COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("PTO request", e))?;

        row.map(PtoRequest::try_from).transpose()
    }

    async fn find_live_overlapping(
        &self,
        tenant_id: &Uuid,
        staff_id: &Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PtoRequest>, DomainError> {
        let rows: Vec<PtoRow> = sqlx::query_as(&format!(
            r#"SELECT {} FROM pto_requests
               WHERE tenant_id = $1 AND staff_id = $2 AND NOT is_deleted
                 AND status IN ('pending', 'approved')
                 AND start_date <= $4 AND end_date >= $3"#,
            COLUMNS
        ))
        .bind(tenant_id)
        .bind(staff_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("PTO request", e))?;

        convert(rows)
    }

    async fn find_approved_in_period(
        &self,
        tenant_id: &Uuid,
        kind: PtoKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PtoRequest>, DomainError> {
        let rows: Vec<PtoRow> = sqlx::query_as(&format!(
            r#"SELECT {} FROM pto_requests
               WHERE tenant_id = $1 AND kind = $2 AND status = 'approved' AND NOT is_deleted
                 AND start_date <= $4 AND end_date >= $3"#,
            COLUMNS
        ))
        .bind(tenant_id)
        .bind(kind.as_str())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("PTO request", e))?;

        convert(rows)
    }

    async fn create(&self, request: &PtoRequest) -> Result<PtoRequest, DomainError> {
        let row: PtoRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO pto_requests (
                id, tenant_id, staff_id, kind, start_date, end_date, days, reason, status,
                reviewer_id, review_note, reviewed_at, created_at, updated_at, is_deleted, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(request.id)
        .bind(request.tenant_id)
        .bind(request.staff_id)
        .bind(request.kind.as_str())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.days)
        .bind(&request.reason)
        .bind(request.status.as_str())
        .bind(request.reviewer_id)
        .bind(&request.review_note)
        .bind(request.reviewed_at)
        .bind(request.created_at)
        .bind(request.updated_at)
        .bind(request.is_deleted)
        .bind(request.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("PTO request", e))?;

        row.try_into()
    }

    async fn save_with_balance(
        &self,
        request: &PtoRequest,
        expected: PtoStatus,
        balance_delta: f32,
    ) -> Result<PtoRequest, DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| db_error("PTO request", e))?;

        let row: Option<PtoRow> = sqlx::query_as(&format!(
            r#"
            UPDATE pto_requests
            SET status = $3, reviewer_id = $4, review_note = $5, reviewed_at = $6,
                updated_at = $7, is_deleted = $8, deleted_at = $9
            WHERE tenant_id = $1 AND id = $2 AND status = $10 AND is_deleted = FALSE
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(request.tenant_id)
        .bind(request.id)
        .bind(request.status.as_str())
        .bind(request.reviewer_id)
        .bind(&request.review_note)
        .bind(request.reviewed_at)
        .bind(request.updated_at)
        .bind(request.is_deleted)
        .bind(request.deleted_at)
        .bind(expected.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("PTO request", e))?;

        let Some(row) = row else {
            warn!(pto_id = %request.id, expected = expected.as_str(), "PTO request changed before the update applied");
            return Err(DomainError::InvalidState(format!(
                "PTO request is no longer {}",
                expected.as_str()
            )));
        };

        if balance_delta != 0.0 {
            sqlx::query(
                r#"UPDATE staff SET pto_balance_days = pto_balance_days + $3, updated_at = NOW()
                   WHERE tenant_id = $1 AND id = $2"#,
            )
            .bind(request.tenant_id)
            .bind(request.staff_id)
            .bind(balance_delta)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("staff", e))?;
        }

        tx.commit().await.map_err(|e| db_error("PTO request", e))?;
        if balance_delta != 0.0 {
            info!(
                tenant_id = %request.tenant_id,
                staff_id = %request.staff_id,
                delta = balance_delta,
                "PTO balance adjusted"
            );
        }
        row.try_into()
    }
}
