// ============================================================================
// BizDesk Infrastructure - PostgreSQL Payroll Repository
// File: crates/bizdesk-infrastructure/src/database/postgres/payroll_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use bizdesk_core::domain::{PayrollLine, PayrollRun, PayrollStatus};
use bizdesk_core::error::DomainError;
use bizdesk_core::repositories::PayrollRepository;

use crate::database::db_error;

pub struct PgPayrollRepository {
    pool: PgPool,
}

impl PgPayrollRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RunRow {
    id: Uuid,
    tenant_id: Uuid,
    period_start: NaiveDate,
    period_end: NaiveDate,
    status: String,
    total_gross: i64,
    total_deductions: i64,
    total_net: i64,
    approved_by: Option<Uuid>,
    approved_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl RunRow {
    fn into_run(self, lines: Vec<PayrollLine>) -> Result<PayrollRun, DomainError> {
        let status = PayrollStatus::from_str(&self.status)
            .ok_or_else(|| DomainError::DatabaseError(format!("unknown payroll status '{}'", self.status)))?;
        Ok(PayrollRun {
            id: self.id,
            tenant_id: self.tenant_id,
            period_start: self.period_start,
            period_end: self.period_end,
            status,
            total_gross: self.total_gross,
            total_deductions: self.total_deductions,
            total_net: self.total_net,
            approved_by: self.approved_by,
            approved_at: self.approved_at,
            paid_at: self.paid_at,
            lines,
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct LineRow {
    id: Uuid,
    payroll_run_id: Uuid,
    staff_id: Uuid,
    staff_name: String,
    base_salary: i64,
    bonus: i64,
    unpaid_leave_days: i32,
    unpaid_leave_deduction: i64,
    pension: i64,
    health: i64,
    gross: i64,
    net: i64,
}

impl From<LineRow> for PayrollLine {
    fn from(row: LineRow) -> Self {
        PayrollLine {
            id: row.id,
            payroll_run_id: row.payroll_run_id,
            staff_id: row.staff_id,
            staff_name: row.staff_name,
            base_salary: row.base_salary,
            bonus: row.bonus,
            unpaid_leave_days: row.unpaid_leave_days,
            unpaid_leave_deduction: row.unpaid_leave_deduction,
            pension: row.pension,
            health: row.health,
            gross: row.gross,
            net: row.net,
        }
    }
}

const RUN_COLUMNS: &str = r#"id, tenant_id, period_start, period_end, status, total_gross, total_deductions,
    total_net, approved_by, approved_at, paid_at, created_at, updated_at, is_deleted, deleted_at"#;

const LINE_COLUMNS: &str = r#"id, payroll_run_id, staff_id, staff_name, base_salary, bonus, unpaid_leave_days,
    unpaid_leave_deduction, pension, health, gross, net"#;

impl PgPayrollRepository {
    async fn lines_of(&self, run_id: &Uuid) -> Result<Vec<PayrollLine>, DomainError> {
        let rows: Vec<LineRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payroll_lines WHERE payroll_run_id = $1 ORDER BY staff_name",
            LINE_COLUMNS
        ))
        .bind(run_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("payroll line", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl PayrollRepository for PgPayrollRepository {
    async fn list(&self, tenant_id: &Uuid, pagination: Pagination) -> Result<Page<PayrollRun>, DomainError> {
        let rows: Vec<RunRow> = sqlx::query_as(&format!(
            r#"SELECT {} FROM payroll_runs WHERE tenant_id = $1 AND NOT is_deleted
               ORDER BY period_start DESC LIMIT $2 OFFSET $3"#,
            RUN_COLUMNS
        ))
        .bind(tenant_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("payroll run", e))?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM payroll_runs WHERE tenant_id = $1 AND NOT is_deleted")
                .bind(tenant_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| db_error("payroll run", e))?;

        let runs = rows
            .into_iter()
            .map(|r| r.into_run(Vec::new()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(runs, pagination, total))
    }

    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<PayrollRun>, DomainError> {
        let row: Option<RunRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payroll_runs WHERE tenant_id = $1 AND id = $2 AND NOT is_deleted",
            RUN_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("payroll run", e))?;

        match row {
            Some(row) => {
                let lines = self.lines_of(&row.id).await?;
                Ok(Some(row.into_run(lines)?))
            }
            None => Ok(None),
        }
    }

    async fn has_overlapping(&self, tenant_id: &Uuid, start: NaiveDate, end: NaiveDate) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            r#"SELECT EXISTS (
                   SELECT 1 FROM payroll_runs
                   WHERE tenant_id = $1 AND NOT is_deleted AND period_start <= $3 AND period_end >= $2
               )"#,
        )
        .bind(tenant_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("payroll run", e))
    }

    async fn create(&self, run: &PayrollRun) -> Result<PayrollRun, DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| db_error("payroll run", e))?;

        let row: RunRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO payroll_runs (
                id, tenant_id, period_start, period_end, status, total_gross, total_deductions,
                total_net, approved_by, approved_at, paid_at, created_at, updated_at, is_deleted, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {}
            "#,
            RUN_COLUMNS
        ))
        .bind(run.id)
        .bind(run.tenant_id)
        .bind(run.period_start)
        .bind(run.period_end)
        .bind(run.status.as_str())
        .bind(run.total_gross)
        .bind(run.total_deductions)
        .bind(run.total_net)
        .bind(run.approved_by)
        .bind(run.approved_at)
        .bind(run.paid_at)
        .bind(run.created_at)
        .bind(run.updated_at)
        .bind(run.is_deleted)
        .bind(run.deleted_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error("payroll run", e))?;

        for line in &run.lines {
            sqlx::query(&format!(
                "INSERT INTO payroll_lines ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
                LINE_COLUMNS
            ))
            .bind(line.id)
            .bind(run.id)
            .bind(line.staff_id)
            .bind(&line.staff_name)
            .bind(line.base_salary)
            .bind(line.bonus)
            .bind(line.unpaid_leave_days)
            .bind(line.unpaid_leave_deduction)
            .bind(line.pension)
            .bind(line.health)
            .bind(line.gross)
            .bind(line.net)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("payroll line", e))?;
        }

        tx.commit().await.map_err(|e| db_error("payroll run", e))?;
        info!(tenant_id = %run.tenant_id, run_id = %run.id, lines = run.lines.len(), "Payroll run stored");

        row.into_run(run.lines.clone())
    }

    async fn update(&self, run: &PayrollRun, expected: PayrollStatus) -> Result<PayrollRun, DomainError> {
        let row: Option<RunRow> = sqlx::query_as(&format!(
            r#"
            UPDATE payroll_runs
            SET status = $3, approved_by = $4, approved_at = $5, paid_at = $6,
                updated_at = $7, is_deleted = $8, deleted_at = $9
            WHERE tenant_id = $1 AND id = $2 AND status = $10 AND is_deleted = FALSE
            RETURNING {}
            "#,
            RUN_COLUMNS
        ))
        .bind(run.tenant_id)
        .bind(run.id)
        .bind(run.status.as_str())
        .bind(run.approved_by)
        .bind(run.approved_at)
        .bind(run.paid_at)
        .bind(run.updated_at)
        .bind(run.is_deleted)
        .bind(run.deleted_at)
        .bind(expected.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("payroll run", e))?;

        let Some(row) = row else {
            warn!(run_id = %run.id, expected = expected.as_str(), "Payroll run changed before the update applied");
            return Err(DomainError::InvalidState(format!(
                "payroll run is no longer {}",
                expected.as_str()
            )));
        };
        let lines = self.lines_of(&row.id).await?;
        row.into_run(lines)
    }
}
