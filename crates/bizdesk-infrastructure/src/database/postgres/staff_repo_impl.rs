// ============================================================================
// BizDesk Infrastructure - PostgreSQL Staff & Role Repositories
// File: crates/bizdesk-infrastructure/src/database/postgres/staff_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use bizdesk_core::domain::{Role, Staff};
use bizdesk_core::error::DomainError;
use bizdesk_core::repositories::{RoleRepository, StaffFilter, StaffRepository};

use crate::database::{db_error, like_pattern};

// ---------------------------------------------------------------------------
// Staff
// ---------------------------------------------------------------------------

pub struct PgStaffRepository {
    pool: PgPool,
}

impl PgStaffRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct StaffRow {
    id: Uuid,
    tenant_id: Uuid,
    email: String,
    full_name: String,
    role_id: Uuid,
    role_name: String,
    job_title: Option<String>,
    phone: Option<String>,
    rut: Option<String>,
    hire_date: Option<NaiveDate>,
    base_salary: i64,
    pto_balance_days: f32,
    is_active: bool,
    password_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<StaffRow> for Staff {
    fn from(row: StaffRow) -> Self {
        Staff {
            id: row.id,
            tenant_id: row.tenant_id,
            email: row.email,
            full_name: row.full_name,
            role_id: row.role_id,
            role_name: row.role_name,
            job_title: row.job_title,
            phone: row.phone,
            rut: row.rut,
            hire_date: row.hire_date,
            base_salary: row.base_salary,
            pto_balance_days: row.pto_balance_days,
            is_active: row.is_active,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
        }
    }
}

const STAFF_SELECT: &str = r#"
    SELECT s.id, s.tenant_id, s.email, s.full_name, s.role_id, r.name AS role_name,
           s.job_title, s.phone, s.rut, s.hire_date, s.base_salary, s.pto_balance_days,
           s.is_active, s.password_hash, s.created_at, s.updated_at, s.is_deleted, s.deleted_at
    FROM staff s
    JOIN roles r ON r.id = s.role_id
"#;

const STAFF_FILTER: &str = r#"
    WHERE s.tenant_id = $1 AND NOT s.is_deleted
      AND ($2::text IS NULL OR s.full_name ILIKE $2 OR s.email ILIKE $2)
      AND ($3::boolean IS NULL OR s.is_active = $3)
"#;

impl PgStaffRepository {
    async fn fetch_one_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Staff, DomainError> {
        self.find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Staff"))
    }
}

#[async_trait]
impl StaffRepository for PgStaffRepository {
    async fn list(
        &self,
        tenant_id: &Uuid,
        filter: &StaffFilter,
        pagination: Pagination,
    ) -> Result<Page<Staff>, DomainError> {
        let search = like_pattern(&filter.search);

        let rows: Vec<StaffRow> = sqlx::query_as(&format!(
            "{} {} ORDER BY s.full_name LIMIT $4 OFFSET $5",
            STAFF_SELECT, STAFF_FILTER
        ))
        .bind(tenant_id)
        .bind(&search)
        .bind(filter.active)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("staff", e))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM staff s {}", STAFF_FILTER))
            .bind(tenant_id)
            .bind(&search)
            .bind(filter.active)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("staff", e))?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), pagination, total))
    }

    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<Staff>, DomainError> {
        let row: Option<StaffRow> = sqlx::query_as(&format!(
            "{} WHERE s.tenant_id = $1 AND s.id = $2 AND NOT s.is_deleted",
            STAFF_SELECT
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("staff", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_email(&self, tenant_id: &Uuid, email: &str) -> Result<Option<Staff>, DomainError> {
        let row: Option<StaffRow> = sqlx::query_as(&format!(
            "{} WHERE s.tenant_id = $1 AND LOWER(s.email) = LOWER($2) AND NOT s.is_deleted",
            STAFF_SELECT
        ))
        .bind(tenant_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("staff", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_active_by_role(&self, tenant_id: &Uuid, role: &str) -> Result<Vec<Staff>, DomainError> {
        let rows: Vec<StaffRow> = sqlx::query_as(&format!(
            r#"{} WHERE s.tenant_id = $1 AND LOWER(r.name) = LOWER($2)
                 AND s.is_active AND NOT s.is_deleted AND NOT r.is_deleted
               ORDER BY s.full_name"#,
            STAFF_SELECT
        ))
        .bind(tenant_id)
        .bind(role)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("staff", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_active(&self, tenant_id: &Uuid) -> Result<Vec<Staff>, DomainError> {
        let rows: Vec<StaffRow> = sqlx::query_as(&format!(
            "{} WHERE s.tenant_id = $1 AND s.is_active AND NOT s.is_deleted ORDER BY s.full_name",
            STAFF_SELECT
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("staff", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(&self, staff: &Staff) -> Result<Staff, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO staff (
                id, tenant_id, email, full_name, role_id, job_title, phone, rut, hire_date,
                base_salary, pto_balance_days, is_active, password_hash,
                created_at, updated_at, is_deleted, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(staff.id)
        .bind(staff.tenant_id)
        .bind(&staff.email)
        .bind(&staff.full_name)
        .bind(staff.role_id)
        .bind(&staff.job_title)
        .bind(&staff.phone)
        .bind(&staff.rut)
        .bind(staff.hire_date)
        .bind(staff.base_salary)
        .bind(staff.pto_balance_days)
        .bind(staff.is_active)
        .bind(&staff.password_hash)
        .bind(staff.created_at)
        .bind(staff.updated_at)
        .bind(staff.is_deleted)
        .bind(staff.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("staff e-mail", e))?;

        info!(tenant_id = %staff.tenant_id, staff_id = %staff.id, "Staff created");
        self.fetch_one_by_id(&staff.tenant_id, &staff.id).await
    }

    async fn update(&self, staff: &Staff) -> Result<Staff, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE staff
            SET email = $3, full_name = $4, role_id = $5, job_title = $6, phone = $7, rut = $8,
                hire_date = $9, base_salary = $10, pto_balance_days = $11, is_active = $12,
                password_hash = $13, updated_at = $14, is_deleted = $15, deleted_at = $16
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(staff.tenant_id)
        .bind(staff.id)
        .bind(&staff.email)
        .bind(&staff.full_name)
        .bind(staff.role_id)
        .bind(&staff.job_title)
        .bind(&staff.phone)
        .bind(&staff.rut)
        .bind(staff.hire_date)
        .bind(staff.base_salary)
        .bind(staff.pto_balance_days)
        .bind(staff.is_active)
        .bind(&staff.password_hash)
        .bind(staff.updated_at)
        .bind(staff.is_deleted)
        .bind(staff.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("staff e-mail", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Staff"));
        }
        if staff.is_deleted {
            return Ok(staff.clone());
        }
        self.fetch_one_by_id(&staff.tenant_id, &staff.id).await
    }
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    description: Option<String>,
    permissions: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            description: row.description,
            permissions: row.permissions,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
        }
    }
}

const ROLE_COLUMNS: &str =
    "id, tenant_id, name, description, permissions, created_at, updated_at, is_deleted, deleted_at";

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn list(&self, tenant_id: &Uuid) -> Result<Vec<Role>, DomainError> {
        let rows: Vec<RoleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM roles WHERE tenant_id = $1 AND NOT is_deleted ORDER BY name",
            ROLE_COLUMNS
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("role", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<Role>, DomainError> {
        let row: Option<RoleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM roles WHERE tenant_id = $1 AND id = $2 AND NOT is_deleted",
            ROLE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("role", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_name(&self, tenant_id: &Uuid, name: &str) -> Result<Option<Role>, DomainError> {
        let row: Option<RoleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM roles WHERE tenant_id = $1 AND LOWER(name) = LOWER($2) AND NOT is_deleted",
            ROLE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("role", e))?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, role: &Role) -> Result<Role, DomainError> {
        let row: RoleRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO roles (id, tenant_id, name, description, permissions, created_at, updated_at, is_deleted, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            ROLE_COLUMNS
        ))
        .bind(role.id)
        .bind(role.tenant_id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(&role.permissions)
        .bind(role.created_at)
        .bind(role.updated_at)
        .bind(role.is_deleted)
        .bind(role.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("role name", e))?;

        Ok(row.into())
    }

    async fn update(&self, role: &Role) -> Result<Role, DomainError> {
        let row: Option<RoleRow> = sqlx::query_as(&format!(
            r#"
            UPDATE roles
            SET name = $3, description = $4, permissions = $5, updated_at = $6, is_deleted = $7, deleted_at = $8
            WHERE tenant_id = $1 AND id = $2
            RETURNING {}
            "#,
            ROLE_COLUMNS
        ))
        .bind(role.tenant_id)
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(&role.permissions)
        .bind(role.updated_at)
        .bind(role.is_deleted)
        .bind(role.deleted_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("role name", e))?;

        row.map(Into::into).ok_or_else(|| DomainError::not_found("Role"))
    }

    async fn count_staff_with_role(&self, tenant_id: &Uuid, role_id: &Uuid) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM staff WHERE tenant_id = $1 AND role_id = $2 AND NOT is_deleted")
            .bind(tenant_id)
            .bind(role_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("role", e))
    }
}
