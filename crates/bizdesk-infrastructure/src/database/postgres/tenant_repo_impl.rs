// ============================================================================
// BizDesk Infrastructure - PostgreSQL Tenant Repository
// File: crates/bizdesk-infrastructure/src/database/postgres/tenant_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use bizdesk_core::domain::Tenant;
use bizdesk_core::error::DomainError;
use bizdesk_core::repositories::TenantRepository;

use crate::database::db_error;

pub struct PgTenantRepository {
    pool: PgPool,
}

impl PgTenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct TenantRow {
    id: Uuid,
    name: String,
    slug: String,
    rut: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Tenant {
            id: row.id,
            name: row.name,
            slug: row.slug,
            rut: row.rut,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
        }
    }
}

const COLUMNS: &str = "id, name, slug, rut, is_active, created_at, updated_at, is_deleted, deleted_at";

#[async_trait]
impl TenantRepository for PgTenantRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Tenant>, DomainError> {
        let row: Option<TenantRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tenants WHERE id = $1 AND NOT is_deleted",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("tenant", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, DomainError> {
        let row: Option<TenantRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tenants WHERE LOWER(slug) = LOWER($1) AND NOT is_deleted",
            COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("tenant", e))?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, tenant: &Tenant) -> Result<Tenant, DomainError> {
        let row: TenantRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO tenants (id, name, slug, rut, is_active, created_at, updated_at, is_deleted, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.slug)
        .bind(&tenant.rut)
        .bind(tenant.is_active)
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .bind(tenant.is_deleted)
        .bind(tenant.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("tenant slug", e))?;

        info!(tenant_id = %row.id, slug = %row.slug, "Tenant created");
        Ok(row.into())
    }

    async fn update(&self, tenant: &Tenant) -> Result<Tenant, DomainError> {
        let row: TenantRow = sqlx::query_as(&format!(
            r#"
            UPDATE tenants
            SET name = $2, slug = $3, rut = $4, is_active = $5,
                updated_at = $6, is_deleted = $7, deleted_at = $8
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.slug)
        .bind(&tenant.rut)
        .bind(tenant.is_active)
        .bind(tenant.updated_at)
        .bind(tenant.is_deleted)
        .bind(tenant.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("tenant slug", e))?;

        Ok(row.into())
    }
}
