// ============================================================================
// BizDesk Infrastructure - PostgreSQL Contact Repository
// File: crates/bizdesk-infrastructure/src/database/postgres/contact_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use bizdesk_shared::{Page, Pagination};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use bizdesk_core::domain::{Contact, ContactKind};
use bizdesk_core::error::DomainError;
use bizdesk_core::repositories::{ContactFilter, ContactRepository};

use crate::database::{db_error, like_pattern};

pub struct PgContactRepository {
    pool: PgPool,
}

impl PgContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ContactRow {
    id: Uuid,
    tenant_id: Uuid,
    kind: String,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    company: Option<String>,
    rut: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<ContactRow> for Contact {
    fn from(row: ContactRow) -> Self {
        Contact {
            id: row.id,
            tenant_id: row.tenant_id,
            kind: ContactKind::from_str(&row.kind).unwrap_or_default(),
            name: row.name,
            email: row.email,
            phone: row.phone,
            company: row.company,
            rut: row.rut,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
        }
    }
}

const COLUMNS: &str = r#"id, tenant_id, kind, name, email, phone, company, rut, notes,
    created_at, updated_at, is_deleted, deleted_at"#;

const FILTER: &str = r#"
    WHERE tenant_id = $1 AND NOT is_deleted
      AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2 OR company ILIKE $2)
      AND ($3::text IS NULL OR kind = $3)
"#;

#[async_trait]
impl ContactRepository for PgContactRepository {
    async fn list(
        &self,
        tenant_id: &Uuid,
        filter: &ContactFilter,
        pagination: Pagination,
    ) -> Result<Page<Contact>, DomainError> {
        let search = like_pattern(&filter.search);
        let kind = filter.kind.map(|k| k.as_str());

        let rows: Vec<ContactRow> = sqlx::query_as(&format!(
            "SELECT {} FROM contacts {} ORDER BY name LIMIT $4 OFFSET $5",
            COLUMNS, FILTER
        ))
        .bind(tenant_id)
        .bind(&search)
        .bind(kind)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("contact", e))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM contacts {}", FILTER))
            .bind(tenant_id)
            .bind(&search)
            .bind(kind)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("contact", e))?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), pagination, total))
    }

    async fn find_by_id(&self, tenant_id: &Uuid, id: &Uuid) -> Result<Option<Contact>, DomainError> {
        let row: Option<ContactRow> = sqlx::query_as(&format!(
            "SELECT {} FROM contacts WHERE tenant_id = $1 AND id = $2 AND NOT is_deleted",
            COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("contact", e))?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, contact: &Contact) -> Result<Contact, DomainError> {
        let row: ContactRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO contacts (
                id, tenant_id, kind, name, email, phone, company, rut, notes,
                created_at, updated_at, is_deleted, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(contact.id)
        .bind(contact.tenant_id)
        .bind(contact.kind.as_str())
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.company)
        .bind(&contact.rut)
        .bind(&contact.notes)
        .bind(contact.created_at)
        .bind(contact.updated_at)
        .bind(contact.is_deleted)
        .bind(contact.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("contact", e))?;

        Ok(row.into())
    }

    async fn update(&self, contact: &Contact) -> Result<Contact, DomainError> {
        let row: Option<ContactRow> = sqlx::query_as(&format!(
            r#"
            UPDATE contacts
            SET kind = $3, name = $4, email = $5, phone = $6, company = $7, rut = $8, notes = $9,
                updated_at = $10, is_deleted = $11, deleted_at = $12
            WHERE tenant_id = $1 AND id = $2
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(contact.tenant_id)
        .bind(contact.id)
        .bind(contact.kind.as_str())
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.company)
        .bind(&contact.rut)
        .bind(&contact.notes)
        .bind(contact.updated_at)
        .bind(contact.is_deleted)
        .bind(contact.deleted_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("contact", e))?;

        row.map(Into::into).ok_or_else(|| DomainError::not_found("Contact"))
    }
}
